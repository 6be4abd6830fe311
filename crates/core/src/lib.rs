//! Core domain logic for reelvote.
//!
//! Implements the group decision state machine (genre nomination, genre
//! voting, movie swipe consensus), the in-memory group store and the movie
//! catalog backends. The HTTP layer in `reelvote-api` is a thin shell over
//! the services defined here.

pub mod catalog;
pub mod model;
pub mod services;
pub mod store;

pub use catalog::{Catalog, DemoCatalog, SharedCatalog, TmdbCatalog};
pub use model::{
    GenreCount, GroupSnapshot, GroupState, MovieCandidate, Participant, ParticipantView, Phase,
    RoundStatus,
};
pub use services::{
    GenreVoteService, LeaveOutcome, NominationService, NominationTally, Progress, RegisterInput,
    Registration, RegistryService, SelectorService, SessionService, Standings, SwipeService,
    VetoService,
};
pub use store::{GroupStore, SessionToken};
