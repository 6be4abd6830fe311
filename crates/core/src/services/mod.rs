//! Decision-session services.
//!
//! One service per concern, all sharing the [`crate::store::GroupStore`].
//! Services take the group lock once per operation, so every mutation is a
//! single atomic step of the state machine.

pub mod genre_vote;
pub mod nomination;
pub mod registry;
pub mod selector;
pub mod session;
pub mod swipe;
pub mod veto;

pub use genre_vote::{GenreVoteService, Standings};
pub use nomination::{NominationService, NominationTally};
pub use registry::{LeaveOutcome, RegisterInput, Registration, RegistryService};
pub use selector::SelectorService;
pub use session::{Progress, SessionService};
pub use swipe::SwipeService;
pub use veto::VetoService;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing {
    //! Fixtures that drive a group through the early phases so movie-phase
    //! tests can start from `MovieSelection`.

    use super::{GenreVoteService, NominationService, RegisterInput, RegistryService};
    use crate::store::{GroupStore, SessionToken};
    use std::sync::Arc;

    pub struct Fixture {
        pub store: Arc<GroupStore>,
        pub code: String,
        pub sessions: Vec<SessionToken>,
    }

    /// Create a group from `(display_name, services)` pairs; the first entry
    /// is the host.
    pub async fn group(members: &[(&str, &[&str])]) -> Fixture {
        let store = Arc::new(GroupStore::new());
        let registry = RegistryService::new(Arc::clone(&store));
        let input = |name: &str, services: &[&str]| RegisterInput {
            display_name: name.to_string(),
            services: services.iter().map(ToString::to_string).collect(),
        };

        let host = registry
            .create_group(None, input(members[0].0, members[0].1))
            .await
            .unwrap();
        let code = host.group.code.clone();
        let mut sessions = vec![SessionToken {
            code: code.clone(),
            participant_id: host.participant_id,
        }];
        for (name, services) in &members[1..] {
            let reg = registry
                .join_group(None, &code, input(name, services))
                .await
                .unwrap();
            sessions.push(SessionToken {
                code: code.clone(),
                participant_id: reg.participant_id,
            });
        }
        Fixture {
            store,
            code,
            sessions,
        }
    }

    impl Fixture {
        pub async fn nominate(&self, idx: usize, genres: &[&str]) {
            let genres: Vec<String> = genres.iter().map(ToString::to_string).collect();
            NominationService::new(Arc::clone(&self.store))
                .nominate(&self.sessions[idx], &genres)
                .await
                .unwrap();
        }

        pub async fn vote_genre(&self, idx: usize, genre: &str) {
            GenreVoteService::new(Arc::clone(&self.store))
                .vote(&self.sessions[idx], genre)
                .await
                .unwrap();
        }

        /// Drive every member through nomination and voting so the group
        /// lands in `MovieSelection` with the given genres finalized.
        /// `genres` must have one or two entries.
        pub async fn finalize_genres(&self, genres: &[&str]) {
            for idx in 0..self.sessions.len() {
                self.nominate(idx, genres).await;
            }
            if self.sessions.len() > 1 {
                let last = self.sessions.len() - 1;
                for idx in 0..last {
                    for genre in genres {
                        self.vote_genre(idx, genre).await;
                    }
                }
                // The final participant's first vote concludes the round,
                // so they vote only the lead genre.
                self.vote_genre(last, genres[0]).await;
            }
        }
    }
}
