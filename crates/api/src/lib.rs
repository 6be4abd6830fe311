//! HTTP API layer for reelvote.
//!
//! This crate provides the REST API for group decision sessions:
//!
//! - **Endpoints**: group lifecycle, genre rounds, movie swipe voting
//! - **Extractors**: bearer-token participant authentication
//! - **Middleware**: token resolution, application state
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
