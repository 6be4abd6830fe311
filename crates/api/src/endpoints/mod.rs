//! API endpoints.

mod genres;
mod groups;
mod movies;
mod session;

use axum::Router;
use reelvote_common::{AppError, AppResult};
use reelvote_core::SessionToken;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest(
            "/groups",
            groups::router()
                .merge(genres::router())
                .merge(movies::router()),
        )
        .merge(session::router())
}

/// Reject tokens that belong to a different group than the one addressed
/// in the path.
pub(crate) fn require_group(session: &SessionToken, code: &str) -> AppResult<()> {
    if session.code.eq_ignore_ascii_case(code.trim()) {
        return Ok(());
    }
    Err(AppError::Forbidden(
        "Token does not belong to this group".to_string(),
    ))
}
