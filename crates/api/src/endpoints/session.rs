//! Token introspection.

use axum::{Router, extract::State, routing::get};
use reelvote_common::AppResult;
use reelvote_core::{GroupSnapshot, ParticipantView};
use serde::Serialize;

use crate::{extractors::AuthParticipant, middleware::AppState, response::ApiResponse};

/// Create session router.
pub fn router() -> Router<AppState> {
    Router::new().route("/whoami", get(whoami))
}

/// Who-am-I response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoAmIResponse {
    pub group: GroupSnapshot,
    pub participant: ParticipantView,
}

/// The caller's own membership, resolved from the bearer token.
async fn whoami(
    AuthParticipant(session): AuthParticipant,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<WhoAmIResponse>> {
    let (group, participant) = state.registry_service.whoami(&session).await?;
    Ok(ApiResponse::ok(WhoAmIResponse { group, participant }))
}
