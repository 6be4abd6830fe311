//! Movie swipe and veto endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use reelvote_common::AppResult;
use reelvote_core::{MovieCandidate, RoundStatus};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthParticipant, middleware::AppState, response::ApiResponse};

use super::require_group;

/// Create movie-round router (mounted under `/groups`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{code}/movies/current", get(current_movie))
        .route("/{code}/movies/vote", post(vote_movie))
        .route("/{code}/veto/use", post(use_veto))
}

/// Swipe ballot request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeRequest {
    pub accept: bool,
}

/// Round status on the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie: Option<MovieCandidate>,
}

impl From<RoundStatus> for RoundResponse {
    fn from(status: RoundStatus) -> Self {
        match status {
            RoundStatus::Pending => Self {
                status: "pending",
                movie: None,
            },
            RoundStatus::Current(movie) => Self {
                status: "current",
                movie: Some(movie),
            },
            RoundStatus::Finalized(movie) => Self {
                status: "finalized",
                movie: Some(movie),
            },
            RoundStatus::Exhausted => Self {
                status: "exhausted",
                movie: None,
            },
        }
    }
}

/// The candidate currently on screen (or the winner once finalized).
async fn current_movie(
    AuthParticipant(session): AuthParticipant,
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<ApiResponse<RoundResponse>> {
    require_group(&session, &code)?;
    let status = state.selector_service.current(&session).await?;
    Ok(ApiResponse::ok(status.into()))
}

/// Cast or change an accept/reject ballot on the current candidate.
async fn vote_movie(
    AuthParticipant(session): AuthParticipant,
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(request): Json<SwipeRequest>,
) -> AppResult<ApiResponse<RoundResponse>> {
    require_group(&session, &code)?;
    let status = state.swipe_service.vote(&session, request.accept).await?;
    Ok(ApiResponse::ok(status.into()))
}

/// Spend the caller's single veto on the current candidate.
async fn use_veto(
    AuthParticipant(session): AuthParticipant,
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<ApiResponse<RoundResponse>> {
    require_group(&session, &code)?;
    let status = state.veto_service.use_veto(&session).await?;
    Ok(ApiResponse::ok(status.into()))
}
