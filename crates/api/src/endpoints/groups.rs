//! Group lifecycle endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use reelvote_common::AppResult;
use reelvote_core::{GroupSnapshot, LeaveOutcome, Progress, RegisterInput};
use serde::Serialize;
use tracing::info;

use crate::{
    extractors::{AuthParticipant, MaybeAuthParticipant},
    middleware::AppState,
    response::ApiResponse,
};

/// Create group router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_group))
        .route("/{code}/join", post(join_group))
        .route("/leave", post(leave_group))
        .route("/{code}", get(get_group))
        .route("/{code}/progress", get(get_progress))
}

/// Registration response: the group plus the caller's credentials.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub group: GroupSnapshot,
    pub participant_id: String,
    /// Opaque bearer token; send as `Authorization: Bearer <token>`.
    pub token: String,
}

/// Leave response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveResponse {
    pub status: &'static str,
}

/// Create a group with the caller as host.
async fn create_group(
    MaybeAuthParticipant(principal): MaybeAuthParticipant,
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<ApiResponse<RegistrationResponse>> {
    let registration = state
        .registry_service
        .create_group(principal.as_ref(), input)
        .await?;
    info!(code = %registration.group.code, "Group created via API");
    Ok(ApiResponse::ok(RegistrationResponse {
        group: registration.group,
        participant_id: registration.participant_id,
        token: registration.token,
    }))
}

/// Join an existing group by code.
async fn join_group(
    MaybeAuthParticipant(principal): MaybeAuthParticipant,
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(input): Json<RegisterInput>,
) -> AppResult<ApiResponse<RegistrationResponse>> {
    let registration = state
        .registry_service
        .join_group(principal.as_ref(), &code, input)
        .await?;
    Ok(ApiResponse::ok(RegistrationResponse {
        group: registration.group,
        participant_id: registration.participant_id,
        token: registration.token,
    }))
}

/// Leave the caller's group. A departing host disbands it.
async fn leave_group(
    AuthParticipant(session): AuthParticipant,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<LeaveResponse>> {
    let outcome = state.registry_service.leave_group(&session).await?;
    let status = match outcome {
        LeaveOutcome::Left => "left",
        LeaveOutcome::Disbanded => "disbanded",
    };
    Ok(ApiResponse::ok(LeaveResponse { status }))
}

/// Group snapshot for the lobby poll.
async fn get_group(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<ApiResponse<GroupSnapshot>> {
    let snapshot = state.registry_service.snapshot(&code).await?;
    Ok(ApiResponse::ok(snapshot))
}

/// Progress summary; the one read that still answers after a disband.
async fn get_progress(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<ApiResponse<Progress>> {
    let progress = state.session_service.progress(&code).await?;
    Ok(ApiResponse::ok(progress))
}
