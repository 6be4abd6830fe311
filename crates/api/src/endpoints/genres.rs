//! Genre nomination and voting endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use reelvote_common::AppResult;
use reelvote_core::model::ALLOWED_GENRES;
use reelvote_core::{GenreCount, GroupSnapshot, Phase};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthParticipant, middleware::AppState, response::ApiResponse};

use super::require_group;

/// Create genre-round router (mounted under `/groups`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{code}/genres/nominate", post(nominate))
        .route("/{code}/genres/nominations", get(nominations))
        .route("/{code}/genres/vote", post(vote))
        .route("/{code}/genres/standings", get(standings))
        .route("/{code}/genres/advance", post(advance))
        .route("/{code}/genres/reset", post(reset))
}

/// Nomination request: up to two genres, replacing any previous set.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NominateRequest {
    pub genres: Vec<String>,
}

/// Nomination tally response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NominationsResponse {
    pub tally: Vec<GenreCount>,
    pub phase: Phase,
    pub allowed_genres: &'static [&'static str],
}

/// Genre vote request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreVoteRequest {
    pub genre: String,
}

/// Standings response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsResponse {
    pub standings: Vec<GenreCount>,
    pub leader: Option<String>,
    pub phase: Phase,
    pub finalized_genres: Vec<String>,
}

/// Phase response for host advance.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseResponse {
    pub phase: Phase,
}

/// Submit the caller's nominations.
async fn nominate(
    AuthParticipant(session): AuthParticipant,
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(request): Json<NominateRequest>,
) -> AppResult<ApiResponse<NominationsResponse>> {
    require_group(&session, &code)?;
    let result = state
        .nomination_service
        .nominate(&session, &request.genres)
        .await?;
    Ok(ApiResponse::ok(NominationsResponse {
        tally: result.tally,
        phase: result.phase,
        allowed_genres: &ALLOWED_GENRES,
    }))
}

/// Current nomination tally plus the allowed genre list.
async fn nominations(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<ApiResponse<NominationsResponse>> {
    let result = state.nomination_service.tally(&code).await?;
    Ok(ApiResponse::ok(NominationsResponse {
        tally: result.tally,
        phase: result.phase,
        allowed_genres: &ALLOWED_GENRES,
    }))
}

/// Cast a genre vote.
async fn vote(
    AuthParticipant(session): AuthParticipant,
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(request): Json<GenreVoteRequest>,
) -> AppResult<ApiResponse<StandingsResponse>> {
    require_group(&session, &code)?;
    let result = state
        .genre_vote_service
        .vote(&session, &request.genre)
        .await?;
    Ok(ApiResponse::ok(StandingsResponse {
        standings: result.standings,
        leader: result.leader,
        phase: result.phase,
        finalized_genres: result.finalized_genres,
    }))
}

/// Current vote standings.
async fn standings(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<ApiResponse<StandingsResponse>> {
    let result = state.genre_vote_service.standings(&code).await?;
    Ok(ApiResponse::ok(StandingsResponse {
        standings: result.standings,
        leader: result.leader,
        phase: result.phase,
        finalized_genres: result.finalized_genres,
    }))
}

/// Host-only: close nominations early.
async fn advance(
    AuthParticipant(session): AuthParticipant,
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<ApiResponse<PhaseResponse>> {
    require_group(&session, &code)?;
    let phase = state.nomination_service.advance(&session).await?;
    Ok(ApiResponse::ok(PhaseResponse { phase }))
}

/// Host-only: restart the session from genre nomination.
async fn reset(
    AuthParticipant(session): AuthParticipant,
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<ApiResponse<GroupSnapshot>> {
    require_group(&session, &code)?;
    let snapshot = state.session_service.reset(&session).await?;
    Ok(ApiResponse::ok(snapshot))
}
