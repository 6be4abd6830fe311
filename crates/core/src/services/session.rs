//! Session-level views and control: the polling progress summary and the
//! host reset.

use crate::model::{GroupSnapshot, MovieCandidate, Phase};
use crate::store::{GroupStore, SessionToken};
use reelvote_common::AppResult;
use serde::Serialize;
use std::sync::Arc;

/// Polling summary of where a group stands.
///
/// This is the one read that still works after a group is disbanded, so
/// clients waiting on a poll loop learn about the disband instead of
/// hitting an error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub phase: Phase,
    pub disbanded: bool,
    /// Active participants; departures drop out of every threshold.
    pub total_participants: usize,
    pub nominated_count: usize,
    pub all_nominated: bool,
    pub voted_count: usize,
    pub all_voted: bool,
    /// Genre currently leading the vote, if any votes are in.
    pub leader: Option<String>,
    pub finalized_genres: Vec<String>,
    /// The winning movie once the group is finalized.
    pub winner: Option<MovieCandidate>,
}

/// Service for session-wide reads and the reset operation.
#[derive(Clone)]
pub struct SessionService {
    store: Arc<GroupStore>,
}

impl SessionService {
    /// Create a new session service.
    #[must_use]
    pub const fn new(store: Arc<GroupStore>) -> Self {
        Self { store }
    }

    /// Progress summary for a group, disbanded or not.
    pub async fn progress(&self, code: &str) -> AppResult<Progress> {
        let handle = self.store.get(code).await?;
        let group = handle.lock().await;

        let active = group.active_count();
        let nominated = group.distinct_nominators();
        let voted = group.distinct_voters();
        let winner = group
            .winner_id
            .as_deref()
            .and_then(|id| group.candidate(id))
            .cloned();

        Ok(Progress {
            phase: group.phase,
            disbanded: group.disbanded,
            total_participants: active,
            nominated_count: nominated,
            all_nominated: active > 0 && nominated >= active,
            voted_count: voted,
            all_voted: active > 0 && voted >= active,
            leader: group.vote_standings().first().map(|gc| gc.genre.clone()),
            finalized_genres: group.finalized_genres.clone(),
            winner,
        })
    }

    /// Host-only: restart the session from genre nomination.
    ///
    /// Clears nominations, votes, the candidate pool and all swipe state in
    /// one atomic step. Spent vetoes stay spent.
    pub async fn reset(&self, session: &SessionToken) -> AppResult<GroupSnapshot> {
        let handle = self.store.get(&session.code).await?;
        let mut group = handle.lock().await;
        group.require_open()?;
        group.require_host(&session.participant_id)?;

        group.nominations.clear();
        group.genre_votes.clear();
        group.finalized_genres.clear();
        group.pool.clear();
        group.pool_built = false;
        group.rejected.clear();
        group.current_candidate_id = None;
        group.ballots.clear();
        group.winner_id = None;
        group.phase = Phase::GenreNomination;

        tracing::info!(code = %group.code, "Session reset by host");
        Ok(group.snapshot())
    }
}
