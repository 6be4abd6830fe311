//! Swipe voting on the current movie candidate.
//!
//! Each participant holds one ballot per candidate and may change it freely
//! until a strict majority of active participants resolves the candidate:
//! accept finalizes the group, reject excludes the movie and advances to the
//! next one.

use crate::catalog::SharedCatalog;
use crate::model::{Phase, RoundStatus, SwipeBallot, is_strict_majority};
use crate::services::selector::{advance_to_next, ensure_pool};
use crate::store::{GroupStore, SessionToken};
use reelvote_common::{AppError, AppResult};
use std::sync::Arc;

/// Service for accept/reject ballots during movie selection.
#[derive(Clone)]
pub struct SwipeService {
    store: Arc<GroupStore>,
    catalog: SharedCatalog,
}

impl SwipeService {
    /// Create a new swipe service.
    #[must_use]
    pub fn new(store: Arc<GroupStore>, catalog: SharedCatalog) -> Self {
        Self { store, catalog }
    }

    /// Cast or change the caller's ballot on the current candidate.
    pub async fn vote(&self, session: &SessionToken, accept: bool) -> AppResult<RoundStatus> {
        let handle = self.store.get(&session.code).await?;
        let mut group = handle.lock().await;
        group.require_open()?;
        group.require_member(&session.participant_id)?;
        if group.phase != Phase::MovieSelection {
            return Err(AppError::WrongPhase(group.phase.as_str().to_string()));
        }

        ensure_pool(&mut group, self.catalog.as_ref()).await?;
        let current_id = match group.current_candidate_id.clone() {
            Some(id) if !group.rejected.contains(&id) => id,
            _ => match advance_to_next(&mut group) {
                RoundStatus::Current(candidate) => candidate.id,
                _ => return Ok(RoundStatus::Exhausted),
            },
        };

        // One ballot per participant; a re-vote replaces it.
        group
            .ballots
            .retain(|b| b.participant_id != session.participant_id);
        group.ballots.push(SwipeBallot {
            participant_id: session.participant_id.clone(),
            candidate_id: current_id.clone(),
            accept,
        });

        let active = group.active_count();
        let (yes, no) = tally(&group, &current_id);

        if is_strict_majority(yes, active) {
            group.winner_id = Some(current_id.clone());
            group.phase = Phase::Finalized;
            let winner = group.candidate(&current_id).cloned().ok_or_else(|| {
                AppError::Internal("Winner candidate missing from pool".to_string())
            })?;
            tracing::info!(code = %group.code, movie = %winner.title, "Group finalized");
            return Ok(RoundStatus::Finalized(winner));
        }

        if is_strict_majority(no, active) {
            group.rejected.insert(current_id);
            return Ok(advance_to_next(&mut group));
        }

        Ok(RoundStatus::Pending)
    }
}

/// Count accept and reject ballots for a candidate. A departure never
/// retracts a ballot already cast; leaving only shrinks `active_count`,
/// and with it the threshold for future ballots.
fn tally(group: &crate::model::GroupState, candidate_id: &str) -> (usize, usize) {
    let mut yes = 0;
    let mut no = 0;
    for ballot in &group.ballots {
        if ballot.candidate_id != candidate_id {
            continue;
        }
        if ballot.accept {
            yes += 1;
        } else {
            no += 1;
        }
    }
    (yes, no)
}
