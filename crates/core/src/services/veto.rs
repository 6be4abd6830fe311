//! Single-use veto: instantly strike the current candidate.
//!
//! Every participant gets exactly one veto per group membership. Using it
//! bypasses the ballot count entirely; the candidate is rejected and the
//! next one comes up. Resets never restore a spent veto.

use crate::model::{Phase, RoundStatus};
use crate::services::selector::advance_to_next;
use crate::store::{GroupStore, SessionToken};
use reelvote_common::{AppError, AppResult};
use std::sync::Arc;

/// Service for veto usage.
#[derive(Clone)]
pub struct VetoService {
    store: Arc<GroupStore>,
}

impl VetoService {
    /// Create a new veto service.
    #[must_use]
    pub const fn new(store: Arc<GroupStore>) -> Self {
        Self { store }
    }

    /// Spend the caller's veto on the current candidate.
    pub async fn use_veto(&self, session: &SessionToken) -> AppResult<RoundStatus> {
        let handle = self.store.get(&session.code).await?;
        let mut group = handle.lock().await;
        group.require_open()?;
        let member = group.require_member(&session.participant_id)?;
        // Phase outranks a spent veto: outside selection the call is a
        // phase error regardless of the caller's veto state.
        if group.phase != Phase::MovieSelection {
            return Err(AppError::WrongPhase(group.phase.as_str().to_string()));
        }
        if member.veto_used {
            return Err(AppError::AlreadyUsed);
        }
        let current_id = group
            .current_candidate_id
            .clone()
            .filter(|id| !group.rejected.contains(id))
            .ok_or(AppError::NoCandidate)?;

        if let Some(participant) = group.participant_mut(&session.participant_id) {
            participant.veto_used = true;
        }
        group.rejected.insert(current_id.clone());
        tracing::info!(code = %group.code, candidate = %current_id, "Veto used");
        Ok(advance_to_next(&mut group))
    }
}
