//! Group lifecycle: create, join, leave, disband.

use crate::model::{GroupSnapshot, GroupState, Participant, ParticipantView, Phase};
use crate::services::genre_vote::maybe_finalize_votes;
use crate::services::nomination::maybe_advance_nomination;
use crate::store::{GroupStore, SessionToken};
use chrono::Utc;
use reelvote_common::{AppError, AppResult};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Input for creating a group or joining one.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    /// Name shown to other participants.
    #[validate(length(min = 1, max = 50, message = "must be 1-50 characters"))]
    pub display_name: String,
    /// Streaming services the participant can watch on.
    #[serde(default)]
    pub services: Vec<String>,
}

/// Result of a registration: the group plus the caller's credentials.
#[derive(Debug, Clone)]
pub struct Registration {
    pub group: GroupSnapshot,
    pub participant_id: String,
    pub token: String,
}

/// Result of leaving a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The participant left; the group continues.
    Left,
    /// The leaver was the host (or the last member); the group is disbanded.
    Disbanded,
}

/// Service for group membership operations.
#[derive(Clone)]
pub struct RegistryService {
    store: Arc<GroupStore>,
}

impl RegistryService {
    /// Create a new registry service.
    #[must_use]
    pub const fn new(store: Arc<GroupStore>) -> Self {
        Self { store }
    }

    /// Reject callers that already hold an active membership somewhere.
    async fn require_unaffiliated(&self, principal: Option<&SessionToken>) -> AppResult<()> {
        let Some(session) = principal else {
            return Ok(());
        };
        let Ok(handle) = self.store.get(&session.code).await else {
            return Ok(());
        };
        let group = handle.lock().await;
        let active = !group.disbanded
            && group
                .participant(&session.participant_id)
                .is_some_and(crate::model::Participant::is_active);
        if active {
            return Err(AppError::AlreadyMember(group.code.clone()));
        }
        Ok(())
    }

    fn new_participant(&self, input: &RegisterInput, is_host: bool) -> Participant {
        Participant {
            id: self.store.id_gen().generate(),
            display_name: input.display_name.trim().to_string(),
            is_host,
            joined_at: Utc::now(),
            left_at: None,
            veto_used: false,
            services: input
                .services
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Create a group with the caller as host.
    pub async fn create_group(
        &self,
        principal: Option<&SessionToken>,
        input: RegisterInput,
    ) -> AppResult<Registration> {
        input.validate()?;
        self.require_unaffiliated(principal).await?;

        let host = self.new_participant(&input, true);
        let participant_id = host.id.clone();
        let handle = self
            .store
            .create_group(|code| GroupState::new(code, host))
            .await;
        let (group, code) = {
            let group = handle.lock().await;
            (group.snapshot(), group.code.clone())
        };
        let token = self.store.issue_token(&code, &participant_id).await;
        tracing::info!(code = %code, "Group created");
        Ok(Registration {
            group,
            participant_id,
            token,
        })
    }

    /// Join an existing group by code.
    pub async fn join_group(
        &self,
        principal: Option<&SessionToken>,
        code: &str,
        input: RegisterInput,
    ) -> AppResult<Registration> {
        input.validate()?;
        self.require_unaffiliated(principal).await?;

        let handle = self.store.get(code).await?;
        let member = self.new_participant(&input, false);
        let participant_id = member.id.clone();

        let (group, code) = {
            let mut group = handle.lock().await;
            group.require_open()?;
            if group.phase == Phase::Finalized {
                return Err(AppError::WrongPhase(group.phase.as_str().to_string()));
            }
            group.participants.push(member);
            (group.snapshot(), group.code.clone())
        };
        let token = self.store.issue_token(&code, &participant_id).await;

        tracing::info!(code = %code, "Participant joined group");
        Ok(Registration {
            group,
            participant_id,
            token,
        })
    }

    /// Leave the caller's group. A departing host disbands the group; any
    /// other departure may unblock a pending phase transition.
    pub async fn leave_group(&self, session: &SessionToken) -> AppResult<LeaveOutcome> {
        let handle = self.store.get(&session.code).await?;
        let mut group = handle.lock().await;
        group.require_open()?;
        group.require_member(&session.participant_id)?;

        let is_host = group.host_id == session.participant_id;
        if let Some(participant) = group.participant_mut(&session.participant_id) {
            participant.left_at = Some(Utc::now());
        }

        if is_host || group.active_count() == 0 {
            group.disbanded = true;
            tracing::info!(code = %group.code, "Group disbanded");
            return Ok(LeaveOutcome::Disbanded);
        }

        // The departure may satisfy an all-participants threshold.
        match group.phase {
            p if p.accepts_nominations() => maybe_advance_nomination(&mut group),
            Phase::GenreVoting => maybe_finalize_votes(&mut group),
            _ => {}
        }

        tracing::info!(code = %group.code, "Participant left group");
        Ok(LeaveOutcome::Left)
    }

    /// Read-only view of a group by code.
    pub async fn snapshot(&self, code: &str) -> AppResult<GroupSnapshot> {
        let handle = self.store.get(code).await?;
        let group = handle.lock().await;
        Ok(group.snapshot())
    }

    /// The caller's own membership.
    pub async fn whoami(
        &self,
        session: &SessionToken,
    ) -> AppResult<(GroupSnapshot, ParticipantView)> {
        let handle = self.store.get(&session.code).await?;
        let group = handle.lock().await;
        let participant = group
            .participant(&session.participant_id)
            .ok_or(AppError::Unauthorized)?;
        let view = ParticipantView {
            id: participant.id.clone(),
            display_name: participant.display_name.clone(),
            is_host: participant.is_host,
            veto_used: participant.veto_used,
            left: !participant.is_active(),
            services: participant.services.clone(),
        };
        Ok((group.snapshot(), view))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(name: &str, services: &[&str]) -> RegisterInput {
        RegisterInput {
            display_name: name.to_string(),
            services: services.iter().map(ToString::to_string).collect(),
        }
    }

    fn service() -> RegistryService {
        RegistryService::new(Arc::new(GroupStore::new()))
    }

    #[tokio::test]
    async fn create_registers_host_and_issues_token() {
        let registry = service();
        let reg = registry
            .create_group(None, input("Ana", &["Netflix", " Hulu "]))
            .await
            .unwrap();

        assert_eq!(reg.group.code.len(), 6);
        assert_eq!(reg.group.phase, Phase::GenreNomination);
        assert_eq!(reg.group.participants.len(), 1);
        assert!(reg.group.participants[0].is_host);
        // Services are trimmed and lowercased on registration.
        assert_eq!(reg.group.participants[0].services, vec!["netflix", "hulu"]);
        assert!(!reg.token.is_empty());
    }

    #[tokio::test]
    async fn join_rejects_active_members_elsewhere() {
        let registry = service();
        let host = registry.create_group(None, input("Ana", &[])).await.unwrap();
        let other = registry.create_group(None, input("Ben", &[])).await.unwrap();

        let session = SessionToken {
            code: other.group.code.clone(),
            participant_id: other.participant_id.clone(),
        };
        let err = registry
            .join_group(Some(&session), &host.group.code, input("Ben", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyMember(code) if code == other.group.code));
    }

    #[tokio::test]
    async fn host_leave_disbands_and_blocks_further_mutation() {
        let registry = service();
        let host = registry.create_group(None, input("Ana", &[])).await.unwrap();
        let guest = registry
            .join_group(None, &host.group.code, input("Ben", &[]))
            .await
            .unwrap();

        let host_session = SessionToken {
            code: host.group.code.clone(),
            participant_id: host.participant_id.clone(),
        };
        let outcome = registry.leave_group(&host_session).await.unwrap();
        assert_eq!(outcome, LeaveOutcome::Disbanded);

        let guest_session = SessionToken {
            code: guest.group.code.clone(),
            participant_id: guest.participant_id.clone(),
        };
        let err = registry.leave_group(&guest_session).await.unwrap_err();
        assert!(matches!(err, AppError::Disbanded));
    }

    #[tokio::test]
    async fn rejoin_after_leave_gets_a_fresh_identity() {
        let registry = service();
        let host = registry.create_group(None, input("Ana", &[])).await.unwrap();
        let guest = registry
            .join_group(None, &host.group.code, input("Ben", &[]))
            .await
            .unwrap();

        let guest_session = SessionToken {
            code: guest.group.code.clone(),
            participant_id: guest.participant_id.clone(),
        };
        registry.leave_group(&guest_session).await.unwrap();

        // A former member may rejoin even while still holding the old token.
        let rejoined = registry
            .join_group(Some(&guest_session), &host.group.code, input("Ben", &[]))
            .await
            .unwrap();
        assert_ne!(rejoined.participant_id, guest.participant_id);

        let snapshot = registry.snapshot(&host.group.code).await.unwrap();
        let active: Vec<_> = snapshot.participants.iter().filter(|p| !p.left).collect();
        assert_eq!(active.len(), 2);
        assert_eq!(snapshot.participants.len(), 3);
    }

    #[tokio::test]
    async fn departure_can_unblock_a_pending_transition() {
        use crate::services::nomination::NominationService;

        let store = Arc::new(GroupStore::new());
        let registry = RegistryService::new(Arc::clone(&store));
        let nomination = NominationService::new(Arc::clone(&store));

        let host = registry.create_group(None, input("Ana", &[])).await.unwrap();
        let code = host.group.code.clone();
        let ben = registry
            .join_group(None, &code, input("Ben", &[]))
            .await
            .unwrap();
        let cal = registry
            .join_group(None, &code, input("Cal", &[]))
            .await
            .unwrap();

        let session = |reg: &Registration| SessionToken {
            code: code.clone(),
            participant_id: reg.participant_id.clone(),
        };
        for reg in [&host, &ben] {
            nomination
                .nominate(&session(reg), &["Drama".to_string()])
                .await
                .unwrap();
        }

        let snapshot = registry.snapshot(&code).await.unwrap();
        assert_eq!(snapshot.phase, Phase::GenreNomination);

        // Cal never nominates; Cal leaving satisfies the threshold.
        registry.leave_group(&session(&cal)).await.unwrap();
        let snapshot = registry.snapshot(&code).await.unwrap();
        assert_eq!(snapshot.phase, Phase::GenreVoting);
    }

    #[tokio::test]
    async fn blank_display_name_is_rejected() {
        let registry = service();
        let err = registry.create_group(None, input("", &[])).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
