//! In-memory group registry.
//!
//! Sessions are short-lived, so groups live in process memory: a map from
//! join code to a per-group `Mutex<GroupState>`. Holding one group's lock
//! never blocks operations on another group, and every mutation of a group
//! happens as a single critical section, so each operation observes and
//! produces a consistent state.

use crate::model::GroupState;
use reelvote_common::{AppError, AppResult, IdGenerator};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// What a bearer token resolves to.
#[derive(Debug, Clone)]
pub struct SessionToken {
    /// Join code of the group the token belongs to.
    pub code: String,
    /// Participant the token authenticates.
    pub participant_id: String,
}

/// Shared handle to one group's state.
pub type GroupHandle = Arc<Mutex<GroupState>>;

/// Registry of all live groups plus the participant token index.
#[derive(Debug, Default)]
pub struct GroupStore {
    groups: RwLock<HashMap<String, GroupHandle>>,
    tokens: RwLock<HashMap<String, SessionToken>>,
    id_gen: IdGenerator,
}

impl GroupStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The store's ID generator.
    #[must_use]
    pub const fn id_gen(&self) -> &IdGenerator {
        &self.id_gen
    }

    /// Allocate a fresh join code and register the group built from it.
    ///
    /// Code generation, the uniqueness check and the insert all happen
    /// under one write lock, so two concurrent creates can never collide
    /// on a code.
    pub async fn create_group(&self, make: impl FnOnce(String) -> GroupState) -> GroupHandle {
        let mut groups = self.groups.write().await;
        let code = loop {
            let code = self.id_gen.generate_group_code();
            if !groups.contains_key(&code) {
                break code;
            }
        };
        let handle = Arc::new(Mutex::new(make(code.clone())));
        groups.insert(code, Arc::clone(&handle));
        handle
    }

    /// Look up a group by join code (case-insensitive).
    pub async fn get(&self, code: &str) -> AppResult<GroupHandle> {
        let code = code.trim().to_uppercase();
        self.groups
            .read()
            .await
            .get(&code)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Group {code}")))
    }

    /// Issue a bearer token for a participant.
    pub async fn issue_token(&self, code: &str, participant_id: &str) -> String {
        let token = self.id_gen.generate_token();
        self.tokens.write().await.insert(
            token.clone(),
            SessionToken {
                code: code.to_string(),
                participant_id: participant_id.to_string(),
            },
        );
        token
    }

    /// Resolve a bearer token to its session, if any.
    pub async fn resolve_token(&self, token: &str) -> Option<SessionToken> {
        self.tokens.read().await.get(token).cloned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Participant;
    use chrono::Utc;

    fn host() -> Participant {
        Participant {
            id: "host".to_string(),
            display_name: "Host".to_string(),
            is_host: true,
            joined_at: Utc::now(),
            left_at: None,
            veto_used: false,
            services: Vec::new(),
        }
    }

    #[tokio::test]
    async fn lookup_is_case_insensitive() {
        let store = GroupStore::new();
        let handle = store
            .create_group(|code| GroupState::new(code, host()))
            .await;
        let code = handle.lock().await.code.clone();

        assert!(store.get(&code.to_lowercase()).await.is_ok());
        assert!(store.get(&format!(" {code} ")).await.is_ok());
        assert!(store.get("??????").await.is_err());
    }

    #[tokio::test]
    async fn created_groups_get_distinct_codes() {
        let store = GroupStore::new();
        let mut codes = std::collections::HashSet::new();
        for _ in 0..32 {
            let handle = store
                .create_group(|code| GroupState::new(code, host()))
                .await;
            let code = handle.lock().await.code.clone();
            assert!(store.get(&code).await.is_ok());
            assert!(codes.insert(code), "duplicate code issued");
        }
    }

    #[tokio::test]
    async fn tokens_round_trip() {
        let store = GroupStore::new();
        let token = store.issue_token("AB12CD", "p1").await;

        let session = store.resolve_token(&token).await.unwrap();
        assert_eq!(session.code, "AB12CD");
        assert_eq!(session.participant_id, "p1");
        assert!(store.resolve_token("bogus").await.is_none());
    }
}
