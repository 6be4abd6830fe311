//! Movie selection: builds the candidate pool from the catalog and hands
//! out candidates one at a time, deterministically.

use crate::catalog::{Catalog, SharedCatalog};
use crate::model::{GroupState, Phase, RoundStatus};
use crate::store::{GroupStore, SessionToken};
use reelvote_common::{AppError, AppResult};
use std::cmp::Ordering;
use std::sync::Arc;

/// Service that answers "what movie is on screen right now".
#[derive(Clone)]
pub struct SelectorService {
    store: Arc<GroupStore>,
    catalog: SharedCatalog,
}

impl SelectorService {
    /// Create a new selector service.
    #[must_use]
    pub fn new(store: Arc<GroupStore>, catalog: SharedCatalog) -> Self {
        Self { store, catalog }
    }

    /// The current candidate for the caller's group.
    ///
    /// Builds the pool lazily on first call after genres finalize. In the
    /// `Finalized` phase this returns the winner; before `MovieSelection`
    /// it is a phase error.
    pub async fn current(&self, session: &SessionToken) -> AppResult<RoundStatus> {
        let handle = self.store.get(&session.code).await?;
        let mut group = handle.lock().await;
        group.require_open()?;
        group.require_member(&session.participant_id)?;

        match group.phase {
            Phase::Finalized => {
                let winner = group
                    .winner_id
                    .as_deref()
                    .and_then(|id| group.candidate(id))
                    .cloned()
                    .ok_or_else(|| {
                        AppError::Internal("Finalized group has no winner candidate".to_string())
                    })?;
                Ok(RoundStatus::Finalized(winner))
            }
            Phase::MovieSelection => {
                ensure_pool(&mut group, self.catalog.as_ref()).await?;
                if let Some(current) = current_candidate(&group) {
                    return Ok(RoundStatus::Current(current));
                }
                Ok(advance_to_next(&mut group))
            }
            phase => Err(AppError::WrongPhase(phase.as_str().to_string())),
        }
    }
}

/// Union of the streaming services of all active participants. An empty
/// union means no provider filter is applied.
pub(crate) fn service_union(group: &GroupState) -> Vec<String> {
    let mut union: Vec<String> = Vec::new();
    for participant in group.participants.iter().filter(|p| p.is_active()) {
        for service in &participant.services {
            if !union.contains(service) {
                union.push(service.clone());
            }
        }
    }
    union
}

/// Fetch and order the candidate pool if it has not been built yet. Call
/// with the group lock held; the lock also serializes the fetch so only one
/// request goes out per group.
pub(crate) async fn ensure_pool(group: &mut GroupState, catalog: &dyn Catalog) -> AppResult<()> {
    if group.pool_built {
        return Ok(());
    }
    let union = service_union(group);
    let mut pool = catalog.fetch(&group.finalized_genres, &union).await?;
    // Deterministic presentation order: best score first, id as tie break.
    pool.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    tracing::debug!(code = %group.code, size = pool.len(), "Candidate pool built");
    group.pool = pool;
    group.pool_built = true;
    Ok(())
}

/// The valid current candidate, if one is set.
fn current_candidate(group: &GroupState) -> Option<crate::model::MovieCandidate> {
    let id = group.current_candidate_id.as_deref()?;
    if group.rejected.contains(id) {
        return None;
    }
    group.candidate(id).cloned()
}

/// Put the next eligible candidate on screen, clearing ballots for it.
/// Returns `Exhausted` when the pool has no eligible candidate left.
pub(crate) fn advance_to_next(group: &mut GroupState) -> RoundStatus {
    let union = service_union(group);
    let next = group
        .pool
        .iter()
        .find(|c| {
            !group.rejected.contains(&c.id)
                && group.winner_id.as_deref() != Some(c.id.as_str())
                && (union.is_empty() || c.providers.iter().any(|p| union.contains(p)))
        })
        .cloned();

    group.ballots.clear();
    match next {
        Some(candidate) => {
            group.current_candidate_id = Some(candidate.id.clone());
            RoundStatus::Current(candidate)
        }
        None => {
            group.current_candidate_id = None;
            RoundStatus::Exhausted
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::DemoCatalog;
    use crate::services::testing;

    fn selector(fx: &testing::Fixture) -> SelectorService {
        SelectorService::new(Arc::clone(&fx.store), Arc::new(DemoCatalog))
    }

    #[tokio::test]
    async fn current_is_deterministic_best_score_first() {
        let fx = testing::group(&[("Ana", &[]), ("Ben", &[])]).await;
        fx.finalize_genres(&["Drama", "Thriller"]).await;

        let service = selector(&fx);
        let first = service.current(&fx.sessions[0]).await.unwrap();
        let again = service.current(&fx.sessions[1]).await.unwrap();

        // Parasite has the top score among Drama/Thriller titles.
        match (&first, &again) {
            (RoundStatus::Current(a), RoundStatus::Current(b)) => {
                assert_eq!(a.title, "Parasite");
                assert_eq!(a.id, b.id);
            }
            other => panic!("expected current candidate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn union_of_services_filters_the_pool() {
        // Ana only has Hulu, Ben only Amazon: the union admits both.
        let fx = testing::group(&[("Ana", &["hulu"]), ("Ben", &["amazon"])]).await;
        fx.finalize_genres(&["Drama", "Mystery"]).await;

        let service = selector(&fx);
        let current = service.current(&fx.sessions[0]).await.unwrap();
        match current {
            RoundStatus::Current(c) => assert_eq!(c.title, "Parasite"),
            other => panic!("expected current candidate, got {other:?}"),
        }

        let group = fx.store.get(&fx.code).await.unwrap();
        let group = group.lock().await;
        let titles: Vec<&str> = group.pool.iter().map(|c| c.title.as_str()).collect();
        assert!(titles.contains(&"Knives Out"));
        assert!(!titles.contains(&"The Social Network"));
    }

    #[tokio::test]
    async fn empty_pool_reports_exhausted() {
        let fx = testing::group(&[("Ana", &["betamax-plus"])]).await;
        fx.finalize_genres(&["Drama"]).await;

        let service = selector(&fx);
        let current = service.current(&fx.sessions[0]).await.unwrap();
        assert_eq!(current, RoundStatus::Exhausted);
    }

    #[tokio::test]
    async fn current_is_a_phase_error_before_selection() {
        let fx = testing::group(&[("Ana", &[]), ("Ben", &[])]).await;
        let service = selector(&fx);

        let err = service.current(&fx.sessions[0]).await.unwrap_err();
        assert!(matches!(err, AppError::WrongPhase(p) if p == "genre_nomination"));
    }
}
