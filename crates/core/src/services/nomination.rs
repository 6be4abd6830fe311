//! Genre nomination: collect up to two genres per participant and advance
//! to genre voting (or straight to movie selection for a lone participant).

use crate::model::{
    FINALIZED_GENRE_COUNT, GenreCount, GenreNomination, GroupState, MAX_NOMINATIONS, Phase,
    canonical_genre,
};
use crate::store::{GroupStore, SessionToken};
use reelvote_common::{AppError, AppResult};
use std::sync::Arc;

/// Nomination tally plus the phase the submission left the group in.
#[derive(Debug, Clone)]
pub struct NominationTally {
    pub tally: Vec<GenreCount>,
    pub phase: Phase,
}

/// Service for the genre nomination phase.
#[derive(Clone)]
pub struct NominationService {
    store: Arc<GroupStore>,
}

impl NominationService {
    /// Create a new nomination service.
    #[must_use]
    pub const fn new(store: Arc<GroupStore>) -> Self {
        Self { store }
    }

    /// Submit the caller's nominations. Resubmission replaces the previous
    /// set rather than adding to it.
    pub async fn nominate(
        &self,
        session: &SessionToken,
        genres: &[String],
    ) -> AppResult<NominationTally> {
        let canonical = canonicalize_selection(genres)?;

        let handle = self.store.get(&session.code).await?;
        let mut group = handle.lock().await;
        group.require_open()?;
        group.require_member(&session.participant_id)?;
        if !group.phase.accepts_nominations() {
            return Err(AppError::WrongPhase(group.phase.as_str().to_string()));
        }

        group
            .nominations
            .retain(|n| n.participant_id != session.participant_id);
        for genre in canonical {
            group.nominations.push(GenreNomination {
                participant_id: session.participant_id.clone(),
                genre: genre.to_string(),
            });
        }

        maybe_advance_nomination(&mut group);
        Ok(NominationTally {
            tally: group.nomination_tally(),
            phase: group.phase,
        })
    }

    /// Current nomination tally.
    pub async fn tally(&self, code: &str) -> AppResult<NominationTally> {
        let handle = self.store.get(code).await?;
        let group = handle.lock().await;
        Ok(NominationTally {
            tally: group.nomination_tally(),
            phase: group.phase,
        })
    }

    /// Host-only: close nominations without waiting for everyone.
    pub async fn advance(&self, session: &SessionToken) -> AppResult<Phase> {
        let handle = self.store.get(&session.code).await?;
        let mut group = handle.lock().await;
        group.require_open()?;
        group.require_host(&session.participant_id)?;
        if !group.phase.accepts_nominations() {
            return Err(AppError::WrongPhase(group.phase.as_str().to_string()));
        }
        if group.nominations.is_empty() {
            return Err(AppError::Conflict(
                "No genres have been nominated yet".to_string(),
            ));
        }

        advance_from_nomination(&mut group);
        tracing::info!(code = %group.code, phase = group.phase.as_str(), "Host closed nominations");
        Ok(group.phase)
    }
}

/// Validate, canonicalize and dedupe a nomination submission.
fn canonicalize_selection(genres: &[String]) -> AppResult<Vec<&'static str>> {
    let mut canonical: Vec<&'static str> = Vec::new();
    for raw in genres {
        let genre = canonical_genre(raw)
            .ok_or_else(|| AppError::Validation(format!("Unknown genre: {raw}")))?;
        if !canonical.contains(&genre) {
            canonical.push(genre);
        }
    }
    if canonical.is_empty() {
        return Err(AppError::EmptySelection);
    }
    if canonical.len() > MAX_NOMINATIONS {
        return Err(AppError::LimitExceeded(format!(
            "At most {MAX_NOMINATIONS} genres may be nominated"
        )));
    }
    Ok(canonical)
}

/// Advance out of the nomination phase when every active participant has
/// nominated. Call with the group lock held.
pub(crate) fn maybe_advance_nomination(group: &mut GroupState) {
    if !group.phase.accepts_nominations() || group.nominations.is_empty() {
        return;
    }
    let active = group.active_count();
    if active == 0 || group.distinct_nominators() < active {
        return;
    }
    advance_from_nomination(group);
}

/// Unconditional transition out of the nomination phase. A lone participant
/// skips genre voting entirely: their nominations are the finalized genres.
fn advance_from_nomination(group: &mut GroupState) {
    if group.active_count() == 1 {
        group.finalized_genres = group
            .nomination_tally()
            .into_iter()
            .take(FINALIZED_GENRE_COUNT)
            .map(|gc| gc.genre)
            .collect();
        group.phase = Phase::MovieSelection;
    } else {
        group.phase = Phase::GenreVoting;
    }
}
