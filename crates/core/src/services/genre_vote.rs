//! Genre voting: each participant backs up to three nominated genres; when
//! everyone has voted, the top two genres are locked in for movie selection.

use crate::model::{
    FINALIZED_GENRE_COUNT, GenreCount, GenreVote, GroupState, MAX_GENRE_VOTES, Phase,
    canonical_genre,
};
use crate::store::{GroupStore, SessionToken};
use reelvote_common::{AppError, AppResult};
use std::sync::Arc;

/// Vote standings plus the group's phase after the operation.
#[derive(Debug, Clone)]
pub struct Standings {
    pub standings: Vec<GenreCount>,
    /// Genre currently in the lead, if any votes have been cast.
    pub leader: Option<String>,
    pub phase: Phase,
    /// Set once voting has concluded.
    pub finalized_genres: Vec<String>,
}

impl Standings {
    fn of(group: &GroupState) -> Self {
        let standings = group.vote_standings();
        Self {
            leader: standings.first().map(|gc| gc.genre.clone()),
            standings,
            phase: group.phase,
            finalized_genres: group.finalized_genres.clone(),
        }
    }
}

/// Service for the genre voting phase.
#[derive(Clone)]
pub struct GenreVoteService {
    store: Arc<GroupStore>,
}

impl GenreVoteService {
    /// Create a new genre vote service.
    #[must_use]
    pub const fn new(store: Arc<GroupStore>) -> Self {
        Self { store }
    }

    /// Cast a vote for a nominated genre. Voting the same genre twice is a
    /// no-op, not an error.
    pub async fn vote(&self, session: &SessionToken, genre: &str) -> AppResult<Standings> {
        let genre = canonical_genre(genre)
            .ok_or_else(|| AppError::Validation(format!("Unknown genre: {genre}")))?;

        let handle = self.store.get(&session.code).await?;
        let mut group = handle.lock().await;
        group.require_open()?;
        group.require_member(&session.participant_id)?;
        if group.phase != Phase::GenreVoting {
            return Err(AppError::WrongPhase(group.phase.as_str().to_string()));
        }
        if !group.nominations.iter().any(|n| n.genre == genre) {
            return Err(AppError::NotNominated(genre.to_string()));
        }

        let own_votes: Vec<&str> = group
            .genre_votes
            .iter()
            .filter(|v| v.participant_id == session.participant_id)
            .map(|v| v.genre.as_str())
            .collect();
        if own_votes.contains(&genre) {
            return Ok(Standings::of(&group));
        }
        if own_votes.len() >= MAX_GENRE_VOTES {
            return Err(AppError::VoteLimitReached(MAX_GENRE_VOTES));
        }

        group.genre_votes.push(GenreVote {
            participant_id: session.participant_id.clone(),
            genre: genre.to_string(),
        });
        maybe_finalize_votes(&mut group);
        Ok(Standings::of(&group))
    }

    /// Current standings without voting.
    pub async fn standings(&self, code: &str) -> AppResult<Standings> {
        let handle = self.store.get(code).await?;
        let group = handle.lock().await;
        Ok(Standings::of(&group))
    }
}

/// Finalize the top genres once every active participant has voted. Call
/// with the group lock held.
pub(crate) fn maybe_finalize_votes(group: &mut GroupState) {
    if group.phase != Phase::GenreVoting || group.genre_votes.is_empty() {
        return;
    }
    let active = group.active_count();
    if active == 0 || group.distinct_voters() < active {
        return;
    }

    group.finalized_genres = group
        .vote_standings()
        .into_iter()
        .take(FINALIZED_GENRE_COUNT)
        .map(|gc| gc.genre)
        .collect();
    group.phase = Phase::MovieSelection;
    tracing::info!(
        code = %group.code,
        genres = ?group.finalized_genres,
        "Genre voting concluded"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::nomination::NominationService;
    use crate::services::registry::{RegisterInput, RegistryService};

    struct Fixture {
        store: Arc<GroupStore>,
        code: String,
        sessions: Vec<SessionToken>,
    }

    /// Group with everyone already past nomination, in `GenreVoting`.
    async fn voting_group(members: &[(&str, &[&str])]) -> Fixture {
        let store = Arc::new(GroupStore::new());
        let registry = RegistryService::new(Arc::clone(&store));
        let nomination = NominationService::new(Arc::clone(&store));
        let input = |name: &str| RegisterInput {
            display_name: name.to_string(),
            services: Vec::new(),
        };

        let host = registry
            .create_group(None, input(members[0].0))
            .await
            .unwrap();
        let code = host.group.code.clone();
        let mut sessions = vec![SessionToken {
            code: code.clone(),
            participant_id: host.participant_id,
        }];
        for (name, _) in &members[1..] {
            let reg = registry.join_group(None, &code, input(name)).await.unwrap();
            sessions.push(SessionToken {
                code: code.clone(),
                participant_id: reg.participant_id,
            });
        }
        for (session, (_, genres)) in sessions.iter().zip(members) {
            let genres: Vec<String> = genres.iter().map(ToString::to_string).collect();
            nomination.nominate(session, &genres).await.unwrap();
        }
        Fixture {
            store,
            code,
            sessions,
        }
    }

    #[tokio::test]
    async fn vote_requires_nominated_genre() {
        let fx = voting_group(&[("Ana", &["Action"]), ("Ben", &["Comedy"])]).await;
        let service = GenreVoteService::new(fx.store);

        let err = service.vote(&fx.sessions[0], "Drama").await.unwrap_err();
        assert!(matches!(err, AppError::NotNominated(g) if g == "Drama"));
    }

    #[tokio::test]
    async fn duplicate_vote_is_idempotent_and_limit_applies() {
        let fx = voting_group(&[
            ("Ana", &["Action", "Comedy"]),
            ("Ben", &["Drama", "Horror"]),
        ])
        .await;
        let service = GenreVoteService::new(fx.store);
        let ana = &fx.sessions[0];

        service.vote(ana, "Action").await.unwrap();
        let after_dup = service.vote(ana, "action").await.unwrap();
        assert_eq!(
            after_dup
                .standings
                .iter()
                .find(|gc| gc.genre == "Action")
                .unwrap()
                .count,
            1
        );

        service.vote(ana, "Comedy").await.unwrap();
        service.vote(ana, "Drama").await.unwrap();
        let err = service.vote(ana, "Horror").await.unwrap_err();
        assert!(matches!(err, AppError::VoteLimitReached(3)));
    }

    #[tokio::test]
    async fn all_voted_finalizes_top_two() {
        let fx = voting_group(&[
            ("Ana", &["Action", "Comedy"]),
            ("Ben", &["Drama"]),
            ("Cal", &["Comedy"]),
        ])
        .await;
        let service = GenreVoteService::new(Arc::clone(&fx.store));

        service.vote(&fx.sessions[0], "Comedy").await.unwrap();
        service.vote(&fx.sessions[1], "Comedy").await.unwrap();
        let mid = service.vote(&fx.sessions[1], "Drama").await.unwrap();
        assert_eq!(mid.phase, Phase::GenreVoting);

        let done = service.vote(&fx.sessions[2], "Action").await.unwrap();
        assert_eq!(done.phase, Phase::MovieSelection);
        assert_eq!(done.finalized_genres, vec!["Comedy", "Drama"]);
    }

    #[tokio::test]
    async fn leader_tracks_the_front_runner() {
        let fx = voting_group(&[("Ana", &["Action", "Comedy"]), ("Ben", &["Drama"])]).await;
        let service = GenreVoteService::new(fx.store);

        let standings = service.standings(&fx.code).await.unwrap();
        assert!(standings.leader.is_none());

        let after = service.vote(&fx.sessions[0], "Drama").await.unwrap();
        assert_eq!(after.leader.as_deref(), Some("Drama"));
    }

    #[tokio::test]
    async fn voting_rejected_outside_voting_phase() {
        let store = Arc::new(GroupStore::new());
        let registry = RegistryService::new(Arc::clone(&store));
        let host = registry
            .create_group(
                None,
                RegisterInput {
                    display_name: "Ana".to_string(),
                    services: Vec::new(),
                },
            )
            .await
            .unwrap();
        let session = SessionToken {
            code: host.group.code,
            participant_id: host.participant_id,
        };

        let service = GenreVoteService::new(store);
        let err = service.vote(&session, "Action").await.unwrap_err();
        assert!(matches!(err, AppError::WrongPhase(p) if p == "genre_nomination"));
    }
}
