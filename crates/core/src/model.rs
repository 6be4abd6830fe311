//! Domain model for decision sessions.
//!
//! A [`GroupState`] owns everything a single session needs: its
//! participants, the genre nomination and vote rows, the movie candidate
//! pool and the ballots for the candidate currently on screen. All of it is
//! guarded by one per-group lock (see [`crate::store::GroupStore`]), so the
//! methods here are plain synchronous reads over a consistent snapshot.

use chrono::{DateTime, Utc};
use reelvote_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Maximum genres a participant may nominate in one submission.
pub const MAX_NOMINATIONS: usize = 2;

/// Maximum distinct genre votes per participant.
pub const MAX_GENRE_VOTES: usize = 3;

/// How many genres are carried into movie selection.
pub const FINALIZED_GENRE_COUNT: usize = 2;

/// Canonical genre names accepted for nomination.
pub const ALLOWED_GENRES: [&str; 14] = [
    "Action",
    "Comedy",
    "Drama",
    "Thriller",
    "Horror",
    "Sci-Fi",
    "Romance",
    "Animation",
    "Family",
    "Adventure",
    "Documentary",
    "Fantasy",
    "Mystery",
    "Crime",
];

/// Canonicalize a genre name (case-insensitive, trimmed).
#[must_use]
pub fn canonical_genre(name: &str) -> Option<&'static str> {
    let needle = name.trim();
    ALLOWED_GENRES
        .iter()
        .copied()
        .find(|g| g.eq_ignore_ascii_case(needle))
}

/// Session phase, strictly ordered.
///
/// `Setup` exists only before the first participant registers and is
/// display-equivalent to `GenreNomination`; both accept nominations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    GenreNomination,
    GenreVoting,
    MovieSelection,
    Finalized,
}

impl Phase {
    /// Wire name of the phase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::GenreNomination => "genre_nomination",
            Self::GenreVoting => "genre_voting",
            Self::MovieSelection => "movie_selection",
            Self::Finalized => "finalized",
        }
    }

    /// Whether genre nominations are accepted in this phase.
    #[must_use]
    pub const fn accepts_nominations(self) -> bool {
        matches!(self, Self::Setup | Self::GenreNomination)
    }
}

/// One member of a group.
///
/// Leaving never deletes the row; `left_at` is set and the participant drops
/// out of every threshold computation while their past votes stay for audit.
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: String,
    pub display_name: String,
    pub is_host: bool,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
    pub veto_used: bool,
    /// Lowercased streaming-service preferences.
    pub services: Vec<String>,
}

impl Participant {
    /// Whether the participant still counts toward quorums.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.left_at.is_none()
    }
}

/// One nominated genre row. Unique per `(participant, genre)`.
#[derive(Debug, Clone)]
pub struct GenreNomination {
    pub participant_id: String,
    pub genre: String,
}

/// One genre vote row. Unique per `(participant, genre)`.
#[derive(Debug, Clone)]
pub struct GenreVote {
    pub participant_id: String,
    pub genre: String,
}

/// One accept/reject ballot on the current candidate.
#[derive(Debug, Clone)]
pub struct SwipeBallot {
    pub participant_id: String,
    pub candidate_id: String,
    pub accept: bool,
}

/// A movie proposed for swipe voting. Shared reference data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieCandidate {
    pub id: String,
    pub title: String,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    pub genres: Vec<String>,
    /// Lowercased streaming providers the title is available on.
    pub providers: Vec<String>,
    /// External relevance score; higher sorts earlier.
    #[serde(skip)]
    pub score: f64,
}

/// A genre with an aggregated count (nomination tally or vote standings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreCount {
    pub genre: String,
    pub count: usize,
}

/// Outcome of a swipe round query or mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundStatus {
    /// Neither threshold met yet.
    Pending,
    /// This candidate is on screen.
    Current(MovieCandidate),
    /// The group winner.
    Finalized(MovieCandidate),
    /// The filtered pool is empty; no consensus reachable without a reset.
    Exhausted,
}

/// Read-only view of a participant for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    pub id: String,
    pub display_name: String,
    pub is_host: bool,
    pub veto_used: bool,
    pub left: bool,
    pub services: Vec<String>,
}

/// Read-only view of a group for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSnapshot {
    pub code: String,
    pub phase: Phase,
    pub disbanded: bool,
    pub created_at: DateTime<Utc>,
    pub participants: Vec<ParticipantView>,
}

/// Full state of one decision session.
#[derive(Debug)]
pub struct GroupState {
    pub code: String,
    pub phase: Phase,
    pub host_id: String,
    pub created_at: DateTime<Utc>,
    pub disbanded: bool,
    pub participants: Vec<Participant>,
    /// Insertion order doubles as first-nomination order for tie breaks.
    pub nominations: Vec<GenreNomination>,
    pub genre_votes: Vec<GenreVote>,
    /// Winning genres, most-voted first, set when genre voting concludes.
    pub finalized_genres: Vec<String>,
    /// Candidate pool, built once from the catalog after genres finalize.
    pub pool: Vec<MovieCandidate>,
    pub pool_built: bool,
    /// Candidates permanently excluded by majority reject or veto.
    pub rejected: HashSet<String>,
    pub current_candidate_id: Option<String>,
    /// Ballots for the current candidate only; cleared on advance.
    pub ballots: Vec<SwipeBallot>,
    pub winner_id: Option<String>,
}

impl GroupState {
    /// Create a fresh group. The phase starts at `GenreNomination`; `Setup`
    /// collapses as soon as the host registers, which happens in the same
    /// operation that creates the group.
    #[must_use]
    pub fn new(code: String, host: Participant) -> Self {
        Self {
            code,
            phase: Phase::GenreNomination,
            host_id: host.id.clone(),
            created_at: Utc::now(),
            disbanded: false,
            participants: vec![host],
            nominations: Vec::new(),
            genre_votes: Vec::new(),
            finalized_genres: Vec::new(),
            pool: Vec::new(),
            pool_built: false,
            rejected: HashSet::new(),
            current_candidate_id: None,
            ballots: Vec::new(),
            winner_id: None,
        }
    }

    /// Number of participants that count toward thresholds.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.participants.iter().filter(|p| p.is_active()).count()
    }

    /// Look up a participant by id.
    #[must_use]
    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Mutable participant lookup.
    pub fn participant_mut(&mut self, id: &str) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id == id)
    }

    /// Fail with `Disbanded` when the group is no longer reachable.
    pub fn require_open(&self) -> AppResult<()> {
        if self.disbanded {
            return Err(AppError::Disbanded);
        }
        Ok(())
    }

    /// Resolve an active member or fail with `Forbidden`.
    pub fn require_member(&self, participant_id: &str) -> AppResult<&Participant> {
        self.participant(participant_id)
            .filter(|p| p.is_active())
            .ok_or_else(|| AppError::Forbidden("You are not a member of this group".to_string()))
    }

    /// Resolve the host or fail with `Forbidden`.
    pub fn require_host(&self, participant_id: &str) -> AppResult<&Participant> {
        let member = self.require_member(participant_id)?;
        if !member.is_host {
            return Err(AppError::Forbidden(
                "Only the host can perform this action".to_string(),
            ));
        }
        Ok(member)
    }

    /// Look up a pool candidate by id.
    #[must_use]
    pub fn candidate(&self, id: &str) -> Option<&MovieCandidate> {
        self.pool.iter().find(|c| c.id == id)
    }

    /// Number of distinct active participants who have nominated.
    #[must_use]
    pub fn distinct_nominators(&self) -> usize {
        self.distinct_participants(self.nominations.iter().map(|n| n.participant_id.as_str()))
    }

    /// Number of distinct active participants who have voted on a genre.
    #[must_use]
    pub fn distinct_voters(&self) -> usize {
        self.distinct_participants(self.genre_votes.iter().map(|v| v.participant_id.as_str()))
    }

    fn distinct_participants<'a>(&self, ids: impl Iterator<Item = &'a str>) -> usize {
        let distinct: HashSet<&str> = ids.collect();
        distinct
            .into_iter()
            .filter(|id| self.participant(id).is_some_and(Participant::is_active))
            .count()
    }

    /// Nomination tally: genre → distinct nominator count, sorted by count
    /// descending and first-nomination order for ties.
    #[must_use]
    pub fn nomination_tally(&self) -> Vec<GenreCount> {
        let mut order: Vec<&str> = Vec::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for nom in &self.nominations {
            let genre = nom.genre.as_str();
            if !counts.contains_key(genre) {
                order.push(genre);
            }
            *counts.entry(genre).or_insert(0) += 1;
        }

        let first_seen: HashMap<&str, usize> =
            order.iter().enumerate().map(|(i, g)| (*g, i)).collect();
        let mut tally: Vec<GenreCount> = counts
            .into_iter()
            .map(|(genre, count)| GenreCount {
                genre: genre.to_string(),
                count,
            })
            .collect();
        tally.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| first_seen[a.genre.as_str()].cmp(&first_seen[b.genre.as_str()]))
        });
        tally
    }

    /// Vote standings: genre → vote count, sorted descending, ties broken by
    /// nomination count then alphabetically.
    #[must_use]
    pub fn vote_standings(&self) -> Vec<GenreCount> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for vote in &self.genre_votes {
            *counts.entry(vote.genre.as_str()).or_insert(0) += 1;
        }

        let nomination_counts: HashMap<String, usize> = self
            .nomination_tally()
            .into_iter()
            .map(|gc| (gc.genre, gc.count))
            .collect();
        let mut standings: Vec<GenreCount> = counts
            .into_iter()
            .map(|(genre, count)| GenreCount {
                genre: genre.to_string(),
                count,
            })
            .collect();
        standings.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| {
                    let na = nomination_counts.get(&a.genre).copied().unwrap_or(0);
                    let nb = nomination_counts.get(&b.genre).copied().unwrap_or(0);
                    nb.cmp(&na)
                })
                .then_with(|| a.genre.cmp(&b.genre))
        });
        standings
    }

    /// Read-only snapshot for API responses.
    #[must_use]
    pub fn snapshot(&self) -> GroupSnapshot {
        GroupSnapshot {
            code: self.code.clone(),
            phase: self.phase,
            disbanded: self.disbanded,
            created_at: self.created_at,
            participants: self
                .participants
                .iter()
                .map(|p| ParticipantView {
                    id: p.id.clone(),
                    display_name: p.display_name.clone(),
                    is_host: p.is_host,
                    veto_used: p.veto_used,
                    left: !p.is_active(),
                    services: p.services.clone(),
                })
                .collect(),
        }
    }
}

/// Strict majority of `active`: true iff `count > active / 2` in the integer
/// sense, i.e. `2 * count > active`.
#[must_use]
pub const fn is_strict_majority(count: usize, active: usize) -> bool {
    2 * count > active
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn participant(id: &str, host: bool) -> Participant {
        Participant {
            id: id.to_string(),
            display_name: id.to_string(),
            is_host: host,
            joined_at: Utc::now(),
            left_at: None,
            veto_used: false,
            services: Vec::new(),
        }
    }

    #[test]
    fn canonical_genre_is_case_insensitive() {
        assert_eq!(canonical_genre("action"), Some("Action"));
        assert_eq!(canonical_genre("  SCI-FI "), Some("Sci-Fi"));
        assert_eq!(canonical_genre("polka"), None);
    }

    #[test]
    fn strict_majority_uses_floor_division() {
        // active = 4: majority is 3
        assert!(!is_strict_majority(2, 4));
        assert!(is_strict_majority(3, 4));
        // active = 3: majority is 2
        assert!(is_strict_majority(2, 3));
        // active = 1: majority is 1
        assert!(is_strict_majority(1, 1));
        assert!(!is_strict_majority(0, 1));
    }

    #[test]
    fn left_participants_are_excluded_from_counts() {
        let mut state = GroupState::new("ABC123".to_string(), participant("host", true));
        state.participants.push(participant("p2", false));
        assert_eq!(state.active_count(), 2);

        state.participant_mut("p2").unwrap().left_at = Some(Utc::now());
        assert_eq!(state.active_count(), 1);
        assert!(state.require_member("p2").is_err());
    }

    #[test]
    fn nomination_tally_orders_by_count_then_first_seen() {
        let mut state = GroupState::new("ABC123".to_string(), participant("a", true));
        state.participants.push(participant("b", false));
        state.participants.push(participant("c", false));
        for (pid, genre) in [
            ("a", "Comedy"),
            ("a", "Drama"),
            ("b", "Action"),
            ("b", "Comedy"),
            ("c", "Action"),
        ] {
            state.nominations.push(GenreNomination {
                participant_id: pid.to_string(),
                genre: genre.to_string(),
            });
        }

        let tally = state.nomination_tally();
        let genres: Vec<&str> = tally.iter().map(|gc| gc.genre.as_str()).collect();
        // Comedy and Action tie at 2; Comedy was nominated first.
        assert_eq!(genres, vec!["Comedy", "Action", "Drama"]);
        assert_eq!(tally[0].count, 2);
        assert_eq!(tally[2].count, 1);
    }

    #[test]
    fn standings_break_ties_by_nomination_count_then_name() {
        let mut state = GroupState::new("ABC123".to_string(), participant("a", true));
        state.participants.push(participant("b", false));
        // Drama nominated twice, Action once.
        for (pid, genre) in [("a", "Drama"), ("b", "Drama"), ("b", "Action")] {
            state.nominations.push(GenreNomination {
                participant_id: pid.to_string(),
                genre: genre.to_string(),
            });
        }
        // One vote each: tie on votes, Drama wins on nomination count.
        for (pid, genre) in [("a", "Action"), ("b", "Drama")] {
            state.genre_votes.push(GenreVote {
                participant_id: pid.to_string(),
                genre: genre.to_string(),
            });
        }

        let standings = state.vote_standings();
        let genres: Vec<&str> = standings.iter().map(|gc| gc.genre.as_str()).collect();
        assert_eq!(genres, vec!["Drama", "Action"]);
    }
}
