//! Movie catalog backends.
//!
//! The selector only needs one thing from the outside world: a list of
//! candidates matching the finalized genres and the group's streaming
//! services. [`Catalog`] is that seam. [`TmdbCatalog`] talks to TMDb when
//! credentials are configured; [`DemoCatalog`] is the built-in fallback so
//! the whole flow works offline.

use crate::model::MovieCandidate;
use async_trait::async_trait;
use reelvote_common::config::CatalogConfig;
use reelvote_common::{AppError, AppResult};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Source of movie candidates.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch candidates for the given genres, filtered to the given
    /// streaming services when the list is non-empty. Services are
    /// lowercased provider names; an empty list means no provider filter.
    async fn fetch(&self, genres: &[String], services: &[String])
    -> AppResult<Vec<MovieCandidate>>;
}

/// Shared catalog handle.
pub type SharedCatalog = Arc<dyn Catalog>;

fn intersects(haystack: &[String], needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.iter().any(|h| h == n))
}

// === Demo catalog ===

/// Small fixed catalog used when no TMDb credentials are configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoCatalog;

impl DemoCatalog {
    fn titles() -> Vec<MovieCandidate> {
        let entry = |id: &str,
                     title: &str,
                     year: i32,
                     description: &str,
                     genres: &[&str],
                     providers: &[&str],
                     score: f64| MovieCandidate {
            id: id.to_string(),
            title: title.to_string(),
            year: Some(year),
            description: Some(description.to_string()),
            poster_url: None,
            genres: genres.iter().map(ToString::to_string).collect(),
            providers: providers.iter().map(ToString::to_string).collect(),
            score,
        };

        vec![
            entry(
                "demo-01",
                "Inception",
                2010,
                "A thief who steals corporate secrets through dream-sharing technology.",
                &["Action", "Sci-Fi", "Thriller"],
                &["netflix", "amazon"],
                87.0,
            ),
            entry(
                "demo-02",
                "The Social Network",
                2010,
                "The founding of Facebook and the lawsuits that followed.",
                &["Drama"],
                &["netflix"],
                96.0,
            ),
            entry(
                "demo-03",
                "Mad Max: Fury Road",
                2015,
                "In a post-apocalyptic wasteland, Max teams up with Furiosa.",
                &["Action", "Adventure", "Sci-Fi"],
                &["hbo", "hulu"],
                97.0,
            ),
            entry(
                "demo-04",
                "Parasite",
                2019,
                "A poor family schemes to become employed by a wealthy household.",
                &["Drama", "Thriller"],
                &["hulu"],
                99.0,
            ),
            entry(
                "demo-05",
                "Knives Out",
                2019,
                "A detective investigates the death of a patriarch of an eccentric family.",
                &["Comedy", "Crime", "Mystery"],
                &["amazon"],
                97.0,
            ),
            entry(
                "demo-06",
                "Spider-Man: Into the Spider-Verse",
                2018,
                "Teen Miles Morales becomes Spider-Man and meets his counterparts.",
                &["Animation", "Action", "Family"],
                &["netflix", "hbo"],
                97.0,
            ),
        ]
    }
}

#[async_trait]
impl Catalog for DemoCatalog {
    async fn fetch(
        &self,
        genres: &[String],
        services: &[String],
    ) -> AppResult<Vec<MovieCandidate>> {
        let candidates = Self::titles()
            .into_iter()
            .filter(|c| genres.is_empty() || intersects(&c.genres, genres))
            .filter(|c| services.is_empty() || intersects(&c.providers, services))
            .collect();
        Ok(candidates)
    }
}

// === TMDb catalog ===

/// TMDb genre ids for the canonical genre names.
const TMDB_GENRE_IDS: [(&str, i64); 14] = [
    ("Action", 28),
    ("Comedy", 35),
    ("Drama", 18),
    ("Thriller", 53),
    ("Horror", 27),
    ("Sci-Fi", 878),
    ("Romance", 10749),
    ("Animation", 16),
    ("Family", 10751),
    ("Adventure", 12),
    ("Documentary", 99),
    ("Fantasy", 14),
    ("Mystery", 9648),
    ("Crime", 80),
];

const TMDB_BASE: &str = "https://api.themoviedb.org/3";
const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";
const DISCOVER_PAGES: u32 = 5;
const MAX_CANDIDATES: usize = 100;

/// Collapse TMDb provider names onto the short service names participants
/// register with.
fn normalize_provider(name: &str) -> String {
    let lower = name.to_lowercase();
    match lower.as_str() {
        "amazon prime video" | "amazon video" | "prime video" => "amazon".to_string(),
        "hbo max" | "max" => "hbo".to_string(),
        other => other.to_string(),
    }
}

fn genre_name(id: i64) -> Option<&'static str> {
    TMDB_GENRE_IDS
        .iter()
        .find(|(_, gid)| *gid == id)
        .map(|(name, _)| *name)
}

#[derive(Debug, Deserialize)]
struct DiscoverResponse {
    results: Vec<DiscoverMovie>,
}

#[derive(Debug, Deserialize)]
struct DiscoverMovie {
    id: i64,
    title: String,
    overview: Option<String>,
    poster_path: Option<String>,
    release_date: Option<String>,
    genre_ids: Vec<i64>,
    popularity: f64,
}

#[derive(Debug, Deserialize)]
struct ProvidersResponse {
    results: std::collections::HashMap<String, RegionProviders>,
}

#[derive(Debug, Deserialize, Default)]
struct RegionProviders {
    #[serde(default)]
    flatrate: Vec<ProviderEntry>,
}

#[derive(Debug, Deserialize)]
struct ProviderEntry {
    provider_name: String,
}

/// Movie catalog backed by the TMDb discover and watch-provider APIs.
pub struct TmdbCatalog {
    client: reqwest::Client,
    read_token: Option<String>,
    api_key: Option<String>,
    region: String,
}

impl TmdbCatalog {
    /// Build a catalog from configuration. Call only when
    /// [`CatalogConfig::tmdb_configured`] holds.
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            read_token: config.tmdb_read_token.clone(),
            api_key: config.tmdb_api_key.clone(),
            region: config.region.clone(),
        }
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.get(url);
        if let Some(token) = &self.read_token {
            req = req.bearer_auth(token);
        } else if let Some(key) = &self.api_key {
            req = req.query(&[("api_key", key.as_str())]);
        }
        req
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> AppResult<T> {
        let response = req
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("TMDb request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "TMDb returned {}",
                response.status()
            )));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| AppError::ExternalService(format!("TMDb response malformed: {e}")))
    }

    async fn discover(&self, genre_ids: &[i64]) -> AppResult<Vec<DiscoverMovie>> {
        let with_genres = genre_ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("|");

        let mut movies = Vec::new();
        let mut seen: HashSet<i64> = HashSet::new();
        for page in 1..=DISCOVER_PAGES {
            let page = page.to_string();
            let req = self
                .request(&format!("{TMDB_BASE}/discover/movie"))
                .query(&[
                    ("with_genres", with_genres.as_str()),
                    ("sort_by", "popularity.desc"),
                    ("include_adult", "false"),
                    ("page", page.as_str()),
                ]);
            let body: DiscoverResponse = self.get_json(req).await?;
            if body.results.is_empty() {
                break;
            }
            for movie in body.results {
                if seen.insert(movie.id) {
                    movies.push(movie);
                }
            }
        }
        Ok(movies)
    }

    async fn providers_for(&self, movie_id: i64) -> AppResult<Vec<String>> {
        let req = self.request(&format!("{TMDB_BASE}/movie/{movie_id}/watch/providers"));
        let body: ProvidersResponse = self.get_json(req).await?;
        let providers = body
            .results
            .get(&self.region)
            .map(|region| {
                region
                    .flatrate
                    .iter()
                    .map(|p| normalize_provider(&p.provider_name))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Ok(providers)
    }
}

fn release_year(date: Option<&str>) -> Option<i32> {
    date.and_then(|d| d.get(..4)).and_then(|y| y.parse().ok())
}

#[async_trait]
impl Catalog for TmdbCatalog {
    async fn fetch(
        &self,
        genres: &[String],
        services: &[String],
    ) -> AppResult<Vec<MovieCandidate>> {
        let genre_ids: Vec<i64> = genres
            .iter()
            .filter_map(|g| {
                TMDB_GENRE_IDS
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(g))
                    .map(|(_, id)| *id)
            })
            .collect();
        if genre_ids.is_empty() {
            return Ok(Vec::new());
        }

        let movies = self.discover(&genre_ids).await?;
        tracing::debug!(count = movies.len(), "Fetched TMDb discover results");

        let mut candidates = Vec::new();
        for movie in movies {
            if candidates.len() >= MAX_CANDIDATES {
                break;
            }
            let providers = if services.is_empty() {
                Vec::new()
            } else {
                let providers = self.providers_for(movie.id).await?;
                if !intersects(&providers, services) {
                    continue;
                }
                providers
            };
            candidates.push(MovieCandidate {
                id: format!("tmdb-{}", movie.id),
                title: movie.title,
                year: release_year(movie.release_date.as_deref()),
                description: movie.overview,
                poster_url: movie
                    .poster_path
                    .as_deref()
                    .map(|p| format!("{TMDB_IMAGE_BASE}{p}")),
                genres: movie.genre_ids.iter().filter_map(|id| genre_name(*id)).map(ToString::to_string).collect(),
                providers,
                score: movie.popularity,
            });
        }
        Ok(candidates)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_catalog_filters_by_genre() {
        let catalog = DemoCatalog;
        let results = catalog
            .fetch(&["Drama".to_string()], &[])
            .await
            .unwrap();
        let titles: Vec<&str> = results.iter().map(|c| c.title.as_str()).collect();
        assert!(titles.contains(&"Parasite"));
        assert!(titles.contains(&"The Social Network"));
        assert!(!titles.contains(&"Knives Out"));
    }

    #[tokio::test]
    async fn demo_catalog_filters_by_service_union() {
        let catalog = DemoCatalog;
        let results = catalog
            .fetch(
                &["Action".to_string(), "Drama".to_string()],
                &["hulu".to_string()],
            )
            .await
            .unwrap();
        let titles: Vec<&str> = results.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Mad Max: Fury Road", "Parasite"]);
    }

    #[test]
    fn provider_names_normalize_to_short_forms() {
        assert_eq!(normalize_provider("Amazon Prime Video"), "amazon");
        assert_eq!(normalize_provider("HBO Max"), "hbo");
        assert_eq!(normalize_provider("Max"), "hbo");
        assert_eq!(normalize_provider("Netflix"), "netflix");
    }

    #[test]
    fn release_year_parses_prefix() {
        assert_eq!(release_year(Some("2019-05-30")), Some(2019));
        assert_eq!(release_year(Some("")), None);
        assert_eq!(release_year(None), None);
    }
}
