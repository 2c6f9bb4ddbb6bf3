use crate::clients::{MovieLookup, SearchHit};
use crate::db::{CacheSource, Store};
use crate::error::{ResolutionFailure, TransportError};
use crate::models::{EpisodeCandidate, MovieMetadata};
use crate::parser::normalize_for_matching;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Whether a resolver may call its upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    Online,
    /// Cached data of any age, never a request.
    CacheOnly,
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    FreshCache,
    Fetched,
    /// Served from an expired entry, or from any entry in cache-only mode.
    StaleCache,
    PriorCatalog,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentityOutcome {
    pub metadata: Option<MovieMetadata>,
    pub provenance: Provenance,
    /// Set whenever the lookup did not succeed, even if a fallback filled
    /// `metadata`.
    pub failure: Option<ResolutionFailure>,
}

impl IdentityOutcome {
    const fn resolved(metadata: MovieMetadata, provenance: Provenance) -> Self {
        Self {
            metadata: Some(metadata),
            provenance,
            failure: None,
        }
    }

    fn failed(failure: ResolutionFailure, fallback: Option<MovieMetadata>) -> Self {
        let provenance = if fallback.is_some() {
            Provenance::StaleCache
        } else {
            Provenance::Unavailable
        };
        Self {
            metadata: fallback,
            provenance,
            failure: Some(failure),
        }
    }
}

/// Cache key for a title lookup: `"<normalized title>|<year or ->"`.
#[must_use]
pub fn identity_cache_key(candidate: &EpisodeCandidate) -> String {
    let year = candidate
        .year_hint
        .map_or_else(|| "-".to_string(), |y| y.to_string());
    format!("{}|{year}", candidate.normalized_title())
}

/// Prefers an exact normalized title (and year, when known) match, else the
/// first hit in upstream order.
#[must_use]
pub fn pick_hit<'a>(hits: &'a [SearchHit], title: &str, year: Option<i32>) -> Option<&'a SearchHit> {
    let wanted = normalize_for_matching(title);
    hits.iter()
        .find(|hit| {
            normalize_for_matching(&hit.title) == wanted && (year.is_none() || hit.year == year)
        })
        .or_else(|| hits.first())
}

/// Maps episode candidates to IMDb identities, OMDB first through the cache.
pub struct IdentityResolver {
    lookup: Arc<dyn MovieLookup>,
    store: Option<Store>,
    max_age: chrono::Duration,
    mode: ResolveMode,
    calls_made: u32,
}

impl IdentityResolver {
    #[must_use]
    pub fn new(
        lookup: Arc<dyn MovieLookup>,
        store: Option<Store>,
        max_age: chrono::Duration,
        mode: ResolveMode,
    ) -> Self {
        Self {
            lookup,
            store,
            max_age,
            mode,
            calls_made: 0,
        }
    }

    /// Requests issued so far, excluding those refused for lack of credentials.
    #[must_use]
    pub const fn calls_made(&self) -> u32 {
        self.calls_made
    }

    /// Resolves one candidate. `pinned` is the IMDb ID an unchanged episode
    /// already carries; it replaces the title search with a fetch by ID.
    pub async fn resolve(
        &mut self,
        candidate: &EpisodeCandidate,
        pinned: Option<&str>,
    ) -> IdentityOutcome {
        let key = identity_cache_key(candidate);
        let cached = self.cached(&key, pinned).await;

        if self.mode == ResolveMode::CacheOnly {
            return match cached {
                Some((metadata, _)) => IdentityOutcome::resolved(metadata, Provenance::StaleCache),
                None => IdentityOutcome::failed(ResolutionFailure::NotCached, None),
            };
        }

        if let Some((metadata, true)) = &cached {
            debug!(key, imdb_id = %metadata.imdb_id, "OMDB cache hit");
            return IdentityOutcome::resolved(metadata.clone(), Provenance::FreshCache);
        }

        let fetched = match pinned {
            Some(imdb_id) => self.fetch_pinned(candidate, imdb_id).await,
            None => self.fetch_by_title(candidate).await,
        };

        match fetched {
            Ok(metadata) => {
                info!(
                    title = %candidate.parsed_title,
                    imdb_id = %metadata.imdb_id,
                    "Resolved movie"
                );
                self.remember(&key, &metadata).await;
                IdentityOutcome::resolved(metadata, Provenance::Fetched)
            }
            Err(failure @ ResolutionFailure::Transport(_)) => {
                warn!(key, error = %failure, stale_fallback = cached.is_some(), "OMDB lookup failed");
                IdentityOutcome::failed(failure, cached.map(|(metadata, _)| metadata))
            }
            Err(failure) => {
                info!(key, error = %failure, "No OMDB match");
                IdentityOutcome::failed(failure, None)
            }
        }
    }

    /// The cached metadata for `key` and whether it is fresh. An entry for a
    /// different ID than `pinned` is ignored.
    async fn cached(&self, key: &str, pinned: Option<&str>) -> Option<(MovieMetadata, bool)> {
        let store = self.store.as_ref()?;
        let entry = match store.get_cached(key, CacheSource::Omdb).await {
            Ok(entry) => entry?,
            Err(e) => {
                warn!(key, error = %e, "Failed to read OMDB cache");
                return None;
            }
        };

        let metadata: MovieMetadata = match entry.decode() {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(key, error = %e, "Ignoring unreadable OMDB cache entry");
                return None;
            }
        };

        if pinned.is_some_and(|id| id != metadata.imdb_id) {
            debug!(key, ?pinned, cached = %metadata.imdb_id, "Cached identity differs from pinned ID");
            return None;
        }

        let fresh = entry.is_fresh(self.max_age);
        Some((metadata, fresh))
    }

    async fn remember(&self, key: &str, metadata: &MovieMetadata) {
        let Some(store) = &self.store else {
            return;
        };

        let payload = match serde_json::to_value(metadata) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key, error = %e, "Failed to encode OMDB cache payload");
                return;
            }
        };

        if let Err(e) = store.put_cached(key, CacheSource::Omdb, &payload).await {
            warn!(key, error = %e, "Failed to write OMDB cache");
        }
    }

    async fn fetch_pinned(
        &mut self,
        candidate: &EpisodeCandidate,
        imdb_id: &str,
    ) -> Result<MovieMetadata, ResolutionFailure> {
        debug!(imdb_id, "Refreshing pinned identity");
        self.details(imdb_id).await?.ok_or_else(|| ResolutionFailure::NoMatch {
            title: candidate.parsed_title.clone(),
            year: candidate.year_hint,
        })
    }

    async fn fetch_by_title(
        &mut self,
        candidate: &EpisodeCandidate,
    ) -> Result<MovieMetadata, ResolutionFailure> {
        let title = candidate.parsed_title.as_str();
        let year = candidate.year_hint;

        let mut hits = self.search(title, year).await?;
        if hits.is_empty() && year.is_some() {
            debug!(title, ?year, "No match with year, retrying title only");
            hits = self.search(title, None).await?;
        }

        let no_match = || ResolutionFailure::NoMatch {
            title: title.to_string(),
            year,
        };

        let hit = pick_hit(&hits, title, year).ok_or_else(no_match)?;
        let imdb_id = hit.imdb_id.clone();
        self.details(&imdb_id).await?.ok_or_else(no_match)
    }

    async fn search(
        &mut self,
        title: &str,
        year: Option<i32>,
    ) -> Result<Vec<SearchHit>, TransportError> {
        let result = self.lookup.search(title, year).await;
        self.count(result.as_ref().err());
        result
    }

    async fn details(&mut self, imdb_id: &str) -> Result<Option<MovieMetadata>, TransportError> {
        let result = self.lookup.details(imdb_id).await;
        self.count(result.as_ref().err());
        result
    }

    fn count(&mut self, error: Option<&TransportError>) {
        if !matches!(error, Some(TransportError::MissingCredentials { .. })) {
            self.calls_made += 1;
        }
    }
}
