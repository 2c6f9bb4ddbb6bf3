use crate::clients::StreamingLookup;
use crate::db::{CacheSource, Store};
use crate::error::TransportError;
use crate::models::{StreamingOption, StreamingSnapshot, dedupe_options};
use crate::services::identity::{Provenance, ResolveMode};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct StreamingOutcome {
    pub options: Vec<StreamingOption>,
    pub provenance: Provenance,
    pub failure: Option<TransportError>,
}

/// Resolves current streaming availability per IMDb ID.
///
/// A successful fetch replaces the cached snapshot wholesale; a failed one
/// leaves it untouched.
pub struct StreamingResolver {
    lookup: Arc<dyn StreamingLookup>,
    store: Option<Store>,
    country: String,
    max_age: chrono::Duration,
    mode: ResolveMode,
    calls_made: u32,
}

impl StreamingResolver {
    #[must_use]
    pub fn new(
        lookup: Arc<dyn StreamingLookup>,
        store: Option<Store>,
        country: impl Into<String>,
        max_age: chrono::Duration,
        mode: ResolveMode,
    ) -> Self {
        Self {
            lookup,
            store,
            country: country.into(),
            max_age,
            mode,
            calls_made: 0,
        }
    }

    #[must_use]
    pub const fn calls_made(&self) -> u32 {
        self.calls_made
    }

    /// `previous` holds the options the last catalog listed for this ID; they
    /// are the fallback when neither the API nor the cache can answer.
    pub async fn resolve(
        &mut self,
        imdb_id: &str,
        previous: Option<&[StreamingOption]>,
    ) -> StreamingOutcome {
        let cached = self.cached(imdb_id).await;

        if self.mode == ResolveMode::Online {
            if let Some((options, true)) = &cached {
                debug!(imdb_id, "Streaming cache hit");
                return StreamingOutcome {
                    options: options.clone(),
                    provenance: Provenance::FreshCache,
                    failure: None,
                };
            }

            let result = self.lookup.options(imdb_id).await;
            if !matches!(result, Err(TransportError::MissingCredentials { .. })) {
                self.calls_made += 1;
            }

            match result {
                Ok(options) => {
                    let options = dedupe_options(options);
                    debug!(imdb_id, count = options.len(), "Fetched streaming options");
                    self.remember(imdb_id, &options).await;
                    return StreamingOutcome {
                        options,
                        provenance: Provenance::Fetched,
                        failure: None,
                    };
                }
                Err(e) => {
                    warn!(imdb_id, error = %e, "Streaming lookup failed");
                    let mut outcome = Self::fallback(cached, previous);
                    outcome.failure = Some(e);
                    return outcome;
                }
            }
        }

        Self::fallback(cached, previous)
    }

    fn fallback(
        cached: Option<(Vec<StreamingOption>, bool)>,
        previous: Option<&[StreamingOption]>,
    ) -> StreamingOutcome {
        let (options, provenance) = match (cached, previous) {
            (Some((options, _)), _) => (options, Provenance::StaleCache),
            (None, Some(previous)) => (
                dedupe_options(previous.to_vec()),
                Provenance::PriorCatalog,
            ),
            (None, None) => (Vec::new(), Provenance::Unavailable),
        };

        StreamingOutcome {
            options,
            provenance,
            failure: None,
        }
    }

    async fn cached(&self, imdb_id: &str) -> Option<(Vec<StreamingOption>, bool)> {
        let store = self.store.as_ref()?;
        let entry = match store.get_cached(imdb_id, CacheSource::Streaming).await {
            Ok(entry) => entry?,
            Err(e) => {
                warn!(imdb_id, error = %e, "Failed to read streaming cache");
                return None;
            }
        };

        let snapshot: StreamingSnapshot = match entry.decode() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(imdb_id, error = %e, "Ignoring unreadable streaming cache entry");
                return None;
            }
        };

        // A snapshot taken for another country is as good as none.
        if !snapshot.country.eq_ignore_ascii_case(&self.country) {
            return None;
        }

        let fresh = entry.is_fresh(self.max_age);
        Some((snapshot.options, fresh))
    }

    async fn remember(&self, imdb_id: &str, options: &[StreamingOption]) {
        let Some(store) = &self.store else {
            return;
        };

        let snapshot = StreamingSnapshot {
            imdb_id: imdb_id.to_string(),
            country: self.country.clone(),
            options: options.to_vec(),
        };

        let payload = match serde_json::to_value(&snapshot) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(imdb_id, error = %e, "Failed to encode streaming cache payload");
                return;
            }
        };

        if let Err(e) = store
            .put_cached(imdb_id, CacheSource::Streaming, &payload)
            .await
        {
            warn!(imdb_id, error = %e, "Failed to write streaming cache");
        }
    }
}
