use crate::clients::{
    EpisodeSource, MaximumFunScraper, MovieLookup, OmdbClient, StreamingClient, StreamingLookup,
};
use crate::config::Config;
use crate::db::Store;
use crate::error::{ParseError, ParseFailure, ResolutionError};
use crate::models::run::success_rate;
use crate::models::{EpisodeCandidate, EpisodeListEntry, MovieRecord, RunMetadata, Stage};
use crate::parser::TitleParser;
use crate::services::catalog::{Catalog, EpisodeList, JsonGenerator};
use crate::services::identity::{IdentityResolver, Provenance, ResolveMode};
use crate::services::streaming::StreamingResolver;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Stage switches from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Resolve from the cache and the prior catalog only.
    pub skip_apis: bool,
    pub skip_streaming: bool,
    /// Reuse the last known episode list.
    pub skip_scraping: bool,
}

/// The upstream services a run talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub episodes: Arc<dyn EpisodeSource>,
    pub movies: Arc<dyn MovieLookup>,
    pub streaming: Arc<dyn StreamingLookup>,
}

impl Collaborators {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            episodes: Arc::new(MaximumFunScraper::new(&config.scraper)),
            movies: Arc::new(OmdbClient::new(&config.omdb)),
            streaming: Arc::new(StreamingClient::new(&config.streaming)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total_movies: usize,
    pub omdb_calls_made: u32,
    pub streaming_calls_made: u32,
    pub error_count: usize,
    pub catalog_path: PathBuf,
}

pub struct Pipeline {
    config: Config,
    options: PipelineOptions,
    collaborators: Collaborators,
    store: Option<Store>,
    cache_error: Option<String>,
}

impl Pipeline {
    /// `cache` is the opened cache store; if opening failed the run goes
    /// ahead without one and records why.
    #[must_use]
    pub fn new(
        config: Config,
        options: PipelineOptions,
        collaborators: Collaborators,
        cache: anyhow::Result<Store>,
    ) -> Self {
        let (store, cache_error) = match cache {
            Ok(store) => (Some(store), None),
            Err(e) => (None, Some(format!("Cache unavailable: {e:#}"))),
        };

        Self {
            config,
            options,
            collaborators,
            store,
            cache_error,
        }
    }

    /// Runs every stage. Only a failure to write the catalog is an error.
    pub async fn run(&self) -> anyhow::Result<RunSummary> {
        let started_at = Utc::now();
        let mut metadata = RunMetadata::new(started_at);

        if let Some(message) = &self.cache_error {
            warn!("{message}");
            metadata.record_error(None, Stage::Cache, message.clone());
        }

        let generator = JsonGenerator::new(self.config.output_dir());
        let prior = Catalog::load_prior(&generator.catalog_path());

        let listing = self.scrape(&prior, &mut metadata).await;
        let candidates = self.parse(&listing, &mut metadata);
        let records = self.enrich(&candidates, &prior, &mut metadata).await;

        let records = Self::merge_with_prior(records, prior);
        Self::finish_metadata(&mut metadata, &records);

        let catalog = Catalog::new(records, started_at);
        let artifacts = generator.generate(&catalog, &metadata)?;

        info!(
            total_movies = catalog.total_movies,
            omdb_calls = metadata.omdb_calls_made,
            streaming_calls = metadata.streaming_calls_made,
            errors = metadata.errors.len(),
            "Pipeline finished"
        );

        Ok(RunSummary {
            total_movies: catalog.total_movies,
            omdb_calls_made: metadata.omdb_calls_made,
            streaming_calls_made: metadata.streaming_calls_made,
            error_count: metadata.errors.len(),
            catalog_path: artifacts.catalog_path,
        })
    }

    async fn scrape(
        &self,
        prior: &[MovieRecord],
        metadata: &mut RunMetadata,
    ) -> Vec<EpisodeListEntry> {
        let list = EpisodeList::new(&self.config.data_dir());
        let known = match list.load() {
            Ok(Some(entries)) => entries,
            Ok(None) => {
                let rebuilt = EpisodeList::rebuild_from_catalog(prior);
                info!(count = rebuilt.len(), "No episode list on disk, rebuilt from catalog");
                rebuilt
            }
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable episode list");
                EpisodeList::rebuild_from_catalog(prior)
            }
        };

        let entries = if self.options.skip_scraping {
            info!(count = known.len(), "Scraping skipped, using last known episode list");
            metadata.statistics.skipped_stages.push(Stage::Scrape);
            known
        } else {
            match self.collaborators.episodes.fetch_episodes().await {
                Ok(scraped) if !scraped.is_empty() => EpisodeList::merge(scraped, &known),
                Ok(_) => {
                    warn!("Scrape returned no episodes, using last known episode list");
                    known
                }
                Err(e) => {
                    warn!(error = %e, "Scrape failed, using last known episode list");
                    metadata.record_error(None, Stage::Scrape, format!("{e:#}"));
                    known
                }
            }
        };

        if let Err(e) = list.save(&entries) {
            warn!(error = %e, "Failed to persist episode list");
        }

        entries
    }

    fn parse(
        &self,
        listing: &[EpisodeListEntry],
        metadata: &mut RunMetadata,
    ) -> Vec<(u32, EpisodeCandidate)> {
        let parser = TitleParser::new(&self.config.parser.exclude_patterns);
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        let mut excluded = 0usize;

        for entry in listing {
            let candidate = match parser.parse(&entry.raw_title) {
                Ok(candidate) => candidate.with_episode_url(entry.episode_url.clone()),
                Err(e) => {
                    if e.reason == ParseFailure::Excluded {
                        excluded += 1;
                        debug!(raw_title = %e.raw_title, "Skipping non-movie episode");
                    } else {
                        warn!(error = %e, "Unparseable episode title");
                    }
                    metadata.record_error(None, Stage::Parse, e.to_string());
                    continue;
                }
            };

            let Some(number) = candidate.episode_number else {
                let error =
                    ParseError::new(ParseFailure::MissingEpisodeNumber, &candidate.raw_title);
                warn!(error = %error, "Episode needs a manual number");
                metadata.record_error(None, Stage::Parse, error.to_string());
                continue;
            };

            if !seen.insert(number) {
                warn!(episode_number = number, raw_title = %candidate.raw_title, "Duplicate episode number");
                metadata.record_error(
                    Some(number),
                    Stage::Parse,
                    format!("Duplicate episode number, ignoring {:?}", candidate.raw_title),
                );
                continue;
            }

            candidates.push((number, candidate));
        }

        info!(
            parsed = candidates.len(),
            excluded,
            total = listing.len(),
            "Parsed episode listing"
        );
        candidates
    }

    async fn enrich(
        &self,
        candidates: &[(u32, EpisodeCandidate)],
        prior: &[MovieRecord],
        metadata: &mut RunMetadata,
    ) -> Vec<MovieRecord> {
        let prior_by_number: BTreeMap<u32, &MovieRecord> =
            prior.iter().map(|r| (r.episode_number, r)).collect();

        let identity_mode = if self.options.skip_apis {
            metadata.statistics.skipped_stages.push(Stage::EnrichOmdb);
            ResolveMode::CacheOnly
        } else {
            ResolveMode::Online
        };
        let streaming_mode = if self.options.skip_apis || self.options.skip_streaming {
            metadata.statistics.skipped_stages.push(Stage::EnrichStreaming);
            ResolveMode::CacheOnly
        } else {
            ResolveMode::Online
        };

        let mut identity = IdentityResolver::new(
            self.collaborators.movies.clone(),
            self.store.clone(),
            self.config.omdb_cache_ttl(),
            identity_mode,
        );
        let mut streaming = StreamingResolver::new(
            self.collaborators.streaming.clone(),
            self.store.clone(),
            self.config.streaming.country.clone(),
            self.config.streaming_cache_ttl(),
            streaming_mode,
        );

        let total = candidates.len();
        let mut records = Vec::with_capacity(total);

        for (index, (number, candidate)) in candidates.iter().enumerate() {
            let previous = prior_by_number.get(number).copied();
            let unchanged = previous.filter(|p| p.matches_candidate(candidate));

            if self.options.skip_apis
                && let Some(previous) = unchanged
            {
                debug!(episode_number = number, "Reusing prior record");
                records.push(previous.clone());
                continue;
            }

            debug!(
                episode_number = number,
                progress = %format!("{}/{total}", index + 1),
                title = %candidate.parsed_title,
                "Enriching episode"
            );

            let mut record = MovieRecord::from_candidate(*number, candidate);
            if let Some(previous) = previous {
                record.host_ratings = previous.host_ratings.clone();
            }

            let pinned = unchanged.and_then(|p| p.imdb_id.as_deref());
            let outcome = identity.resolve(candidate, pinned).await;
            if let Some(found) = &outcome.metadata {
                record.apply_metadata(found);
            } else if let Some(previous) = unchanged.filter(|p| p.has_imdb_data()) {
                debug!(episode_number = number, "Keeping prior IMDb data");
                record.carry_enrichment_from(previous);
            }
            if let Some(reason) = outcome.failure {
                let error = ResolutionError {
                    episode_number: *number,
                    reason,
                };
                metadata.record_error(Some(*number), Stage::EnrichOmdb, error.to_string());
            }
            if outcome.provenance == Provenance::StaleCache {
                debug!(episode_number = number, "Using cached metadata past its freshness window");
            }

            if let Some(imdb_id) = record.imdb_id.clone() {
                let previous_options = previous
                    .filter(|p| p.imdb_id.as_deref() == Some(imdb_id.as_str()))
                    .map(|p| p.streaming_options.as_slice());
                let outcome = streaming.resolve(&imdb_id, previous_options).await;
                record.streaming_options = outcome.options;
                if let Some(e) = outcome.failure {
                    metadata.record_error(Some(*number), Stage::EnrichStreaming, e.to_string());
                }
            }

            records.push(record);
        }

        metadata.omdb_calls_made = identity.calls_made();
        metadata.streaming_calls_made = streaming.calls_made();
        records
    }

    /// Prior records whose episode vanished from this run's listing are kept
    /// as they were.
    fn merge_with_prior(mut records: Vec<MovieRecord>, prior: Vec<MovieRecord>) -> Vec<MovieRecord> {
        let current: HashSet<u32> = records.iter().map(|r| r.episode_number).collect();
        let mut carried = 0usize;

        for record in prior {
            if !current.contains(&record.episode_number) {
                carried += 1;
                records.push(record);
            }
        }

        if carried > 0 {
            info!(carried, "Kept prior records missing from this run");
        }
        records
    }

    fn finish_metadata(metadata: &mut RunMetadata, records: &[MovieRecord]) {
        let total = records.len();
        let omdb_matched = records.iter().filter(|r| r.has_imdb_data()).count();
        let streaming_matched = records
            .iter()
            .filter(|r| !r.streaming_options.is_empty())
            .count();

        metadata.total_movies = total;
        metadata.statistics.omdb_matched = omdb_matched;
        metadata.statistics.streaming_matched = streaming_matched;
        metadata.statistics.omdb_success_rate = success_rate(omdb_matched, total);
        metadata.statistics.streaming_success_rate = success_rate(streaming_matched, total);
    }
}
