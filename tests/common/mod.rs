//! Fakes for the upstream services and scratch directories for pipeline runs.
#![allow(dead_code)]

use firetrack::clients::{EpisodeSource, MovieLookup, SearchHit, StreamingLookup};
use firetrack::config::Config;
use firetrack::db::Store;
use firetrack::error::TransportError;
use firetrack::models::{
    EpisodeListEntry, MovieMetadata, RunMetadata, StreamingOption, StreamingType,
};
use firetrack::parser::normalize_for_matching;
use firetrack::services::{Catalog, Collaborators, Pipeline, PipelineOptions, RunSummary};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

pub fn the_thing() -> MovieMetadata {
    MovieMetadata {
        imdb_id: "tt0084787".to_string(),
        title: "The Thing".to_string(),
        year: Some(1982),
        imdb_rating: Some(8.2),
        imdb_votes: Some(455_123),
        genre: Some("Horror, Mystery, Sci-Fi".to_string()),
        director: Some("John Carpenter".to_string()),
        plot: Some("A research team in Antarctica is hunted by a shape-shifting alien.".to_string()),
        runtime: Some("109 min".to_string()),
        poster: None,
    }
}

pub fn heat() -> MovieMetadata {
    MovieMetadata {
        imdb_id: "tt0113277".to_string(),
        title: "Heat".to_string(),
        year: Some(1995),
        imdb_rating: Some(8.3),
        imdb_votes: Some(720_000),
        genre: Some("Action, Crime, Drama".to_string()),
        director: Some("Michael Mann".to_string()),
        plot: None,
        runtime: Some("170 min".to_string()),
        poster: None,
    }
}

pub fn option(service: &str, kind: StreamingType) -> StreamingOption {
    StreamingOption::new(service, kind)
}

#[derive(Default)]
pub struct FakeMovies {
    movies: Vec<MovieMetadata>,
    failing: AtomicBool,
    pub searches: AtomicU32,
    pub details: AtomicU32,
}

impl FakeMovies {
    pub fn new(movies: Vec<MovieMetadata>) -> Arc<Self> {
        Arc::new(Self {
            movies,
            ..Self::default()
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> u32 {
        self.searches.load(Ordering::SeqCst) + self.details.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), TransportError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Request {
                service: "omdb",
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl MovieLookup for FakeMovies {
    async fn search(
        &self,
        title: &str,
        year: Option<i32>,
    ) -> Result<Vec<SearchHit>, TransportError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.check()?;

        let wanted = normalize_for_matching(title);
        Ok(self
            .movies
            .iter()
            .filter(|m| normalize_for_matching(&m.title) == wanted)
            .filter(|m| year.is_none() || m.year == year)
            .map(|m| SearchHit {
                imdb_id: m.imdb_id.clone(),
                title: m.title.clone(),
                year: m.year,
            })
            .collect())
    }

    async fn details(&self, imdb_id: &str) -> Result<Option<MovieMetadata>, TransportError> {
        self.details.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.movies.iter().find(|m| m.imdb_id == imdb_id).cloned())
    }
}

#[derive(Default)]
pub struct FakeStreaming {
    options: Mutex<HashMap<String, Vec<StreamingOption>>>,
    failing: AtomicBool,
    pub calls: AtomicU32,
}

impl FakeStreaming {
    pub fn new(entries: Vec<(&str, Vec<StreamingOption>)>) -> Arc<Self> {
        let options = entries
            .into_iter()
            .map(|(id, options)| (id.to_string(), options))
            .collect();
        Arc::new(Self {
            options: Mutex::new(options),
            ..Self::default()
        })
    }

    pub fn set_options(&self, imdb_id: &str, options: Vec<StreamingOption>) {
        self.options
            .lock()
            .unwrap()
            .insert(imdb_id.to_string(), options);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StreamingLookup for FakeStreaming {
    async fn options(&self, imdb_id: &str) -> Result<Vec<StreamingOption>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::RateLimited {
                service: "streaming",
            });
        }
        Ok(self
            .options
            .lock()
            .unwrap()
            .get(imdb_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct FakeEpisodes {
    entries: Mutex<Vec<EpisodeListEntry>>,
    failing: AtomicBool,
    pub calls: AtomicU32,
}

impl FakeEpisodes {
    pub fn new(titles: &[&str]) -> Arc<Self> {
        let fake = Self::default();
        fake.set_titles(titles);
        Arc::new(fake)
    }

    pub fn set_titles(&self, titles: &[&str]) {
        *self.entries.lock().unwrap() = titles
            .iter()
            .map(|t| EpisodeListEntry::new(*t, None))
            .collect();
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EpisodeSource for FakeEpisodes {
    async fn fetch_episodes(&self) -> anyhow::Result<Vec<EpisodeListEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("maximumfun.org unreachable");
        }
        Ok(self.entries.lock().unwrap().clone())
    }
}

/// A scratch workspace with its own output, data and cache locations.
pub struct TestEnv {
    pub root: PathBuf,
    pub config: Config,
}

impl TestEnv {
    pub fn new() -> Self {
        let root = std::env::temp_dir().join(format!("firetrack-test-{}", uuid::Uuid::new_v4()));

        let mut config = Config::default();
        config.general.output_dir = root.join("out").display().to_string();
        config.general.data_dir = root.join("data").display().to_string();
        config.general.database_path = Some(format!("sqlite:{}", root.join("cache.db").display()));

        Self { root, config }
    }

    pub async fn store(&self) -> Store {
        Store::new(&self.config.database_url())
            .await
            .expect("Failed to open cache store")
    }

    pub async fn run(
        &self,
        options: PipelineOptions,
        movies: &Arc<FakeMovies>,
        streaming: &Arc<FakeStreaming>,
        episodes: &Arc<FakeEpisodes>,
    ) -> RunSummary {
        let collaborators = Collaborators {
            episodes: episodes.clone(),
            movies: movies.clone(),
            streaming: streaming.clone(),
        };
        let cache = Store::new(&self.config.database_url()).await;
        Pipeline::new(self.config.clone(), options, collaborators, cache)
            .run()
            .await
            .expect("Pipeline run failed")
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.config.output_dir().join("movies.json")
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::load(&self.catalog_path())
            .expect("Failed to read catalog")
            .expect("Catalog missing")
    }

    pub fn metadata(&self) -> RunMetadata {
        let path = self.config.output_dir().join("metadata.json");
        let content = std::fs::read_to_string(path).expect("Failed to read metadata");
        serde_json::from_str(&content).expect("Failed to parse metadata")
    }
}

impl Drop for TestEnv {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.root).ok();
    }
}
