use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::parser::title::DEFAULT_EXCLUDE_PATTERNS;

pub const OMDB_API_KEY_ENV: &str = "OMDB_API_KEY";
pub const RAPIDAPI_KEY_ENV: &str = "RAPIDAPI_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub omdb: OmdbConfig,

    pub streaming: StreamingConfig,

    pub scraper: ScraperConfig,

    pub parser: ParserConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Directory receiving `movies.json` and `metadata.json`.
    pub output_dir: String,

    /// Directory for pipeline state (episode list, cache database).
    pub data_dir: String,

    /// Cache database URL; defaults to `sqlite:<data_dir>/cache.db`.
    pub database_path: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            output_dir: "docs/data".to_string(),
            data_dir: "data".to_string(),
            database_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OmdbConfig {
    pub base_url: String,

    /// Overridden by `OMDB_API_KEY` when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Minimum delay between two OMDB requests.
    pub rate_limit_ms: u64,

    pub request_timeout_seconds: u64,

    /// Cached OMDB metadata younger than this is reused without a request.
    pub cache_ttl_days: i64,
}

impl Default for OmdbConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.omdbapi.com/".to_string(),
            api_key: None,
            rate_limit_ms: 500,
            request_timeout_seconds: 10,
            cache_ttl_days: 180,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    pub base_url: String,

    pub rapidapi_host: String,

    /// Overridden by `RAPIDAPI_KEY` when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub country: String,

    pub rate_limit_ms: u64,

    pub request_timeout_seconds: u64,

    /// Availability changes often; keep this below the run interval.
    pub cache_ttl_hours: i64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://streaming-availability.p.rapidapi.com".to_string(),
            rapidapi_host: "streaming-availability.p.rapidapi.com".to_string(),
            api_key: None,
            country: "us".to_string(),
            rate_limit_ms: 1000,
            request_timeout_seconds: 15,
            cache_ttl_hours: 144,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub base_url: String,

    pub max_pages: u32,

    pub max_retries: u32,

    pub retry_delay_seconds: u64,

    pub request_timeout_seconds: u64,

    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maximumfun.org/podcasts/friendly-fire/".to_string(),
            max_pages: 20,
            max_retries: 3,
            retry_delay_seconds: 2,
            request_timeout_seconds: 10,
            user_agent: "FriendlyFireBot/1.0 (Educational Project)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Case-insensitive substrings marking non-movie episodes.
    pub exclude_patterns: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            exclude_patterns: DEFAULT_EXCLUDE_PATTERNS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl Config {
    /// Loads the first config file found, then applies environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = explicit {
            info!("Loading config from: {}", path.display());
            Self::load_from_path(path)?
        } else {
            Self::load_from_search_paths()?
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn load_from_search_paths() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("firetrack.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("firetrack").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".firetrack").join("config.toml"));
        }

        paths
    }

    fn apply_env_overrides(&mut self) {
        if let Some(key) = non_empty_env(OMDB_API_KEY_ENV) {
            self.omdb.api_key = Some(key);
        }
        if let Some(key) = non_empty_env(RAPIDAPI_KEY_ENV) {
            self.streaming.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.omdb.base_url.is_empty() {
            anyhow::bail!("OMDB base URL cannot be empty");
        }

        if self.streaming.base_url.is_empty() {
            anyhow::bail!("Streaming API base URL cannot be empty");
        }

        if self.scraper.base_url.is_empty() {
            anyhow::bail!("Scraper base URL cannot be empty");
        }

        if self.scraper.max_pages == 0 {
            anyhow::bail!("Scraper max_pages must be > 0");
        }

        if self.omdb.cache_ttl_days < 0 || self.streaming.cache_ttl_hours < 0 {
            anyhow::bail!("Cache TTLs cannot be negative");
        }

        Ok(())
    }

    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.general.output_dir)
    }

    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.general.data_dir)
    }

    #[must_use]
    pub fn database_url(&self) -> String {
        self.general.database_path.clone().unwrap_or_else(|| {
            format!(
                "sqlite:{}",
                Path::new(&self.general.data_dir).join("cache.db").display()
            )
        })
    }

    #[must_use]
    pub fn omdb_cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.omdb.cache_ttl_days)
    }

    #[must_use]
    pub fn streaming_cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.streaming.cache_ttl_hours)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
