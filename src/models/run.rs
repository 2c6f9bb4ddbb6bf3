use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Scrape,
    Parse,
    Cache,
    EnrichOmdb,
    EnrichStreaming,
}

impl Stage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scrape => "scrape",
            Self::Parse => "parse",
            Self::Cache => "cache",
            Self::EnrichOmdb => "enrich_omdb",
            Self::EnrichStreaming => "enrich_streaming",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    pub episode_number: Option<u32>,

    pub stage: Stage,

    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub omdb_matched: usize,

    pub streaming_matched: usize,

    pub omdb_success_rate: String,

    pub streaming_success_rate: String,

    pub skipped_stages: Vec<Stage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSources {
    pub podcast: String,

    pub movie_metadata: String,

    pub streaming_availability: String,
}

impl Default for DataSources {
    fn default() -> Self {
        Self {
            podcast: "Maximum Fun - Friendly Fire".to_string(),
            movie_metadata: "OMDB API".to_string(),
            streaming_availability: "Streaming Availability API (RapidAPI)".to_string(),
        }
    }
}

/// Diagnostics for a single run. Never merged with earlier runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub last_updated: String,

    pub total_movies: usize,

    pub omdb_calls_made: u32,

    pub streaming_calls_made: u32,

    pub errors: Vec<RunError>,

    pub statistics: RunStatistics,

    pub data_sources: DataSources,
}

impl RunMetadata {
    #[must_use]
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            last_updated: format_timestamp(started_at),
            total_movies: 0,
            omdb_calls_made: 0,
            streaming_calls_made: 0,
            errors: Vec::new(),
            statistics: RunStatistics::default(),
            data_sources: DataSources::default(),
        }
    }

    pub fn record_error(
        &mut self,
        episode_number: Option<u32>,
        stage: Stage,
        message: impl Into<String>,
    ) {
        self.errors.push(RunError {
            episode_number,
            stage,
            message: message.into(),
        });
    }

    #[must_use]
    pub fn errors_for_stage(&self, stage: Stage) -> Vec<&RunError> {
        self.errors.iter().filter(|e| e.stage == stage).collect()
    }
}

/// RFC 3339 with second precision and a `Z` suffix.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[must_use]
pub fn success_rate(matched: usize, total: usize) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    #[allow(clippy::cast_precision_loss)]
    let rate = matched as f64 / total as f64 * 100.0;
    format!("{rate:.1}%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp_is_second_precision() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 5).unwrap();
        assert_eq!(format_timestamp(at), "2026-03-01T12:30:05Z");
    }

    #[test]
    fn test_success_rate() {
        assert_eq!(success_rate(0, 0), "0%");
        assert_eq!(success_rate(1, 3), "33.3%");
        assert_eq!(success_rate(4, 4), "100.0%");
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        let error = RunError {
            episode_number: None,
            stage: Stage::EnrichOmdb,
            message: "boom".to_string(),
        };
        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(
            json,
            r#"{"episode_number":null,"stage":"enrich_omdb","message":"boom"}"#
        );
    }
}
