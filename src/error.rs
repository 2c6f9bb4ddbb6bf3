//! Error taxonomy for the enrichment pipeline.
//!
//! Everything except [`ArtifactWriteError`] is recoverable: the pipeline
//! records it in the run metadata and keeps going.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFailure {
    Empty,
    Excluded,
    MissingEpisodeNumber,
    MissingTitle,
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Empty => "empty title",
            Self::Excluded => "not a movie episode",
            Self::MissingEpisodeNumber => "needs manual episode number",
            Self::MissingTitle => "no movie title",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not parse {raw_title:?}: {reason}")]
pub struct ParseError {
    pub reason: ParseFailure,
    pub raw_title: String,
}

impl ParseError {
    pub fn new(reason: ParseFailure, raw_title: impl Into<String>) -> Self {
        Self {
            reason,
            raw_title: raw_title.into(),
        }
    }
}

/// Network, quota or credential failure talking to an upstream API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("{service}: no API key configured")]
    MissingCredentials { service: &'static str },

    #[error("{service}: request failed: {message}")]
    Request {
        service: &'static str,
        message: String,
    },

    #[error("{service}: rate limit exceeded")]
    RateLimited { service: &'static str },

    #[error("{service}: HTTP {status} - {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service}: {message}")]
    Api {
        service: &'static str,
        message: String,
    },

    #[error("{service}: invalid response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}

impl TransportError {
    pub fn request(service: &'static str, err: &reqwest::Error) -> Self {
        Self::Request {
            service,
            message: err.to_string(),
        }
    }

    pub fn decode(service: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            service,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionFailure {
    #[error("no match for {title:?} ({})", describe_year(.year))]
    NoMatch { title: String, year: Option<i32> },

    #[error("no cached metadata and API calls are skipped")]
    NotCached,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

fn describe_year(year: &Option<i32>) -> String {
    year.map_or_else(|| "any year".to_string(), |y| y.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Episode {episode_number}: {reason}")]
pub struct ResolutionError {
    pub episode_number: u32,
    pub reason: ResolutionFailure,
}

#[derive(Debug, Error)]
#[error("Failed to write {}: {source}", path.display())]
pub struct ArtifactWriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl ArtifactWriteError {
    pub fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}
