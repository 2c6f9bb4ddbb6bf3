//! Upstream collaborators: the podcast listing, OMDB and the streaming
//! availability API.
//!
//! The pipeline only sees the traits below, so tests swap in fakes that
//! count calls instead of touching the network.

use crate::constants::limits::ERROR_BODY_CHARS;
use crate::error::TransportError;
use crate::models::{EpisodeListEntry, MovieMetadata, StreamingOption};

pub mod maximumfun;
pub mod omdb;
pub mod rate_limit;
pub mod streaming;

pub use maximumfun::MaximumFunScraper;
pub use omdb::OmdbClient;
pub use streaming::StreamingClient;

/// A candidate returned by a title search, before details are fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub imdb_id: String,
    pub title: String,
    pub year: Option<i32>,
}

/// Title lookups against a movie database.
#[async_trait::async_trait]
pub trait MovieLookup: Send + Sync {
    /// Lists movies matching `title`, optionally restricted to `year`.
    ///
    /// An empty list means "no match", not a failure.
    async fn search(&self, title: &str, year: Option<i32>)
    -> Result<Vec<SearchHit>, TransportError>;

    /// Fetches the full record for one IMDb ID. `None` if the ID is unknown.
    async fn details(&self, imdb_id: &str) -> Result<Option<MovieMetadata>, TransportError>;
}

/// Where a movie can currently be watched.
#[async_trait::async_trait]
pub trait StreamingLookup: Send + Sync {
    /// Current options for `imdb_id` in the configured country.
    async fn options(&self, imdb_id: &str) -> Result<Vec<StreamingOption>, TransportError>;
}

/// The podcast's episode listing.
#[async_trait::async_trait]
pub trait EpisodeSource: Send + Sync {
    /// Raw episode titles, newest first.
    async fn fetch_episodes(&self) -> anyhow::Result<Vec<EpisodeListEntry>>;
}

/// Maps a non-success response to a [`TransportError`], keeping a short
/// excerpt of the body for the run log.
pub(crate) async fn status_error(
    service: &'static str,
    response: reqwest::Response,
) -> TransportError {
    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return TransportError::RateLimited { service };
    }

    let body = response.text().await.unwrap_or_default();
    TransportError::Status {
        service,
        status: status.as_u16(),
        body: body.chars().take(ERROR_BODY_CHARS).collect(),
    }
}
