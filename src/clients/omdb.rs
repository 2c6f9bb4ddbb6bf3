use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::rate_limit::RateLimiter;
use super::{MovieLookup, SearchHit, status_error};
use crate::config::OmdbConfig;
use crate::constants::services::OMDB;
use crate::error::TransportError;
use crate::models::MovieMetadata;
use crate::models::lenient::{parse_rating, parse_votes, parse_year};

#[derive(Debug, Deserialize)]
struct OmdbSearchResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error", default)]
    error: Option<String>,
    #[serde(rename = "Search", default)]
    search: Vec<OmdbSearchItem>,
}

#[derive(Debug, Deserialize)]
struct OmdbSearchItem {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "imdbID")]
    imdb_id: String,
}

#[derive(Debug, Deserialize)]
struct OmdbTitle {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error", default)]
    error: Option<String>,
    #[serde(rename = "imdbID", default)]
    imdb_id: Option<String>,
    #[serde(rename = "Title", default)]
    title: Option<String>,
    #[serde(rename = "Year", default)]
    year: Option<String>,
    #[serde(rename = "imdbRating", default)]
    imdb_rating: Option<String>,
    #[serde(rename = "imdbVotes", default)]
    imdb_votes: Option<String>,
    #[serde(rename = "Genre", default)]
    genre: Option<String>,
    #[serde(rename = "Director", default)]
    director: Option<String>,
    #[serde(rename = "Plot", default)]
    plot: Option<String>,
    #[serde(rename = "Runtime", default)]
    runtime: Option<String>,
    #[serde(rename = "Poster", default)]
    poster: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("n/a"))
}

impl OmdbTitle {
    fn into_metadata(self) -> Option<MovieMetadata> {
        let imdb_id = present(self.imdb_id)?;
        let title = present(self.title)?;

        Some(MovieMetadata {
            imdb_id,
            title,
            year: self.year.as_deref().and_then(parse_year),
            imdb_rating: self.imdb_rating.as_deref().and_then(parse_rating),
            imdb_votes: self.imdb_votes.as_deref().and_then(parse_votes),
            genre: present(self.genre),
            director: present(self.director),
            plot: present(self.plot),
            runtime: present(self.runtime),
            poster: present(self.poster),
        })
    }
}

/// OMDB answers `Response: "False"` with HTTP 200 for both misses and
/// account problems; only the former is a clean "no match".
fn classify_error(message: Option<String>) -> Option<TransportError> {
    let message = message.unwrap_or_default();
    let lower = message.to_lowercase();

    if lower.contains("not found") || lower.contains("incorrect imdb id") {
        return None;
    }
    if lower.contains("limit") {
        return Some(TransportError::RateLimited { service: OMDB });
    }

    Some(TransportError::Api {
        service: OMDB,
        message,
    })
}

pub struct OmdbClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    limiter: RateLimiter,
}

impl OmdbClient {
    #[must_use]
    pub fn new(config: &OmdbConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_seconds))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            limiter: RateLimiter::new(config.rate_limit_ms),
        }
    }

    fn request_url(&self, params: &[(&str, &str)]) -> Result<Url, TransportError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(TransportError::MissingCredentials { service: OMDB })?;

        let mut url = Url::parse(&self.base_url).map_err(|e| TransportError::Request {
            service: OMDB,
            message: format!("invalid base URL: {e}"),
        })?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("apikey", api_key);
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, TransportError> {
        self.limiter.wait().await;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::request(OMDB, &e))?;

        if !response.status().is_success() {
            return Err(status_error(OMDB, response).await);
        }

        response
            .json()
            .await
            .map_err(|e| TransportError::decode(OMDB, e))
    }
}

#[async_trait::async_trait]
impl MovieLookup for OmdbClient {
    async fn search(
        &self,
        title: &str,
        year: Option<i32>,
    ) -> Result<Vec<SearchHit>, TransportError> {
        let year_param = year.map(|y| y.to_string());
        let mut params = vec![("s", title), ("type", "movie")];
        if let Some(y) = year_param.as_deref() {
            params.push(("y", y));
        }
        let url = self.request_url(&params)?;

        debug!(title, ?year, "Searching OMDB");
        let response: OmdbSearchResponse = self.get(url).await?;

        if !response.response.eq_ignore_ascii_case("true") {
            return match classify_error(response.error) {
                None => {
                    debug!(title, ?year, "OMDB search returned no results");
                    Ok(Vec::new())
                }
                Some(err) => Err(err),
            };
        }

        Ok(response
            .search
            .into_iter()
            .map(|item| SearchHit {
                year: parse_year(&item.year),
                imdb_id: item.imdb_id,
                title: item.title,
            })
            .collect())
    }

    async fn details(&self, imdb_id: &str) -> Result<Option<MovieMetadata>, TransportError> {
        let url = self.request_url(&[("i", imdb_id), ("plot", "short")])?;

        debug!(imdb_id, "Fetching OMDB details");
        let response: OmdbTitle = self.get(url).await?;

        if !response.response.eq_ignore_ascii_case("true") {
            return match classify_error(response.error) {
                None => Ok(None),
                Some(err) => Err(err),
            };
        }

        let metadata = response.into_metadata();
        if metadata.is_none() {
            warn!(imdb_id, "OMDB record is missing its ID or title");
        }
        Ok(metadata)
    }
}
