use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::rate_limit::RateLimiter;
use super::{StreamingLookup, status_error};
use crate::config::StreamingConfig;
use crate::constants::services::STREAMING;
use crate::error::TransportError;
use crate::models::{StreamingOption, StreamingType};

pub struct StreamingClient {
    client: Client,
    base_url: String,
    rapidapi_host: String,
    api_key: Option<String>,
    country: String,
    limiter: RateLimiter,
}

impl StreamingClient {
    #[must_use]
    pub fn new(config: &StreamingConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_seconds))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            rapidapi_host: config.rapidapi_host.clone(),
            api_key: config.api_key.clone(),
            country: config.country.to_lowercase(),
            limiter: RateLimiter::new(config.rate_limit_ms),
        }
    }
}

#[async_trait::async_trait]
impl StreamingLookup for StreamingClient {
    async fn options(&self, imdb_id: &str) -> Result<Vec<StreamingOption>, TransportError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(TransportError::MissingCredentials { service: STREAMING })?;

        let mut url = Url::parse(&format!("{}/get", self.base_url)).map_err(|e| {
            TransportError::Request {
                service: STREAMING,
                message: format!("invalid base URL: {e}"),
            }
        })?;
        url.query_pairs_mut()
            .append_pair("imdb_id", imdb_id)
            .append_pair("output_language", "en");

        self.limiter.wait().await;
        debug!(imdb_id, country = %self.country, "Fetching streaming availability");

        let response = self
            .client
            .get(url)
            .header("X-RapidAPI-Key", api_key)
            .header("X-RapidAPI-Host", &self.rapidapi_host)
            .send()
            .await
            .map_err(|e| TransportError::request(STREAMING, &e))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(imdb_id, "Title unknown to streaming API, treating as unavailable");
            return Ok(Vec::new());
        }

        if !response.status().is_success() {
            return Err(status_error(STREAMING, response).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TransportError::decode(STREAMING, e))?;

        Ok(parse_options(&body, &self.country))
    }
}

/// Extracts the options for `country` from either known response shape:
/// `streamingInfo.<country>.<service>[]` or `streamingOptions.<country>[]`,
/// optionally wrapped in a `result` object.
pub fn parse_options(body: &Value, country: &str) -> Vec<StreamingOption> {
    let root = body.get("result").unwrap_or(body);
    let mut options = Vec::new();

    if let Some(services) = root
        .get("streamingInfo")
        .and_then(|info| info.get(country))
        .and_then(Value::as_object)
    {
        for (service, entries) in services {
            for entry in entries.as_array().into_iter().flatten() {
                if let Some(option) = parse_entry(service, entry) {
                    options.push(option);
                }
            }
        }
    }

    if let Some(entries) = root
        .get("streamingOptions")
        .and_then(|info| info.get(country))
        .and_then(Value::as_array)
    {
        for entry in entries {
            let service = entry
                .get("service")
                .and_then(|s| s.get("id").or(Some(s)))
                .and_then(Value::as_str);
            if let Some(option) = service.and_then(|s| parse_entry(s, entry)) {
                options.push(option);
            }
        }
    }

    options
}

fn parse_entry(service: &str, entry: &Value) -> Option<StreamingOption> {
    let kind_text = entry
        .get("type")
        .or_else(|| entry.get("streamingType"))
        .and_then(Value::as_str)
        .unwrap_or("subscription");

    let Some(kind) = StreamingType::from_api(kind_text) else {
        warn!(service, kind = kind_text, "Skipping unknown streaming option type");
        return None;
    };

    let mut option = StreamingOption::new(service.to_lowercase(), kind);
    option.link = entry
        .get("link")
        .and_then(Value::as_str)
        .filter(|l| !l.is_empty())
        .map(ToString::to_string);
    option.price = entry
        .get("price")
        .and_then(|p| p.get("amount"))
        .and_then(|amount| match amount {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .map(|amount| format!("${amount}"));

    Some(option)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_v3_shape() {
        let body = json!({
            "result": {
                "title": "The Thing",
                "streamingInfo": {
                    "us": {
                        "netflix": [{"type": "subscription", "link": "https://www.netflix.com/title/1"}],
                        "prime": [
                            {"type": "rent", "link": "https://amazon.com/x", "price": {"amount": "3.99", "currency": "USD"}}
                        ]
                    },
                    "gb": {
                        "mubi": [{"type": "subscription"}]
                    }
                }
            }
        });

        let options = parse_options(&body, "us");
        assert_eq!(options.len(), 2);

        let rent = options.iter().find(|o| o.service == "prime").unwrap();
        assert_eq!(rent.kind, StreamingType::Rent);
        assert_eq!(rent.price.as_deref(), Some("$3.99"));

        let netflix = options.iter().find(|o| o.service == "netflix").unwrap();
        assert_eq!(netflix.kind, StreamingType::Subscription);
        assert_eq!(netflix.price, None);
    }

    #[test]
    fn test_parse_v4_shape() {
        let body = json!({
            "streamingOptions": {
                "us": [
                    {"service": {"id": "hulu", "name": "Hulu"}, "type": "addon", "link": "https://hulu.com/x"},
                    {"service": {"id": "apple"}, "type": "buy", "price": {"amount": 14.99}},
                    {"service": {"id": "odd"}, "type": "mystery"}
                ]
            }
        });

        let options = parse_options(&body, "us");
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].service, "hulu");
        assert_eq!(options[0].kind, StreamingType::Addon);
        assert_eq!(options[1].price.as_deref(), Some("$14.99"));
    }

    #[test]
    fn test_parse_missing_country_is_empty() {
        let body = json!({"streamingInfo": {"gb": {"netflix": [{"type": "subscription"}]}}});
        assert!(parse_options(&body, "us").is_empty());
    }
}
