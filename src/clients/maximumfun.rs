use anyhow::{Context, Result, bail};
use rand::Rng;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::EpisodeSource;
use crate::config::ScraperConfig;
use crate::models::EpisodeListEntry;

const ENTRY_SELECTOR: &str = "div.latest-panel-loop-item-title";
const TITLE_SELECTOR: &str = "h4";
const LINK_SELECTOR: &str = "a[href]";

/// Pages shorter than this are error pages, not listings.
const MIN_PAGE_BYTES: usize = 100;

/// Scrapes the podcast's paginated episode archive.
pub struct MaximumFunScraper {
    client: Client,
    config: ScraperConfig,
}

impl MaximumFunScraper {
    #[must_use]
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            client: Client::builder()
                .user_agent(&config.user_agent)
                .timeout(Duration::from_secs(config.request_timeout_seconds))
                .build()
                .unwrap_or_else(|_| Client::new()),
            config: config.clone(),
        }
    }

    fn page_url(&self, page: u32) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url)
            .with_context(|| format!("Invalid scraper base URL: {}", self.config.base_url))?;
        url.query_pairs_mut()
            .append_pair("_paged", &page.to_string());
        Ok(url)
    }

    async fn fetch_page(&self, url: &Url) -> Result<String> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            bail!("HTTP {status} for {url}");
        }

        let body = response.text().await?;
        if body.len() < MIN_PAGE_BYTES {
            bail!("Response too short for {url}, likely an empty page");
        }
        Ok(body)
    }

    async fn scrape_page(&self, page: u32) -> Result<Vec<EpisodeListEntry>> {
        let url = self.page_url(page)?;
        let attempts = self.config.max_retries + 1;
        let mut attempt = 1;

        loop {
            match self.fetch_page(&url).await {
                Ok(body) => return Ok(parse_listing(&body, &url)),
                Err(e) if attempt < attempts => {
                    warn!(
                        page,
                        attempt,
                        max_attempts = attempts,
                        error = %e,
                        "Failed to scrape page, retrying"
                    );
                    let delay = self.config.retry_delay_seconds * u64::from(attempt);
                    tokio::time::sleep(Duration::from_secs(delay)).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(e.context(format!("Failed to scrape page {page} after {attempts} attempts")));
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl EpisodeSource for MaximumFunScraper {
    async fn fetch_episodes(&self) -> Result<Vec<EpisodeListEntry>> {
        info!(base_url = %self.config.base_url, "Scraping episode listing");
        let mut episodes = Vec::new();

        for page in 1..=self.config.max_pages {
            let page_episodes = match self.scrape_page(page).await {
                Ok(entries) => entries,
                // Keep what earlier pages produced; the caller merges it with
                // the persisted list.
                Err(e) if !episodes.is_empty() => {
                    warn!(page, error = %e, "Stopping pagination after page failure");
                    break;
                }
                Err(e) => return Err(e),
            };

            if page_episodes.is_empty() {
                debug!(page, "No episodes on page, stopping pagination");
                break;
            }

            debug!(page, count = page_episodes.len(), "Scraped page");
            episodes.extend(page_episodes);

            if page < self.config.max_pages {
                let delay = rand::rng().random_range(1.0..3.0);
                tokio::time::sleep(Duration::from_secs_f64(delay)).await;
            }
        }

        info!(count = episodes.len(), "Scraped episode listing");
        Ok(episodes)
    }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("Invalid selector {css:?} defined in code: {e}"))
}

fn first_link(element: ElementRef<'_>, links: &Selector) -> Option<String> {
    element
        .select(links)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(ToString::to_string)
}

fn enclosing_link(element: ElementRef<'_>) -> Option<String> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "a")
        .and_then(|a| a.value().attr("href"))
        .map(ToString::to_string)
}

/// Extracts episode titles and links from one archive page.
pub fn parse_listing(html: &str, page_url: &Url) -> Vec<EpisodeListEntry> {
    let document = Html::parse_document(html);
    let entries = selector(ENTRY_SELECTOR);
    let titles = selector(TITLE_SELECTOR);
    let links = selector(LINK_SELECTOR);

    document
        .select(&entries)
        .filter_map(|entry| {
            let heading = entry.select(&titles).next()?;
            let title = heading.text().collect::<String>().trim().to_string();
            if title.is_empty() {
                return None;
            }

            let href = first_link(entry, &links).or_else(|| enclosing_link(entry));
            let episode_url = href
                .and_then(|h| page_url.join(&h).ok())
                .map(String::from);

            Some(EpisodeListEntry::new(title, episode_url))
        })
        .collect()
}
