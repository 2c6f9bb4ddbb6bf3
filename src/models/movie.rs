use serde::{Deserialize, Serialize};

use super::episode::EpisodeCandidate;
use super::lenient;
use super::streaming::StreamingOption;

const IMDB_TITLE_URL: &str = "https://www.imdb.com/title";

/// The hosts' scores, merged from their ratings export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRatings {
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub ar: Option<String>,

    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub br: Option<String>,

    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub jr: Option<String>,

    #[serde(
        rename = "rating",
        default,
        deserialize_with = "lenient::optional_text"
    )]
    pub overall: Option<String>,

    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub rating_notes: Option<String>,
}

impl HostRatings {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ar.is_none()
            && self.br.is_none()
            && self.jr.is_none()
            && self.overall.is_none()
            && self.rating_notes.is_none()
    }
}

/// Normalized subset of an OMDB title record. This is also the cache payload
/// for `source = omdb`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieMetadata {
    pub imdb_id: String,

    pub title: String,

    pub year: Option<i32>,

    pub imdb_rating: Option<f32>,

    pub imdb_votes: Option<u64>,

    pub genre: Option<String>,

    pub director: Option<String>,

    pub plot: Option<String>,

    pub runtime: Option<String>,

    pub poster: Option<String>,
}

/// One catalog row. Field order here is the serialized order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    #[serde(deserialize_with = "lenient::episode_number")]
    pub episode_number: u32,

    #[serde(default)]
    pub episode_url: Option<String>,

    /// Title as listed by the podcast; detects scrape changes between runs.
    #[serde(default)]
    pub episode_title: Option<String>,

    /// Year given by the listing, kept apart from `year`, which OMDB may
    /// correct.
    #[serde(default, deserialize_with = "lenient::optional_year")]
    pub episode_year: Option<i32>,

    pub title: String,

    #[serde(default, deserialize_with = "lenient::optional_year")]
    pub year: Option<i32>,

    #[serde(default)]
    pub imdb_id: Option<String>,

    #[serde(default, deserialize_with = "lenient::optional_rating")]
    pub imdb_rating: Option<f32>,

    #[serde(default, deserialize_with = "lenient::optional_votes")]
    pub imdb_votes: Option<u64>,

    #[serde(default)]
    pub imdb_url: Option<String>,

    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub genre: Option<String>,

    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub director: Option<String>,

    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub plot: Option<String>,

    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub runtime: Option<String>,

    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub poster: Option<String>,

    #[serde(flatten)]
    pub host_ratings: HostRatings,

    #[serde(default)]
    pub streaming_options: Vec<StreamingOption>,
}

impl MovieRecord {
    /// A record carrying only what the podcast listing says.
    #[must_use]
    pub fn from_candidate(episode_number: u32, candidate: &EpisodeCandidate) -> Self {
        Self {
            episode_number,
            episode_url: candidate.episode_url.clone(),
            episode_title: Some(candidate.parsed_title.clone()),
            episode_year: candidate.year_hint,
            title: candidate.parsed_title.clone(),
            year: candidate.year_hint,
            imdb_id: None,
            imdb_rating: None,
            imdb_votes: None,
            imdb_url: None,
            genre: None,
            director: None,
            plot: None,
            runtime: None,
            poster: None,
            host_ratings: HostRatings::default(),
            streaming_options: Vec::new(),
        }
    }

    pub fn apply_metadata(&mut self, metadata: &MovieMetadata) {
        self.title.clone_from(&metadata.title);
        self.year = metadata.year.or(self.year);
        self.imdb_id = Some(metadata.imdb_id.clone());
        self.imdb_url = Some(format!("{IMDB_TITLE_URL}/{}", metadata.imdb_id));
        self.imdb_rating = metadata.imdb_rating;
        self.imdb_votes = metadata.imdb_votes;
        self.genre.clone_from(&metadata.genre);
        self.director.clone_from(&metadata.director);
        self.plot.clone_from(&metadata.plot);
        self.runtime.clone_from(&metadata.runtime);
        self.poster.clone_from(&metadata.poster);
    }

    /// Copies the IMDb-sourced fields of an earlier record for the same
    /// episode, for runs where no fresher metadata could be obtained.
    pub fn carry_enrichment_from(&mut self, previous: &Self) {
        self.title.clone_from(&previous.title);
        self.year = previous.year.or(self.year);
        self.imdb_id.clone_from(&previous.imdb_id);
        self.imdb_url.clone_from(&previous.imdb_url);
        self.imdb_rating = previous.imdb_rating;
        self.imdb_votes = previous.imdb_votes;
        self.genre.clone_from(&previous.genre);
        self.director.clone_from(&previous.director);
        self.plot.clone_from(&previous.plot);
        self.runtime.clone_from(&previous.runtime);
        self.poster.clone_from(&previous.poster);
    }

    #[must_use]
    pub const fn has_imdb_data(&self) -> bool {
        self.imdb_id.is_some()
    }

    /// Whether this record was built from the same listing content as
    /// `candidate`. Records from catalogs without `episode_title` never match.
    #[must_use]
    pub fn matches_candidate(&self, candidate: &EpisodeCandidate) -> bool {
        let Some(previous_title) = self.episode_title.as_deref() else {
            return false;
        };

        crate::parser::normalize_for_matching(previous_title) == candidate.normalized_title()
            && self.episode_year == candidate.year_hint
    }
}
