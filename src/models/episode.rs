use serde::{Deserialize, Serialize};

use crate::parser::normalize_for_matching;

/// A parsed but not yet enriched episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeCandidate {
    pub episode_number: Option<u32>,

    pub raw_title: String,

    pub parsed_title: String,

    pub year_hint: Option<i32>,

    pub episode_url: Option<String>,
}

impl EpisodeCandidate {
    #[must_use]
    pub fn normalized_title(&self) -> String {
        normalize_for_matching(&self.parsed_title)
    }

    #[must_use]
    pub fn with_episode_url(mut self, url: Option<String>) -> Self {
        self.episode_url = url;
        self
    }
}

/// One entry of the persisted "last known episode list".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeListEntry {
    pub raw_title: String,

    #[serde(default)]
    pub episode_url: Option<String>,
}

impl EpisodeListEntry {
    #[must_use]
    pub fn new(raw_title: impl Into<String>, episode_url: Option<String>) -> Self {
        Self {
            raw_title: raw_title.into(),
            episode_url,
        }
    }
}
