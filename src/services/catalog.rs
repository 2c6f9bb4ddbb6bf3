//! Reading and writing the published artifacts: the movie catalog, the run
//! metadata and the persisted episode list.

use crate::constants::files;
use crate::error::ArtifactWriteError;
use crate::models::run::format_timestamp;
use crate::models::{EpisodeListEntry, MovieRecord, RunMetadata};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// The catalog document consumed by the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub last_updated: String,

    #[serde(default)]
    pub total_movies: usize,

    #[serde(default)]
    pub movies: Vec<MovieRecord>,
}

impl Catalog {
    /// Orders `movies` newest episode first.
    #[must_use]
    pub fn new(mut movies: Vec<MovieRecord>, generated_at: DateTime<Utc>) -> Self {
        movies.sort_by(|a, b| b.episode_number.cmp(&a.episode_number));
        Self {
            last_updated: format_timestamp(generated_at),
            total_movies: movies.len(),
            movies,
        }
    }

    /// `Ok(None)` if the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
        let catalog = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog: {}", path.display()))?;
        Ok(Some(catalog))
    }

    /// Records from the last published catalog; unreadable counts as empty.
    #[must_use]
    pub fn load_prior(path: &Path) -> Vec<MovieRecord> {
        match Self::load(path) {
            Ok(Some(catalog)) => {
                info!(count = catalog.movies.len(), path = %path.display(), "Loaded prior catalog");
                catalog.movies
            }
            Ok(None) => {
                info!(path = %path.display(), "No prior catalog");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable prior catalog");
                Vec::new()
            }
        }
    }
}

/// Pretty JSON with a trailing newline.
pub fn to_json_bytes<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Replaces `path` with `value` through a temp file in the same directory,
/// so readers never observe a partial document.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactWriteError> {
    let fail = |e: std::io::Error| ArtifactWriteError::new(path, e);

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(fail)?;

    let bytes = to_json_bytes(value).map_err(|e| fail(std::io::Error::other(e)))?;

    let mut file = NamedTempFile::new_in(&dir).map_err(fail)?;
    file.write_all(&bytes).map_err(fail)?;
    file.as_file().sync_all().map_err(fail)?;
    file.persist(path).map_err(|e| fail(e.error))?;

    Ok(())
}

/// Paths written by one generator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifacts {
    pub catalog_path: PathBuf,
    pub metadata_path: Option<PathBuf>,
}

/// Writes the catalog and run metadata into the output directory.
pub struct JsonGenerator {
    output_dir: PathBuf,
}

impl JsonGenerator {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        self.output_dir.join(files::CATALOG)
    }

    #[must_use]
    pub fn metadata_path(&self) -> PathBuf {
        self.output_dir.join(files::RUN_METADATA)
    }

    /// Only the catalog is required; a metadata write failure is logged.
    pub fn generate(
        &self,
        catalog: &Catalog,
        metadata: &RunMetadata,
    ) -> Result<GeneratedArtifacts, ArtifactWriteError> {
        let catalog_path = self.catalog_path();
        write_json_atomic(&catalog_path, catalog)?;
        info!(
            path = %catalog_path.display(),
            total_movies = catalog.total_movies,
            "Wrote catalog"
        );

        let metadata_path = self.metadata_path();
        let metadata_path = match write_json_atomic(&metadata_path, metadata) {
            Ok(()) => Some(metadata_path),
            Err(e) => {
                warn!(error = %e, "Failed to write run metadata");
                None
            }
        };

        Ok(GeneratedArtifacts {
            catalog_path,
            metadata_path,
        })
    }
}

/// The "last known episode list" kept between runs.
pub struct EpisodeList {
    path: PathBuf,
}

impl EpisodeList {
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(files::EPISODE_LIST),
        }
    }

    pub fn load(&self) -> Result<Option<Vec<EpisodeListEntry>>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read episode list: {}", self.path.display()))?;
        let entries = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse episode list: {}", self.path.display()))?;
        Ok(Some(entries))
    }

    pub fn save(&self, entries: &[EpisodeListEntry]) -> Result<(), ArtifactWriteError> {
        write_json_atomic(&self.path, &entries)
    }

    /// Reconstructs listing titles from catalog records that remember them.
    #[must_use]
    pub fn rebuild_from_catalog(records: &[MovieRecord]) -> Vec<EpisodeListEntry> {
        let mut sorted: Vec<&MovieRecord> = records.iter().collect();
        sorted.sort_by(|a, b| b.episode_number.cmp(&a.episode_number));

        sorted
            .into_iter()
            .map(|record| {
                let (title, year) = match record.episode_title.as_deref() {
                    Some(title) => (title, record.episode_year),
                    None => (record.title.as_str(), record.year),
                };
                let raw_title = match year {
                    Some(year) => format!("{}: {title} ({year})", record.episode_number),
                    None => format!("{}: {title}", record.episode_number),
                };
                EpisodeListEntry::new(raw_title, record.episode_url.clone())
            })
            .collect()
    }

    /// Scraped entries first, then known entries the scrape did not return.
    #[must_use]
    pub fn merge(
        scraped: Vec<EpisodeListEntry>,
        known: &[EpisodeListEntry],
    ) -> Vec<EpisodeListEntry> {
        let mut seen: std::collections::HashSet<String> =
            scraped.iter().map(|e| e.raw_title.clone()).collect();
        let mut merged = scraped;

        for entry in known {
            if seen.insert(entry.raw_title.clone()) {
                merged.push(entry.clone());
            }
        }

        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EpisodeCandidate;
    use chrono::TimeZone;

    fn record(number: u32, title: &str, year: Option<i32>) -> MovieRecord {
        MovieRecord::from_candidate(
            number,
            &EpisodeCandidate {
                episode_number: Some(number),
                raw_title: String::new(),
                parsed_title: title.to_string(),
                year_hint: year,
                episode_url: None,
            },
        )
    }

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("firetrack-catalog-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_catalog_sorted_descending() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let catalog = Catalog::new(
            vec![record(3, "Heat", Some(1995)), record(10, "Alien", Some(1979))],
            at,
        );

        assert_eq!(catalog.total_movies, 2);
        assert_eq!(catalog.movies[0].episode_number, 10);
        assert_eq!(catalog.last_updated, "2026-03-01T00:00:00Z");
    }

    #[test]
    fn test_write_json_atomic_replaces_file() {
        let dir = scratch_dir();
        let path = dir.join("nested").join("movies.json");

        write_json_atomic(&path, &vec![1, 2]).unwrap();
        write_json_atomic(&path, &vec![3]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "[\n  3\n]\n");

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_merge_keeps_scraped_order_and_known_extras() {
        let scraped = vec![
            EpisodeListEntry::new("43: Heat (1995)", None),
            EpisodeListEntry::new("42: The Thing (1982)", None),
        ];
        let known = vec![
            EpisodeListEntry::new("42: The Thing (1982)", Some("https://x/42".to_string())),
            EpisodeListEntry::new("41: Alien (1979)", None),
        ];

        let merged = EpisodeList::merge(scraped, &known);
        let titles: Vec<&str> = merged.iter().map(|e| e.raw_title.as_str()).collect();
        assert_eq!(titles, ["43: Heat (1995)", "42: The Thing (1982)", "41: Alien (1979)"]);
        assert_eq!(merged[1].episode_url, None);
    }

    #[test]
    fn test_rebuild_from_catalog() {
        let mut thing = record(42, "The Thing", Some(1982));
        thing.title = "The Thing (OMDB)".to_string();
        thing.year = Some(1983);
        let mut legacy = record(5, "Alien", None);
        legacy.episode_title = None;
        legacy.year = Some(1979);
        let entries =
            EpisodeList::rebuild_from_catalog(&[record(7, "Heat", None), thing, legacy]);

        assert_eq!(entries[0].raw_title, "42: The Thing (1982)");
        assert_eq!(entries[1].raw_title, "7: Heat");
        assert_eq!(entries[2].raw_title, "5: Alien (1979)");
    }

    #[test]
    fn test_episode_list_round_trip_and_missing() {
        let dir = scratch_dir();
        let list = EpisodeList::new(&dir);
        assert!(list.load().unwrap().is_none());

        let entries = vec![EpisodeListEntry::new("42: The Thing (1982)", None)];
        list.save(&entries).unwrap();
        assert_eq!(list.load().unwrap(), Some(entries));

        std::fs::remove_dir_all(dir).ok();
    }
}
