//! Merges the hosts' ratings spreadsheet into the catalog.

use crate::models::MovieRecord;
use crate::models::lenient::parse_year;
use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;

/// Minimum title similarity for a rating row to be attached to a movie.
pub const MATCH_THRESHOLD: f64 = 0.90;

const STRIPPED_PUNCTUATION: &[char] = &[':', ',', '.', '!', '?', '-', '\'', '"'];

fn get_regex(re: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    re.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern defined in code"))
}

/// One row of the ratings export.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RatingRow {
    #[serde(rename = "Title", alias = "Name", default)]
    pub title: String,

    #[serde(rename = "Year", default)]
    pub year: String,

    #[serde(rename = "AR", default)]
    pub ar: String,

    #[serde(rename = "BR", default)]
    pub br: String,

    #[serde(rename = "JR", default)]
    pub jr: String,

    #[serde(rename = "Rating", default)]
    pub rating: String,

    #[serde(rename = "Rating Notes", default)]
    pub notes: String,
}

impl RatingRow {
    /// The year column, or a `(YYYY)` in the title when the column is blank.
    #[must_use]
    pub fn effective_year(&self) -> Option<i32> {
        static YEAR: OnceLock<Regex> = OnceLock::new();

        parse_year(&self.year).or_else(|| {
            get_regex(&YEAR, r"\((\d{4})\)")
                .captures(&self.title)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse().ok())
        })
    }
}

pub fn read_ratings(path: &Path) -> Result<Vec<RatingRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open ratings CSV: {}", path.display()))?;

    reader
        .deserialize()
        .collect::<Result<Vec<RatingRow>, _>>()
        .with_context(|| format!("Failed to parse ratings CSV: {}", path.display()))
}

/// Drops a `(YYYY)` suffix and anything after it.
#[must_use]
pub fn clean_title(title: &str) -> String {
    static SUFFIX: OnceLock<Regex> = OnceLock::new();
    get_regex(&SUFFIX, r"\s*\(\d{4}\).*$")
        .replace(title, "")
        .trim()
        .to_string()
}

#[must_use]
pub fn normalize_title(title: &str) -> String {
    let lower = clean_title(title).to_lowercase();
    let lower = lower.trim();
    let without_article = lower.strip_prefix("the ").unwrap_or(lower);
    without_article
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&normalize_title(a), &normalize_title(b))
}

fn sanitize(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || ["n/a", "none", "-"].contains(&trimmed.to_lowercase().as_str()) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchDetail {
    pub csv_title: String,
    pub csv_year: String,
    pub matched_title: String,
    pub matched_year: Option<i32>,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnmatchedRating {
    pub title: String,
    pub year: String,
    /// Best similarity among same-year movies, if any were compared.
    pub best_confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    pub total_ratings: usize,
    pub total_movies: usize,
    pub matches: Vec<MatchDetail>,
    pub unmatched: Vec<UnmatchedRating>,
}

impl MergeReport {
    #[must_use]
    pub fn matched(&self) -> usize {
        self.matches.len()
    }
}

/// The index and score of the most similar same-year movie.
fn best_match(row: &RatingRow, movies: &[MovieRecord]) -> Option<(usize, f64)> {
    let year = row.effective_year()?;
    let title = clean_title(&row.title);
    if title.is_empty() {
        return None;
    }

    movies
        .iter()
        .enumerate()
        .filter(|(_, movie)| movie.year == Some(year))
        .map(|(index, movie)| (index, similarity(&title, &movie.title)))
        .fold(None, |best: Option<(usize, f64)>, candidate| match best {
            Some((_, score)) if score >= candidate.1 => best,
            _ => Some(candidate),
        })
}

/// Writes matching rows into `movies`; unmatched movies are left alone.
pub fn merge_ratings(movies: &mut [MovieRecord], rows: &[RatingRow]) -> MergeReport {
    let mut report = MergeReport {
        total_ratings: rows.len(),
        total_movies: movies.len(),
        ..MergeReport::default()
    };

    for row in rows {
        let best = best_match(row, movies);
        let csv_year = row
            .effective_year()
            .map_or_else(|| row.year.trim().to_string(), |y| y.to_string());

        match best {
            Some((index, score)) if score >= MATCH_THRESHOLD => {
                let movie = &mut movies[index];
                movie.host_ratings.ar = sanitize(&row.ar);
                movie.host_ratings.br = sanitize(&row.br);
                movie.host_ratings.jr = sanitize(&row.jr);
                movie.host_ratings.overall = sanitize(&row.rating);
                movie.host_ratings.rating_notes = sanitize(&row.notes);

                report.matches.push(MatchDetail {
                    csv_title: row.title.clone(),
                    csv_year,
                    matched_title: movie.title.clone(),
                    matched_year: movie.year,
                    confidence: score,
                });
            }
            other => report.unmatched.push(UnmatchedRating {
                title: row.title.clone(),
                year: csv_year,
                best_confidence: other.map(|(_, score)| score),
            }),
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EpisodeCandidate;

    fn movie(number: u32, title: &str, year: i32) -> MovieRecord {
        MovieRecord::from_candidate(
            number,
            &EpisodeCandidate {
                episode_number: Some(number),
                raw_title: String::new(),
                parsed_title: title.to_string(),
                year_hint: Some(year),
                episode_url: None,
            },
        )
    }

    fn row(title: &str, year: &str) -> RatingRow {
        RatingRow {
            title: title.to_string(),
            year: year.to_string(),
            ar: "4".to_string(),
            br: "N/A".to_string(),
            jr: " 3.5 ".to_string(),
            rating: "4".to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("The Thing (1982) (LIVE)"), "thing");
        assert_eq!(normalize_title("Tora! Tora! Tora!"), "tora tora tora");
        assert_eq!(normalize_title("Schindler's List"), "schindlers list");
    }

    #[test]
    fn test_effective_year_sources() {
        assert_eq!(row("Heat", "1995.0").effective_year(), Some(1995));
        assert_eq!(row("Heat (1995)", "").effective_year(), Some(1995));
        assert_eq!(row("Heat", "").effective_year(), None);
    }

    #[test]
    fn test_merge_requires_same_year() {
        let mut movies = vec![movie(42, "The Thing", 1982), movie(43, "The Thing", 2011)];
        let report = merge_ratings(&mut movies, &[row("Thing", "2011")]);

        assert_eq!(report.matched(), 1);
        assert!(movies[0].host_ratings.is_empty());
        assert_eq!(movies[1].host_ratings.ar.as_deref(), Some("4"));
        assert_eq!(movies[1].host_ratings.br, None);
        assert_eq!(movies[1].host_ratings.jr.as_deref(), Some("3.5"));
    }

    #[test]
    fn test_merge_rejects_weak_similarity() {
        let mut movies = vec![movie(10, "Aliens", 1986)];
        let report = merge_ratings(&mut movies, &[row("Alien Nation", "1986"), row("Aliens", "1979")]);

        assert_eq!(report.matched(), 0);
        assert_eq!(report.unmatched.len(), 2);
        assert!(report.unmatched[0].best_confidence.is_some_and(|s| s < MATCH_THRESHOLD));
        assert_eq!(report.unmatched[1].best_confidence, None);
        assert!(movies[0].host_ratings.is_empty());
    }
}
