use crate::error::{ParseError, ParseFailure};
use crate::models::EpisodeCandidate;
use chrono::Datelike;
use regex::Regex;
use std::sync::OnceLock;

/// Listing entries that are never movie episodes.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &["TRANSCRIPT", "Pork Chop Feed", "Bonus", "Live Show"];

const MIN_YEAR: i32 = 1900;

fn get_regex(re: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    re.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern defined in code"))
}

/// Turns scraped episode titles into [`EpisodeCandidate`]s.
#[derive(Debug, Clone)]
pub struct TitleParser {
    exclude_patterns: Vec<String>,
    max_year: i32,
}

impl Default for TitleParser {
    fn default() -> Self {
        let patterns: Vec<String> = DEFAULT_EXCLUDE_PATTERNS
            .iter()
            .map(ToString::to_string)
            .collect();
        Self::new(&patterns)
    }
}

impl TitleParser {
    #[must_use]
    pub fn new(exclude_patterns: &[String]) -> Self {
        Self {
            exclude_patterns: exclude_patterns
                .iter()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
            max_year: chrono::Utc::now().year() + 1,
        }
    }

    /// Overrides the upper bound of the plausible year range.
    #[must_use]
    pub const fn with_max_year(mut self, max_year: i32) -> Self {
        self.max_year = max_year;
        self
    }

    /// Parses one raw listing title.
    ///
    /// A missing episode number is not an error here; the candidate comes
    /// back with `episode_number = None` and the caller decides what to do.
    pub fn parse(&self, raw_title: &str) -> Result<EpisodeCandidate, ParseError> {
        let text = clean_text(raw_title);
        if text.is_empty() {
            return Err(ParseError::new(ParseFailure::Empty, raw_title));
        }

        let lowered = text.to_lowercase();
        if self.exclude_patterns.iter().any(|p| lowered.contains(p)) {
            return Err(ParseError::new(ParseFailure::Excluded, raw_title));
        }

        let (episode_number, rest) = split_episode_number(&text);
        let (title, year_hint) = self.split_year(rest);
        let parsed_title = clean_title(title);

        if parsed_title.is_empty() {
            return Err(ParseError::new(ParseFailure::MissingTitle, raw_title));
        }

        Ok(EpisodeCandidate {
            episode_number,
            raw_title: raw_title.to_string(),
            parsed_title,
            year_hint,
            episode_url: None,
        })
    }

    /// Splits `"Title (1982) (LIVE)"` into the title and a plausible year.
    /// Everything from the first parenthesised four-digit token on is
    /// dropped from the title, plausible or not.
    fn split_year<'a>(&self, text: &'a str) -> (&'a str, Option<i32>) {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = get_regex(&RE, r"\(\s*(?P<year>\d{4})\s*\)");

        let mut matches = re.captures_iter(text).peekable();
        let Some(first) = matches.peek() else {
            return (text, None);
        };
        let title_end = first.get(0).map_or(text.len(), |m| m.start());

        let year = matches
            .filter_map(|caps| caps.name("year")?.as_str().parse::<i32>().ok())
            .find(|year| (MIN_YEAR..=self.max_year).contains(year));

        (&text[..title_end], year)
    }
}

fn split_episode_number(text: &str) -> (Option<u32>, &str) {
    static NUMBERED: OnceLock<Regex> = OnceLock::new();
    static PREFIX_THEN_NUMBER: OnceLock<Regex> = OnceLock::new();

    let numbered = get_regex(
        &NUMBERED,
        r"^(?i:ep(?:isode)?\.?\s*)?(?P<number>\d{1,4})\s*[:.\-–—]\s*(?P<rest>.+)$",
    );
    let prefixed = get_regex(
        &PREFIX_THEN_NUMBER,
        r"^(?i:ep(?:isode)?\.?)\s*:\s*(?P<number>\d{1,4})\s+(?P<rest>.+)$",
    );

    for re in [numbered, prefixed] {
        if let Some(caps) = re.captures(text)
            && let (Some(number), Some(rest)) = (caps.name("number"), caps.name("rest"))
            && let Ok(number) = number.as_str().parse::<u32>()
        {
            return (Some(number), rest.as_str());
        }
    }

    (None, text)
}

/// Whitespace and quote normalization applied before any splitting.
fn clean_text(raw: &str) -> String {
    raw.replace("â€™", "'")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn clean_title(title: &str) -> String {
    let trimmed = title
        .trim()
        .trim_end_matches(|c: char| c == ':' || c == '-' || c.is_whitespace());

    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(trimmed);

    unquoted.trim().to_string()
}

/// Lowercase, alphanumerics and single spaces only. Apostrophes vanish so
/// `"Schindler's List"` and `"Schindlers List"` agree.
#[must_use]
pub fn normalize_for_matching(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter(|c| *c != '\'')
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> TitleParser {
        TitleParser::default().with_max_year(2026)
    }

    #[test]
    fn test_standard_format() {
        let c = parser().parse("42: The Thing (1982)").unwrap();
        assert_eq!(c.episode_number, Some(42));
        assert_eq!(c.parsed_title, "The Thing");
        assert_eq!(c.year_hint, Some(1982));
        assert_eq!(c.raw_title, "42: The Thing (1982)");
    }

    #[test]
    fn test_ep_prefix_variants() {
        let c = parser().parse("Ep 12: Saving Private Ryan (1998)").unwrap();
        assert_eq!(c.episode_number, Some(12));
        assert_eq!(c.parsed_title, "Saving Private Ryan");

        let c = parser().parse("Episode 7: Glory (1989)").unwrap();
        assert_eq!(c.episode_number, Some(7));

        let c = parser().parse("Ep. 003 - Das Boot (1981)").unwrap();
        assert_eq!(c.episode_number, Some(3));
        assert_eq!(c.parsed_title, "Das Boot");
    }

    #[test]
    fn test_number_after_prefix_colon() {
        let c = parser().parse("Ep: 100 Tora! Tora! Tora! (1970)").unwrap();
        assert_eq!(c.episode_number, Some(100));
        assert_eq!(c.parsed_title, "Tora! Tora! Tora!");
        assert_eq!(c.year_hint, Some(1970));
    }

    #[test]
    fn test_title_starting_with_digits_is_not_a_number() {
        let c = parser().parse("1917 (2019)").unwrap();
        assert_eq!(c.episode_number, None);
        assert_eq!(c.parsed_title, "1917");
        assert_eq!(c.year_hint, Some(2019));
    }

    #[test]
    fn test_missing_year() {
        let c = parser().parse("88: Starship Troopers").unwrap();
        assert_eq!(c.episode_number, Some(88));
        assert_eq!(c.parsed_title, "Starship Troopers");
        assert_eq!(c.year_hint, None);
    }

    #[test]
    fn test_implausible_year_is_dropped() {
        let c = parser().parse("5: Future War (3024)").unwrap();
        assert_eq!(c.parsed_title, "Future War");
        assert_eq!(c.year_hint, None);

        let c = parser().parse("6: Old War (1850)").unwrap();
        assert_eq!(c.year_hint, None);
    }

    #[test]
    fn test_trailing_parentheticals_are_dropped() {
        let c = parser().parse("64: Aliens (1986) (LIVE)").unwrap();
        assert_eq!(c.parsed_title, "Aliens");
        assert_eq!(c.year_hint, Some(1986));
    }

    #[test]
    fn test_exclusions() {
        let err = parser().parse("Untitled Bonus Episode").unwrap_err();
        assert_eq!(err.reason, ParseFailure::Excluded);
        assert_eq!(err.raw_title, "Untitled Bonus Episode");

        let err = parser().parse("TRANSCRIPT: 42: The Thing (1982)").unwrap_err();
        assert_eq!(err.reason, ParseFailure::Excluded);
    }

    #[test]
    fn test_custom_exclusions_replace_defaults() {
        let parser = TitleParser::new(&["special".to_string()]).with_max_year(2026);
        assert!(parser.parse("1: Bonus Round (2001)").is_ok());
        assert_eq!(
            parser.parse("2: Holiday Special").unwrap_err().reason,
            ParseFailure::Excluded
        );
    }

    #[test]
    fn test_empty_and_titleless() {
        assert_eq!(parser().parse("   ").unwrap_err().reason, ParseFailure::Empty);
        assert_eq!(
            parser().parse("12: (1999)").unwrap_err().reason,
            ParseFailure::MissingTitle
        );
    }

    #[test]
    fn test_quote_and_whitespace_normalization() {
        let c = parser().parse("  17:   Schindlerâ€™s   List  (1993) ").unwrap();
        assert_eq!(c.parsed_title, "Schindler's List");

        let c = parser().parse("18: \u{201C}Paths of Glory\u{201D} (1957)").unwrap();
        assert_eq!(c.parsed_title, "Paths of Glory");
    }

    #[test]
    fn test_parse_is_idempotent() {
        let inputs = [
            "42: The Thing (1982)",
            "Ep 12: Saving Private Ryan (1998)",
            "  17:   Schindler’s   List  (1993) ",
            "88: Starship Troopers",
            "1917 (2019)",
        ];
        for raw in inputs {
            assert_eq!(parser().parse(raw), parser().parse(raw), "{raw}");
        }
    }

    #[test]
    fn test_normalize_for_matching() {
        assert_eq!(normalize_for_matching("Schindler's List"), "schindlers list");
        assert_eq!(normalize_for_matching("Tora! Tora! Tora!"), "tora tora tora");
        assert_eq!(
            normalize_for_matching("Dr. Strangelove: or How I Learned"),
            "dr strangelove or how i learned"
        );
        let once = normalize_for_matching("  M*A*S*H ");
        assert_eq!(normalize_for_matching(&once), once);
    }
}
