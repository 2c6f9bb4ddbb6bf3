//! Tolerant deserializers for catalogs written by older pipeline versions,
//! which stored numbers as strings and used `"N/A"` for missing values.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Int(i64),
    Float(f64),
    Text(String),
}

fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") || trimmed == "-"
}

/// Parses the first four-digit run, so `"2010–2012"` yields 2010.
#[must_use]
pub fn parse_year(value: &str) -> Option<i32> {
    let digits: String = value
        .trim()
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    if digits.len() == 4 { digits.parse().ok() } else { None }
}

#[must_use]
pub fn parse_rating(value: &str) -> Option<f32> {
    if is_placeholder(value) {
        return None;
    }
    value.trim().parse().ok()
}

/// Parses vote counts such as `"412,392"`.
#[must_use]
pub fn parse_votes(value: &str) -> Option<u64> {
    if is_placeholder(value) {
        return None;
    }
    value.trim().replace(',', "").parse().ok()
}

pub fn episode_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Int(n) => u32::try_from(n).map_err(serde::de::Error::custom),
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        NumberOrString::Float(f) if f >= 0.0 => Ok(f as u32),
        NumberOrString::Float(f) => Err(serde::de::Error::custom(format!(
            "invalid episode number {f}"
        ))),
        NumberOrString::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid episode number {s:?}"))),
    }
}

pub fn optional_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(NumberOrString::Int(n)) => i32::try_from(n).ok(),
        #[allow(clippy::cast_possible_truncation)]
        Some(NumberOrString::Float(f)) => Some(f as i32),
        Some(NumberOrString::Text(s)) => parse_year(&s),
        None => None,
    })
}

pub fn optional_rating<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumberOrString>::deserialize(deserializer)? {
        #[allow(clippy::cast_precision_loss)]
        Some(NumberOrString::Int(n)) => Some(n as f32),
        #[allow(clippy::cast_possible_truncation)]
        Some(NumberOrString::Float(f)) => Some(f as f32),
        Some(NumberOrString::Text(s)) => parse_rating(&s),
        None => None,
    })
}

pub fn optional_votes<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(NumberOrString::Int(n)) => u64::try_from(n).ok(),
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some(NumberOrString::Float(f)) if f >= 0.0 => Some(f as u64),
        Some(NumberOrString::Float(_)) => None,
        Some(NumberOrString::Text(s)) => parse_votes(&s),
        None => None,
    })
}

/// Host ratings were exported as strings; numbers are accepted and kept in
/// their shortest textual form.
pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(NumberOrString::Int(n)) => Some(n.to_string()),
        Some(NumberOrString::Float(f)) => Some(f.to_string()),
        Some(NumberOrString::Text(s)) if is_placeholder(&s) => None,
        Some(NumberOrString::Text(s)) => Some(s.trim().to_string()),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_year_ranges() {
        assert_eq!(parse_year("1982"), Some(1982));
        assert_eq!(parse_year("2010–2012"), Some(2010));
        assert_eq!(parse_year("N/A"), None);
        assert_eq!(parse_year("82"), None);
    }

    #[test]
    fn test_parse_votes_with_separators() {
        assert_eq!(parse_votes("412,392"), Some(412_392));
        assert_eq!(parse_votes("N/A"), None);
    }

    #[test]
    fn test_parse_rating_placeholder() {
        assert_eq!(parse_rating("8.2"), Some(8.2));
        assert_eq!(parse_rating("N/A"), None);
        assert_eq!(parse_rating(""), None);
    }
}
