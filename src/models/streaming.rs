use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamingType {
    Subscription,
    Rent,
    Buy,
    Free,
    Addon,
}

impl StreamingType {
    /// Maps the upstream vocabulary; unknown kinds are dropped by the caller.
    #[must_use]
    pub fn from_api(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "subscription" => Some(Self::Subscription),
            "rent" => Some(Self::Rent),
            "buy" => Some(Self::Buy),
            "free" => Some(Self::Free),
            "addon" => Some(Self::Addon),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingOption {
    pub service: String,

    #[serde(rename = "type")]
    pub kind: StreamingType,

    #[serde(default)]
    pub price: Option<String>,

    #[serde(default)]
    pub link: Option<String>,
}

impl StreamingOption {
    #[must_use]
    pub fn new(service: impl Into<String>, kind: StreamingType) -> Self {
        Self {
            service: service.into(),
            kind,
            price: None,
            link: None,
        }
    }
}

/// Cache payload for `source = streaming`: the availability snapshot of one
/// title at fetch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingSnapshot {
    pub imdb_id: String,

    pub country: String,

    pub options: Vec<StreamingOption>,
}

/// Orders options by `(service, type)` and keeps the first of each pair.
#[must_use]
pub fn dedupe_options(mut options: Vec<StreamingOption>) -> Vec<StreamingOption> {
    options.sort_by(|a, b| a.service.cmp(&b.service).then(a.kind.cmp(&b.kind)));
    options.dedup_by(|next, kept| next.service == kept.service && next.kind == kept.kind);
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_keeps_first_of_each_pair() {
        let mut first = StreamingOption::new("prime", StreamingType::Rent);
        first.price = Some("$3.99".to_string());
        let mut second = StreamingOption::new("prime", StreamingType::Rent);
        second.price = Some("$4.99".to_string());

        let options = dedupe_options(vec![
            StreamingOption::new("netflix", StreamingType::Subscription),
            first,
            second,
            StreamingOption::new("prime", StreamingType::Subscription),
        ]);

        assert_eq!(options.len(), 3);
        assert_eq!(options[0].service, "netflix");
        assert_eq!(options[1].kind, StreamingType::Subscription);
        assert_eq!(options[2].price.as_deref(), Some("$3.99"));
    }

    #[test]
    fn test_type_serializes_lowercase() {
        let json = serde_json::to_string(&StreamingOption::new("netflix", StreamingType::Subscription))
            .unwrap();
        assert_eq!(
            json,
            r#"{"service":"netflix","type":"subscription","price":null,"link":null}"#
        );
    }
}
