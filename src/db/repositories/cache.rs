use crate::entities::{cache_entries, prelude::*};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

/// Which upstream produced a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheSource {
    Omdb,
    Streaming,
}

impl CacheSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Omdb => "omdb",
            Self::Streaming => "streaming",
        }
    }
}

impl std::fmt::Display for CacheSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub source: CacheSource,
    pub fetched_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl CacheEntry {
    #[must_use]
    pub fn is_fresh(&self, max_age: chrono::Duration) -> bool {
        self.is_fresh_at(Utc::now(), max_age)
    }

    /// An entry stamped in the future counts as fresh.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>, max_age: chrono::Duration) -> bool {
        now.signed_duration_since(self.fetched_at) <= max_age
    }

    /// Decodes the payload into the resolver's own type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.payload.clone()).with_context(|| {
            format!(
                "Cached {} payload for {:?} has an unexpected shape",
                self.source, self.key
            )
        })
    }
}

pub struct CacheRepository {
    conn: DatabaseConnection,
}

impl CacheRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, key: &str, source: CacheSource) -> Result<Option<CacheEntry>> {
        let row = CacheEntries::find_by_id((key.to_string(), source.as_str().to_string()))
            .one(&self.conn)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let fetched_at = DateTime::parse_from_rfc3339(&row.fetched_at)
            .with_context(|| format!("Invalid fetched_at for cache key {key:?}"))?
            .with_timezone(&Utc);
        let payload = serde_json::from_str(&row.payload)
            .with_context(|| format!("Corrupt cache payload for key {key:?}"))?;

        Ok(Some(CacheEntry {
            key: row.cache_key,
            source,
            fetched_at,
            payload,
        }))
    }

    /// Inserts or replaces the entry in one statement.
    pub async fn put(
        &self,
        key: &str,
        source: CacheSource,
        payload: &serde_json::Value,
        fetched_at: DateTime<Utc>,
    ) -> Result<()> {
        let active_model = cache_entries::ActiveModel {
            cache_key: Set(key.to_string()),
            source: Set(source.as_str().to_string()),
            payload: Set(serde_json::to_string(payload)?),
            fetched_at: Set(fetched_at.to_rfc3339()),
        };

        CacheEntries::insert(active_model)
            .on_conflict(
                OnConflict::columns([
                    cache_entries::Column::CacheKey,
                    cache_entries::Column::Source,
                ])
                .update_columns([
                    cache_entries::Column::Payload,
                    cache_entries::Column::FetchedAt,
                ])
                .to_owned(),
            )
            .exec(&self.conn)
            .await?;

        Ok(())
    }

    pub async fn count(&self, source: CacheSource) -> Result<u64> {
        let count = CacheEntries::find()
            .filter(cache_entries::Column::Source.eq(source.as_str()))
            .count(&self.conn)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(fetched_at: DateTime<Utc>) -> CacheEntry {
        CacheEntry {
            key: "the thing|1982".to_string(),
            source: CacheSource::Omdb,
            fetched_at,
            payload: serde_json::json!({"imdb_id": "tt0084787"}),
        }
    }

    #[test]
    fn test_is_fresh_at_boundary() {
        let fetched = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let e = entry(fetched);
        let max_age = chrono::Duration::days(7);

        assert!(e.is_fresh_at(fetched + chrono::Duration::days(7), max_age));
        assert!(!e.is_fresh_at(fetched + chrono::Duration::days(8), max_age));
        assert!(e.is_fresh_at(fetched - chrono::Duration::days(1), max_age));
    }

    #[test]
    fn test_decode_reports_shape_errors() {
        let e = entry(Utc::now());
        let err = e.decode::<Vec<String>>().unwrap_err();
        assert!(err.to_string().contains("unexpected shape"));
    }
}
