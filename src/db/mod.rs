use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::cache::{CacheEntry, CacheSource};

/// Persistent lookup cache shared by the resolvers.
///
/// A single connection serializes writes, so concurrent upserts for the
/// same key never interleave.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 1, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Cache database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn cache_repo(&self) -> repositories::cache::CacheRepository {
        repositories::cache::CacheRepository::new(self.conn.clone())
    }

    pub async fn get_cached(&self, key: &str, source: CacheSource) -> Result<Option<CacheEntry>> {
        self.cache_repo().get(key, source).await
    }

    pub async fn put_cached(
        &self,
        key: &str,
        source: CacheSource,
        payload: &serde_json::Value,
    ) -> Result<()> {
        self.cache_repo().put(key, source, payload, Utc::now()).await
    }

    /// Stores an entry with an explicit fetch time, e.g. to seed aged entries.
    pub async fn put_cached_at(
        &self,
        key: &str,
        source: CacheSource,
        payload: &serde_json::Value,
        fetched_at: DateTime<Utc>,
    ) -> Result<()> {
        self.cache_repo().put(key, source, payload, fetched_at).await
    }

    pub async fn cache_count(&self, source: CacheSource) -> Result<u64> {
        self.cache_repo().count(source).await
    }
}
