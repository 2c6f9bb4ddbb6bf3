//! Cache store behaviour against a real SQLite file.

use chrono::{Duration, Utc};
use firetrack::db::{CacheSource, Store};
use serde_json::json;

fn scratch_db_url() -> (String, std::path::PathBuf) {
    let path = std::env::temp_dir().join(format!("firetrack-cache-test-{}.db", uuid::Uuid::new_v4()));
    (format!("sqlite:{}", path.display()), path)
}

#[tokio::test]
async fn test_get_missing_entry() {
    let (url, path) = scratch_db_url();
    let store = Store::new(&url).await.unwrap();

    assert!(store.get_cached("heat|1995", CacheSource::Omdb).await.unwrap().is_none());

    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn test_put_replaces_existing_entry() {
    let (url, path) = scratch_db_url();
    let store = Store::new(&url).await.unwrap();

    store
        .put_cached("tt0113277", CacheSource::Streaming, &json!({"options": ["a", "b"]}))
        .await
        .unwrap();
    store
        .put_cached("tt0113277", CacheSource::Streaming, &json!({"options": ["c"]}))
        .await
        .unwrap();

    let entry = store
        .get_cached("tt0113277", CacheSource::Streaming)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.payload, json!({"options": ["c"]}));
    assert_eq!(store.cache_count(CacheSource::Streaming).await.unwrap(), 1);

    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn test_same_key_different_sources_are_separate() {
    let (url, path) = scratch_db_url();
    let store = Store::new(&url).await.unwrap();

    store
        .put_cached("tt0084787", CacheSource::Omdb, &json!({"kind": "omdb"}))
        .await
        .unwrap();
    store
        .put_cached("tt0084787", CacheSource::Streaming, &json!({"kind": "streaming"}))
        .await
        .unwrap();

    let omdb = store.get_cached("tt0084787", CacheSource::Omdb).await.unwrap().unwrap();
    assert_eq!(omdb.payload["kind"], "omdb");
    assert_eq!(omdb.source, CacheSource::Omdb);

    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn test_entries_survive_reopen() {
    let (url, path) = scratch_db_url();

    {
        let store = Store::new(&url).await.unwrap();
        store
            .put_cached("the thing|1982", CacheSource::Omdb, &json!({"imdb_id": "tt0084787"}))
            .await
            .unwrap();
    }

    let reopened = Store::new(&url).await.unwrap();
    let entry = reopened
        .get_cached("the thing|1982", CacheSource::Omdb)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.payload["imdb_id"], "tt0084787");

    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn test_freshness_is_decided_by_caller() {
    let (url, path) = scratch_db_url();
    let store = Store::new(&url).await.unwrap();

    store
        .put_cached_at(
            "tt0084787",
            CacheSource::Streaming,
            &json!([]),
            Utc::now() - Duration::days(10),
        )
        .await
        .unwrap();

    let entry = store
        .get_cached("tt0084787", CacheSource::Streaming)
        .await
        .unwrap()
        .unwrap();
    assert!(!entry.is_fresh(Duration::hours(144)));
    assert!(entry.is_fresh(Duration::days(180)));

    std::fs::remove_file(path).ok();
}
