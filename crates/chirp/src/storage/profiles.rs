//! Author profile metadata cache.
//!
//! Entries live in `<cache_dir>/id_<id>.json` or `<cache_dir>/handle_<handle>.json`,
//! hold the profile body exactly as the API returned it, and never expire.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::write_atomic;
use crate::client::ApiClient;
use crate::error::{CacheError, FetchError};
use crate::timeline::AuthorKey;

/// Profile JSON for one author.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthorMetadata(Map<String, Value>);

impl AuthorMetadata {
    /// Parse a profile body; `None` unless it is a JSON object.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        match serde_json::from_slice(bytes) {
            Ok(Value::Object(map)) => Some(Self(map)),
            _ => None,
        }
    }

    /// Whether the author has notifications turned on for the local user.
    pub fn notifications(&self) -> bool {
        self.0
            .get("notifications")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Where profile bodies come from on a cache miss.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Fetch the raw profile body for `key`.
    async fn fetch_profile(&self, key: &AuthorKey) -> Result<Vec<u8>, FetchError>;
}

/// Profile endpoint: `GET <base>/<id-or-handle>.json`.
pub struct HttpProfileSource {
    client: ApiClient,
    base_url: String,
}

impl HttpProfileSource {
    #[must_use]
    pub fn new(client: ApiClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url_for(&self, key: &AuthorKey) -> String {
        format!(
            "{}/{}.json",
            self.base_url.trim_end_matches('/'),
            key.path_segment()
        )
    }
}

#[async_trait]
impl ProfileSource for HttpProfileSource {
    async fn fetch_profile(&self, key: &AuthorKey) -> Result<Vec<u8>, FetchError> {
        self.client.get_bytes(&self.url_for(key), &[], true).await
    }
}

/// Durable per-author metadata cache.
pub struct MetadataCache {
    dir: PathBuf,
    source: Arc<dyn ProfileSource>,
    memory: HashMap<AuthorKey, AuthorMetadata>,
}

impl MetadataCache {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, source: Arc<dyn ProfileSource>) -> Self {
        Self {
            dir: dir.into(),
            source,
            memory: HashMap::new(),
        }
    }

    /// Cache file for `key`.
    #[must_use]
    pub fn entry_path(&self, key: &AuthorKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.file_stem()))
    }

    /// Resolve metadata for `key`, fetching and persisting it on a miss.
    ///
    /// A missing, empty or unparseable entry counts as a miss.
    pub async fn lookup(&mut self, key: &AuthorKey) -> Result<AuthorMetadata, CacheError> {
        if let Some(hit) = self.memory.get(key) {
            return Ok(hit.clone());
        }

        let path = self.entry_path(key);
        if let Some(metadata) = read_entry(&path) {
            tracing::debug!(%key, "Profile cache hit");
            self.memory.insert(key.clone(), metadata.clone());
            return Ok(metadata);
        }

        tracing::debug!(%key, "Profile cache miss, fetching");
        let body = self.source.fetch_profile(key).await?;
        let metadata = AuthorMetadata::from_slice(&body).ok_or_else(|| FetchError::Malformed {
            url: key.to_string(),
            reason: "profile is not a JSON object".to_string(),
        })?;

        write_atomic(&path, &body)?;
        self.memory.insert(key.clone(), metadata.clone());
        Ok(metadata)
    }
}

fn read_entry(path: &Path) -> Option<AuthorMetadata> {
    let bytes = std::fs::read(path).ok()?;
    if bytes.is_empty() {
        return None;
    }
    let metadata = AuthorMetadata::from_slice(&bytes);
    if metadata.is_none() {
        tracing::warn!(path = %path.display(), "Ignoring unreadable profile cache entry");
    }
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FakeProfiles {
        calls: AtomicUsize,
        body: Option<&'static str>,
    }

    impl FakeProfiles {
        fn serving(body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                body: Some(body),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                body: None,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProfileSource for FakeProfiles {
        async fn fetch_profile(&self, key: &AuthorKey) -> Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.body {
                Some(body) => Ok(body.as_bytes().to_vec()),
                None => Err(FetchError::Status {
                    url: key.to_string(),
                    status: 503,
                }),
            }
        }
    }

    #[test]
    fn test_notifications_flag() {
        let on = AuthorMetadata::from_slice(br#"{"notifications": true}"#).unwrap();
        let off = AuthorMetadata::from_slice(br#"{"notifications": false}"#).unwrap();
        let null = AuthorMetadata::from_slice(br#"{"notifications": null, "name": "Al"}"#).unwrap();
        let absent = AuthorMetadata::from_slice(br#"{"name": "Al"}"#).unwrap();

        assert!(on.notifications());
        assert!(!off.notifications());
        assert!(!null.notifications());
        assert!(!absent.notifications());
        assert!(AuthorMetadata::from_slice(b"[1, 2]").is_none());
    }

    #[tokio::test]
    async fn test_lookup_fetches_once_and_persists_verbatim() {
        let dir = TempDir::new().unwrap();
        let body = r#"{"id": 42, "notifications": true}"#;
        let profiles = FakeProfiles::serving(body);
        let mut cache = MetadataCache::new(dir.path(), profiles.clone());
        let key = AuthorKey::ById(42);

        let first = cache.lookup(&key).await.unwrap();
        let second = cache.lookup(&key).await.unwrap();

        assert!(first.notifications());
        assert_eq!(first, second);
        assert_eq!(profiles.calls(), 1);
        assert_eq!(std::fs::read_to_string(dir.path().join("id_42.json")).unwrap(), body);
    }

    #[tokio::test]
    async fn test_entries_survive_restart() {
        let dir = TempDir::new().unwrap();
        let key = AuthorKey::ByHandle("carol".to_string());

        let mut cache = MetadataCache::new(dir.path(), FakeProfiles::serving(r#"{"notifications": true}"#));
        cache.lookup(&key).await.unwrap();

        // A fresh cache over the same directory must not hit the network.
        let offline = FakeProfiles::failing();
        let mut restarted = MetadataCache::new(dir.path(), offline.clone());
        let metadata = restarted.lookup(&key).await.unwrap();

        assert!(metadata.notifications());
        assert_eq!(offline.calls(), 0);
    }

    #[tokio::test]
    async fn test_numeric_handle_does_not_reuse_id_entry() {
        let dir = TempDir::new().unwrap();

        let mut cache = MetadataCache::new(dir.path(), FakeProfiles::serving(r#"{"notifications": true}"#));
        cache.lookup(&AuthorKey::ById(12345)).await.unwrap();

        let handles = FakeProfiles::serving(r#"{"notifications": false}"#);
        let mut restarted = MetadataCache::new(dir.path(), handles.clone());
        let metadata = restarted.lookup(&AuthorKey::ByHandle("12345".to_string())).await.unwrap();

        assert!(!metadata.notifications());
        assert_eq!(handles.calls(), 1);
        assert!(dir.path().join("id_12345.json").exists());
        assert!(dir.path().join("handle_12345.json").exists());
    }

    #[tokio::test]
    async fn test_empty_entry_is_refetched() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("id_7.json"), "").unwrap();
        let profiles = FakeProfiles::serving(r#"{"notifications": false}"#);
        let mut cache = MetadataCache::new(dir.path(), profiles.clone());

        cache.lookup(&AuthorKey::ById(7)).await.unwrap();

        assert_eq!(profiles.calls(), 1);
        assert!(!std::fs::read_to_string(dir.path().join("id_7.json")).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates_and_caches_nothing() {
        let dir = TempDir::new().unwrap();
        let mut cache = MetadataCache::new(dir.path(), FakeProfiles::failing());
        let key = AuthorKey::ById(9);

        let err = cache.lookup(&key).await.unwrap_err();

        assert!(matches!(err, CacheError::Fetch(_)));
        assert!(!err.is_fatal());
        assert!(!cache.entry_path(&key).exists());
    }

    #[tokio::test]
    async fn test_non_object_body_is_not_cached() {
        let dir = TempDir::new().unwrap();
        let mut cache = MetadataCache::new(dir.path(), FakeProfiles::serving("<html>oops</html>"));
        let key = AuthorKey::ById(3);

        let err = cache.lookup(&key).await.unwrap_err();

        assert!(matches!(err, CacheError::Fetch(FetchError::Malformed { .. })));
        assert!(!cache.entry_path(&key).exists());
    }

    #[tokio::test]
    async fn test_write_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let mut cache = MetadataCache::new(&blocker, FakeProfiles::serving("{}"));

        let err = cache.lookup(&AuthorKey::ById(1)).await.unwrap_err();
        assert!(err.is_fatal());
    }
}
