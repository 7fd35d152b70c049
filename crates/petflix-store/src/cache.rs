//! Content-addressed cache of finished videos.
//!
//! The fingerprint is a pure function of the generation inputs: identical
//! (image ref, theme id) pairs must hit the same entry across process
//! restarts. Entries are written once on first success and never mutated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::StoreResult;

const METADATA_FILE: &str = "metadata.json";

/// Compute the cache key for a generation request.
///
/// SHA-256 hex over `"{image_ref}-{theme_id}"`, matching the on-disk
/// format of existing cache files.
pub fn fingerprint(image_ref: &str, theme_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image_ref.as_bytes());
    hasher.update(b"-");
    hasher.update(theme_id.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// One cached result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// URL of the finished stitched video
    pub video_ref: String,
    pub created_at: DateTime<Utc>,
}

/// Persistent fingerprint → video-reference map backed by one JSON file.
#[derive(Debug, Clone)]
pub struct ContentCache {
    dir: PathBuf,
}

impl ContentCache {
    /// Open (or lazily create) a cache rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    /// Look up a fingerprint. `None` on miss.
    pub async fn get(&self, key: &str) -> StoreResult<Option<CacheEntry>> {
        let metadata = self.read_metadata().await?;
        Ok(metadata.get(key).cloned())
    }

    /// Record a finished video for a fingerprint, best-effort.
    ///
    /// Cache write failures must never fail a run that already produced a
    /// video, so errors are logged and swallowed here.
    pub async fn put(&self, key: &str, video_ref: &str) {
        if let Err(e) = self.try_put(key, video_ref).await {
            warn!("Failed to write video cache entry for {}: {}", key, e);
        }
    }

    /// Fallible insert, exposed for tests and callers that care.
    pub async fn try_put(&self, key: &str, video_ref: &str) -> StoreResult<()> {
        let mut metadata = self.read_metadata().await?;
        metadata.insert(
            key.to_string(),
            CacheEntry {
                video_ref: video_ref.to_string(),
                created_at: Utc::now(),
            },
        );
        self.write_metadata(&metadata).await?;
        debug!("Cached video for key {}: {}", key, video_ref);
        Ok(())
    }

    async fn read_metadata(&self) -> StoreResult<HashMap<String, CacheEntry>> {
        let path = self.metadata_path();
        if !path.exists() {
            return Ok(HashMap::new());
        }

        let raw = tokio::fs::read(&path).await?;
        match serde_json::from_slice(&raw) {
            Ok(metadata) => Ok(metadata),
            Err(e) => {
                // A corrupt metadata file is reset rather than poisoning
                // every later run.
                warn!("Video cache metadata corrupt, resetting: {}", e);
                self.write_metadata(&HashMap::new()).await?;
                Ok(HashMap::new())
            }
        }
    }

    async fn write_metadata(&self, metadata: &HashMap<String, CacheEntry>) -> StoreResult<()> {
        self.ensure_dir().await?;
        let raw = serde_json::to_vec_pretty(metadata)?;
        tokio::fs::write(self.metadata_path(), raw).await?;
        Ok(())
    }

    async fn ensure_dir(&self) -> StoreResult<()> {
        if !Path::new(&self.dir).exists() {
            tokio::fs::create_dir_all(&self.dir).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = fingerprint("file:///pet.jpg", "fairy-tale");
        let b = fingerprint("file:///pet.jpg", "fairy-tale");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_fingerprint_differs_per_input() {
        let base = fingerprint("file:///pet.jpg", "fairy-tale");
        assert_ne!(base, fingerprint("file:///pet.jpg", "superhero"));
        assert_ne!(base, fingerprint("file:///other.jpg", "fairy-tale"));
    }

    #[tokio::test]
    async fn test_hit_after_put() {
        let dir = TempDir::new().unwrap();
        let cache = ContentCache::new(dir.path());
        let key = fingerprint("file:///pet.jpg", "fairy-tale");

        assert!(cache.get(&key).await.unwrap().is_none());

        cache.try_put(&key, "https://cdn/final.mp4").await.unwrap();
        let entry = cache.get(&key).await.unwrap().unwrap();
        assert_eq!(entry.video_ref, "https://cdn/final.mp4");
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let key = fingerprint("file:///pet.jpg", "crime-drama");

        {
            let cache = ContentCache::new(dir.path());
            cache.try_put(&key, "https://cdn/noir.mp4").await.unwrap();
        }

        let reopened = ContentCache::new(dir.path());
        let entry = reopened.get(&key).await.unwrap().unwrap();
        assert_eq!(entry.video_ref, "https://cdn/noir.mp4");
    }

    #[tokio::test]
    async fn test_corrupt_metadata_resets_to_empty() {
        let dir = TempDir::new().unwrap();
        let cache = ContentCache::new(dir.path());
        tokio::fs::write(dir.path().join(METADATA_FILE), b"not json")
            .await
            .unwrap();

        assert!(cache.get("whatever").await.unwrap().is_none());

        // And the file is usable again afterwards
        cache.try_put("k", "https://cdn/v.mp4").await.unwrap();
        assert!(cache.get("k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_put_is_best_effort() {
        // Point the cache at a path that cannot be a directory
        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("occupied");
        tokio::fs::write(&file_path, b"x").await.unwrap();

        let cache = ContentCache::new(&file_path);
        // Must not panic or propagate
        cache.put("k", "https://cdn/v.mp4").await;
    }
}
