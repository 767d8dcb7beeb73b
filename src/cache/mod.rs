//! Report caching keyed by repository commit
//!
//! The engine itself is indifferent to the backing store: anything that
//! implements [`KeyValueStore`] works, and every store failure is absorbed by
//! [`CachedAnalyzer`], which falls back to running the pipeline.

pub mod cached;
pub mod commit;
pub mod file;
pub mod memory;

pub use cached::CachedAnalyzer;
pub use commit::{CommitResolver, GitHeadResolver, GitHubCommitResolver, ResolveError};
pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

pub const KEY_PREFIX: &str = "scanner";
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache entry could not be encoded: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache backend unavailable: {0}")]
    Backend(String),
}

/// Minimal TTL key-value contract
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// `scanner:<owner>:<repo>:<sha>`
pub fn cache_key(owner: &str, repo: &str, sha: &str) -> String {
    format!("{}:{}:{}:{}", KEY_PREFIX, owner, repo, sha)
}

/// Stand-in commit identifier used when the real one cannot be resolved.
/// Never collides with a hex SHA.
pub fn fallback_sha(now: DateTime<Utc>) -> String {
    format!("fallback-{}", now.timestamp_millis())
}
