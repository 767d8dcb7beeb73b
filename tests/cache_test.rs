//! Caching façade: commit-keyed round trips and fail-open behaviour

mod support;

use async_trait::async_trait;
use chrono::Utc;
use reposcan::cache::{
    cache_key, CacheError, CachedAnalyzer, CommitResolver, FileStore, KeyValueStore, MemoryStore,
    ResolveError,
};
use reposcan::output::schema::CompletionStatus;
use reposcan::{AnalysisReport, DetectorOrchestrator, DetectorRegistry, PipelineConfig, RepositoryContext};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use support::{calls, counter, Behavior, Probe};
use tempfile::TempDir;

struct FixedCommit(&'static str);

#[async_trait]
impl CommitResolver for FixedCommit {
    async fn resolve(&self, _owner: &str, _repo: &str, _branch: &str) -> Result<String, ResolveError> {
        Ok(self.0.to_string())
    }
}

struct OfflineResolver;

#[async_trait]
impl CommitResolver for OfflineResolver {
    async fn resolve(&self, owner: &str, repo: &str, _branch: &str) -> Result<String, ResolveError> {
        Err(ResolveError::Status {
            status: 503,
            url: format!("https://api.github.com/repos/{}/{}/commits/main", owner, repo),
        })
    }
}

/// Store whose operations can each be made to fail, counting every call
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_get: bool,
    fail_set: bool,
    gets: AtomicUsize,
    sets: AtomicUsize,
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_get {
            return Err(CacheError::Backend("get refused".to_string()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.fail_set {
            return Err(CacheError::Backend("set refused".to_string()));
        }
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.inner.delete(key).await
    }
}

fn spy_orchestrator(calls: &Arc<AtomicUsize>, behavior: Behavior) -> Arc<DetectorOrchestrator> {
    let mut registry = DetectorRegistry::new();
    registry.register(Probe::new("spy", &[], behavior).with_counter(calls).shared());
    Arc::new(DetectorOrchestrator::new(registry, PipelineConfig::default()))
}

fn repo() -> RepositoryContext {
    RepositoryContext::new("o", "r")
}

#[tokio::test]
async fn test_cached_report_is_served_without_running_detectors() {
    let spy = counter();
    let store = MemoryStore::new();

    let mut seeded = DetectorOrchestrator::new(DetectorRegistry::new(), PipelineConfig::default())
        .analyze_repository(repo())
        .await;
    seeded.metadata.commit_sha = Some("sha1".to_string());
    store
        .set("scanner:o:r:sha1", seeded.to_json().unwrap(), Duration::from_secs(600))
        .await
        .unwrap();

    let analyzer = CachedAnalyzer::new(
        spy_orchestrator(&spy, Behavior::Succeed),
        Arc::new(store),
        Arc::new(FixedCommit("sha1")),
    );
    let report = analyzer.analyze(repo()).await;

    assert_eq!(report.metadata.commit_sha.as_deref(), Some("sha1"));
    assert_eq!(calls(&spy), 0);
}

#[tokio::test]
async fn test_second_analysis_hits_the_cache() {
    let spy = counter();
    let store = MemoryStore::new();
    let analyzer = CachedAnalyzer::new(
        spy_orchestrator(&spy, Behavior::Succeed),
        Arc::new(store.clone()),
        Arc::new(FixedCommit("abc123")),
    )
    .with_ttl(Duration::from_secs(60));

    let first = analyzer.analyze(repo()).await;
    let second = analyzer.analyze(repo()).await;

    assert_eq!(calls(&spy), 1);
    assert_eq!(first, second);
    assert!(store.get(&cache_key("o", "r", "abc123")).await.unwrap().is_some());
}

#[tokio::test]
async fn test_cache_read_failure_falls_back_to_pipeline() {
    let spy = counter();
    let store = Arc::new(FlakyStore {
        fail_get: true,
        ..Default::default()
    });
    let analyzer = CachedAnalyzer::new(
        spy_orchestrator(&spy, Behavior::Succeed),
        store.clone(),
        Arc::new(FixedCommit("abc")),
    );

    let report = analyzer.analyze(repo()).await;

    assert_eq!(report.metadata.completion_status, CompletionStatus::Complete);
    assert_eq!(calls(&spy), 1);
    assert_eq!(store.gets.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cache_write_failure_still_returns_report() {
    let spy = counter();
    let store = Arc::new(FlakyStore {
        fail_set: true,
        ..Default::default()
    });
    let analyzer = CachedAnalyzer::new(
        spy_orchestrator(&spy, Behavior::Succeed),
        store.clone(),
        Arc::new(FixedCommit("abc")),
    );

    let report = analyzer.analyze(repo()).await;
    assert!(report.is_complete());
    assert_eq!(store.sets.load(Ordering::SeqCst), 1);

    // Nothing was stored, so the next call runs again
    analyzer.analyze(repo()).await;
    assert_eq!(calls(&spy), 2);
}

#[tokio::test]
async fn test_partial_reports_are_not_cached() {
    let spy = counter();
    let store = Arc::new(FlakyStore::default());
    let analyzer = CachedAnalyzer::new(
        spy_orchestrator(&spy, Behavior::Fail("flaky upstream")),
        store.clone(),
        Arc::new(FixedCommit("abc")),
    );

    let report = analyzer.analyze(repo()).await;
    assert_eq!(report.metadata.completion_status, CompletionStatus::Partial);
    assert_eq!(store.sets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unresolvable_commit_uses_fallback_key() {
    let spy = counter();
    let store = MemoryStore::new();
    let analyzer = CachedAnalyzer::new(
        spy_orchestrator(&spy, Behavior::Succeed),
        Arc::new(store.clone()),
        Arc::new(OfflineResolver),
    );

    let before = Utc::now().timestamp_millis();
    let report = analyzer.analyze(repo()).await;

    let sha = report.metadata.commit_sha.clone().unwrap();
    let millis: i64 = sha.strip_prefix("fallback-").unwrap().parse().unwrap();
    assert!(millis >= before);
    assert_eq!(calls(&spy), 1);

    let raw = store.get(&cache_key("o", "r", &sha)).await.unwrap().unwrap();
    assert_eq!(AnalysisReport::from_json(&raw).unwrap(), report);
}

#[tokio::test]
async fn test_file_store_persists_across_analyzers() {
    let dir = TempDir::new().unwrap();
    let spy = counter();

    for _ in 0..2 {
        let analyzer = CachedAnalyzer::new(
            spy_orchestrator(&spy, Behavior::Succeed),
            Arc::new(FileStore::new(dir.path())),
            Arc::new(FixedCommit("deadbeef")),
        );
        let report = analyzer.analyze(repo()).await;
        assert_eq!(report.metadata.commit_sha.as_deref(), Some("deadbeef"));
    }

    assert_eq!(calls(&spy), 1);
}

#[tokio::test]
async fn test_invalidate_forces_rerun() {
    let spy = counter();
    let analyzer = CachedAnalyzer::new(
        spy_orchestrator(&spy, Behavior::Succeed),
        Arc::new(MemoryStore::new()),
        Arc::new(FixedCommit("abc")),
    );

    analyzer.analyze(repo()).await;
    analyzer.invalidate("o", "r", "abc").await.unwrap();
    analyzer.analyze(repo()).await;

    assert_eq!(calls(&spy), 2);
}
