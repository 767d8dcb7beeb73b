use super::commit::CommitResolver;
use super::{cache_key, fallback_sha, CacheError, KeyValueStore, DEFAULT_TTL};
use crate::context::RepositoryContext;
use crate::output::schema::AnalysisReport;
use crate::pipeline::DetectorOrchestrator;
use crate::progress::{NoOpHandler, ProgressEvent, ProgressHandler};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Serves reports from a [`KeyValueStore`] keyed by commit, running the
/// orchestrator on a miss
///
/// Fails open: any store or resolver fault degrades to running the pipeline.
pub struct CachedAnalyzer {
    orchestrator: Arc<DetectorOrchestrator>,
    store: Arc<dyn KeyValueStore>,
    resolver: Arc<dyn CommitResolver>,
    ttl: Duration,
    progress: Arc<dyn ProgressHandler>,
}

impl CachedAnalyzer {
    pub fn new(
        orchestrator: Arc<DetectorOrchestrator>,
        store: Arc<dyn KeyValueStore>,
        resolver: Arc<dyn CommitResolver>,
    ) -> Self {
        Self {
            orchestrator,
            store,
            resolver,
            ttl: DEFAULT_TTL,
            progress: Arc::new(NoOpHandler),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    pub fn orchestrator(&self) -> &DetectorOrchestrator {
        &self.orchestrator
    }

    pub async fn analyze(&self, context: impl Into<Arc<RepositoryContext>>) -> AnalysisReport {
        let context: Arc<RepositoryContext> = context.into();
        let sha = self.resolve_commit(&context).await;
        let key = cache_key(&context.owner, &context.repo, &sha);

        if let Some(report) = self.lookup(&key).await {
            info!(key = %key, "Cache hit");
            self.progress
                .on_progress(&ProgressEvent::CacheHit { key: key.clone() });
            return report;
        }

        let mut report = self.orchestrator.analyze_repository(context).await;
        report.metadata.commit_sha = Some(sha);

        if report.is_complete() {
            self.store_report(&key, &report).await;
        } else {
            debug!(key = %key, "Partial report not cached");
        }
        report
    }

    /// Removes the stored report for one commit
    pub async fn invalidate(&self, owner: &str, repo: &str, sha: &str) -> Result<(), CacheError> {
        self.store.delete(&cache_key(owner, repo, sha)).await
    }

    async fn resolve_commit(&self, context: &RepositoryContext) -> String {
        match self
            .resolver
            .resolve(&context.owner, &context.repo, &context.metadata.default_branch)
            .await
        {
            Ok(sha) => sha,
            Err(e) => {
                let fallback = fallback_sha(Utc::now());
                warn!(
                    repo = %context.full_name(),
                    error = %e,
                    fallback = %fallback,
                    "Commit resolution failed, using fallback key"
                );
                fallback
            }
        }
    }

    async fn lookup(&self, key: &str) -> Option<AnalysisReport> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %key, "Cache miss");
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed, running pipeline");
                return None;
            }
        };

        match AnalysisReport::from_json(&raw) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                if let Err(e) = self.store.delete(key).await {
                    debug!(key = %key, error = %e, "Failed to delete undecodable entry");
                }
                None
            }
        }
    }

    async fn store_report(&self, key: &str, report: &AnalysisReport) {
        let json = match report.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to encode report for caching");
                return;
            }
        };
        match self.store.set(key, json, self.ttl).await {
            Ok(()) => debug!(key = %key, ttl_secs = self.ttl.as_secs(), "Report cached"),
            Err(e) => warn!(key = %key, error = %e, "Cache write failed, ignoring"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryStore, ResolveError};
    use async_trait::async_trait;

    struct Fixed(&'static str);

    #[async_trait]
    impl CommitResolver for Fixed {
        async fn resolve(&self, _: &str, _: &str, _: &str) -> Result<String, ResolveError> {
            Ok(self.0.to_string())
        }
    }

    struct Unreachable;

    #[async_trait]
    impl CommitResolver for Unreachable {
        async fn resolve(&self, _: &str, _: &str, _: &str) -> Result<String, ResolveError> {
            Err(ResolveError::MissingSha)
        }
    }

    fn analyzer(store: MemoryStore, resolver: Arc<dyn CommitResolver>) -> CachedAnalyzer {
        CachedAnalyzer::new(
            Arc::new(DetectorOrchestrator::default()),
            Arc::new(store),
            resolver,
        )
    }

    #[tokio::test]
    async fn test_stores_complete_report_under_commit_key() {
        let store = MemoryStore::new();
        let analyzer = analyzer(store.clone(), Arc::new(Fixed("abc")));

        let report = analyzer.analyze(RepositoryContext::new("o", "r")).await;
        assert_eq!(report.metadata.commit_sha.as_deref(), Some("abc"));

        let raw = store.get("scanner:o:r:abc").await.unwrap().unwrap();
        let cached = AnalysisReport::from_json(&raw).unwrap();
        assert_eq!(cached, report);
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_replaced() {
        let store = MemoryStore::new();
        store
            .set("scanner:o:r:abc", "garbage".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        let analyzer = analyzer(store.clone(), Arc::new(Fixed("abc")));

        let report = analyzer.analyze(RepositoryContext::new("o", "r")).await;
        assert!(report.is_complete());
        let raw = store.get("scanner:o:r:abc").await.unwrap().unwrap();
        assert!(AnalysisReport::from_json(&raw).is_ok());
    }

    #[tokio::test]
    async fn test_fallback_key_when_commit_unknown() {
        let store = MemoryStore::new();
        let analyzer = analyzer(store.clone(), Arc::new(Unreachable));

        let report = analyzer.analyze(RepositoryContext::new("o", "r")).await;
        let sha = report.metadata.commit_sha.unwrap();
        assert!(sha.starts_with("fallback-"));
        assert!(store.get(&cache_key("o", "r", &sha)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_invalidate() {
        let store = MemoryStore::new();
        let analyzer = analyzer(store.clone(), Arc::new(Fixed("abc")));
        analyzer.analyze(RepositoryContext::new("o", "r")).await;

        analyzer.invalidate("o", "r", "abc").await.unwrap();
        assert!(store.get("scanner:o:r:abc").await.unwrap().is_none());
    }
}
