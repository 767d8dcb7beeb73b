use super::types::{DetectionError, DetectionResult, DetectorPayload};
use crate::context::RepositoryContext;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// A pluggable analysis unit
///
/// Implementations must be read-only with respect to the repository snapshot and
/// safe to keep running after the scheduler has stopped waiting on them: a
/// timed-out detector is abandoned, not cancelled.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Stable, unique name used for registration and dependency references
    fn name(&self) -> &str;

    /// Names of detectors whose results this one reads
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    async fn detect(&self, ctx: &DetectionContext) -> Result<DetectorPayload, DetectionError>;
}

/// What a detector sees while it runs: the snapshot plus every result settled in
/// earlier batches
#[derive(Clone)]
pub struct DetectionContext {
    repository: Arc<RepositoryContext>,
    upstream: Arc<HashMap<String, DetectionResult>>,
}

impl DetectionContext {
    pub fn new(
        repository: Arc<RepositoryContext>,
        upstream: Arc<HashMap<String, DetectionResult>>,
    ) -> Self {
        Self {
            repository,
            upstream,
        }
    }

    /// Context with no upstream results, for running a detector on its own
    pub fn standalone(repository: RepositoryContext) -> Self {
        Self::new(Arc::new(repository), Arc::new(HashMap::new()))
    }

    pub fn repository(&self) -> &RepositoryContext {
        &self.repository
    }

    pub fn upstream(&self, name: &str) -> Option<&DetectionResult> {
        self.upstream.get(name)
    }

    /// Payload of a dependency that settled successfully
    pub fn upstream_payload(&self, name: &str) -> Option<&DetectorPayload> {
        self.upstream(name).and_then(DetectionResult::payload)
    }

    /// Like [`upstream_payload`](Self::upstream_payload), but a missing or failed
    /// dependency becomes a recoverable error
    pub fn require(&self, name: &str) -> Result<&DetectorPayload, DetectionError> {
        self.upstream_payload(name)
            .ok_or_else(|| DetectionError::upstream_unavailable(name))
    }
}
