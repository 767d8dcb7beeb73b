use super::aggregator::aggregate;
use super::config::PipelineConfig;
use super::resolver::resolve;
use super::scheduler::ExecutionScheduler;
use crate::context::RepositoryContext;
use crate::detection::{Detector, DetectorRegistry};
use crate::output::schema::AnalysisReport;
use crate::progress::{NoOpHandler, ProgressEvent, ProgressHandler};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Engine entry point: resolve, schedule, aggregate
///
/// Stateless between runs apart from the registry. A run never fails; every
/// fault ends up in the report's `metadata.errors`.
pub struct DetectorOrchestrator {
    registry: DetectorRegistry,
    config: PipelineConfig,
    progress: Arc<dyn ProgressHandler>,
}

impl Default for DetectorOrchestrator {
    fn default() -> Self {
        Self::new(DetectorRegistry::with_defaults(), PipelineConfig::default())
    }
}

impl DetectorOrchestrator {
    pub fn new(registry: DetectorRegistry, config: PipelineConfig) -> Self {
        Self {
            registry,
            config,
            progress: Arc::new(NoOpHandler),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    /// Last write wins for a name already registered
    pub fn register_detector(&mut self, detector: Arc<dyn Detector>) {
        self.registry.register(detector);
    }

    pub fn detectors(&self) -> Vec<Arc<dyn Detector>> {
        self.registry.list()
    }

    pub fn registry(&self) -> &DetectorRegistry {
        &self.registry
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn analyze_repository(
        &self,
        context: impl Into<Arc<RepositoryContext>>,
    ) -> AnalysisReport {
        self.run(context.into(), self.config.clone()).await
    }

    /// Same as [`analyze_repository`](Self::analyze_repository) with explicit
    /// budgets for this run only
    pub async fn analyze_repository_with(
        &self,
        context: impl Into<Arc<RepositoryContext>>,
        overall_timeout: Duration,
        detector_timeout: Duration,
    ) -> AnalysisReport {
        let config = self
            .config
            .clone()
            .with_overall_timeout(overall_timeout)
            .with_detector_timeout(detector_timeout);
        self.run(context.into(), config).await
    }

    async fn run(&self, context: Arc<RepositoryContext>, config: PipelineConfig) -> AnalysisReport {
        let detectors = self.registry.list();
        let order: Vec<String> = detectors.iter().map(|d| d.name().to_string()).collect();

        info!(
            repo = %context.full_name(),
            files = context.stats.file_count,
            detectors = detectors.len(),
            "Starting repository analysis"
        );
        self.progress.on_progress(&ProgressEvent::Started {
            repository: context.full_name(),
            detectors: detectors.len(),
        });

        let plan = resolve(&detectors);
        let outcome = ExecutionScheduler::new(config, Arc::clone(&self.progress))
            .run(&plan, Arc::clone(&context))
            .await;

        let report = aggregate(&order, &outcome, &context, Utc::now());

        info!(
            repo = %context.full_name(),
            status = %report.metadata.completion_status,
            errors = report.metadata.errors.len(),
            health = report.health_score.total,
            duration_ms = report.metadata.duration_ms,
            "Repository analysis complete"
        );
        self.progress.on_progress(&ProgressEvent::Completed {
            complete: report.is_complete(),
            errors: report.metadata.errors.len(),
            total_time: outcome.elapsed,
        });

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::LoggingHandler;

    #[test]
    fn test_default_orchestrator_has_builtin_detectors() {
        let orchestrator = DetectorOrchestrator::default();
        let names: Vec<String> = orchestrator
            .detectors()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["language", "build-tool", "dependency", "framework", "documentation"]
        );
    }

    #[tokio::test]
    async fn test_empty_repository_is_complete() {
        let orchestrator = DetectorOrchestrator::default().with_progress(Arc::new(LoggingHandler));
        let report = orchestrator
            .analyze_repository(RepositoryContext::new("acme", "empty"))
            .await;

        assert!(report.is_complete(), "errors: {:?}", report.metadata.errors);
        assert!(report.languages.languages.is_empty());
        assert!(report.frameworks.is_empty());
        assert!(report.build_tools.tools.is_empty());
        assert_eq!(report.dependencies.total_count, 0);
        assert!(report.health_score.total <= 100);
    }

    #[tokio::test]
    async fn test_analyze_with_explicit_budgets() {
        let orchestrator = DetectorOrchestrator::default();
        let context = RepositoryContext::new("acme", "web")
            .with_file("package.json", Some(r#"{"dependencies": {"react": "^18.2.0"}}"#))
            .with_file("src/index.js", Some("console.log(1)"));
        let report = orchestrator
            .analyze_repository_with(context, Duration::from_secs(10), Duration::from_secs(5))
            .await;

        assert!(report.is_complete());
        assert!(report.frameworks.iter().any(|f| f.name.to_lowercase().contains("react")));
        assert_eq!(report.dependencies.total_count, 1);
        // The per-run override does not leak into the stored config
        assert_eq!(orchestrator.config(), &PipelineConfig::default());
    }
}
