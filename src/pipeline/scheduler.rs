//! Batch-by-batch execution with per-detector and overall deadlines
//!
//! Each detector runs in its own tokio task. The scheduler only ever stops
//! *waiting*: a detector that overruns its budget is detached and keeps running
//! in the background, and its eventual result is never observed.

use super::config::PipelineConfig;
use super::resolver::{ExecutionBatch, ExecutionPlan};
use crate::context::RepositoryContext;
use crate::detection::{DetectionContext, DetectionError, DetectionResult, Detector};
use crate::progress::{ProgressEvent, ProgressHandler};
use futures_util::stream::{FuturesUnordered, StreamExt};
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Everything the scheduler observed during one run
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutcome {
    /// Exactly one entry per planned detector
    pub results: HashMap<String, DetectionResult>,
    /// Wall-clock time each settled detector took
    pub durations: HashMap<String, Duration>,
    /// The overall deadline fired before every batch settled
    pub timed_out: bool,
    pub elapsed: Duration,
}

pub struct ExecutionScheduler {
    config: PipelineConfig,
    progress: Arc<dyn ProgressHandler>,
}

impl ExecutionScheduler {
    pub fn new(config: PipelineConfig, progress: Arc<dyn ProgressHandler>) -> Self {
        Self { config, progress }
    }

    /// Runs the batches in order. Never fails: every fault becomes a failure
    /// result for the detector it belongs to.
    pub async fn run(&self, plan: &ExecutionPlan, repository: Arc<RepositoryContext>) -> ExecutionOutcome {
        let start = Instant::now();
        // A budget too large to represent as an instant means no overall deadline
        let deadline = start.checked_add(self.config.overall_timeout);
        let semaphore = self
            .config
            .max_concurrency
            .map(|limit| Arc::new(Semaphore::new(limit)));

        let mut outcome = ExecutionOutcome::default();

        for (position, batch) in plan.batches.iter().enumerate() {
            let later = plan.batches[position + 1..].iter().flat_map(ExecutionBatch::names);

            if deadline.is_some_and(|d| Instant::now() >= d) {
                self.abandon(batch.names().into_iter().chain(later).collect(), &mut outcome);
                break;
            }

            self.progress.on_progress(&ProgressEvent::BatchStarted {
                index: batch.index,
                detectors: batch.names(),
            });
            let batch_start = Instant::now();

            // Dependents read a frozen copy of everything settled so far
            let ctx = DetectionContext::new(
                Arc::clone(&repository),
                Arc::new(outcome.results.clone()),
            );
            let mut pending: FuturesUnordered<_> = batch
                .detectors
                .iter()
                .map(|detector| self.invoke(Arc::clone(detector), ctx.clone(), semaphore.clone()))
                .collect();
            let mut unsettled: HashSet<String> = batch.names().into_iter().collect();

            loop {
                let next = match deadline {
                    Some(deadline) => tokio::time::timeout_at(deadline, pending.next()).await,
                    None => Ok(pending.next().await),
                };
                match next {
                    Ok(Some((result, duration))) => {
                        unsettled.remove(&result.detector);
                        outcome.durations.insert(result.detector.clone(), duration);
                        outcome.results.insert(result.detector.clone(), result);
                    }
                    Ok(None) | Err(_) => break,
                }
            }

            if !unsettled.is_empty() {
                // Keep registration order for the abandoned list
                let abandoned = batch
                    .names()
                    .into_iter()
                    .filter(|name| unsettled.contains(name))
                    .chain(later)
                    .collect();
                self.abandon(abandoned, &mut outcome);
                break;
            }

            self.progress.on_progress(&ProgressEvent::BatchComplete {
                index: batch.index,
                duration: batch_start.elapsed(),
            });
        }

        outcome.elapsed = start.elapsed();
        outcome
    }

    /// Records a pipeline-timeout failure for every detector in `abandoned`
    fn abandon(&self, abandoned: Vec<String>, outcome: &mut ExecutionOutcome) {
        warn!(
            abandoned = ?abandoned,
            overall_timeout_ms = self.config.overall_timeout.as_millis(),
            "Overall deadline exceeded, abandoning remaining detectors"
        );
        for name in &abandoned {
            outcome.results.insert(
                name.clone(),
                DetectionResult::failure(
                    name.clone(),
                    DetectionError::pipeline_timeout(self.config.overall_timeout),
                ),
            );
        }
        outcome.timed_out = true;
        self.progress
            .on_progress(&ProgressEvent::PipelineTimedOut { abandoned });
    }

    async fn invoke(
        &self,
        detector: Arc<dyn Detector>,
        ctx: DetectionContext,
        semaphore: Option<Arc<Semaphore>>,
    ) -> (DetectionResult, Duration) {
        let name = detector.name().to_string();
        let timeout = self.config.detector_timeout;

        // Closed semaphores never happen here; treat one as unbounded
        let _permit = match semaphore {
            Some(semaphore) => semaphore.acquire_owned().await.ok(),
            None => None,
        };

        let started = Instant::now();
        debug!(detector = %name, "Starting detector");
        let handle = tokio::spawn(async move { detector.detect(&ctx).await });

        let result = match tokio::time::timeout(timeout, handle).await {
            Ok(Ok(Ok(payload))) => DetectionResult::success(name.clone(), payload),
            Ok(Ok(Err(error))) => DetectionResult::failure(name.clone(), error),
            Ok(Err(join_error)) => {
                let detail = if join_error.is_panic() {
                    panic_message(join_error.into_panic())
                } else {
                    "task cancelled".to_string()
                };
                warn!(detector = %name, detail = %detail, "Detector crashed");
                DetectionResult::failure(name.clone(), DetectionError::panicked(detail))
            }
            Err(_) => {
                // Dropping the JoinHandle detaches the task
                self.progress.on_progress(&ProgressEvent::DetectorTimedOut {
                    detector: name.clone(),
                    timeout,
                });
                DetectionResult::failure(name.clone(), DetectionError::timeout(timeout))
            }
        };
        let duration = started.elapsed();

        if result.error().map_or(true, |e| !e.is_timeout()) {
            self.progress.on_progress(&ProgressEvent::DetectorFinished {
                detector: name,
                duration,
                success: result.is_success(),
            });
        }

        (result, duration)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
