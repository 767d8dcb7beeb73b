//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started {
                repository,
                detectors,
            } => {
                info!(repo = %repository, detectors, "Starting analysis");
            }
            ProgressEvent::CacheHit { key } => {
                info!(key = %key, "Serving cached report");
            }
            ProgressEvent::BatchStarted { index, detectors } => {
                debug!(batch = index, detectors = ?detectors, "Starting batch");
            }
            ProgressEvent::DetectorFinished {
                detector,
                duration,
                success,
            } => {
                if *success {
                    debug!(
                        detector = %detector,
                        duration_ms = duration.as_millis(),
                        "Detector complete"
                    );
                } else {
                    warn!(
                        detector = %detector,
                        duration_ms = duration.as_millis(),
                        "Detector failed"
                    );
                }
            }
            ProgressEvent::DetectorTimedOut { detector, timeout } => {
                warn!(
                    detector = %detector,
                    timeout_ms = timeout.as_millis(),
                    "Detector timed out"
                );
            }
            ProgressEvent::BatchComplete { index, duration } => {
                debug!(
                    batch = index,
                    duration_ms = duration.as_millis(),
                    "Batch complete"
                );
            }
            ProgressEvent::PipelineTimedOut { abandoned } => {
                warn!(abandoned = ?abandoned, "Overall deadline exceeded");
            }
            ProgressEvent::Completed {
                complete,
                errors,
                total_time,
            } => {
                info!(
                    complete,
                    errors,
                    total_time_ms = total_time.as_millis(),
                    "Analysis complete"
                );
            }
        }
    }
}
