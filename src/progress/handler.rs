//! Progress handler trait and events

use std::time::Duration;

/// Events emitted while an analysis run progresses
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Analysis started for `owner/repo`
    Started { repository: String, detectors: usize },

    /// A previously stored report was served
    CacheHit { key: String },

    /// Batch launched with these detectors
    BatchStarted { index: usize, detectors: Vec<String> },

    /// Detector settled (successfully or with a returned error)
    DetectorFinished {
        detector: String,
        duration: Duration,
        success: bool,
    },

    /// Detector abandoned after exceeding its own budget
    DetectorTimedOut { detector: String, timeout: Duration },

    /// Every detector of the batch settled
    BatchComplete { index: usize, duration: Duration },

    /// Overall deadline hit; these detectors never settled
    PipelineTimedOut { abandoned: Vec<String> },

    /// Run finished
    Completed {
        complete: bool,
        errors: usize,
        total_time: Duration,
    },
}

/// Trait for handling progress events during analysis
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    impl ProgressHandler for CountingHandler {
        fn on_progress(&self, _event: &ProgressEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_noop_handler() {
        NoOpHandler.on_progress(&ProgressEvent::Started {
            repository: "o/r".to_string(),
            detectors: 0,
        });
    }

    #[test]
    fn test_progress_events() {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler {
            count: count.clone(),
        };

        handler.on_progress(&ProgressEvent::Started {
            repository: "o/r".to_string(),
            detectors: 2,
        });
        handler.on_progress(&ProgressEvent::BatchStarted {
            index: 0,
            detectors: vec!["language".to_string()],
        });
        handler.on_progress(&ProgressEvent::Completed {
            complete: true,
            errors: 0,
            total_time: Duration::from_secs(1),
        });

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_event_debug() {
        let event = ProgressEvent::BatchComplete {
            index: 1,
            duration: Duration::from_millis(5),
        };
        let debug_str = format!("{:?}", event);
        assert!(debug_str.contains("BatchComplete"));
        assert!(debug_str.contains("index: 1"));
    }
}
