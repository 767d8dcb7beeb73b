use std::time::Duration;

pub const DEFAULT_DETECTOR_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_OVERALL_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Budget for a single detector invocation
    pub detector_timeout: Duration,
    /// Ceiling on the whole run
    pub overall_timeout: Duration,
    /// Upper bound on detectors running at once inside a batch; unbounded when `None`
    pub max_concurrency: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detector_timeout: DEFAULT_DETECTOR_TIMEOUT,
            overall_timeout: DEFAULT_OVERALL_TIMEOUT,
            max_concurrency: None,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_detector_timeout(mut self, timeout: Duration) -> Self {
        self.detector_timeout = timeout;
        self
    }

    pub fn with_overall_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = timeout;
        self
    }

    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit.max(1));
        self
    }
}
