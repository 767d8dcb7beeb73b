//! Detector orchestration: dependency resolution, batch scheduling and
//! result aggregation

pub mod aggregator;
pub mod config;
pub mod orchestrator;
pub mod resolver;
pub mod scheduler;

pub use aggregator::aggregate;
pub use config::PipelineConfig;
pub use orchestrator::DetectorOrchestrator;
pub use resolver::{resolve, ExecutionBatch, ExecutionPlan};
pub use scheduler::{ExecutionOutcome, ExecutionScheduler};
