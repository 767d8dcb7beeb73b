//! reposcan - dependency-ordered detector orchestration for repository analysis
//!
//! A set of pluggable detectors runs over an immutable repository snapshot.
//! Detectors declare which other detectors they read from; the engine layers
//! them into batches, runs each batch concurrently under per-detector and
//! overall time budgets, and folds whatever settled into one
//! [`AnalysisReport`] with a health score. A failing, panicking or hanging
//! detector only ever affects its own entry in the report.
//!
//! # Example
//!
//! ```no_run
//! use reposcan::{DetectorOrchestrator, RepositoryContext};
//!
//! # async fn example() {
//! let context = RepositoryContext::new("acme", "widget")
//!     .with_file("Cargo.toml", Some("[package]\nname = \"widget\"\n"));
//!
//! let report = DetectorOrchestrator::default().analyze_repository(context).await;
//! println!("{} ({})", report.health_score.total, report.metadata.completion_status);
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`detection`]: the detector contract, results and registry
//! - [`detectors`]: built-in detectors
//! - [`pipeline`]: resolver, scheduler, aggregator and orchestrator
//! - [`health`]: health score calculation
//! - [`cache`]: commit-keyed report caching

pub mod cache;
pub mod cli;
pub mod config;
pub mod context;
pub mod detection;
pub mod detectors;
pub mod health;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod util;

pub use cache::{CacheError, CachedAnalyzer, KeyValueStore, MemoryStore};
pub use config::{ConfigError, ScanConfig};
pub use context::RepositoryContext;
pub use detection::{
    DetectionContext, DetectionError, DetectionResult, Detector, DetectorPayload, DetectorRegistry,
};
pub use output::schema::AnalysisReport;
pub use pipeline::{DetectorOrchestrator, PipelineConfig};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
