pub mod schema;

pub use schema::{AnalysisReport, CompletionStatus, HealthCategory, HealthScore, Issue, Severity};
