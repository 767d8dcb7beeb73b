pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{AnalyzeArgs, CliArgs, Commands, ConfigArgs, DetectorsArgs};
pub use output::{DetectorInfo, OutputFormat, OutputFormatter};
