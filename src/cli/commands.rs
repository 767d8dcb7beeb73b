use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Dependency-ordered, fault-tolerant repository analysis
#[derive(Parser, Debug)]
#[command(
    name = "reposcan",
    about = "Analyze a repository with a set of interdependent detectors",
    version,
    long_about = "reposcan runs language, build-tool, dependency, framework and documentation \
                  detectors over a repository snapshot in dependency order, with per-detector \
                  and overall time budgets, and reports the results with a health score."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Analyze a repository",
        long_about = "Loads a local checkout, runs every registered detector and prints the \
                      aggregated report.\n\n\
                      Examples:\n  \
                      reposcan analyze\n  \
                      reposcan analyze /path/to/repo --format json\n  \
                      reposcan analyze . --owner acme --repo widget --github\n  \
                      reposcan analyze . --timeout-ms 5000 --detector-timeout-ms 1000"
    )]
    Analyze(AnalyzeArgs),

    #[command(about = "List registered detectors and their execution batches")]
    Detectors(DetectorsArgs),

    #[command(about = "Show the effective configuration")]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(
        value_name = "PATH",
        help = "Path to repository (defaults to current directory)"
    )]
    pub repository_path: Option<PathBuf>,

    #[arg(long, help = "Repository owner (defaults to \"local\")")]
    pub owner: Option<String>,

    #[arg(long, help = "Repository name (defaults to the directory name)")]
    pub repo: Option<String>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(long, value_name = "MS", help = "Overall time budget in milliseconds")]
    pub timeout_ms: Option<u64>,

    #[arg(long, value_name = "MS", help = "Per-detector time budget in milliseconds")]
    pub detector_timeout_ms: Option<u64>,

    #[arg(long, value_name = "N", help = "Maximum detectors running at once")]
    pub max_concurrency: Option<usize>,

    #[arg(long, help = "Disable report caching")]
    pub no_cache: bool,

    #[arg(
        long,
        help = "Resolve the cache commit through the GitHub API instead of the local .git"
    )]
    pub github: bool,

    #[arg(long, help = "Exit with status 2 when the report is partial")]
    pub fail_on_partial: bool,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write output to file instead of stdout"
    )]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct DetectorsArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
