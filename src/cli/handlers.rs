//! Command handlers; each returns the process exit code

use super::commands::{AnalyzeArgs, ConfigArgs, DetectorsArgs};
use super::output::{DetectorInfo, OutputFormatter};
use crate::cache::{
    CachedAnalyzer, CommitResolver, FileStore, GitHeadResolver, GitHubCommitResolver,
};
use crate::config::ScanConfig;
use crate::context::{load_directory, RepositoryContext};
use crate::detection::DetectorRegistry;
use crate::output::schema::AnalysisReport;
use crate::pipeline::{resolve, DetectorOrchestrator};
use crate::progress::LoggingHandler;
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

pub const EXIT_OK: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_PARTIAL: i32 = 2;

const DEFAULT_OWNER: &str = "local";

pub async fn handle_analyze(args: &AnalyzeArgs, quiet: bool) -> i32 {
    let report = match run_analyze(args).await {
        Ok(report) => report,
        Err(e) => {
            error!("Analysis failed: {:#}", e);
            return EXIT_ERROR;
        }
    };

    let formatter = OutputFormatter::new(args.format.into());
    let output = match formatter.format_report(&report) {
        Ok(output) => output,
        Err(e) => {
            error!("Failed to format report: {:#}", e);
            return EXIT_ERROR;
        }
    };

    if let Err(e) = emit(&output, args.output.as_deref(), quiet) {
        error!("{:#}", e);
        return EXIT_ERROR;
    }

    if args.fail_on_partial && !report.is_complete() {
        EXIT_PARTIAL
    } else {
        EXIT_OK
    }
}

pub fn handle_detectors(args: &DetectorsArgs) -> i32 {
    let registry = DetectorRegistry::with_defaults();
    let formatter = OutputFormatter::new(args.format.into());
    match formatter.format_detectors(&detector_infos(&registry)) {
        Ok(output) => {
            println!("{}", output);
            EXIT_OK
        }
        Err(e) => {
            error!("{:#}", e);
            EXIT_ERROR
        }
    }
}

pub fn handle_config(args: &ConfigArgs) -> i32 {
    let config = ScanConfig::default();
    let formatter = OutputFormatter::new(args.format.into());
    let status = match config.validate() {
        Ok(()) => EXIT_OK,
        Err(e) => {
            error!("Configuration error: {}", e);
            EXIT_ERROR
        }
    };
    match formatter.format_config(&config) {
        Ok(output) => {
            println!("{}", output);
            status
        }
        Err(e) => {
            error!("{:#}", e);
            EXIT_ERROR
        }
    }
}

/// Registry order, annotated with the batch each detector resolves into
pub fn detector_infos(registry: &DetectorRegistry) -> Vec<DetectorInfo> {
    let plan = resolve(&registry.list());
    registry
        .list()
        .iter()
        .map(|detector| DetectorInfo {
            name: detector.name().to_string(),
            dependencies: detector.dependencies(),
            batch: plan
                .batches
                .iter()
                .find(|b| b.names().iter().any(|n| n == detector.name()))
                .map(|b| b.index)
                .unwrap_or_default(),
        })
        .collect()
}

fn scan_config(args: &AnalyzeArgs) -> Result<ScanConfig> {
    let defaults = ScanConfig::default();
    let config = ScanConfig {
        detector_timeout_ms: args.detector_timeout_ms.unwrap_or(defaults.detector_timeout_ms),
        overall_timeout_ms: args.timeout_ms.unwrap_or(defaults.overall_timeout_ms),
        max_concurrency: args.max_concurrency.or(defaults.max_concurrency),
        cache_enabled: defaults.cache_enabled && !args.no_cache,
        ..defaults
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn run_analyze(args: &AnalyzeArgs) -> Result<AnalysisReport> {
    let config = scan_config(args)?;

    let path = match &args.repository_path {
        Some(path) => path.clone(),
        None => env::current_dir().context("Failed to get current directory")?,
    };
    let owner = args.owner.clone().unwrap_or_else(|| DEFAULT_OWNER.to_string());
    let repo = args
        .repo
        .clone()
        .or_else(|| directory_name(&path))
        .unwrap_or_else(|| "repository".to_string());

    info!(path = %path.display(), repo = %format!("{}/{}", owner, repo), "Loading repository");
    let context = load(path.clone(), owner, repo, &config).await?;

    let orchestrator = Arc::new(
        DetectorOrchestrator::new(DetectorRegistry::with_defaults(), config.pipeline_config())
            .with_progress(Arc::new(LoggingHandler)),
    );

    let cache_dir = match (&config.cache_dir, config.cache_enabled) {
        (Some(dir), true) => dir.clone(),
        _ => {
            debug!("Caching disabled");
            return Ok(orchestrator.analyze_repository(context).await);
        }
    };

    let resolver: Arc<dyn CommitResolver> = if args.github {
        Arc::new(
            GitHubCommitResolver::new(config.github_api_url.clone(), config.github_token.clone())
                .context("Failed to create GitHub client")?,
        )
    } else {
        Arc::new(GitHeadResolver::new(path))
    };

    let analyzer = CachedAnalyzer::new(orchestrator, Arc::new(FileStore::new(cache_dir)), resolver)
        .with_ttl(config.cache_ttl())
        .with_progress(Arc::new(LoggingHandler));
    Ok(analyzer.analyze(context).await)
}

async fn load(
    path: PathBuf,
    owner: String,
    repo: String,
    config: &ScanConfig,
) -> Result<RepositoryContext> {
    let loader_config = config.loader_config();
    let display = path.display().to_string();
    let context = tokio::task::spawn_blocking(move || {
        load_directory(&path, &owner, &repo, &loader_config)
    })
    .await
    .context("Repository loader task failed")?
    .with_context(|| format!("Failed to load repository at {}", display))?;
    Ok(context)
}

fn directory_name(path: &Path) -> Option<String> {
    path.canonicalize()
        .ok()?
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
}

fn emit(output: &str, target: Option<&Path>, quiet: bool) -> Result<()> {
    match target {
        Some(file) => {
            std::fs::write(file, output)
                .with_context(|| format!("Failed to write output to {}", file.display()))?;
            if !quiet {
                eprintln!("Report written to {}", file.display());
            }
        }
        None => println!("{}", output),
    }
    Ok(())
}
