//! Configuration management for reposcan
//!
//! Settings come from environment variables with defaults.
//!
//! # Environment Variables
//!
//! - `REPOSCAN_DETECTOR_TIMEOUT_MS`: Per-detector budget - default: "30000"
//! - `REPOSCAN_OVERALL_TIMEOUT_MS`: Whole-run budget - default: "120000"
//! - `REPOSCAN_MAX_CONCURRENCY`: Detectors running at once per batch - default: unbounded
//! - `REPOSCAN_CACHE_ENABLED`: Enable report caching (true|false) - default: "true"
//! - `REPOSCAN_CACHE_TTL_SECS`: Cached report lifetime - default: "600"
//! - `REPOSCAN_CACHE_DIR`: Cache directory - default: user cache dir + "reposcan"
//! - `REPOSCAN_GITHUB_API_URL`: GitHub API base - default: "https://api.github.com"
//! - `REPOSCAN_GITHUB_TOKEN`: Token for commit lookups - optional
//! - `REPOSCAN_MAX_FILE_SIZE`: Largest file whose content is read, in bytes - default: 1 MiB
//! - `REPOSCAN_LOG_LEVEL`: Logging level - default: "info"
//! - `REPOSCAN_LOG_JSON`: JSON log output (true|false) - default: "false"

use crate::cache::commit::DEFAULT_GITHUB_API_URL;
use crate::context::LoaderConfig;
use crate::pipeline::PipelineConfig;
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_DETECTOR_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_OVERALL_TIMEOUT_MS: u64 = 120_000;
const DEFAULT_CACHE_ENABLED: bool = true;
const DEFAULT_CACHE_TTL_SECS: u64 = 600;
const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;
const DEFAULT_LOG_LEVEL: &str = "info";

const MAX_DETECTOR_TIMEOUT_MS: u64 = 600_000;
const MAX_OVERALL_TIMEOUT_MS: u64 = 3_600_000;
const MAX_FILE_SIZE_LIMIT: u64 = 100 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub detector_timeout_ms: u64,
    pub overall_timeout_ms: u64,
    pub max_concurrency: Option<usize>,
    pub cache_enabled: bool,
    pub cache_ttl_secs: u64,
    pub cache_dir: Option<PathBuf>,
    pub github_api_url: String,
    pub github_token: Option<String>,
    pub max_file_size: u64,
    pub log_level: String,
    pub log_json: bool,
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Default for ScanConfig {
    /// Reads `REPOSCAN_*` variables; unset or unparsable values fall back to
    /// their defaults
    fn default() -> Self {
        let cache_enabled =
            env_parse::<bool>("REPOSCAN_CACHE_ENABLED").unwrap_or(DEFAULT_CACHE_ENABLED);

        let cache_dir = env_string("REPOSCAN_CACHE_DIR")
            .map(PathBuf::from)
            .or_else(|| {
                cache_enabled.then(|| {
                    dirs::cache_dir()
                        .unwrap_or_else(env::temp_dir)
                        .join("reposcan")
                })
            });

        Self {
            detector_timeout_ms: env_parse("REPOSCAN_DETECTOR_TIMEOUT_MS")
                .unwrap_or(DEFAULT_DETECTOR_TIMEOUT_MS),
            overall_timeout_ms: env_parse("REPOSCAN_OVERALL_TIMEOUT_MS")
                .unwrap_or(DEFAULT_OVERALL_TIMEOUT_MS),
            max_concurrency: env_parse("REPOSCAN_MAX_CONCURRENCY"),
            cache_enabled,
            cache_ttl_secs: env_parse("REPOSCAN_CACHE_TTL_SECS").unwrap_or(DEFAULT_CACHE_TTL_SECS),
            cache_dir,
            github_api_url: env_string("REPOSCAN_GITHUB_API_URL")
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            github_token: env_string("REPOSCAN_GITHUB_TOKEN"),
            max_file_size: env_parse("REPOSCAN_MAX_FILE_SIZE").unwrap_or(DEFAULT_MAX_FILE_SIZE),
            log_level: env::var("REPOSCAN_LOG_LEVEL")
                .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
                .to_lowercase(),
            log_json: env_parse("REPOSCAN_LOG_JSON").unwrap_or(false),
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.detector_timeout_ms == 0 || self.detector_timeout_ms > MAX_DETECTOR_TIMEOUT_MS {
            return Err(ConfigError::ValidationFailed(format!(
                "Detector timeout must be between 1 and {} ms",
                MAX_DETECTOR_TIMEOUT_MS
            )));
        }
        if self.overall_timeout_ms == 0 || self.overall_timeout_ms > MAX_OVERALL_TIMEOUT_MS {
            return Err(ConfigError::ValidationFailed(format!(
                "Overall timeout must be between 1 and {} ms",
                MAX_OVERALL_TIMEOUT_MS
            )));
        }
        if self.max_concurrency == Some(0) {
            return Err(ConfigError::ValidationFailed(
                "Max concurrency must be at least 1".to_string(),
            ));
        }
        if self.cache_enabled && self.cache_ttl_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Cache TTL must be at least 1 second when caching is enabled".to_string(),
            ));
        }
        if self.max_file_size < 1024 || self.max_file_size > MAX_FILE_SIZE_LIMIT {
            return Err(ConfigError::ValidationFailed(
                "Max file size must be between 1KB and 100MB".to_string(),
            ));
        }
        if !self.github_api_url.starts_with("http://") && !self.github_api_url.starts_with("https://") {
            return Err(ConfigError::ValidationFailed(format!(
                "GitHub API URL must be http(s): {}",
                self.github_api_url
            )));
        }
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }
        Ok(())
    }

    pub fn detector_timeout(&self) -> Duration {
        Duration::from_millis(self.detector_timeout_ms)
    }

    pub fn overall_timeout(&self) -> Duration {
        Duration::from_millis(self.overall_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        let config = PipelineConfig::new()
            .with_detector_timeout(self.detector_timeout())
            .with_overall_timeout(self.overall_timeout());
        match self.max_concurrency {
            Some(limit) => config.with_max_concurrency(limit),
            None => config,
        }
    }

    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            max_file_size: self.max_file_size,
            ..LoaderConfig::default()
        }
    }

    /// Flattened view for the `config` command; the token is masked
    pub fn to_display_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("detector_timeout_ms".to_string(), self.detector_timeout_ms.to_string());
        map.insert("overall_timeout_ms".to_string(), self.overall_timeout_ms.to_string());
        map.insert(
            "max_concurrency".to_string(),
            self.max_concurrency
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unbounded".to_string()),
        );
        map.insert("cache_enabled".to_string(), self.cache_enabled.to_string());
        map.insert("cache_ttl_secs".to_string(), self.cache_ttl_secs.to_string());
        if let Some(ref dir) = self.cache_dir {
            map.insert("cache_dir".to_string(), dir.display().to_string());
        }
        map.insert("github_api_url".to_string(), self.github_api_url.clone());
        map.insert(
            "github_token".to_string(),
            if self.github_token.is_some() { "set" } else { "unset" }.to_string(),
        );
        map.insert("max_file_size".to_string(), self.max_file_size.to_string());
        map.insert("log_level".to_string(), self.log_level.clone());
        map.insert("log_json".to_string(), self.log_json.to_string());
        map
    }
}

impl fmt::Display for ScanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reposcan Configuration:")?;
        for (key, value) in self.to_display_map() {
            writeln!(f, "  {}: {}", key, value)?;
        }
        Ok(())
    }
}
