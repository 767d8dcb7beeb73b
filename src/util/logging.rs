//! Structured logging setup for reposcan
//!
//! Initialises a `tracing` subscriber once per process. `RUST_LOG` wins over
//! the configured level when set.
//!
//! # Example
//!
//! ```no_run
//! use reposcan::util::logging;
//! use tracing::info;
//!
//! logging::init_from_env();
//! info!(repo = "acme/widget", "Analyzing repository");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Noisy HTTP internals are capped at warn unless `RUST_LOG` says otherwise
const QUIET_TARGETS: &[&str] = &["h2=warn", "hyper=warn", "hyper_util=warn", "reqwest=warn"];

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for reposcan's own targets
    pub level: Level,

    /// Use JSON output format
    pub use_json: bool,

    /// Include the module target (e.g., reposcan::pipeline) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// JSON output with source locations
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
        }
    }
}

/// Parses a log level (case-insensitive), falling back to INFO
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn build_filter(level: Level, rust_log_set: bool) -> EnvFilter {
    let mut filter = EnvFilter::from_default_env();
    if rust_log_set {
        return filter;
    }
    let own = format!("reposcan={}", level);
    for directive in std::iter::once(own.as_str()).chain(QUIET_TARGETS.iter().copied()) {
        if let Ok(directive) = directive.parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Installs the global subscriber; later calls are no-ops
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(config.level, env::var("RUST_LOG").is_ok());

        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.include_target)
            .with_file(config.include_location)
            .with_line_number(config.include_location);

        // try_init: a test harness may already own the global subscriber
        let result = if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(layer.json())
                .try_init()
        } else {
            tracing_subscriber::registry().with(filter).with(layer).try_init()
        };
        if let Err(e) = result {
            eprintln!("Logging already initialised: {}", e);
        }
    });
}

pub fn init_default() {
    init_logging(LoggingConfig::default());
}

/// Reads `REPOSCAN_LOG_LEVEL` and `REPOSCAN_LOG_JSON`
pub fn init_from_env() {
    init_logging(config_from_env());
}

pub fn config_from_env() -> LoggingConfig {
    let level_str = env::var("REPOSCAN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let use_json = env::var("REPOSCAN_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    LoggingConfig {
        level: parse_level(&level_str),
        use_json,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("Debug"), Level::DEBUG);
        assert_eq!(parse_level("INFO"), Level::INFO);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
        assert_eq!(parse_level("invalid"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    fn test_default_and_production_configs() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.use_json);

        let config = LoggingConfig::production();
        assert!(config.use_json);
        assert!(config.include_location);

        assert_eq!(LoggingConfig::with_level(Level::DEBUG).level, Level::DEBUG);
    }

    #[test]
    fn test_filter_includes_own_level() {
        let filter = build_filter(Level::DEBUG, false).to_string();
        assert!(filter.contains("reposcan=debug"));
        assert!(filter.contains("reqwest=warn"));
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        let old_level = env::var("REPOSCAN_LOG_LEVEL").ok();
        let old_json = env::var("REPOSCAN_LOG_JSON").ok();
        env::set_var("REPOSCAN_LOG_LEVEL", "warn");
        env::set_var("REPOSCAN_LOG_JSON", "true");

        let config = config_from_env();
        assert_eq!(config.level, Level::WARN);
        assert!(config.use_json);

        match old_level {
            Some(v) => env::set_var("REPOSCAN_LOG_LEVEL", v),
            None => env::remove_var("REPOSCAN_LOG_LEVEL"),
        }
        match old_json {
            Some(v) => env::set_var("REPOSCAN_LOG_JSON", v),
            None => env::remove_var("REPOSCAN_LOG_JSON"),
        }
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_default();
        init_logging(LoggingConfig::production());
    }
}
