//! Output formatting for JSON, YAML and human-readable text

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::{self, Write};

use crate::config::ScanConfig;
use crate::output::schema::AnalysisReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Human,
}

/// One row of the `detectors` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorInfo {
    pub name: String,
    pub dependencies: Vec<String>,
    pub batch: usize,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(report).context("Failed to serialize report to YAML")
            }
            OutputFormat::Human => {
                let mut out = String::new();
                write_report_human(&mut out, report).context("Failed to format report")?;
                Ok(out)
            }
        }
    }

    pub fn format_detectors(&self, detectors: &[DetectorInfo]) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(detectors)
                .context("Failed to serialize detectors to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(detectors).context("Failed to serialize detectors to YAML")
            }
            OutputFormat::Human => {
                let mut out = String::new();
                write_detectors_human(&mut out, detectors).context("Failed to format detectors")?;
                Ok(out)
            }
        }
    }

    pub fn format_config(&self, config: &ScanConfig) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&config.to_display_map())
                .context("Failed to serialize config to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(&config.to_display_map())
                .context("Failed to serialize config to YAML"),
            OutputFormat::Human => Ok(config.to_string()),
        }
    }
}

fn write_detectors_human(out: &mut String, detectors: &[DetectorInfo]) -> fmt::Result {
    writeln!(out, "Registered detectors:")?;
    for detector in detectors {
        let deps = if detector.dependencies.is_empty() {
            "-".to_string()
        } else {
            detector.dependencies.join(", ")
        };
        writeln!(
            out,
            "  [batch {}] {:<16} depends on: {}",
            detector.batch, detector.name, deps
        )?;
    }
    Ok(())
}

fn write_report_human(out: &mut String, report: &AnalysisReport) -> fmt::Result {
    let repo = &report.repository;
    let meta = &report.metadata;

    writeln!(out, "Repository: {}/{} ({})", repo.owner, repo.name, repo.default_branch)?;
    if let Some(sha) = &meta.commit_sha {
        writeln!(out, "Commit: {}", sha)?;
    }
    writeln!(
        out,
        "Status: {} in {}ms ({} detectors)",
        meta.completion_status,
        meta.duration_ms,
        meta.detectors_run.len()
    )?;

    writeln!(out, "\nHealth: {}/100", report.health_score.total)?;
    for category in &report.health_score.categories {
        writeln!(
            out,
            "  {:<20} {:>2}/{}",
            category.name, category.score, category.max_score
        )?;
    }

    let languages: Vec<String> = report
        .languages
        .languages
        .iter()
        .map(|l| format!("{} ({:.1}%)", l.name, l.percentage))
        .collect();
    writeln!(out, "\nLanguages: {}", none_if_empty(&languages))?;

    let frameworks: Vec<String> = report
        .frameworks
        .iter()
        .map(|f| match &f.version {
            Some(v) => format!("{} {}", f.name, v),
            None => f.name.clone(),
        })
        .collect();
    writeln!(out, "Frameworks: {}", none_if_empty(&frameworks))?;

    let tools: Vec<String> = report
        .build_tools
        .tools
        .iter()
        .map(|t| format!("{} ({})", t.name, t.manifest))
        .collect();
    writeln!(out, "Build tools: {}", none_if_empty(&tools))?;

    let deps = &report.dependencies;
    writeln!(
        out,
        "Dependencies: {} total ({} runtime, {} dev, {} unpinned)",
        deps.total_count, deps.runtime_count, deps.dev_count, deps.unpinned_count
    )?;

    if !report.issues.is_empty() {
        writeln!(out, "\nIssues:")?;
        for issue in &report.issues {
            writeln!(out, "  [{}] {}: {}", issue.severity, issue.category, issue.message)?;
        }
    }
    if !report.recommendations.is_empty() {
        writeln!(out, "\nRecommendations:")?;
        for rec in &report.recommendations {
            writeln!(out, "  - {}", rec)?;
        }
    }
    if !meta.errors.is_empty() {
        writeln!(out, "\nErrors:")?;
        for error in &meta.errors {
            writeln!(out, "  - {}", error)?;
        }
    }
    Ok(())
}

fn none_if_empty(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}
