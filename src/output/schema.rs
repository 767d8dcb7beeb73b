//! AnalysisReport schema data structures
//!
//! Field names and nesting are stable for a given [`ANALYSIS_VERSION`]. Every
//! category is always present: a category whose detector failed or never ran
//! carries its empty default.

use crate::detection::{
    BuildToolReport, DependencyReport, DocumentationReport, FrameworkInfo, LanguageReport,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const ANALYSIS_VERSION: &str = "1.0";

fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

fn default_version() -> String {
    ANALYSIS_VERSION.to_string()
}

/// Aggregated outcome of one orchestration run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub repository: RepositoryInfo,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub languages: LanguageReport,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub frameworks: Vec<FrameworkInfo>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub build_tools: BuildToolReport,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub dependencies: DependencyReport,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub documentation: DocumentationReport,
    /// Payloads of detectors outside the built-in categories, keyed by detector name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, serde_json::Value>,
    pub health_score: HealthScore,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub metadata: ReportMetadata,
}

impl AnalysisReport {
    pub fn is_complete(&self) -> bool {
        self.metadata.completion_status == CompletionStatus::Complete
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Copy with run-dependent fields zeroed, for comparing two runs
    pub fn without_timing(&self) -> Self {
        let mut copy = self.clone();
        copy.metadata.analyzed_at = DateTime::<Utc>::UNIX_EPOCH;
        copy.metadata.duration_ms = 0;
        copy
    }
}

/// Echo of the snapshot's identity and metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryInfo {
    pub owner: String,
    pub name: String,
    pub default_branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_language: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pushed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthScore {
    pub total: u32,
    pub categories: Vec<HealthCategory>,
}

impl HealthScore {
    pub fn category(&self, name: &str) -> Option<&HealthCategory> {
        self.categories.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCategory {
    pub name: String,
    pub score: u32,
    pub max_score: u32,
}

impl HealthCategory {
    /// Achieved share of the maximum, 0.0 to 1.0
    pub fn ratio(&self) -> f64 {
        if self.max_score == 0 {
            return 0.0;
        }
        f64::from(self.score) / f64::from(self.max_score)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Health category the issue was derived from
    pub category: String,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionStatus {
    Complete,
    Partial,
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionStatus::Complete => write!(f, "complete"),
            CompletionStatus::Partial => write!(f, "partial"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub completion_status: CompletionStatus,
    /// `"<detector>: <message>"` per failed detector, in registration order
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default = "default_version")]
    pub analysis_version: String,
    pub analyzed_at: DateTime<Utc>,
    pub duration_ms: u64,
    #[serde(default)]
    pub detectors_run: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
}
