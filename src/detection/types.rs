use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const CODE_TIMEOUT: &str = "TIMEOUT";
pub const CODE_PIPELINE_TIMEOUT: &str = "PIPELINE_TIMEOUT";
pub const CODE_PANIC: &str = "DETECTOR_PANIC";
pub const CODE_UPSTREAM_UNAVAILABLE: &str = "UPSTREAM_UNAVAILABLE";

/// Structured failure reported by (or synthesized for) a detector
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct DetectionError {
    pub code: String,
    pub message: String,
    pub recoverable: bool,
}

impl DetectionError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            recoverable: true,
        }
    }

    pub fn fatal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            recoverable: false,
            ..Self::new(code, message)
        }
    }

    /// The detector did not settle within its own budget
    pub fn timeout(after: Duration) -> Self {
        Self::new(
            CODE_TIMEOUT,
            format!("detector timeout after {}ms", after.as_millis()),
        )
    }

    /// The run's overall deadline passed before the detector settled
    pub fn pipeline_timeout(deadline: Duration) -> Self {
        Self::new(
            CODE_PIPELINE_TIMEOUT,
            format!(
                "pipeline timeout: overall deadline of {}ms exceeded",
                deadline.as_millis()
            ),
        )
    }

    /// The detector panicked or its task was lost
    pub fn panicked(detail: impl Into<String>) -> Self {
        Self::fatal(CODE_PANIC, format!("detector crashed: {}", detail.into()))
    }

    pub fn upstream_unavailable(dependency: &str) -> Self {
        Self::new(
            CODE_UPSTREAM_UNAVAILABLE,
            format!("required detector '{}' produced no result", dependency),
        )
    }

    pub fn is_timeout(&self) -> bool {
        self.code == CODE_TIMEOUT || self.code == CODE_PIPELINE_TIMEOUT
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageStat {
    pub name: String,
    pub files: usize,
    pub bytes: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageReport {
    /// Sorted by bytes, descending
    pub languages: Vec<LanguageStat>,
    pub primary: Option<String>,
    pub source_files: usize,
    pub test_files: usize,
    /// Linter / formatter / type-checker configuration files found
    pub tooling_configs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkInfo {
    pub name: String,
    pub category: String,
    pub language: String,
    pub version: Option<String>,
    pub legacy: bool,
    /// What triggered the match, e.g. `dependency:react`
    pub evidence: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTool {
    pub name: String,
    pub manifest: String,
    pub lockfile: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildToolReport {
    pub tools: Vec<BuildTool>,
    pub ci_providers: Vec<String>,
    pub containerized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEntry {
    pub name: String,
    pub version: Option<String>,
    pub ecosystem: String,
    pub dev: bool,
    pub manifest: String,
}

impl DependencyEntry {
    /// A requirement that does not constrain the version at all
    pub fn is_unpinned(&self) -> bool {
        match self.version.as_deref().map(str::trim) {
            None | Some("") | Some("*") | Some("latest") | Some("x") => true,
            Some(_) => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyReport {
    pub total_count: usize,
    pub runtime_count: usize,
    pub dev_count: usize,
    pub unpinned_count: usize,
    pub manifests: Vec<String>,
    pub lockfile_present: bool,
    pub packages: Vec<DependencyEntry>,
}

impl DependencyReport {
    pub fn from_entries(
        packages: Vec<DependencyEntry>,
        manifests: Vec<String>,
        lockfile_present: bool,
    ) -> Self {
        let dev_count = packages.iter().filter(|p| p.dev).count();
        Self {
            total_count: packages.len(),
            runtime_count: packages.len() - dev_count,
            dev_count,
            unpinned_count: packages.iter().filter(|p| p.is_unpinned()).count(),
            manifests,
            lockfile_present,
            packages,
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.packages.iter().any(|p| p.name == name)
    }

    pub fn find(&self, name: &str) -> Option<&DependencyEntry> {
        self.packages.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentationReport {
    pub has_readme: bool,
    pub readme_length: usize,
    pub readme_sections: usize,
    pub has_license: bool,
    pub has_contributing: bool,
    pub has_changelog: bool,
    pub has_docs_dir: bool,
}

/// Category-specific output of a successful detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum DetectorPayload {
    Languages(LanguageReport),
    Frameworks(Vec<FrameworkInfo>),
    BuildTools(BuildToolReport),
    Dependencies(DependencyReport),
    Documentation(DocumentationReport),
    Custom(serde_json::Value),
}

impl DetectorPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            DetectorPayload::Languages(_) => "languages",
            DetectorPayload::Frameworks(_) => "frameworks",
            DetectorPayload::BuildTools(_) => "buildTools",
            DetectorPayload::Dependencies(_) => "dependencies",
            DetectorPayload::Documentation(_) => "documentation",
            DetectorPayload::Custom(_) => "custom",
        }
    }

    pub fn as_languages(&self) -> Option<&LanguageReport> {
        match self {
            DetectorPayload::Languages(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_dependencies(&self) -> Option<&DependencyReport> {
        match self {
            DetectorPayload::Dependencies(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_build_tools(&self) -> Option<&BuildToolReport> {
        match self {
            DetectorPayload::BuildTools(r) => Some(r),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DetectionOutcome {
    Success { payload: DetectorPayload },
    Failure { error: DetectionError },
}

/// Exactly one of these exists per detector per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub detector: String,
    #[serde(flatten)]
    pub outcome: DetectionOutcome,
}

impl DetectionResult {
    pub fn success(detector: impl Into<String>, payload: DetectorPayload) -> Self {
        Self {
            detector: detector.into(),
            outcome: DetectionOutcome::Success { payload },
        }
    }

    pub fn failure(detector: impl Into<String>, error: DetectionError) -> Self {
        Self {
            detector: detector.into(),
            outcome: DetectionOutcome::Failure { error },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, DetectionOutcome::Success { .. })
    }

    pub fn payload(&self) -> Option<&DetectorPayload> {
        match &self.outcome {
            DetectionOutcome::Success { payload } => Some(payload),
            DetectionOutcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&DetectionError> {
        match &self.outcome {
            DetectionOutcome::Success { .. } => None,
            DetectionOutcome::Failure { error } => Some(error),
        }
    }
}
