//! Health score calculation
//!
//! A pure function of the aggregated category payloads. Missing or empty
//! categories score zero; nothing here can fail.

use crate::detection::{
    BuildToolReport, DependencyReport, DocumentationReport, FrameworkInfo, LanguageReport,
};
use crate::detectors::language::is_typed;
use crate::output::schema::{HealthCategory, HealthScore, Issue, Severity};
use chrono::{DateTime, Utc};

pub const DEPENDENCY_HEALTH: &str = "dependencyHealth";
pub const FRAMEWORK_MODERNITY: &str = "frameworkModernity";
pub const BUILD_HEALTH: &str = "buildHealth";
pub const CODE_QUALITY: &str = "codeQuality";
pub const DOCUMENTATION: &str = "documentation";
pub const ACTIVITY: &str = "activity";

const MAX_TOTAL: u32 = 100;

/// Everything the calculator reads
#[derive(Debug, Clone, Copy)]
pub struct HealthInputs<'a> {
    pub languages: &'a LanguageReport,
    pub frameworks: &'a [FrameworkInfo],
    pub build_tools: &'a BuildToolReport,
    pub dependencies: &'a DependencyReport,
    pub documentation: &'a DocumentationReport,
    pub pushed_at: Option<DateTime<Utc>>,
}

/// Scores every category and sums them; `now` anchors the activity window
pub fn calculate(inputs: &HealthInputs<'_>, now: DateTime<Utc>) -> HealthScore {
    let categories = vec![
        category(DEPENDENCY_HEALTH, 25, dependency_health(inputs.dependencies)),
        category(FRAMEWORK_MODERNITY, 15, framework_modernity(inputs.frameworks)),
        category(BUILD_HEALTH, 15, build_health(inputs.build_tools)),
        category(CODE_QUALITY, 20, code_quality(inputs.languages)),
        category(DOCUMENTATION, 15, documentation(inputs.documentation)),
        category(ACTIVITY, 10, activity(inputs.pushed_at, now)),
    ];
    let total = categories.iter().map(|c| c.score).sum::<u32>().min(MAX_TOTAL);

    HealthScore { total, categories }
}

fn category(name: &str, max_score: u32, raw: f64) -> HealthCategory {
    let score = if raw.is_finite() {
        raw.round().clamp(0.0, f64::from(max_score)) as u32
    } else {
        0
    };
    HealthCategory {
        name: name.to_string(),
        score,
        max_score,
    }
}

fn dependency_health(deps: &DependencyReport) -> f64 {
    if deps.total_count == 0 {
        return 0.0;
    }
    let pinned = deps.total_count.saturating_sub(deps.unpinned_count) as f64;
    let lockfile = if deps.lockfile_present { 10.0 } else { 0.0 };
    15.0 * pinned / deps.total_count as f64 + lockfile
}

fn framework_modernity(frameworks: &[FrameworkInfo]) -> f64 {
    if frameworks.is_empty() {
        return 0.0;
    }
    let modern = frameworks.iter().filter(|f| !f.legacy).count() as f64;
    15.0 * modern / frameworks.len() as f64
}

fn build_health(build: &BuildToolReport) -> f64 {
    let mut score = 0.0;
    if !build.tools.is_empty() {
        score += 8.0;
    }
    if !build.ci_providers.is_empty() {
        score += 4.0;
    }
    if build.containerized {
        score += 3.0;
    }
    score
}

fn code_quality(languages: &LanguageReport) -> f64 {
    let mut score = 0.0;
    if languages.test_files > 0 {
        score += 8.0;
    }
    score += (2 * languages.tooling_configs.len()).min(6) as f64;

    let total_bytes: u64 = languages.languages.iter().map(|l| l.bytes).sum();
    if total_bytes > 0 {
        let typed: u64 = languages
            .languages
            .iter()
            .filter(|l| is_typed(&l.name))
            .map(|l| l.bytes)
            .sum();
        score += 6.0 * typed as f64 / total_bytes as f64;
    }
    score
}

fn documentation(docs: &DocumentationReport) -> f64 {
    let mut score = 0.0;
    if docs.has_readme {
        score += 5.0;
        score += match docs.readme_length {
            n if n >= 1500 => 3.0,
            n if n >= 500 => 1.0,
            _ => 0.0,
        };
        if docs.readme_sections >= 3 {
            score += 2.0;
        }
    }
    if docs.has_license {
        score += 2.0;
    }
    if docs.has_contributing {
        score += 1.0;
    }
    if docs.has_changelog {
        score += 1.0;
    }
    if docs.has_docs_dir {
        score += 1.0;
    }
    score
}

fn activity(pushed_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(pushed_at) = pushed_at else {
        return 0.0;
    };
    match (now - pushed_at).num_days() {
        d if d <= 30 => 10.0,
        d if d <= 90 => 7.0,
        d if d <= 180 => 5.0,
        d if d <= 365 => 2.0,
        _ => 0.0,
    }
}

/// Issues paired with the recommendation that addresses each one
pub fn findings(inputs: &HealthInputs<'_>, now: DateTime<Utc>) -> Vec<(Issue, String)> {
    let mut out = Vec::new();
    let mut push = |category: &str, severity: Severity, message: String, advice: &str| {
        out.push((
            Issue {
                category: category.to_string(),
                severity,
                message,
            },
            advice.to_string(),
        ));
    };

    let deps = inputs.dependencies;
    if deps.unpinned_count > 0 {
        push(
            DEPENDENCY_HEALTH,
            Severity::Medium,
            format!("{} of {} dependencies are not pinned to a version", deps.unpinned_count, deps.total_count),
            "Pin dependency versions so builds are reproducible",
        );
    }
    if deps.total_count > 0 && !deps.lockfile_present {
        push(
            DEPENDENCY_HEALTH,
            Severity::Medium,
            "No lockfile is committed".to_string(),
            "Commit the package manager lockfile",
        );
    }

    for framework in inputs.frameworks.iter().filter(|f| f.legacy) {
        push(
            FRAMEWORK_MODERNITY,
            Severity::Medium,
            format!("Legacy framework in use: {}", framework.name),
            "Plan a migration away from legacy frameworks",
        );
    }

    let build = inputs.build_tools;
    let has_source = inputs.languages.source_files > 0;
    if build.tools.is_empty() && has_source {
        push(
            BUILD_HEALTH,
            Severity::High,
            "No build tool manifest found".to_string(),
            "Add a build manifest describing how the project is built",
        );
    }
    if build.ci_providers.is_empty() && has_source {
        push(
            BUILD_HEALTH,
            Severity::Low,
            "No continuous integration configuration found".to_string(),
            "Set up continuous integration to run builds and tests on every change",
        );
    }

    if inputs.languages.test_files == 0 && has_source {
        push(
            CODE_QUALITY,
            Severity::High,
            "No tests found".to_string(),
            "Add an automated test suite",
        );
    }
    if inputs.languages.tooling_configs.is_empty() && has_source {
        push(
            CODE_QUALITY,
            Severity::Low,
            "No linter or formatter configuration found".to_string(),
            "Configure a linter and formatter",
        );
    }

    let docs = inputs.documentation;
    if !docs.has_readme {
        push(
            DOCUMENTATION,
            Severity::High,
            "README is missing".to_string(),
            "Add a README describing the project and how to use it",
        );
    } else if docs.readme_length < 500 {
        push(
            DOCUMENTATION,
            Severity::Low,
            format!("README is short ({} characters)", docs.readme_length),
            "Expand the README with setup and usage instructions",
        );
    }
    if !docs.has_license {
        push(
            DOCUMENTATION,
            Severity::Medium,
            "No license file found".to_string(),
            "Add a LICENSE file",
        );
    }

    if let Some(pushed_at) = inputs.pushed_at {
        let days = (now - pushed_at).num_days();
        if days > 365 {
            push(
                ACTIVITY,
                Severity::Medium,
                format!("No activity for {} days", days),
                "Confirm the project is still maintained",
            );
        }
    }

    out
}

/// Splits [`findings`] into the report's issue and recommendation lists
pub fn issues_and_recommendations(
    inputs: &HealthInputs<'_>,
    now: DateTime<Utc>,
) -> (Vec<Issue>, Vec<String>) {
    let mut issues = Vec::new();
    let mut recommendations: Vec<String> = Vec::new();
    for (issue, advice) in findings(inputs, now) {
        issues.push(issue);
        if !recommendations.contains(&advice) {
            recommendations.push(advice);
        }
    }
    (issues, recommendations)
}
