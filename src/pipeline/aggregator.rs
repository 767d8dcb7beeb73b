//! Folds per-detector results into one [`AnalysisReport`]

use super::scheduler::ExecutionOutcome;
use crate::context::RepositoryContext;
use crate::detection::{DetectionResult, DetectorPayload};
use crate::health::{self, HealthInputs};
use crate::output::schema::{
    AnalysisReport, CompletionStatus, RepositoryInfo, ReportMetadata, ANALYSIS_VERSION,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Builds the report for `order`, the registered detector names in
/// registration order.
///
/// The first successful payload of each built-in category wins; categories
/// nobody produced keep their empty default. `Custom` payloads land in
/// `extensions` under the producing detector's name.
pub fn aggregate(
    order: &[String],
    outcome: &ExecutionOutcome,
    repository: &RepositoryContext,
    now: DateTime<Utc>,
) -> AnalysisReport {
    let mut languages = None;
    let mut frameworks = None;
    let mut build_tools = None;
    let mut dependencies = None;
    let mut documentation = None;
    let mut extensions = BTreeMap::new();
    let mut errors = Vec::new();

    for name in order {
        match outcome.results.get(name).map(|r| (r, r.payload())) {
            Some((_, Some(payload))) => match payload {
                DetectorPayload::Languages(r) => fill(&mut languages, r),
                DetectorPayload::Frameworks(r) => fill(&mut frameworks, r),
                DetectorPayload::BuildTools(r) => fill(&mut build_tools, r),
                DetectorPayload::Dependencies(r) => fill(&mut dependencies, r),
                DetectorPayload::Documentation(r) => fill(&mut documentation, r),
                DetectorPayload::Custom(value) => {
                    extensions.insert(name.clone(), value.clone());
                }
            },
            Some((result, None)) => errors.push(format_error(result)),
            None => errors.push(format!("{}: no result recorded", name)),
        }
    }

    let languages = languages.unwrap_or_default();
    let frameworks = frameworks.unwrap_or_default();
    let build_tools = build_tools.unwrap_or_default();
    let dependencies = dependencies.unwrap_or_default();
    let documentation = documentation.unwrap_or_default();

    let inputs = HealthInputs {
        languages: &languages,
        frameworks: &frameworks,
        build_tools: &build_tools,
        dependencies: &dependencies,
        documentation: &documentation,
        pushed_at: repository.metadata.pushed_at,
    };
    let health_score = health::calculate(&inputs, now);
    let (issues, recommendations) = health::issues_and_recommendations(&inputs, now);

    let completion_status = if errors.is_empty() {
        CompletionStatus::Complete
    } else {
        CompletionStatus::Partial
    };

    AnalysisReport {
        repository: repository_info(repository),
        languages,
        frameworks,
        build_tools,
        dependencies,
        documentation,
        extensions,
        health_score,
        issues,
        recommendations,
        metadata: ReportMetadata {
            completion_status,
            errors,
            analysis_version: ANALYSIS_VERSION.to_string(),
            analyzed_at: now,
            duration_ms: u64::try_from(outcome.elapsed.as_millis()).unwrap_or(u64::MAX),
            detectors_run: order.to_vec(),
            commit_sha: None,
        },
    }
}

fn fill<T: Clone>(slot: &mut Option<T>, value: &T) {
    if slot.is_none() {
        *slot = Some(value.clone());
    }
}

fn format_error(result: &DetectionResult) -> String {
    let message = result.error().map(|e| e.message.as_str()).unwrap_or("unknown error");
    format!("{}: {}", result.detector, message)
}

fn repository_info(repository: &RepositoryContext) -> RepositoryInfo {
    let metadata = &repository.metadata;
    RepositoryInfo {
        owner: repository.owner.clone(),
        name: repository.repo.clone(),
        default_branch: metadata.default_branch.clone(),
        primary_language: metadata.language.clone(),
        stars: metadata.stars,
        forks: metadata.forks,
        open_issues: metadata.open_issues,
        pushed_at: metadata.pushed_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{DetectionError, DocumentationReport, FrameworkInfo};
    use serde_json::json;
    use std::time::Duration;

    fn outcome(results: Vec<DetectionResult>) -> ExecutionOutcome {
        ExecutionOutcome {
            results: results.into_iter().map(|r| (r.detector.clone(), r)).collect(),
            elapsed: Duration::from_millis(42),
            ..Default::default()
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_complete_when_everything_succeeds() {
        let outcome = outcome(vec![
            DetectionResult::success(
                "documentation",
                DetectorPayload::Documentation(DocumentationReport {
                    has_readme: true,
                    ..Default::default()
                }),
            ),
            DetectionResult::success("framework", DetectorPayload::Frameworks(Vec::new())),
        ]);
        let report = aggregate(
            &names(&["documentation", "framework"]),
            &outcome,
            &RepositoryContext::new("acme", "widget"),
            Utc::now(),
        );

        assert!(report.is_complete());
        assert!(report.metadata.errors.is_empty());
        assert!(report.documentation.has_readme);
        assert_eq!(report.metadata.duration_ms, 42);
        assert_eq!(report.metadata.detectors_run, vec!["documentation", "framework"]);
        assert_eq!(report.repository.owner, "acme");
        assert_eq!(report.repository.name, "widget");
    }

    #[test]
    fn test_errors_follow_registration_order() {
        let outcome = outcome(vec![
            DetectionResult::failure("zeta", DetectionError::new("X", "zeta broke")),
            DetectionResult::failure("alpha", DetectionError::timeout(Duration::from_millis(5))),
            DetectionResult::success("mid", DetectorPayload::Custom(json!({"ok": true}))),
        ]);
        let report = aggregate(
            &names(&["zeta", "mid", "alpha"]),
            &outcome,
            &RepositoryContext::new("o", "r"),
            Utc::now(),
        );

        assert_eq!(report.metadata.completion_status, CompletionStatus::Partial);
        assert_eq!(
            report.metadata.errors,
            vec![
                "zeta: zeta broke".to_string(),
                "alpha: detector timeout after 5ms".to_string(),
            ]
        );
        assert_eq!(report.extensions["mid"], json!({"ok": true}));
    }

    #[test]
    fn test_missing_categories_get_defaults() {
        let report = aggregate(&[], &outcome(Vec::new()), &RepositoryContext::new("o", "r"), Utc::now());
        assert!(report.is_complete());
        assert!(report.languages.languages.is_empty());
        assert!(report.frameworks.is_empty());
        assert!(report.build_tools.tools.is_empty());
        assert_eq!(report.dependencies.total_count, 0);
        assert!(report.health_score.total <= 100);
    }

    #[test]
    fn test_missing_result_counts_as_failure() {
        let report = aggregate(
            &names(&["ghost"]),
            &outcome(Vec::new()),
            &RepositoryContext::new("o", "r"),
            Utc::now(),
        );
        assert!(!report.is_complete());
        assert_eq!(report.metadata.errors, vec!["ghost: no result recorded"]);
    }

    #[test]
    fn test_first_successful_payload_wins() {
        let first = FrameworkInfo {
            name: "react".to_string(),
            category: "frontend".to_string(),
            language: "JavaScript".to_string(),
            version: None,
            legacy: false,
            evidence: "dependency:react".to_string(),
        };
        let outcome = outcome(vec![
            DetectionResult::success("a", DetectorPayload::Frameworks(vec![first.clone()])),
            DetectionResult::success("b", DetectorPayload::Frameworks(Vec::new())),
        ]);
        let report = aggregate(&names(&["a", "b"]), &outcome, &RepositoryContext::new("o", "r"), Utc::now());
        assert_eq!(report.frameworks, vec![first]);
    }
}
