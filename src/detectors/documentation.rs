//! README and project-documentation heuristics

use crate::detection::{
    DetectionContext, DetectionError, Detector, DetectorPayload, DocumentationReport,
};
use async_trait::async_trait;

pub const NAME: &str = "documentation";

/// Markdown `#` headings, reStructuredText underlines are not counted
fn count_sections(readme: &str) -> usize {
    let mut in_fence = false;
    readme
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            if trimmed.starts_with("```") {
                in_fence = !in_fence;
                return false;
            }
            !in_fence && trimmed.starts_with('#') && trimmed.trim_start_matches('#').starts_with(' ')
        })
        .count()
}

pub struct DocumentationDetector;

#[async_trait]
impl Detector for DocumentationDetector {
    fn name(&self) -> &str {
        NAME
    }

    async fn detect(&self, ctx: &DetectionContext) -> Result<DetectorPayload, DetectionError> {
        let repo = ctx.repository();

        let readme = repo.find_root_file("README");
        let readme_content = readme.and_then(|f| repo.content(&f.path));
        // Unfetched README: fall back to the listed size
        let readme_length = match (readme, readme_content) {
            (_, Some(content)) => content.chars().count(),
            (Some(file), None) => file.size as usize,
            (None, None) => 0,
        };

        let has_docs_dir = repo
            .files
            .iter()
            .any(|f| f.path == "docs" || f.path.starts_with("docs/") || f.path == "doc" || f.path.starts_with("doc/"));

        Ok(DetectorPayload::Documentation(DocumentationReport {
            has_readme: readme.is_some(),
            readme_length,
            readme_sections: readme_content.map(count_sections).unwrap_or(0),
            has_license: repo.find_root_file("LICENSE").is_some()
                || repo.find_root_file("LICENCE").is_some()
                || repo.find_root_file("COPYING").is_some(),
            has_contributing: repo.find_root_file("CONTRIBUTING").is_some()
                || repo.has_file(".github/CONTRIBUTING.md"),
            has_changelog: repo.find_root_file("CHANGELOG").is_some()
                || repo.find_root_file("CHANGES").is_some()
                || repo.find_root_file("HISTORY").is_some(),
            has_docs_dir,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RepositoryContext;

    async fn run(ctx: RepositoryContext) -> DocumentationReport {
        match DocumentationDetector
            .detect(&DetectionContext::standalone(ctx))
            .await
            .unwrap()
        {
            DetectorPayload::Documentation(report) => report,
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_count_sections_skips_code_fences() {
        let readme = "# Title\n\nIntro\n\n## Install\n\n```sh\n# not a heading\n```\n\n## Usage\n#hashtag\n";
        assert_eq!(count_sections(readme), 3);
    }

    #[tokio::test]
    async fn test_full_documentation() {
        let ctx = RepositoryContext::new("o", "r")
            .with_file("README.md", Some("# Widget\n\n## Install\n\n## Usage\n"))
            .with_file("LICENSE", Some("MIT"))
            .with_file("CONTRIBUTING.md", Some("PRs welcome"))
            .with_file("CHANGELOG.md", Some("## 1.0"))
            .with_file("docs/index.md", Some("docs"));

        let report = run(ctx).await;
        assert!(report.has_readme);
        assert_eq!(report.readme_sections, 3);
        assert_eq!(report.readme_length, 31);
        assert!(report.has_license);
        assert!(report.has_contributing);
        assert!(report.has_changelog);
        assert!(report.has_docs_dir);
    }

    #[tokio::test]
    async fn test_unfetched_readme_uses_listed_size() {
        let mut ctx = RepositoryContext::new("o", "r");
        ctx.files.push(crate::context::FileDescriptor::file("README.md", 2048, "sha"));

        let report = run(ctx).await;
        assert!(report.has_readme);
        assert_eq!(report.readme_length, 2048);
        assert_eq!(report.readme_sections, 0);
    }

    #[tokio::test]
    async fn test_empty_repository() {
        let report = run(RepositoryContext::new("o", "r")).await;
        assert_eq!(report, DocumentationReport::default());
    }
}
