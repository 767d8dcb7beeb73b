//! Build tool, CI and container detection from well-known manifests

use crate::detection::{
    BuildTool, BuildToolReport, DetectionContext, DetectionError, Detector, DetectorPayload,
};
use async_trait::async_trait;

pub const NAME: &str = "build-tool";

struct ManifestPattern {
    filename: &'static str,
    tool: &'static str,
    lockfiles: &'static [&'static str],
}

/// More specific tools come first: a `package.json` next to `yarn.lock` is Yarn
const MANIFESTS: &[ManifestPattern] = &[
    ManifestPattern { filename: "Cargo.toml", tool: "cargo", lockfiles: &["Cargo.lock"] },
    ManifestPattern { filename: "pom.xml", tool: "maven", lockfiles: &[] },
    ManifestPattern { filename: "build.gradle", tool: "gradle", lockfiles: &["gradle.lockfile"] },
    ManifestPattern { filename: "build.gradle.kts", tool: "gradle", lockfiles: &["gradle.lockfile"] },
    ManifestPattern { filename: "package.json", tool: "pnpm", lockfiles: &["pnpm-lock.yaml"] },
    ManifestPattern { filename: "package.json", tool: "yarn", lockfiles: &["yarn.lock"] },
    ManifestPattern { filename: "package.json", tool: "bun", lockfiles: &["bun.lockb", "bun.lock"] },
    ManifestPattern { filename: "package.json", tool: "npm", lockfiles: &["package-lock.json"] },
    ManifestPattern { filename: "pyproject.toml", tool: "poetry", lockfiles: &["poetry.lock"] },
    ManifestPattern { filename: "pyproject.toml", tool: "uv", lockfiles: &["uv.lock"] },
    ManifestPattern { filename: "Pipfile", tool: "pipenv", lockfiles: &["Pipfile.lock"] },
    ManifestPattern { filename: "requirements.txt", tool: "pip", lockfiles: &[] },
    ManifestPattern { filename: "pyproject.toml", tool: "pip", lockfiles: &[] },
    ManifestPattern { filename: "go.mod", tool: "go", lockfiles: &["go.sum"] },
    ManifestPattern { filename: "Gemfile", tool: "bundler", lockfiles: &["Gemfile.lock"] },
    ManifestPattern { filename: "composer.json", tool: "composer", lockfiles: &["composer.lock"] },
    ManifestPattern { filename: "mix.exs", tool: "mix", lockfiles: &["mix.lock"] },
    ManifestPattern { filename: "CMakeLists.txt", tool: "cmake", lockfiles: &[] },
    ManifestPattern { filename: "meson.build", tool: "meson", lockfiles: &[] },
    ManifestPattern { filename: "Makefile", tool: "make", lockfiles: &[] },
    ManifestPattern { filename: "build.sbt", tool: "sbt", lockfiles: &[] },
];

const CI_PROVIDERS: &[(&str, &str)] = &[
    (".github/workflows/", "github-actions"),
    (".gitlab-ci.yml", "gitlab-ci"),
    (".circleci/", "circleci"),
    ("Jenkinsfile", "jenkins"),
    (".travis.yml", "travis"),
    ("azure-pipelines.yml", "azure-pipelines"),
    ("bitbucket-pipelines.yml", "bitbucket-pipelines"),
];

const CONTAINER_FILES: &[&str] = &[
    "Dockerfile",
    "Containerfile",
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

fn dir_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

fn sibling(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

pub struct BuildToolDetector;

#[async_trait]
impl Detector for BuildToolDetector {
    fn name(&self) -> &str {
        NAME
    }

    async fn detect(&self, ctx: &DetectionContext) -> Result<DetectorPayload, DetectionError> {
        let repo = ctx.repository();
        let mut tools: Vec<BuildTool> = Vec::new();

        for file in repo.regular_files() {
            let dir = dir_of(&file.path);
            if dir.split('/').any(|seg| seg == "node_modules" || seg == "vendor") {
                continue;
            }

            // First pattern whose lockfile is present wins; otherwise the first
            // lockfile-less pattern for this manifest
            let candidates = MANIFESTS.iter().filter(|p| p.filename == file.file_name());
            let mut chosen: Option<BuildTool> = None;
            for pattern in candidates {
                let lockfile = pattern
                    .lockfiles
                    .iter()
                    .map(|lock| sibling(dir, lock))
                    .find(|lock| repo.has_file(lock));
                match lockfile {
                    Some(lockfile) => {
                        chosen = Some(BuildTool {
                            name: pattern.tool.to_string(),
                            manifest: file.path.clone(),
                            lockfile: Some(lockfile),
                        });
                        break;
                    }
                    None if pattern.lockfiles.is_empty() && chosen.is_none() => {
                        chosen = Some(BuildTool {
                            name: pattern.tool.to_string(),
                            manifest: file.path.clone(),
                            lockfile: None,
                        });
                    }
                    None => {}
                }
            }
            // A lockfile-bearing tool whose lock is absent still counts, e.g. npm
            // without package-lock.json
            if chosen.is_none() {
                if let Some(pattern) = MANIFESTS.iter().rev().find(|p| p.filename == file.file_name()) {
                    chosen = Some(BuildTool {
                        name: pattern.tool.to_string(),
                        manifest: file.path.clone(),
                        lockfile: None,
                    });
                }
            }

            if let Some(tool) = chosen {
                tools.push(tool);
            }
        }
        tools.sort_by(|a, b| a.manifest.cmp(&b.manifest).then(a.name.cmp(&b.name)));

        let mut ci_providers: Vec<String> = CI_PROVIDERS
            .iter()
            .filter(|(marker, _)| {
                repo.files.iter().any(|f| {
                    if marker.ends_with('/') {
                        f.path.starts_with(marker)
                    } else {
                        f.path == *marker
                    }
                })
            })
            .map(|(_, provider)| provider.to_string())
            .collect();
        ci_providers.dedup();

        let containerized = repo
            .regular_files()
            .any(|f| CONTAINER_FILES.contains(&f.file_name()));

        Ok(DetectorPayload::BuildTools(BuildToolReport {
            tools,
            ci_providers,
            containerized,
        }))
    }
}
