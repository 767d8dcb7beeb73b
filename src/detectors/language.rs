//! Language distribution by file extension

use crate::detection::{
    DetectionContext, DetectionError, Detector, DetectorPayload, LanguageReport, LanguageStat,
};
use async_trait::async_trait;
use std::collections::HashMap;

pub const NAME: &str = "language";

struct LanguageDef {
    name: &'static str,
    extensions: &'static [&'static str],
    typed: bool,
}

const LANGUAGES: &[LanguageDef] = &[
    LanguageDef { name: "Rust", extensions: &["rs"], typed: true },
    LanguageDef { name: "TypeScript", extensions: &["ts", "tsx", "mts", "cts"], typed: true },
    LanguageDef { name: "JavaScript", extensions: &["js", "mjs", "cjs", "jsx"], typed: false },
    LanguageDef { name: "Python", extensions: &["py", "pyi", "pyw"], typed: false },
    LanguageDef { name: "Go", extensions: &["go"], typed: true },
    LanguageDef { name: "Java", extensions: &["java"], typed: true },
    LanguageDef { name: "Kotlin", extensions: &["kt", "kts"], typed: true },
    LanguageDef { name: "C#", extensions: &["cs"], typed: true },
    LanguageDef { name: "F#", extensions: &["fs"], typed: true },
    LanguageDef { name: "Ruby", extensions: &["rb", "rake"], typed: false },
    LanguageDef { name: "PHP", extensions: &["php", "phtml"], typed: false },
    LanguageDef { name: "C++", extensions: &["cpp", "cc", "cxx", "hpp", "hxx"], typed: true },
    LanguageDef { name: "C", extensions: &["c", "h"], typed: true },
    LanguageDef { name: "Elixir", extensions: &["ex", "exs"], typed: false },
    LanguageDef { name: "Swift", extensions: &["swift"], typed: true },
    LanguageDef { name: "Scala", extensions: &["scala", "sc"], typed: true },
    LanguageDef { name: "Dart", extensions: &["dart"], typed: true },
    LanguageDef { name: "Shell", extensions: &["sh", "bash", "zsh"], typed: false },
];

const TOOLING_CONFIGS: &[&str] = &[
    ".editorconfig",
    ".eslintrc",
    ".eslintrc.js",
    ".eslintrc.json",
    ".eslintrc.cjs",
    "eslint.config.js",
    "eslint.config.mjs",
    ".prettierrc",
    ".prettierrc.json",
    "prettier.config.js",
    "biome.json",
    "tsconfig.json",
    "rustfmt.toml",
    ".rustfmt.toml",
    "clippy.toml",
    "ruff.toml",
    ".flake8",
    "mypy.ini",
    ".pylintrc",
    ".golangci.yml",
    ".golangci.yaml",
    ".rubocop.yml",
    "phpstan.neon",
    "checkstyle.xml",
    ".pre-commit-config.yaml",
];

fn language_for(extension: &str) -> Option<&'static LanguageDef> {
    let extension = extension.to_ascii_lowercase();
    LANGUAGES
        .iter()
        .find(|lang| lang.extensions.contains(&extension.as_str()))
}

/// True when the language has static types
pub fn is_typed(language: &str) -> bool {
    LANGUAGES
        .iter()
        .any(|lang| lang.name == language && lang.typed)
}

fn is_test_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    let file = lower.rsplit('/').next().unwrap_or(&lower);
    lower.split('/').any(|seg| seg == "test" || seg == "tests" || seg == "__tests__" || seg == "spec")
        || file.starts_with("test_")
        || file.contains("_test.")
        || file.contains(".test.")
        || file.contains(".spec.")
        || file.ends_with("test.java")
        || file.ends_with("tests.cs")
}

fn is_vendored(path: &str) -> bool {
    path.split('/')
        .any(|seg| matches!(seg, "node_modules" | "vendor" | "target" | "dist" | "build"))
}

/// Counts source files per language from the listing; no content is needed
pub struct LanguageDetector;

#[async_trait]
impl Detector for LanguageDetector {
    fn name(&self) -> &str {
        NAME
    }

    async fn detect(&self, ctx: &DetectionContext) -> Result<DetectorPayload, DetectionError> {
        let repo = ctx.repository();
        let mut stats: HashMap<&'static str, (usize, u64)> = HashMap::new();
        let mut source_files = 0;
        let mut test_files = 0;

        for file in repo.regular_files().filter(|f| !is_vendored(&f.path)) {
            let Some(lang) = file.extension().and_then(language_for) else {
                continue;
            };
            let entry = stats.entry(lang.name).or_default();
            entry.0 += 1;
            entry.1 += file.size;
            source_files += 1;
            if is_test_path(&file.path) {
                test_files += 1;
            }
        }

        let total_bytes: u64 = stats.values().map(|(_, bytes)| bytes).sum();
        let mut languages: Vec<LanguageStat> = stats
            .into_iter()
            .map(|(name, (files, bytes))| LanguageStat {
                name: name.to_string(),
                files,
                bytes,
                percentage: if total_bytes == 0 {
                    0.0
                } else {
                    (bytes as f64 * 10000.0 / total_bytes as f64).round() / 100.0
                },
            })
            .collect();
        languages.sort_by(|a, b| {
            b.bytes
                .cmp(&a.bytes)
                .then(b.files.cmp(&a.files))
                .then(a.name.cmp(&b.name))
        });

        let primary = languages
            .first()
            .map(|l| l.name.clone())
            .or_else(|| repo.metadata.language.clone());

        let mut tooling_configs: Vec<String> = repo
            .regular_files()
            .filter(|f| !f.path.contains('/') && TOOLING_CONFIGS.contains(&f.path.as_str()))
            .map(|f| f.path.clone())
            .collect();
        tooling_configs.sort();

        Ok(DetectorPayload::Languages(LanguageReport {
            languages,
            primary,
            source_files,
            test_files,
            tooling_configs,
        }))
    }
}
