//! Framework recognition from declared dependencies and marker files

use super::{dependency, language};
use crate::detection::{
    DetectionContext, DetectionError, Detector, DetectorPayload, FrameworkInfo,
};
use async_trait::async_trait;
use std::collections::HashSet;

pub const NAME: &str = "framework";

struct FrameworkPattern {
    dependency: &'static str,
    name: &'static str,
    category: &'static str,
    language: &'static str,
    legacy: bool,
}

const fn fw(
    dependency: &'static str,
    name: &'static str,
    category: &'static str,
    language: &'static str,
    legacy: bool,
) -> FrameworkPattern {
    FrameworkPattern {
        dependency,
        name,
        category,
        language,
        legacy,
    }
}

const PATTERNS: &[FrameworkPattern] = &[
    fw("next", "Next.js", "web", "JavaScript", false),
    fw("react", "React", "frontend", "JavaScript", false),
    fw("vue", "Vue", "frontend", "JavaScript", false),
    fw("svelte", "Svelte", "frontend", "JavaScript", false),
    fw("@angular/core", "Angular", "frontend", "TypeScript", false),
    fw("angular", "AngularJS", "frontend", "JavaScript", true),
    fw("jquery", "jQuery", "frontend", "JavaScript", true),
    fw("backbone", "Backbone.js", "frontend", "JavaScript", true),
    fw("express", "Express", "web", "JavaScript", false),
    fw("fastify", "Fastify", "web", "JavaScript", false),
    fw("@nestjs/core", "NestJS", "web", "TypeScript", false),
    fw("django", "Django", "web", "Python", false),
    fw("flask", "Flask", "web", "Python", false),
    fw("fastapi", "FastAPI", "web", "Python", false),
    fw("actix-web", "Actix Web", "web", "Rust", false),
    fw("axum", "Axum", "web", "Rust", false),
    fw("rocket", "Rocket", "web", "Rust", false),
    fw("github.com/gin-gonic/gin", "Gin", "web", "Go", false),
    fw("github.com/labstack/echo/v4", "Echo", "web", "Go", false),
    fw("org.springframework.boot:spring-boot-starter-web", "Spring Boot", "web", "Java", false),
    fw("org.springframework.boot:spring-boot-starter", "Spring Boot", "web", "Java", false),
    fw("io.quarkus:quarkus-core", "Quarkus", "web", "Java", false),
    fw("io.micronaut:micronaut-http", "Micronaut", "web", "Java", false),
    fw("rails", "Rails", "web", "Ruby", false),
    fw("sinatra", "Sinatra", "web", "Ruby", false),
    fw("laravel/framework", "Laravel", "web", "PHP", false),
    fw("symfony/framework-bundle", "Symfony", "web", "PHP", false),
    fw("jest", "Jest", "testing", "JavaScript", false),
    fw("vitest", "Vitest", "testing", "JavaScript", false),
    fw("mocha", "Mocha", "testing", "JavaScript", false),
    fw("pytest", "pytest", "testing", "Python", false),
    fw("nose", "nose", "testing", "Python", true),
    fw("rspec-rails", "RSpec", "testing", "Ruby", false),
    fw("junit:junit", "JUnit 4", "testing", "Java", true),
    fw("org.junit.jupiter:junit-jupiter", "JUnit 5", "testing", "Java", false),
];

/// Files whose mere presence identifies a framework
const MARKERS: &[(&str, &str, &str, &str)] = &[
    ("next.config.js", "Next.js", "web", "JavaScript"),
    ("next.config.mjs", "Next.js", "web", "JavaScript"),
    ("angular.json", "Angular", "frontend", "TypeScript"),
    ("manage.py", "Django", "web", "Python"),
    ("artisan", "Laravel", "web", "PHP"),
];

/// Matches framework patterns against the dependency detector's output and
/// annotates languages using the language detector's primary language.
/// Both upstream results are optional: a failed dependency scan still allows
/// marker-file matches.
pub struct FrameworkDetector;

#[async_trait]
impl Detector for FrameworkDetector {
    fn name(&self) -> &str {
        NAME
    }

    fn dependencies(&self) -> Vec<String> {
        vec![language::NAME.to_string(), dependency::NAME.to_string()]
    }

    async fn detect(&self, ctx: &DetectionContext) -> Result<DetectorPayload, DetectionError> {
        let mut frameworks: Vec<FrameworkInfo> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        let primary = ctx
            .upstream_payload(language::NAME)
            .and_then(|p| p.as_languages())
            .and_then(|l| l.primary.clone());

        if let Some(deps) = ctx
            .upstream_payload(dependency::NAME)
            .and_then(|p| p.as_dependencies())
        {
            for pattern in PATTERNS {
                if seen.contains(pattern.name) {
                    continue;
                }
                if let Some(dep) = deps.find(pattern.dependency) {
                    seen.insert(pattern.name);
                    frameworks.push(FrameworkInfo {
                        name: pattern.name.to_string(),
                        category: pattern.category.to_string(),
                        language: resolve_language(pattern.language, primary.as_deref()),
                        version: dep.version.clone(),
                        legacy: pattern.legacy,
                        evidence: format!("dependency:{}", dep.name),
                    });
                }
            }
        }

        let repo = ctx.repository();
        for (file, name, category, lang) in MARKERS {
            if seen.contains(name) || !repo.has_file(file) {
                continue;
            }
            seen.insert(*name);
            frameworks.push(FrameworkInfo {
                name: name.to_string(),
                category: category.to_string(),
                language: resolve_language(lang, primary.as_deref()),
                version: None,
                legacy: false,
                evidence: format!("file:{}", file),
            });
        }

        Ok(DetectorPayload::Frameworks(frameworks))
    }
}

/// JavaScript frameworks used from a TypeScript codebase are reported as TypeScript
fn resolve_language(declared: &str, primary: Option<&str>) -> String {
    match (declared, primary) {
        ("JavaScript", Some("TypeScript")) => "TypeScript".to_string(),
        _ => declared.to_string(),
    }
}
