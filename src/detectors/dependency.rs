//! Declared dependencies parsed from package manifests

use crate::context::RepositoryContext;
use crate::detection::{
    DependencyEntry, DependencyReport, DetectionContext, DetectionError, Detector, DetectorPayload,
};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::{debug, warn};

pub const NAME: &str = "dependency";

const LOCKFILES: &[&str] = &[
    "Cargo.lock",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
    "bun.lock",
    "poetry.lock",
    "uv.lock",
    "Pipfile.lock",
    "go.sum",
    "Gemfile.lock",
    "composer.lock",
    "mix.lock",
    "gradle.lockfile",
];

type Parser = fn(&str, &str) -> Result<Vec<DependencyEntry>, String>;

fn parser_for(file_name: &str) -> Option<Parser> {
    match file_name {
        "package.json" => Some(parse_package_json),
        "composer.json" => Some(parse_composer_json),
        "Cargo.toml" => Some(parse_cargo_toml),
        "pyproject.toml" => Some(parse_pyproject),
        "requirements.txt" => Some(parse_requirements),
        "go.mod" => Some(parse_go_mod),
        "pom.xml" => Some(parse_pom),
        "Gemfile" => Some(parse_gemfile),
        _ => None,
    }
}

fn entry(name: &str, version: Option<String>, ecosystem: &str, dev: bool, manifest: &str) -> DependencyEntry {
    DependencyEntry {
        name: name.to_string(),
        version,
        ecosystem: ecosystem.to_string(),
        dev,
        manifest: manifest.to_string(),
    }
}

fn parse_json_sections(
    content: &str,
    manifest: &str,
    ecosystem: &str,
    sections: &[(&str, bool)],
) -> Result<Vec<DependencyEntry>, String> {
    let parsed: serde_json::Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    let mut deps = Vec::new();
    for (section, dev) in sections {
        if let Some(map) = parsed.get(section).and_then(|v| v.as_object()) {
            for (name, version) in map {
                deps.push(entry(name, version.as_str().map(String::from), ecosystem, *dev, manifest));
            }
        }
    }
    Ok(deps)
}

fn parse_package_json(content: &str, manifest: &str) -> Result<Vec<DependencyEntry>, String> {
    parse_json_sections(
        content,
        manifest,
        "npm",
        &[
            ("dependencies", false),
            ("peerDependencies", false),
            ("optionalDependencies", false),
            ("devDependencies", true),
        ],
    )
}

fn parse_composer_json(content: &str, manifest: &str) -> Result<Vec<DependencyEntry>, String> {
    let mut deps =
        parse_json_sections(content, manifest, "packagist", &[("require", false), ("require-dev", true)])?;
    // Platform requirements are not packages
    deps.retain(|d| d.name != "php" && !d.name.starts_with("ext-"));
    Ok(deps)
}

fn parse_cargo_toml(content: &str, manifest: &str) -> Result<Vec<DependencyEntry>, String> {
    let parsed: toml::Value = toml::from_str(content).map_err(|e| e.to_string())?;
    let mut deps = Vec::new();
    let mut seen = HashSet::new();

    for (section, dev) in [
        ("dependencies", false),
        ("build-dependencies", false),
        ("dev-dependencies", true),
    ] {
        let Some(table) = parsed.get(section).and_then(|v| v.as_table()) else {
            continue;
        };
        for (name, value) in table {
            if !seen.insert(name.clone()) {
                continue;
            }
            let version = if let Some(ver) = value.as_str() {
                Some(ver.to_string())
            } else if let Some(table) = value.as_table() {
                // Path and git dependencies are pinned by their source
                table
                    .get("version")
                    .and_then(|v| v.as_str())
                    .map(String::from)
                    .or_else(|| table.get("path").map(|_| "path".to_string()))
                    .or_else(|| table.get("git").map(|_| "git".to_string()))
                    .or_else(|| table.get("workspace").map(|_| "workspace".to_string()))
            } else {
                None
            };
            deps.push(entry(name, version, "crates.io", dev, manifest));
        }
    }
    Ok(deps)
}

/// Splits a PEP 508 requirement such as `requests>=2.31; python_version>"3.8"`
fn split_requirement(line: &str) -> Option<(String, Option<String>)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^\s*([A-Za-z0-9][A-Za-z0-9._-]*)(?:\[[^\]]*\])?\s*([^;#]*)").expect("valid regex")
    });
    let caps = re.captures(line)?;
    let name = caps.get(1)?.as_str().to_string();
    let version = caps
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .filter(|v| !v.is_empty());
    Some((name, version))
}

fn parse_requirements(content: &str, manifest: &str) -> Result<Vec<DependencyEntry>, String> {
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#') && !l.starts_with('-'))
        .filter_map(split_requirement)
        .map(|(name, version)| entry(&name, version, "pypi", false, manifest))
        .collect())
}

fn parse_pyproject(content: &str, manifest: &str) -> Result<Vec<DependencyEntry>, String> {
    let parsed: toml::Value = toml::from_str(content).map_err(|e| e.to_string())?;
    let mut deps = Vec::new();

    if let Some(list) = parsed
        .get("project")
        .and_then(|p| p.get("dependencies"))
        .and_then(|d| d.as_array())
    {
        for (name, version) in list.iter().filter_map(|v| v.as_str()).filter_map(split_requirement) {
            deps.push(entry(&name, version, "pypi", false, manifest));
        }
    }

    if let Some(poetry) = parsed.get("tool").and_then(|t| t.get("poetry")) {
        let mut sections: Vec<(&toml::value::Table, bool)> = Vec::new();
        if let Some(t) = poetry.get("dependencies").and_then(|d| d.as_table()) {
            sections.push((t, false));
        }
        if let Some(t) = poetry.get("dev-dependencies").and_then(|d| d.as_table()) {
            sections.push((t, true));
        }
        if let Some(groups) = poetry.get("group").and_then(|g| g.as_table()) {
            for group in groups.values() {
                if let Some(t) = group.get("dependencies").and_then(|d| d.as_table()) {
                    sections.push((t, true));
                }
            }
        }
        for (table, dev) in sections {
            for (name, value) in table {
                if name == "python" {
                    continue;
                }
                let version = value
                    .as_str()
                    .map(String::from)
                    .or_else(|| value.get("version").and_then(|v| v.as_str()).map(String::from));
                deps.push(entry(name, version, "pypi", dev, manifest));
            }
        }
    }
    Ok(deps)
}

fn parse_go_mod(content: &str, manifest: &str) -> Result<Vec<DependencyEntry>, String> {
    let mut deps = Vec::new();
    let mut in_block = false;
    for line in content.lines().map(str::trim) {
        let spec = if in_block {
            if line.starts_with(')') {
                in_block = false;
                continue;
            }
            line
        } else if line == "require (" {
            in_block = true;
            continue;
        } else if let Some(rest) = line.strip_prefix("require ") {
            rest
        } else {
            continue;
        };

        let dev = spec.contains("// indirect");
        let mut parts = spec.split_whitespace();
        if let (Some(name), Some(version)) = (parts.next(), parts.next()) {
            if !name.starts_with("//") {
                deps.push(entry(name, Some(version.to_string()), "go", dev, manifest));
            }
        }
    }
    Ok(deps)
}

fn parse_pom(content: &str, manifest: &str) -> Result<Vec<DependencyEntry>, String> {
    let doc = roxmltree::Document::parse(content).map_err(|e| e.to_string())?;
    let mut deps = Vec::new();
    for node in doc
        .descendants()
        .filter(|n| n.has_tag_name("dependency"))
        // Skip dependencyManagement entries, they only constrain versions
        .filter(|n| {
            !n.ancestors()
                .any(|a| a.has_tag_name("dependencyManagement"))
        })
    {
        let child = |tag: &str| {
            node.children()
                .find(|c| c.has_tag_name(tag))
                .and_then(|c| c.text())
                .map(|t| t.trim().to_string())
        };
        let (Some(group), Some(artifact)) = (child("groupId"), child("artifactId")) else {
            continue;
        };
        let dev = child("scope").as_deref() == Some("test");
        deps.push(entry(
            &format!("{}:{}", group, artifact),
            child("version"),
            "maven",
            dev,
            manifest,
        ));
    }
    Ok(deps)
}

fn parse_gemfile(content: &str, manifest: &str) -> Result<Vec<DependencyEntry>, String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r#"^\s*gem\s+["']([^"']+)["'](?:\s*,\s*["']([^"']+)["'])?"#).expect("valid regex")
    });
    let mut deps = Vec::new();
    // One entry per open `do` block; true when it is a development/test group
    let mut blocks: Vec<bool> = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.ends_with(" do") {
            let dev_group = trimmed.starts_with("group ")
                && (trimmed.contains(":test") || trimmed.contains(":development"));
            blocks.push(dev_group);
            continue;
        }
        if trimmed == "end" {
            blocks.pop();
            continue;
        }
        if let Some(caps) = re.captures(line) {
            let version = caps.get(2).map(|m| m.as_str().to_string());
            let dev = blocks.iter().any(|dev| *dev);
            deps.push(entry(&caps[1], version, "rubygems", dev, manifest));
        }
    }
    Ok(deps)
}

fn collect(repo: &RepositoryContext) -> DependencyReport {
    let mut packages = Vec::new();
    let mut manifests = Vec::new();

    for file in repo.regular_files() {
        if file.path.split('/').any(|seg| seg == "node_modules" || seg == "vendor") {
            continue;
        }
        let Some(parse) = parser_for(file.file_name()) else {
            continue;
        };
        let Some(content) = repo.content(&file.path) else {
            debug!(manifest = %file.path, "Manifest content not fetched, skipping");
            continue;
        };
        match parse(content, &file.path) {
            Ok(deps) => {
                manifests.push(file.path.clone());
                packages.extend(deps);
            }
            Err(error) => {
                warn!(manifest = %file.path, error = %error, "Failed to parse manifest");
            }
        }
    }

    let lockfile_present = repo
        .regular_files()
        .any(|f| LOCKFILES.contains(&f.file_name()));

    DependencyReport::from_entries(packages, manifests, lockfile_present)
}

/// Parses every fetched manifest. An unparsable manifest is skipped with a
/// warning rather than failing the detector.
pub struct DependencyDetector;

#[async_trait]
impl Detector for DependencyDetector {
    fn name(&self) -> &str {
        NAME
    }

    async fn detect(&self, ctx: &DetectionContext) -> Result<DetectorPayload, DetectionError> {
        Ok(DetectorPayload::Dependencies(collect(ctx.repository())))
    }
}
