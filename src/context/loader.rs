//! Builds a [`RepositoryContext`] from a local checkout

use super::{content_hash, FileDescriptor, RepositoryContext, RepositoryMetadata, RepositoryStats};
use chrono::{DateTime, Utc};
use ignore::WalkBuilder;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Repository path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("Repository path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to read repository: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub max_depth: usize,
    pub max_files: usize,
    /// Files larger than this are listed but their content is not read
    pub max_file_size: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_depth: 12,
            max_files: 5000,
            max_file_size: 1024 * 1024,
        }
    }
}

/// Walks `path` (honouring `.gitignore`) and captures listing, text contents and
/// a best-effort metadata block. `owner`/`repo` label the snapshot.
pub fn load_directory(
    path: &Path,
    owner: &str,
    repo: &str,
    config: &LoaderConfig,
) -> Result<RepositoryContext, LoadError> {
    if !path.exists() {
        return Err(LoadError::PathNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(LoadError::NotADirectory(path.to_path_buf()));
    }
    let root = path.canonicalize()?;
    let start = Instant::now();

    let mut files = Vec::new();
    let mut contents = HashMap::new();
    let mut stats = RepositoryStats::default();
    let mut latest_modified: Option<DateTime<Utc>> = None;

    let walker = WalkBuilder::new(&root)
        .max_depth(Some(config.max_depth))
        .hidden(false)
        .git_ignore(true)
        .filter_entry(|entry| entry.file_name() != ".git")
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    for result in walker {
        let entry = match result {
            Ok(e) => e,
            Err(err) => {
                warn!(error = %err, "Failed to read directory entry");
                continue;
            }
        };
        let rel = match entry.path().strip_prefix(&root) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel.to_string_lossy().replace('\\', "/"),
            _ => continue,
        };

        if files.len() >= config.max_files {
            warn!(max_files = config.max_files, "Reached file limit, stopping walk");
            break;
        }

        let Some(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            files.push(FileDescriptor::directory(rel));
            continue;
        }

        let metadata = entry.metadata().map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
        })?;
        if let Ok(modified) = metadata.modified() {
            let modified: DateTime<Utc> = modified.into();
            latest_modified = Some(latest_modified.map_or(modified, |m| m.max(modified)));
        }

        let size = metadata.len();
        stats.file_count += 1;
        stats.total_size += size;

        let mut sha = String::new();
        if size <= config.max_file_size {
            // Binary files fail UTF-8 decoding and are listed without content
            if let Ok(text) = std::fs::read_to_string(entry.path()) {
                sha = content_hash(&text);
                contents.insert(rel.clone(), text);
            }
        }
        let mut descriptor = FileDescriptor::file(rel, size, sha);
        if file_type.is_symlink() {
            descriptor.file_type = super::FileType::Symlink;
        }
        files.push(descriptor);
    }

    let metadata = RepositoryMetadata {
        default_branch: read_head_branch(&root).unwrap_or_else(|| "main".to_string()),
        updated_at: latest_modified,
        pushed_at: latest_modified,
        ..Default::default()
    };

    info!(
        repo = %root.display(),
        files = stats.file_count,
        fetched = contents.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "Loaded repository snapshot"
    );

    Ok(RepositoryContext {
        owner: owner.to_string(),
        repo: repo.to_string(),
        files,
        stats,
        contents,
        metadata,
    })
}

/// Branch named by `.git/HEAD`, when it points at a ref
fn read_head_branch(root: &Path) -> Option<String> {
    let head = std::fs::read_to_string(root.join(".git").join("HEAD")).ok()?;
    let branch = head.trim().strip_prefix("ref: refs/heads/")?.to_string();
    debug!(branch = %branch, "Resolved default branch from HEAD");
    Some(branch)
}
