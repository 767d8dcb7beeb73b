//! Repository snapshot handed to every detector
//!
//! A [`RepositoryContext`] is assembled once per run (by a fetching layer or by
//! [`loader::load_directory`]) and then shared read-only between all detectors
//! through an `Arc`.

pub mod loader;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub use loader::{load_directory, LoadError, LoaderConfig};

/// Kind of entry in the repository listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    File,
    Directory,
    Symlink,
}

/// One entry of the repository file listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub path: String,
    pub file_type: FileType,
    pub size: u64,
    /// Hex-encoded content hash, empty for directories
    pub sha: String,
}

impl FileDescriptor {
    pub fn file(path: impl Into<String>, size: u64, sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file_type: FileType::File,
            size,
            sha: sha.into(),
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file_type: FileType::Directory,
            size: 0,
            sha: String::new(),
        }
    }

    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }

    /// Final path component
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.path).extension().and_then(|e| e.to_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryStats {
    pub file_count: usize,
    pub total_size: u64,
}

/// Hosting-side metadata about the repository
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    pub default_branch: String,
    pub language: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
}

/// Immutable input bundle for one orchestration run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryContext {
    pub owner: String,
    pub repo: String,
    pub files: Vec<FileDescriptor>,
    pub stats: RepositoryStats,
    /// Contents of the files that were fetched, keyed by path
    pub contents: HashMap<String, String>,
    pub metadata: RepositoryMetadata,
}

impl RepositoryContext {
    /// Creates an empty snapshot for `owner/repo`
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            metadata: RepositoryMetadata {
                default_branch: "main".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Adds a file entry, optionally with content, keeping the stats in step
    pub fn with_file(mut self, path: impl Into<String>, content: Option<&str>) -> Self {
        let path = path.into();
        let size = content.map(|c| c.len() as u64).unwrap_or(0);
        let sha = content.map(content_hash).unwrap_or_default();
        if let Some(content) = content {
            self.contents.insert(path.clone(), content.to_string());
        }
        self.files.push(FileDescriptor::file(path, size, sha));
        self.stats.file_count += 1;
        self.stats.total_size += size;
        self
    }

    pub fn with_metadata(mut self, metadata: RepositoryMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// `owner/repo`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    pub fn content(&self, path: &str) -> Option<&str> {
        self.contents.get(path).map(String::as_str)
    }

    /// Regular files only
    pub fn regular_files(&self) -> impl Iterator<Item = &FileDescriptor> {
        self.files.iter().filter(|f| f.is_file())
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.files.iter().any(|f| f.path == path)
    }

    /// Files whose final path component equals `name`, at any depth
    pub fn files_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FileDescriptor> {
        self.regular_files().filter(move |f| f.file_name() == name)
    }

    /// Case-insensitive lookup of a top-level file by name prefix, e.g. `README`
    pub fn find_root_file(&self, prefix: &str) -> Option<&FileDescriptor> {
        let prefix = prefix.to_ascii_lowercase();
        self.regular_files()
            .filter(|f| !f.path.contains('/'))
            .find(|f| f.path.to_ascii_lowercase().starts_with(&prefix))
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Hex SHA-256 of a file's content
pub fn content_hash(content: &str) -> String {
    use sha2::{Digest, Sha256};
    hex::encode(Sha256::digest(content.as_bytes()))
}
