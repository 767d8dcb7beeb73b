//! Commit resolution for cache keys

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("reposcan/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("commit lookup request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("commit lookup returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("commit lookup response had no sha")]
    MissingSha,

    #[error("failed to read git metadata: {0}")]
    Io(#[from] std::io::Error),

    #[error("unrecognised git HEAD: {0}")]
    InvalidHead(String),
}

/// Maps a repository branch to the commit it currently points at
#[async_trait]
pub trait CommitResolver: Send + Sync {
    async fn resolve(&self, owner: &str, repo: &str, branch: &str) -> Result<String, ResolveError>;
}

#[derive(Deserialize)]
struct CommitResponse {
    sha: Option<String>,
}

/// Resolves through the GitHub REST API (`GET /repos/{owner}/{repo}/commits/{ref}`)
pub struct GitHubCommitResolver {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubCommitResolver {
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Result<Self, ResolveError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl CommitResolver for GitHubCommitResolver {
    async fn resolve(&self, owner: &str, repo: &str, branch: &str) -> Result<String, ResolveError> {
        let url = format!("{}/repos/{}/{}/commits/{}", self.api_url, owner, repo, branch);
        debug!(url = %url, "Resolving commit");

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body: CommitResponse = response.json().await?;
        body.sha
            .filter(|sha| !sha.is_empty())
            .ok_or(ResolveError::MissingSha)
    }
}

/// Reads the checked-out commit of a local clone
pub struct GitHeadResolver {
    root: PathBuf,
}

impl GitHeadResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn git_dir(&self) -> PathBuf {
        self.root.join(".git")
    }

    async fn read_ref(&self, git_dir: &Path, reference: &str) -> Result<String, ResolveError> {
        match tokio::fs::read_to_string(git_dir.join(reference)).await {
            Ok(sha) => return Ok(sha.trim().to_string()),
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
            Err(_) => {}
        }

        // Refs moved by `git gc` live in packed-refs as "<sha> <ref>"
        let packed = tokio::fs::read_to_string(git_dir.join("packed-refs")).await?;
        packed
            .lines()
            .filter(|line| !line.starts_with('#') && !line.starts_with('^'))
            .filter_map(|line| line.split_once(' '))
            .find(|(_, name)| name.trim() == reference)
            .map(|(sha, _)| sha.to_string())
            .ok_or_else(|| ResolveError::InvalidHead(format!("ref {} not found", reference)))
    }
}

#[async_trait]
impl CommitResolver for GitHeadResolver {
    /// Owner, repo and branch are ignored; the working tree decides
    async fn resolve(&self, _owner: &str, _repo: &str, _branch: &str) -> Result<String, ResolveError> {
        let git_dir = self.git_dir();
        let head = tokio::fs::read_to_string(git_dir.join("HEAD")).await?;
        let head = head.trim();

        let sha = match head.strip_prefix("ref:") {
            Some(reference) => self.read_ref(&git_dir, reference.trim()).await?,
            None => head.to_string(),
        };

        if sha.len() >= 40 && sha.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(sha)
        } else {
            Err(ResolveError::InvalidHead(sha))
        }
    }
}
