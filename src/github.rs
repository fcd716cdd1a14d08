//! Repository lookups against the GitHub REST API.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;

use crate::config::ClientConfig;
use crate::error::{RepoMvpError, Result};
use crate::model::RepoMetadata;
use crate::repo_ref::RepoReference;

/// Where the describe pipeline reads repository data from.
#[async_trait]
pub trait RepoSource: Send + Sync {
    /// Fetch the repository record. Any non-success response is reported as
    /// [`RepoMvpError::RepoNotFound`].
    async fn fetch_metadata(&self, repo: &RepoReference) -> Result<RepoMetadata>;

    /// Fetch and decode the repository README.
    async fn fetch_readme(&self, repo: &RepoReference) -> Result<String>;
}

#[derive(Clone)]
pub struct GithubClient {
    github: Arc<octocrab::Octocrab>,
}

impl GithubClient {
    pub fn new(github: octocrab::Octocrab) -> Self {
        Self {
            github: Arc::new(github),
        }
    }

    /// Build a client from the API base URL and optional token in `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut builder = octocrab::OctocrabBuilder::new().base_uri(config.github_api_url.as_str())?;
        if let Some(ref token) = config.github_token {
            builder = builder.personal_token(token.clone());
        } else {
            tracing::warn!("No GitHub token provided, API rate limits will be very restrictive");
        }
        Ok(Self::new(builder.build()?))
    }
}

#[async_trait]
impl RepoSource for GithubClient {
    async fn fetch_metadata(&self, repo: &RepoReference) -> Result<RepoMetadata> {
        self.github
            .get::<RepoMetadata, _, ()>(repo.metadata_route(), None)
            .await
            .map_err(|e| {
                tracing::debug!(repo = %repo, error = %e, "Repository lookup failed");
                RepoMvpError::RepoNotFound(repo.to_string())
            })
    }

    async fn fetch_readme(&self, repo: &RepoReference) -> Result<String> {
        let response: serde_json::Value = self
            .github
            .get(repo.readme_route(), None::<&()>)
            .await?;

        let content = response
            .get("content")
            .and_then(|c| c.as_str())
            .ok_or_else(|| RepoMvpError::Other("README response has no content".to_string()))?;

        decode_content(content)
    }
}

/// Decode a base64 `content` field. GitHub wraps the encoded text with newlines.
pub fn decode_content(content: &str) -> Result<String> {
    let cleaned: String = content.chars().filter(|ch| !ch.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&cleaned)
        .map_err(|e| RepoMvpError::Other(format!("README content is not valid base64: {e}")))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
