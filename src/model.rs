//! Wire types shared by the describe client and the proxy service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{RepoMvpError, Result};

/// Message shown when the service reports failure without saying why.
pub const GENERIC_FAILURE: &str = "Failed to generate description";

/// Repository record as returned by `GET /repos/{owner}/{repo}`.
///
/// Only the fields the prompt needs are typed. Everything else is carried in
/// `extra` so the record reaches the service the way GitHub sent it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoMetadata {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub language: Option<String>,

    #[serde(default)]
    pub stargazers_count: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload posted to `POST /api/describe-mvp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionRequest {
    pub repo_url: String,
    pub repo_data: RepoMetadata,
    pub readme: Option<String>,
}

impl DescriptionRequest {
    /// Check an untyped JSON body and convert it into a request.
    pub fn from_value(value: Value) -> Result<Self> {
        let body = value
            .as_object()
            .ok_or_else(|| RepoMvpError::InvalidPayload("body must be a JSON object".into()))?;

        match body.get("repoUrl") {
            Some(Value::String(url)) if !url.trim().is_empty() => {}
            Some(Value::String(_)) => {
                return Err(RepoMvpError::InvalidPayload(
                    "repoUrl must not be empty".into(),
                ))
            }
            Some(_) => {
                return Err(RepoMvpError::InvalidPayload(
                    "repoUrl must be a string".into(),
                ))
            }
            None => return Err(RepoMvpError::InvalidPayload("repoUrl is required".into())),
        }

        match body.get("repoData") {
            Some(Value::Object(_)) => {}
            Some(_) => {
                return Err(RepoMvpError::InvalidPayload(
                    "repoData must be an object".into(),
                ))
            }
            None => return Err(RepoMvpError::InvalidPayload("repoData is required".into())),
        }

        match body.get("readme") {
            None | Some(Value::Null) | Some(Value::String(_)) => {}
            Some(_) => {
                return Err(RepoMvpError::InvalidPayload(
                    "readme must be a string or null".into(),
                ))
            }
        }

        serde_json::from_value(value).map_err(|e| RepoMvpError::InvalidPayload(e.to_string()))
    }
}

/// Response body of the describe endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionResult {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DescriptionResult {
    pub fn success(description: String) -> Self {
        Self {
            success: true,
            description: Some(description),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            description: None,
            error: Some(error.into()),
        }
    }

    /// The generated description, or the service's error message.
    pub fn into_description(self) -> Result<String> {
        match self {
            DescriptionResult {
                success: true,
                description: Some(description),
                ..
            } => Ok(description),
            DescriptionResult { error, .. } => Err(RepoMvpError::Other(
                error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            )),
        }
    }
}
