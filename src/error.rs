use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum RepoMvpError {
    #[error("GitHub API error: {0}")]
    GitHub(#[from] octocrab::Error),

    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Repository not found")]
    RepoNotFound(String),

    #[error("Invalid request payload: {0}")]
    InvalidPayload(String),

    #[error("{message}")]
    Provider { status: u16, message: String },

    #[error("GROQ_API_KEY is not configured")]
    MissingApiKey,

    #[error("public directory not found: {}", .0.display())]
    MissingPublicDir(std::path::PathBuf),

    #[error("{step} timed out after {after:?}")]
    Timeout {
        step: &'static str,
        after: std::time::Duration,
    },

    #[error("{0}")]
    Other(String),
}

impl RepoMvpError {
    /// HTTP status used when this error is returned by the describe endpoint.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RepoMvpError::InvalidPayload(_)
            | RepoMvpError::InvalidInput(_)
            | RepoMvpError::RepoNotFound(_) => StatusCode::BAD_REQUEST,
            RepoMvpError::GitHub(_)
            | RepoMvpError::Http(_)
            | RepoMvpError::Provider { .. }
            | RepoMvpError::MissingApiKey
            | RepoMvpError::Timeout { .. }
            | RepoMvpError::MissingPublicDir(_)
            | RepoMvpError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, RepoMvpError>;
