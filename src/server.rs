//! The describe-mvp HTTP service.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::handler::HandlerWithoutStateExt;
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::error::{RepoMvpError, Result};
use crate::llm::{CompletionProvider, GroqClient};
use crate::model::{DescriptionRequest, DescriptionResult};
use crate::prompt::{build_prompt, SYSTEM_PROMPT};

/// Files the landing page is made of.
pub const PUBLIC_FILES: [&str; 3] = ["index.html", "style.css", "script.js"];

#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn CompletionProvider>,
    public_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(provider: Arc<dyn CompletionProvider>, public_dir: impl Into<PathBuf>) -> Self {
        Self {
            provider,
            public_dir: Arc::new(public_dir.into()),
        }
    }

    /// State backed by the Groq client described in `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let provider = GroqClient::new(config.llm.clone())?;
        Ok(Self::new(Arc::new(provider), config.public_dir.clone()))
    }

    async fn describe(&self, request: &DescriptionRequest) -> Result<String> {
        let prompt = build_prompt(request);
        info!(repo_url = %request.repo_url, "Calling completion provider");
        self.provider.complete(SYSTEM_PROMPT, &prompt).await
    }
}

impl IntoResponse for RepoMvpError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(DescriptionResult::failure(self.to_string())),
        )
            .into_response()
    }
}

/// All routes, with static files from the state's public directory.
pub fn create_app(state: AppState) -> Router {
    let static_files = ServeDir::new(state.public_dir.as_path())
        .call_fallback_on_method_not_allowed(true)
        .fallback(not_found.into_service());

    Router::new()
        .route("/", get(index))
        .route("/api/describe-mvp", post(describe_mvp))
        .method_not_allowed_fallback(not_found)
        .fallback_service(static_files)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Response {
    let index_path = state.public_dir.join("index.html");
    match tokio::fs::read_to_string(&index_path).await {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            warn!(path = %index_path.display(), error = %e, "Landing page unavailable");
            let cwd = std::env::current_dir()
                .map(|d| d.display().to_string())
                .unwrap_or_default();
            (
                StatusCode::NOT_FOUND,
                Html(format!(
                    "<h1>404 - index.html not found</h1>\n\
                     <p>Please create {}</p>\n\
                     <p>Current directory: {}</p>\n\
                     <p>Looking for: {}</p>\n",
                    index_path.display(),
                    cwd,
                    index_path.display()
                )),
            )
                .into_response()
        }
    }
}

async fn describe_mvp(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> std::result::Result<Json<DescriptionResult>, RepoMvpError> {
    let Json(body) = payload.map_err(|e| RepoMvpError::InvalidPayload(e.body_text()))?;
    let request = DescriptionRequest::from_value(body)?;

    match state.describe(&request).await {
        Ok(description) => {
            info!("MVP description generated");
            Ok(Json(DescriptionResult::success(description)))
        }
        Err(e) => {
            error!(error = %e, "MVP description failed");
            Err(e)
        }
    }
}

async fn not_found(uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "path": uri.path(),
            "message": "This endpoint does not exist",
            "availableEndpoints": {
                "GET /": "Main page",
                "POST /api/describe-mvp": "Generate MVP description"
            }
        })),
    )
}

/// The HTTP server, ready to bind.
pub struct MvpServer {
    config: AppConfig,
    state: AppState,
}

impl MvpServer {
    /// Fails when the public directory is missing.
    pub fn new(config: AppConfig) -> Result<Self> {
        ensure_public_dir(&config.public_dir)?;
        let state = AppState::from_config(&config)?;
        Ok(Self { config, state })
    }

    /// Serve until Ctrl-C.
    pub async fn start(self) -> Result<()> {
        let address = self.config.address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| RepoMvpError::Other(format!("Failed to bind {address}: {e}")))?;

        self.log_banner();

        axum::serve(listener, create_app(self.state))
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutting down");
            })
            .await
            .map_err(|e| RepoMvpError::Other(format!("Server error: {e}")))
    }

    fn log_banner(&self) {
        let dir = &self.config.public_dir;
        info!(
            address = %format!("http://localhost:{}", self.config.port),
            public_dir = %dir.display(),
            api_key = if self.config.llm.api_key.is_some() { "configured" } else { "missing" },
            model = %self.config.llm.model,
            "repo-mvp server started"
        );
        if self.config.llm.api_key.is_none() {
            warn!("GROQ_API_KEY is not set, describe requests will fail");
        }
        for file in list_public_files(dir) {
            info!(file = %file, "Serving");
        }
    }
}

fn ensure_public_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    error!(path = %dir.display(), "Public folder not found");
    error!("Please create it and add: {}", PUBLIC_FILES.join(", "));
    Err(RepoMvpError::MissingPublicDir(dir.to_path_buf()))
}

fn list_public_files(dir: &Path) -> Vec<String> {
    let mut files: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    files.sort();
    files
}
