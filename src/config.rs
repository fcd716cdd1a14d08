//! Process configuration, resolved once at startup and passed down explicitly.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Settings for the describe-mvp service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub public_dir: PathBuf,
    pub llm: LlmConfig,
}

/// Settings for the outbound chat-completion call.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// Settings for the describe client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub github_api_url: String,
    pub github_token: Option<String>,
    pub service_url: String,
    /// Budget for each outbound step (metadata, README, proxy).
    pub step_timeout: Duration,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}
fn default_llm_timeout() -> Duration {
    Duration::from_secs(60)
}
fn default_step_timeout() -> Duration {
    Duration::from_secs(30)
}
fn default_service_url() -> String {
    format!("http://localhost:{}", DEFAULT_PORT)
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GROQ_BASE_URL.to_string(),
            model: DEFAULT_GROQ_MODEL.to_string(),
            temperature: 0.5,
            max_tokens: 1000,
            timeout: default_llm_timeout(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_PORT,
            public_dir: default_public_dir(),
            llm: LlmConfig::default(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            github_token: None,
            service_url: default_service_url(),
            step_timeout: default_step_timeout(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from a key lookup. Unset, empty or unparsable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = get("HOST") {
            config.host = host;
        }
        if let Some(port) = get("PORT").and_then(|p| parse_or_warn("PORT", &p)) {
            config.port = port;
        }
        if let Some(dir) = get("PUBLIC_DIR") {
            config.public_dir = PathBuf::from(dir);
        }

        config.llm.api_key = get("GROQ_API_KEY");
        if let Some(url) = get("GROQ_BASE_URL") {
            config.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = get("GROQ_MODEL") {
            config.llm.model = model;
        }
        if let Some(secs) = get("LLM_TIMEOUT_SECS").and_then(|s| parse_or_warn("LLM_TIMEOUT_SECS", &s)) {
            config.llm.timeout = Duration::from_secs(secs);
        }

        config
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get("GITHUB_API_URL") {
            config.github_api_url = url.trim_end_matches('/').to_string();
        }
        config.github_token = get("GITHUB_TOKEN");
        if let Some(url) = get("REPO_MVP_SERVICE_URL") {
            config.service_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) =
            get("REPO_MVP_TIMEOUT_SECS").and_then(|s| parse_or_warn("REPO_MVP_TIMEOUT_SECS", &s))
        {
            config.step_timeout = Duration::from_secs(secs);
        }

        config
    }
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    match value.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value, "Ignoring unparsable environment value");
            None
        }
    }
}
