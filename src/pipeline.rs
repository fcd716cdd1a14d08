//! The describe flow: validate input, read the repository from GitHub, then
//! ask the describe-mvp service for a description.

use std::future::Future;
use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{RepoMvpError, Result};
use crate::github::{GithubClient, RepoSource};
use crate::model::{DescriptionRequest, DescriptionResult};
use crate::repo_ref::validate_input;

/// What happens to the flow when a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    /// Stop and report the error.
    Abort,
    /// Log the error and continue without the step's output.
    Degrade,
}

/// Outbound steps of the describe flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Metadata,
    Readme,
    Proxy,
}

impl Step {
    pub fn name(self) -> &'static str {
        match self {
            Step::Metadata => "metadata",
            Step::Readme => "readme",
            Step::Proxy => "proxy",
        }
    }

    pub fn policy(self) -> StepPolicy {
        match self {
            Step::Readme => StepPolicy::Degrade,
            Step::Metadata | Step::Proxy => StepPolicy::Abort,
        }
    }
}

/// Sends the aggregated payload to the describe-mvp service.
#[async_trait]
pub trait DescriptionProxy: Send + Sync {
    async fn describe(&self, request: &DescriptionRequest) -> Result<String>;
}

/// HTTP client for `POST /api/describe-mvp`.
pub struct ServiceClient {
    client: reqwest::Client,
    base_url: String,
}

impl ServiceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl DescriptionProxy for ServiceClient {
    async fn describe(&self, request: &DescriptionRequest) -> Result<String> {
        let url = format!("{}/api/describe-mvp", self.base_url);
        // The body carries the error on failure, so the status is not checked.
        let result: DescriptionResult = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await?
            .json()
            .await?;
        result.into_description()
    }
}

/// Busy state shown while the flow runs.
pub trait BusyIndicator: Send + Sync {
    fn set_busy(&self, busy: bool);
}

/// Clears the indicator when dropped, whichever way the flow exits.
struct BusyGuard<'a>(&'a dyn BusyIndicator);

impl<'a> BusyGuard<'a> {
    fn engage(indicator: &'a dyn BusyIndicator) -> Self {
        indicator.set_busy(true);
        Self(indicator)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.set_busy(false);
    }
}

/// Status line on stderr.
pub struct TerminalIndicator;

impl BusyIndicator for TerminalIndicator {
    fn set_busy(&self, busy: bool) {
        let mut stderr = std::io::stderr();
        if busy {
            let _ = write!(stderr, "⏳ Generating MVP description...");
        } else {
            let _ = write!(stderr, "\r\x1b[2K");
        }
        let _ = stderr.flush();
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct DescribeOutcome {
    pub request: DescriptionRequest,
    pub description: String,
}

pub struct DescribePipeline<S, P> {
    source: S,
    proxy: P,
    step_timeout: Duration,
}

impl<S: RepoSource, P: DescriptionProxy> DescribePipeline<S, P> {
    pub fn new(source: S, proxy: P, step_timeout: Duration) -> Self {
        Self {
            source,
            proxy,
            step_timeout,
        }
    }

    /// Run the whole flow for one user input.
    ///
    /// Input is validated before any network call. `busy` is set for the
    /// duration of the network steps and always cleared afterwards.
    #[instrument(skip(self, busy))]
    pub async fn run(&self, input: &str, busy: &dyn BusyIndicator) -> Result<DescribeOutcome> {
        let (repo_url, reference) = validate_input(input)?;
        let _busy = BusyGuard::engage(busy);

        let repo_data = self
            .run_required(Step::Metadata, self.source.fetch_metadata(&reference))
            .await?;

        let readme = self
            .run_step(Step::Readme, self.source.fetch_readme(&reference))
            .await?;

        let request = DescriptionRequest {
            repo_url,
            repo_data,
            readme,
        };

        let description = self
            .run_required(Step::Proxy, self.proxy.describe(&request))
            .await?;

        info!(repo = %reference, "MVP description generated");
        Ok(DescribeOutcome {
            request,
            description,
        })
    }

    /// Run one step under the step timeout and apply its failure policy.
    ///
    /// Returns `Ok(None)` when a [`StepPolicy::Degrade`] step failed.
    async fn run_step<T>(
        &self,
        step: Step,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<Option<T>> {
        match (self.attempt(step, fut).await, step.policy()) {
            (Ok(value), _) => Ok(Some(value)),
            (Err(e), StepPolicy::Abort) => Err(e),
            (Err(e), StepPolicy::Degrade) => {
                warn!(step = step.name(), error = %e, "Step failed, continuing without it");
                Ok(None)
            }
        }
    }

    /// Run a [`StepPolicy::Abort`] step, whose failure ends the flow.
    async fn run_required<T>(&self, step: Step, fut: impl Future<Output = Result<T>>) -> Result<T> {
        debug_assert_eq!(step.policy(), StepPolicy::Abort);
        self.attempt(step, fut).await
    }

    async fn attempt<T>(&self, step: Step, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.step_timeout, fut)
            .await
            .unwrap_or(Err(RepoMvpError::Timeout {
                step: step.name(),
                after: self.step_timeout,
            }))
    }
}

impl DescribePipeline<GithubClient, ServiceClient> {
    /// Pipeline wired to GitHub and the describe-mvp service from `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::new(
            GithubClient::from_config(config)?,
            ServiceClient::new(config.service_url.clone()),
            config.step_timeout,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RepoMetadata;
    use crate::repo_ref::RepoReference;
    use crate::test_support::spawn_upstream;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSource {
        metadata_fails: bool,
        metadata_hangs: bool,
        readme_fails: bool,
        readme_hangs: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RepoSource for FakeSource {
        async fn fetch_metadata(&self, repo: &RepoReference) -> Result<RepoMetadata> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.metadata_hangs {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if self.metadata_fails {
                return Err(RepoMvpError::RepoNotFound(repo.to_string()));
            }
            let mut extra = serde_json::Map::new();
            extra.insert("full_name".into(), format!("{}/{}", repo.owner, repo.repo).into());
            Ok(RepoMetadata {
                name: Some(repo.repo.clone()),
                description: Some("x".into()),
                language: Some("Go".into()),
                stargazers_count: Some(5),
                extra,
            })
        }

        async fn fetch_readme(&self, _repo: &RepoReference) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.readme_hangs {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if self.readme_fails {
                return Err(RepoMvpError::Other("404".into()));
            }
            crate::github::decode_content("IyBCYXI=")
        }
    }

    #[derive(Default)]
    struct FakeProxy {
        error: Option<String>,
        seen: Mutex<Vec<DescriptionRequest>>,
    }

    #[async_trait]
    impl DescriptionProxy for FakeProxy {
        async fn describe(&self, request: &DescriptionRequest) -> Result<String> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.error {
                Some(e) => Err(RepoMvpError::Other(e.clone())),
                None => Ok("An MVP".into()),
            }
        }
    }

    #[derive(Default)]
    struct RecordingIndicator(Mutex<Vec<bool>>);

    impl BusyIndicator for RecordingIndicator {
        fn set_busy(&self, busy: bool) {
            self.0.lock().unwrap().push(busy);
        }
    }

    impl RecordingIndicator {
        fn states(&self) -> Vec<bool> {
            self.0.lock().unwrap().clone()
        }
    }

    fn pipeline(source: FakeSource, proxy: FakeProxy) -> DescribePipeline<FakeSource, FakeProxy> {
        DescribePipeline::new(source, proxy, Duration::from_secs(5))
    }

    #[test]
    fn test_step_policies() {
        let policies: Vec<_> = [Step::Metadata, Step::Readme, Step::Proxy]
            .into_iter()
            .map(|s| (s.name(), s.policy()))
            .collect();
        assert_eq!(
            policies,
            vec![
                ("metadata", StepPolicy::Abort),
                ("readme", StepPolicy::Degrade),
                ("proxy", StepPolicy::Abort),
            ]
        );
    }

    #[tokio::test]
    async fn test_example_scenario_payload() {
        let p = pipeline(FakeSource::default(), FakeProxy::default());
        let busy = RecordingIndicator::default();

        let outcome = p.run("https://github.com/foo/bar.git", &busy).await.unwrap();
        assert_eq!(outcome.description, "An MVP");

        let sent = p.proxy.seen.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let payload = serde_json::to_value(&sent[0]).unwrap();
        assert_eq!(payload["repoUrl"], "https://github.com/foo/bar.git");
        assert_eq!(payload["repoData"]["name"], "bar");
        assert_eq!(payload["repoData"]["language"], "Go");
        assert_eq!(payload["repoData"]["stargazers_count"], 5);
        assert_eq!(payload["repoData"]["full_name"], "foo/bar");
        assert_eq!(payload["readme"], "# Bar");
        assert_eq!(busy.states(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_invalid_input_makes_no_calls() {
        let p = pipeline(FakeSource::default(), FakeProxy::default());
        let busy = RecordingIndicator::default();

        for input in ["", "https://gitlab.com/foo/bar", "https://github.com/foo"] {
            assert!(matches!(
                p.run(input, &busy).await,
                Err(RepoMvpError::InvalidInput(_))
            ));
        }
        assert_eq!(p.source.calls.load(Ordering::SeqCst), 0);
        assert!(p.proxy.seen.lock().unwrap().is_empty());
        assert!(busy.states().is_empty());
    }

    #[tokio::test]
    async fn test_metadata_failure_aborts_before_proxy() {
        let source = FakeSource {
            metadata_fails: true,
            ..Default::default()
        };
        let p = pipeline(source, FakeProxy::default());
        let busy = RecordingIndicator::default();

        let err = p.run("https://github.com/foo/bar", &busy).await.unwrap_err();
        assert_eq!(err.to_string(), "Repository not found");
        assert!(p.proxy.seen.lock().unwrap().is_empty());
        assert_eq!(busy.states(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_readme_failure_degrades_to_null() {
        let source = FakeSource {
            readme_fails: true,
            ..Default::default()
        };
        let p = pipeline(source, FakeProxy::default());

        let outcome = p
            .run("https://github.com/foo/bar", &RecordingIndicator::default())
            .await
            .unwrap();
        assert_eq!(outcome.request.readme, None);
        let payload = serde_json::to_value(&p.proxy.seen.lock().unwrap()[0]).unwrap();
        assert!(payload["readme"].is_null());
    }

    #[tokio::test]
    async fn test_readme_timeout_degrades() {
        let source = FakeSource {
            readme_hangs: true,
            ..Default::default()
        };
        let p = DescribePipeline::new(source, FakeProxy::default(), Duration::from_millis(50));

        let outcome = p
            .run("https://github.com/foo/bar", &RecordingIndicator::default())
            .await
            .unwrap();
        assert_eq!(outcome.request.readme, None);
    }

    #[tokio::test]
    async fn test_metadata_timeout_aborts_with_millis() {
        let source = FakeSource {
            metadata_hangs: true,
            ..Default::default()
        };
        let p = DescribePipeline::new(source, FakeProxy::default(), Duration::from_millis(50));
        let busy = RecordingIndicator::default();

        let err = p.run("https://github.com/foo/bar", &busy).await.unwrap_err();
        assert!(matches!(err, RepoMvpError::Timeout { step: "metadata", .. }));
        assert_eq!(err.to_string(), "metadata timed out after 50ms");
        assert!(p.proxy.seen.lock().unwrap().is_empty());
        assert_eq!(busy.states(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_proxy_error_is_surfaced() {
        let proxy = FakeProxy {
            error: Some("Invalid API Key".into()),
            ..Default::default()
        };
        let p = pipeline(FakeSource::default(), proxy);
        let busy = RecordingIndicator::default();

        let err = p.run("https://github.com/foo/bar", &busy).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid API Key");
        assert_eq!(busy.states(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_cancelled_run_clears_busy() {
        let source = FakeSource {
            readme_hangs: true,
            ..Default::default()
        };
        let p = pipeline(source, FakeProxy::default());
        let busy = RecordingIndicator::default();

        let run = p.run("https://github.com/foo/bar", &busy);
        let cancelled = tokio::time::timeout(Duration::from_millis(50), run).await;
        assert!(cancelled.is_err());
        assert_eq!(busy.states(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_service_client_reads_error_body() {
        use axum::http::StatusCode;
        use axum::routing::post;
        use axum::{Json, Router};

        let app = Router::new().route(
            "/api/describe-mvp",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(DescriptionResult::failure("Groq API failed")),
                )
            }),
        );
        let base = spawn_upstream(app).await;

        let request = DescriptionRequest {
            repo_url: "https://github.com/foo/bar".into(),
            repo_data: RepoMetadata::default(),
            readme: None,
        };
        let err = ServiceClient::new(base).describe(&request).await.unwrap_err();
        assert_eq!(err.to_string(), "Groq API failed");
    }

    #[tokio::test]
    async fn test_service_client_success() {
        use axum::routing::post;
        use axum::{Json, Router};

        let app = Router::new().route(
            "/api/describe-mvp",
            post(|Json(req): Json<DescriptionRequest>| async move {
                Json(DescriptionResult::success(format!("MVP of {}", req.repo_url)))
            }),
        );
        let base = spawn_upstream(app).await;

        let request = DescriptionRequest {
            repo_url: "https://github.com/foo/bar".into(),
            repo_data: RepoMetadata::default(),
            readme: Some("# Bar".into()),
        };
        let text = ServiceClient::new(base).describe(&request).await.unwrap();
        assert_eq!(text, "MVP of https://github.com/foo/bar");
    }
}
