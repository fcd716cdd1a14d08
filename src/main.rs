use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use repo_mvp::clipboard::{copy_description, CopyFeedback, SystemClipboard};
use repo_mvp::config::{AppConfig, ClientConfig};
use repo_mvp::pipeline::{DescribePipeline, TerminalIndicator};
use repo_mvp::server::MvpServer;
use tracing_subscriber::EnvFilter;

/// Describe GitHub repositories in simple MVP terms
#[derive(Parser)]
#[command(name = "repo-mvp", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the describe-mvp HTTP service
    Serve {
        /// Address to bind (default: HOST or 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (default: PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory holding index.html and its assets (default: PUBLIC_DIR or ./public)
        #[arg(long)]
        public_dir: Option<PathBuf>,
    },

    /// Generate an MVP description for a repository URL
    Describe {
        /// GitHub repository URL, e.g. https://github.com/owner/repo
        url: String,

        /// Base URL of the describe-mvp service (default: REPO_MVP_SERVICE_URL or http://localhost:3000)
        #[arg(long)]
        service_url: Option<String>,

        /// GitHub personal access token.
        /// Can also be set via GITHUB_TOKEN environment variable.
        #[arg(long)]
        token: Option<String>,

        /// Timeout in seconds for each network step (default: 30)
        #[arg(long)]
        timeout: Option<u64>,

        /// Copy the description to the clipboard
        #[arg(long)]
        copy: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("repo_mvp=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve {
            host,
            port,
            public_dir,
        } => {
            let mut config = AppConfig::from_env();
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(dir) = public_dir {
                config.public_dir = dir;
            }

            let server = MvpServer::new(config)?;
            server.start().await?;
        }
        Command::Describe {
            url,
            service_url,
            token,
            timeout,
            copy,
        } => {
            let mut config = ClientConfig::from_env();
            if let Some(service_url) = service_url {
                config.service_url = service_url.trim_end_matches('/').to_string();
            }
            if token.is_some() {
                config.github_token = token;
            }
            if let Some(secs) = timeout {
                config.step_timeout = Duration::from_secs(secs);
            }

            tracing::debug!(
                service_url = %config.service_url,
                authenticated = config.github_token.is_some(),
                "Starting describe"
            );

            let pipeline = DescribePipeline::from_config(&config)?;
            let outcome = tokio::select! {
                outcome = pipeline.run(&url, &TerminalIndicator) => outcome?,
                _ = tokio::signal::ctrl_c() => anyhow::bail!("Cancelled"),
            };

            println!("{}", outcome.description);

            if copy {
                let feedback = match SystemClipboard::open() {
                    Ok(mut clipboard) => copy_description(&mut clipboard, &outcome.description),
                    Err(e) => {
                        tracing::warn!(error = %e, "Clipboard unavailable");
                        CopyFeedback::Failed
                    }
                };
                eprintln!("{}", feedback.label());
            }
        }
    }

    Ok(())
}
