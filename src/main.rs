//! repo-content - query repository files and directories at a revision
//!
//! # Usage
//! ```bash
//! repo-content --config repos.toml files https://example.com/repo.git --revision main --pattern '*.yaml'
//! repo-content --config repos.toml dirs https://example.com/repo.git --revision deadbeef
//! repo-content --config repos.toml serve --bind 127.0.0.1:3001
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use clap::{Parser, Subcommand};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repo_content::config::Settings;
use repo_content::routes::{self, AppState};
use repo_content::service::SharedRepos;
use repo_content::{GitConnector, RepoService};

/// Fetch files and directory listings from git repositories at a revision
#[derive(Parser)]
#[command(name = "repo-content")]
#[command(about = "Files and directory listings from git repositories at a revision", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "REPO_CONTENT_CONFIG")]
    config: Option<PathBuf>,

    /// Deadline for each request, in seconds
    #[arg(short, long, global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// List files matching a pattern
    Files {
        /// Repository URL
        repo_url: String,

        /// Branch, tag or commit
        #[arg(short, long, default_value = "HEAD")]
        revision: String,

        /// Glob over repository paths, e.g. '*.yaml' or 'apps/**/config.json'
        #[arg(short, long)]
        pattern: String,

        /// Print file contents, not only paths
        #[arg(long)]
        show_content: bool,
    },
    /// List directories
    Dirs {
        /// Repository URL
        repo_url: String,

        /// Branch, tag or commit
        #[arg(short, long, default_value = "HEAD")]
        revision: String,
    },
    /// Serve the HTTP API
    Serve {
        /// Address to listen on, overrides server.bind
        #[arg(short, long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut settings = Settings::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(timeout) = cli.timeout {
        settings.request.timeout_secs = Some(timeout);
    }

    let store = settings.repository_store();
    tracing::info!(repositories = store.len(), "Loaded repository store");

    let service: SharedRepos = Arc::new(RepoService::new(
        Arc::new(store),
        Arc::new(GitConnector::new()),
    ));

    match cli.command {
        Commands::Files {
            repo_url,
            revision,
            pattern,
            show_content,
        } => {
            let ctx = settings.request.context();
            let files = service.get_files(&ctx, &repo_url, &revision, &pattern).await?;

            let mut paths: Vec<&String> = files.keys().collect();
            paths.sort();
            for path in paths {
                let content = &files[path];
                if show_content {
                    println!("==> {} <==", path);
                    println!("{}", String::from_utf8_lossy(content));
                } else {
                    println!("{} ({} bytes)", path, content.len());
                }
            }
        }
        Commands::Dirs { repo_url, revision } => {
            let ctx = settings.request.context();
            let mut directories = service.get_directories(&ctx, &repo_url, &revision).await?;
            directories.sort();
            for dir in directories {
                println!("{}", dir);
            }
        }
        Commands::Serve { bind } => {
            let addr = bind.unwrap_or_else(|| settings.server.bind.clone());
            serve(&addr, service, settings).await?;
        }
    }

    Ok(())
}

async fn serve(addr: &str, repos: SharedRepos, settings: Settings) -> anyhow::Result<()> {
    let state = AppState {
        repos,
        request: settings.request.clone(),
    };

    let app = Router::new()
        .merge(routes::create_router(state))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    println!("  Serving repository content on http://{}", addr);
    if let Some(secs) = settings.request.timeout_secs {
        println!("  Request deadline: {:?}", Duration::from_secs(secs));
    }
    println!("  Press Ctrl+C to stop");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
        println!("\n  Shutting down...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
