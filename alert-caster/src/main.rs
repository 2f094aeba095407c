use alert_caster::api::{build_app, AppState};
use alert_caster::{AppConfig, FeedManager};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "alert-caster", version, about = "Merge, clean up and summarize RSS/Atom feeds")]
struct Cli {
    #[command(flatten)]
    config: AppConfig,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Process feeds once and print the result envelope as JSON
    Digest {
        #[arg(required = true)]
        urls: Vec<String>,
        /// Previous snapshot of a single feed, to summarize what changed
        #[arg(long)]
        previous: Option<PathBuf>,
    },
    /// Print the merged and annotated XML of one or more feeds
    Merge {
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.config.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let pipeline = cli.config.build_pipeline().context("failed to build feed pipeline")?;
            let cache = cli.config.build_cache().await.context("failed to open feed cache")?;
            let manager = Arc::new(FeedManager::new(Arc::new(pipeline), cache));
            let app = build_app(AppState { manager });

            let listener = tokio::net::TcpListener::bind(cli.config.bind_addr).await?;
            info!("Alert Caster listening on {}", cli.config.bind_addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        Command::Digest { urls, previous } => {
            let pipeline = cli.config.build_pipeline().context("failed to build feed pipeline")?;
            let previous = match previous {
                Some(path) => Some(
                    tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("failed to read {}", path.display()))?,
                ),
                None => None,
            };
            let envelope = pipeline.process(&urls, previous.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        Command::Merge { urls } => {
            let pipeline = cli
                .config
                .build_display_pipeline()
                .context("failed to build feed pipeline")?;
            println!("{}", pipeline.merged_document(&urls).await?);
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Received shutdown signal, starting graceful shutdown");
}
