//! kwc-enrich - Keyword collection enrichment service
//!
//! Reads keyword workbooks, generates collection headings and paragraphs,
//! writes enriched workbooks and optionally publishes collection bodies to
//! the storefront.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kwc_common::Settings;
use tokio::signal;
use tracing::{info, warn};

use kwc_enrich::services::background_runner;
use kwc_enrich::{build_router, AppState};

/// Command-line arguments for kwc-enrich
#[derive(Parser, Debug)]
#[command(name = "kwc-enrich")]
#[command(about = "Keyword collection enrichment service")]
#[command(version)]
struct Cli {
    /// TOML config file
    #[arg(short, long, env = "KWC_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides config)
    #[arg(short, long, global = true)]
    bind: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Process a single workbook and exit
    Process {
        /// Input `.xlsx` workbook
        file: PathBuf,
        /// Publish collection bodies to the storefront
        #[arg(long)]
        push: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(bind) = cli.bind {
        settings.bind_address = bind;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_level.clone().into()),
        )
        .init();

    info!(
        "Starting kwc-enrich v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("KWC_BUILD_COMMIT"),
        env!("KWC_BUILD_TIME"),
        env!("KWC_BUILD_PROFILE")
    );

    settings
        .ensure_directories()
        .context("Failed to create working directories")?;
    info!("Input directory: {}", settings.input_dir.display());
    info!("Output directory: {}", settings.output_dir.display());

    if settings.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; rows needing generation will fail");
    }

    let state = AppState::from_settings(settings)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(state).await,
        Command::Process { file, push } => {
            let processor = state.processor(push)?;
            let result = processor.process_file(&file).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
    }
}

async fn serve(state: AppState) -> Result<()> {
    if state.settings.enable_background_runner {
        tokio::spawn(background_runner::run_background_loop(state.clone()));
    }

    let bind_address = state.settings.bind_address.clone();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("Listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
