//! Overlap Server
//!
//! Compares an uploaded PDF against a target PDF (uploaded, or the
//! configured default file) and reports how much of the uploaded document's
//! vocabulary appears in the target. Provides:
//!
//! - An upload page at `/`
//! - `POST /api/check`: score, donut chart and base64 highlighted PDF
//! - `POST /api/highlight`: the highlighted PDF as a download
//!
//! The `check` subcommand runs the same comparison once from the command line.

use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::{Args, Parser, Subcommand};
use overlap_core::{check_against, CheckOptions, Document, ExtractorKind, MatchMode, TargetSource};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;

use api::{handle_check, handle_health, handle_highlight, handle_index};

/// Command-line arguments for the overlap server
#[derive(Parser, Debug)]
#[command(name = "overlap-server")]
#[command(about = "PDF vocabulary overlap checker")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Compare two PDFs once and write the highlighted result
    Check(CheckArgs),
}

/// Settings shared by both subcommands
#[derive(Args, Debug, Clone)]
struct ProcessingArgs {
    /// Text extraction backend: lopdf or pdf-extract
    #[arg(long, env = "OVERLAP_EXTRACTOR", default_value = "lopdf")]
    extractor: ExtractorKind,

    /// Highlight matching: literal (surface words) or lemma
    #[arg(long, env = "OVERLAP_MATCH_MODE", default_value = "literal")]
    match_mode: MatchMode,
}

impl ProcessingArgs {
    fn options(&self) -> CheckOptions {
        CheckOptions {
            extractor: self.extractor,
            match_mode: self.match_mode,
            ..CheckOptions::default()
        }
    }
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, env = "OVERLAP_PORT", default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "OVERLAP_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Target PDF used when the request selects the default target
    #[arg(long, env = "OVERLAP_TARGET_PATH", default_value = "target.pdf")]
    target_path: PathBuf,

    /// Maximum request body size in MiB
    #[arg(long, env = "OVERLAP_MAX_UPLOAD_MB", default_value = "25")]
    max_upload_mb: usize,

    #[command(flatten)]
    processing: ProcessingArgs,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// The PDF to check
    user: PathBuf,

    /// Target PDF to compare against
    #[arg(long, env = "OVERLAP_TARGET_PATH", default_value = "target.pdf")]
    target: PathBuf,

    /// Where to write the highlighted PDF
    #[arg(long, default_value = "highlighted_plagiarism.pdf")]
    out: PathBuf,

    /// Also write the donut chart as SVG
    #[arg(long)]
    chart: Option<PathBuf>,

    #[command(flatten)]
    processing: ProcessingArgs,
}

/// Shared application state
#[derive(Clone, Debug)]
pub struct AppState {
    /// Target used for `target_option=default`
    pub default_target: PathBuf,
    /// Request body limit in bytes
    pub max_upload_bytes: usize,
    pub options: CheckOptions,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Upload page
        .route("/", get(handle_index))
        // Health check
        .route("/health", get(handle_health))
        // API endpoints
        .route("/api/check", post(handle_check))
        .route("/api/highlight", post(handle_highlight))
        // Apply middleware
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Check(args) => run_once(args),
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    info!("Starting overlap server on {}:{}", args.host, args.port);

    let state = AppState {
        default_target: args.target_path,
        max_upload_bytes: args.max_upload_mb * 1024 * 1024,
        options: args.processing.options(),
    };

    info!("Default target: {}", state.default_target.display());
    if !state.default_target.exists() {
        warn!("Default target not found; default-target checks will return 404");
    }
    info!("Upload limit: {} MiB", args.max_upload_mb);

    let app = router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn run_once(args: CheckArgs) -> anyhow::Result<()> {
    let user_bytes =
        fs::read(&args.user).with_context(|| format!("Failed to read {}", args.user.display()))?;
    let user = Document::from_bytes(user_bytes);

    let report = check_against(
        &user,
        TargetSource::DefaultPath(args.target),
        &args.processing.options(),
    )?;

    fs::write(&args.out, &report.highlighted.bytes)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;
    if let Some(chart) = &args.chart {
        fs::write(chart, &report.chart_svg)
            .with_context(|| format!("Failed to write {}", chart.display()))?;
    }

    let shared: Vec<&str> = report.result.shared_tokens.iter().collect();
    println!("Plagiarism percentage: {}", report.result.label());
    println!(
        "Shared words ({}): {}",
        shared.len(),
        shared.join(", ")
    );
    println!(
        "Highlighted {} word(s) -> {}",
        report.highlighted.highlight_count,
        args.out.display()
    );

    Ok(())
}
