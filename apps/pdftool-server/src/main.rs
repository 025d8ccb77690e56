//! pdftool Upload Server
//!
//! Accepts multipart uploads of PDFs and images together with a requested
//! operation, runs the external `pdf_tool` binary on them and answers with a
//! JSON object pointing at the produced file:
//!
//! - `POST /api/upload` (and `/upload.php`) with fields `function` and `files`
//! - `GET /uploads/<file>` serves staged inputs and produced artifacts
//! - `GET /api/operations` lists the operations the tool knows
//!
//! ## Configuration
//!
//! Every flag can also be set through the environment (or a `.env` file).
//! The tool path is only ever taken from here, never from a request.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use pdftool_bridge::config::{DEFAULT_PUBLIC_PREFIX, DEFAULT_TOOL_PATH};
use pdftool_bridge::{stage::ensure_storage_dir, BridgeConfig};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;

use api::{handle_health, handle_list_operations, handle_upload};

/// Command-line arguments for the pdftool server
#[derive(Parser, Debug)]
#[command(name = "pdftool-server")]
#[command(about = "Upload endpoint that runs pdf_tool on submitted documents")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Path of the pdf_tool binary
    #[arg(long, env = "PDF_TOOL_PATH", default_value = DEFAULT_TOOL_PATH)]
    tool_path: PathBuf,

    /// Directory for uploads and produced files
    #[arg(long, env = "PDFTOOL_STORAGE_DIR", default_value = "uploads")]
    storage_dir: PathBuf,

    /// URL segment the storage directory is served under
    #[arg(long, env = "PDFTOOL_PUBLIC_PREFIX", default_value = DEFAULT_PUBLIC_PREFIX)]
    public_prefix: String,

    /// Tool timeout in seconds
    #[arg(long, env = "PDFTOOL_TIMEOUT_SECS", default_value = "120")]
    timeout_secs: u64,

    /// Maximum request body size in megabytes
    #[arg(long, env = "PDFTOOL_MAX_UPLOAD_MB", default_value = "64")]
    max_upload_mb: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BridgeConfig>,
}

/// Build the full router for `state`.
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let files = ServeDir::new(&state.config.storage_dir);
    let prefix = state.config.public_prefix.clone();

    let router = Router::new()
        // Health check
        .route("/health", get(handle_health))
        // API endpoints
        .route("/api/operations", get(handle_list_operations))
        .route("/api/upload", post(handle_upload))
        .route("/upload.php", post(handle_upload));

    // Produced files are linked relative to the served storage directory
    let router = if prefix.is_empty() {
        router.fallback_service(files)
    } else {
        router.nest_service(&format!("/{}", prefix), files)
    };

    router
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Body limit in bytes for a limit given in megabytes
fn max_upload_bytes(mb: usize) -> usize {
    mb.saturating_mul(1024 * 1024)
}

/// `RUST_LOG` when set and valid, otherwise the crate defaults for `verbose`.
fn log_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| {
            EnvFilter::new(format!(
                "warn,pdftool_server={level},pdftool_bridge={level},tower_http={level}"
            ))
        })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::registry()
        .with(log_filter(rust_log.as_deref(), args.verbose))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BridgeConfig::new(&args.tool_path, &args.storage_dir)?
        .with_public_prefix(&args.public_prefix)
        .with_timeout(Duration::from_secs(args.timeout_secs));

    ensure_storage_dir(&config.storage_dir).await?;

    info!("Tool: {}", config.tool_path.display());
    info!(
        "Storage: {} (served at /{})",
        config.storage_dir.display(),
        config.public_prefix
    );
    info!("Tool timeout: {}s", args.timeout_secs);

    let state = AppState {
        config: Arc::new(config),
    };
    let app = build_router(state, max_upload_bytes(args.max_upload_mb));

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
