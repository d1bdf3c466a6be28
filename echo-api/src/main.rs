//! echo-api - Memory & Emotion Service
//!
//! REST service for the ECHO social memory application: voice-tagged
//! emotional memories with geotagging, GLM emotion classification (with a
//! deterministic keyword fallback), and nearby-memory discovery.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use echo_api::services::GlmClient;
use echo_api::AppState;

#[derive(Debug, Parser)]
#[command(name = "echo-api", about = "ECHO memory and emotion service")]
struct Args {
    /// HTTP listen port (default 5000)
    #[arg(long, env = "ECHO_PORT")]
    port: Option<u16>,

    /// Data directory holding the database
    #[arg(long, env = "ECHO_DATA_DIR")]
    data_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Starting echo-api (memory and emotion service)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Resolve data directory: CLI > env > TOML > OS default
    let toml_config = echo_common::config::load_toml_config().unwrap_or_default();
    let data_dir = echo_common::config::resolve_data_dir(args.data_dir.as_deref(), &toml_config);
    std::fs::create_dir_all(&data_dir)?;

    let db_path = echo_common::config::database_path(&data_dir);
    info!("Database: {}", db_path.display());

    // Initialize database connection pool and schema
    let db = echo_common::db::init_database(&db_path).await?;
    info!("Database connection established");

    // Build the GLM classification client; a missing key is non-fatal and
    // routes every analysis through the keyword fallback.
    let rate_limit_ms = echo_api::db::settings::get_glm_rate_limit_ms(&db).await?;
    let api_key = echo_api::config::resolve_glm_api_key(&db, &toml_config).await?;
    let glm = GlmClient::new(api_key, rate_limit_ms)
        .map_err(|e| anyhow::anyhow!("Failed to create GLM client: {}", e))?;

    // Create application state and router
    let state = AppState::new(db, Arc::new(glm));
    let app = echo_api::build_router(state);

    // Start server: CLI/env port > TOML > default
    let port = args.port.or(toml_config.port).unwrap_or(5000);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("Listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
