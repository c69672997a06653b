//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging. The workspace's main `cutis-run` binary serves the
//! same router.

use api_rest::{build_router, AppState};
use cutis_core::{CoreConfig, Services};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the Cutis REST API server
///
/// # Environment Variables
/// - `CUTIS_REST_ADDR`: Server address (default: "0.0.0.0:3002")
/// - everything read by [`CoreConfig::from_lookup`]
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or the data directory cannot be prepared,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("cutis_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CUTIS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3002".into());

    let cfg = CoreConfig::from_lookup(|key| std::env::var(key).ok())?;
    tracing::info!(?cfg, "configuration loaded");
    let services = Services::from_config(&cfg)?;

    let app = build_router(AppState {
        services,
        max_upload_bytes: cfg.max_upload_bytes(),
    });

    tracing::info!("-- Starting Cutis REST API on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
