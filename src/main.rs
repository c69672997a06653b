use api_rest::{build_router, AppState};
use cutis_core::{CoreConfig, Services};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the Cutis backend
///
/// Loads `.env`, resolves [`CoreConfig`] from the environment once, builds the core services
/// and serves the REST API until interrupted.
///
/// # Environment Variables
/// - `CUTIS_REST_ADDR`: REST server address (default: "0.0.0.0:3002")
/// - `CUTIS_DATA_DIR`: Directory for images, history and conversations (default: "cutis_data")
/// - `CUTIS_URL_SIGNING_KEY`: Secret used to sign image URLs (required)
/// - `AI_ORIGIN` / `AI_API_KEY`: Classifier endpoint and key
/// - `SERPER_URL` / `SERPER_API_KEY`: Search provider endpoint and key
/// - `GEMINI_API_KEY`: Enables follow-up conversations
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, startup or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cutis_run=info".parse()?)
                .add_directive("cutis_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("CUTIS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3002".into());

    let cfg = CoreConfig::from_lookup(|key| std::env::var(key).ok())?;
    tracing::info!(?cfg, "configuration loaded");
    let services = Services::from_config(&cfg)?;

    let app = build_router(AppState {
        services,
        max_upload_bytes: cfg.max_upload_bytes(),
    });

    tracing::info!("++ Starting Cutis REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- Cutis REST stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
