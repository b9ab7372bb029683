use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hazard_dashboard::app_state::AppState;
use hazard_dashboard::config::Config;
use hazard_dashboard::create_router;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("FATAL ERROR: {}", e);
        eprintln!("Error details: {:?}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => eprintln!("Loaded environment from {}", path.display()),
        Err(_) => eprintln!("No .env file found, using system environment variables"),
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hazard_dashboard=info,tower_http=info")),
        )
        .init();

    info!("=== Hazard Dashboard Starting ===");

    let config = Config::from_env().context("loading configuration")?;
    config.validate().context("validating configuration")?;
    info!("Backend: {} (app {})", config.backend_base_url, config.backend_app_id);
    info!("LLM provider: {:?}", config.llm_provider);
    info!(
        "Report limits: dashboard {}, analytics {}",
        config.dashboard_report_limit, config.analytics_report_limit
    );
    if config.usable_geocoder_key().is_none() {
        warn!("No geocoder key configured; locations will fall back to coordinates");
    }

    let port = config.port;
    let state = AppState::new(config).context("building HTTP clients")?;

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);
    info!("=== Hazard Dashboard Ready ===");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down gracefully...");
        },
    }
}
