use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use meshforge_chat::ChatApi;
use meshforge_meshy::MeshyApi;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meshforge_api::config::ServerConfig;
use meshforge_api::router::build_app_router;
use meshforge_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "meshforge_api=debug,meshforge_meshy=debug,meshforge_chat=debug,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let mut config = ServerConfig::from_env();
    config.asset_dir = std::path::absolute(&config.asset_dir).expect("Invalid ASSET_DIR");
    tracing::info!(
        host = %config.host,
        port = %config.port,
        asset_dir = %config.asset_dir.display(),
        public_base_url = %config.public_base_url,
        "Loaded server configuration",
    );

    // --- Upstream clients ---
    let http = reqwest_client();
    let gateway = Arc::new(MeshyApi::with_client(http.clone(), &config.meshy));
    let chat = Arc::new(ChatApi::with_client(http, &config.chat));
    tracing::info!(
        meshy_url = %gateway.api_url(),
        chat_model = %chat.model(),
        "Upstream clients created",
    );

    // --- App state ---
    let shutdown = CancellationToken::new();
    let state = AppState::new(config.clone(), gateway, chat, shutdown.clone());

    state
        .storage
        .ensure_root()
        .await
        .expect("Failed to create asset directory");
    tracing::info!(asset_dir = %state.storage.root().display(), "Asset directory ready");

    let app = build_app_router(state.clone(), &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    let in_flight = state.dispatcher.in_flight();
    tracing::info!(in_flight, "Cancelling running jobs");
    shutdown.cancel();

    let drained = state
        .dispatcher
        .shutdown(Duration::from_secs(config.shutdown_timeout_secs))
        .await;
    if drained {
        tracing::info!("Graceful shutdown complete");
    } else {
        tracing::warn!(
            remaining = state.dispatcher.in_flight(),
            "Shutdown timed out with jobs still running",
        );
    }
}

/// Single HTTP client shared by both upstream services.
fn reqwest_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to build HTTP client")
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
