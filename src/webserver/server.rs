/// Axum webserver implementation
///
/// Main server lifecycle management including startup, shutdown, and graceful termination
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use crate::{
    errors::BridgeError,
    logger::{self, LogTag},
    webserver::{routes, state::AppState},
};

/// Global shutdown notifier
static SHUTDOWN_NOTIFY: once_cell::sync::Lazy<Arc<Notify>> =
    once_cell::sync::Lazy::new(|| Arc::new(Notify::new()));

/// Start the webserver
///
/// This function blocks until [`shutdown`] is called
pub async fn start_server(state: AppState) -> Result<(), BridgeError> {
    let host = state.config.webserver.host.clone();
    let port = state.config.webserver.port;
    logger::debug(
        LogTag::Webserver,
        &format!("🌐 Starting webserver on {}:{}", host, port),
    );

    let app = build_app(Arc::new(state));

    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::AddrInUse => BridgeError::configuration(format!(
                "Failed to bind to {}:{}: address already in use",
                host, port
            )),
            std::io::ErrorKind::PermissionDenied => BridgeError::configuration(format!(
                "Failed to bind to {}:{}: permission denied, use a port above 1024",
                host, port
            )),
            _ => BridgeError::configuration(format!("Failed to bind to {}:{}: {}", host, port, e)),
        })?;

    logger::info(
        LogTag::Webserver,
        &format!("✅ Webserver listening on http://{}:{}", host, port),
    );

    let shutdown_signal = async {
        SHUTDOWN_NOTIFY.notified().await;
        logger::debug(
            LogTag::Webserver,
            "Received shutdown signal, stopping webserver...",
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    logger::info(LogTag::Webserver, "✅ Webserver stopped gracefully");
    Ok(())
}

/// Trigger webserver shutdown
pub fn shutdown() {
    logger::debug(LogTag::Webserver, "Triggering webserver shutdown...");
    SHUTDOWN_NOTIFY.notify_one();
}

fn build_app(state: Arc<AppState>) -> Router {
    routes::create_router(state)
}
