//! TezTones site: the live landing page and the head-to-head voting page.

use tokio::{net::TcpListener, signal};
use tracing::info;

pub mod config;
pub mod cookies;
pub mod error;
pub mod logging;
pub mod render;
pub mod routes;
pub mod state;

use config::Config;
use error::StartupError;
use state::AppState;

pub async fn start_server(config: Config) -> Result<(), StartupError> {
    config.validate()?;

    info!("Initializing state...");
    let state = AppState::new(&config).await?;
    let app = routes::create_router(state);

    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|source| StartupError::Bind {
            addr: config.bind,
            source,
        })?;
    info!("Server running on {}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
