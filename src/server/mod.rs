pub mod handlers;
pub mod router;

use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use crate::claims::Registry;
use crate::config::Config;

/// Shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub started: Instant,
}

impl AppState {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
            started: Instant::now(),
        }
    }
}

pub struct Server {
    config: Config,
    state: AppState,
}

impl Server {
    pub fn new(config: Config, registry: Registry) -> Self {
        Self {
            config,
            state: AppState::new(registry),
        }
    }

    /// Serve until Ctrl+C or SIGTERM
    pub async fn run(self) -> anyhow::Result<()> {
        let address = self.config.socket_addr();
        let app = router::init(self.state, &self.config.server);

        let listener = TcpListener::bind(address)
            .await
            .with_context(|| format!("Failed to bind {}", address))?;

        info!("Server running at http://{}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                if let Err(e) = shutdown_signal().await {
                    error!("Error while waiting for shutdown signal: {e}");
                    return;
                }
                info!("Shutdown signal received, finishing in-flight requests...");
            })
            .await
            .context("HTTP server failed")?;

        info!("Server shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() -> anyhow::Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<anyhow::Result<()>>();

    tokio::select! {
        res = ctrl_c => res?,
        res = terminate => res?,
    }

    Ok(())
}
