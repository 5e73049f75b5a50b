use std::{net::SocketAddr, sync::Arc};

use supercookie_core::{ServerBuilder, ServerConfig, SupercookieError, TrackingRegistry};
use tokio::{
    net::TcpListener,
    signal::{self, ctrl_c},
};
use tracing::info;

use crate::router::{build_router, AppState};

pub struct SupercookieServer {
    addr: String,
    config: ServerConfig,
    registry: Arc<TrackingRegistry>,
}

impl SupercookieServer {
    /// Binds to the builder's configured host and port.
    pub fn from_builder(builder: ServerBuilder) -> Self {
        let addr = builder.config.bind_address();
        Self {
            addr,
            config: builder.config,
            registry: builder.registry,
        }
    }

    pub fn registry(&self) -> Arc<TrackingRegistry> {
        self.registry.clone()
    }

    /// Binds the listener and serves until Ctrl+C or SIGTERM.
    pub async fn start(self) -> Result<(), SupercookieError> {
        info!("Binding to {}", self.addr);
        let listener = TcpListener::bind(&self.addr).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serves on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), SupercookieError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let local: SocketAddr = listener.local_addr()?;
        let state = AppState::new(self.registry, self.config);
        let app = build_router(state);

        info!("Server running on http://{local}");
        info!("Routes: /track /probe /stats /set-favicon.bmp /probe/<index>");

        axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

        info!("Server shut down");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
        } else {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
