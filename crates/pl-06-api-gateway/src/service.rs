//! HTTP server lifecycle.

use axum::Router;
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use crate::domain::ApiConfig;
use crate::router::{build_router, AppState};

/// The node's HTTP front door.
pub struct ApiGateway {
    config: ApiConfig,
    router: Router,
}

impl ApiGateway {
    pub fn new(config: ApiConfig, state: AppState) -> Self {
        let router = build_router(state, &config);
        Self { config, router }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> io::Result<TcpListener> {
        let addr: SocketAddr = self
            .config
            .socket_addr()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        TcpListener::bind(addr).await
    }

    /// Serve until `shutdown` turns `true`; in-flight requests finish first.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> io::Result<()> {
        let addr = listener.local_addr()?;
        info!(addr = %addr, "[pl-06] 🌐 Starting HTTP server");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.wait_for(|stop| *stop).await;
            })
            .await?;

        info!("[pl-06] HTTP server stopped");
        Ok(())
    }
}
