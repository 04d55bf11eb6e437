//! Server side of the counter sync endpoint.

pub mod error;
pub mod handlers;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::{Config, CsrfConfig};
use crate::shutdown::ShutdownManager;

pub use error::ServerError;

/// Shared state behind the sync routes.
#[derive(Clone)]
pub struct ServerState {
    csrf: Arc<CsrfConfig>,
    last_count: Arc<AtomicU64>,
    prefetches: Arc<AtomicU64>,
}

impl ServerState {
    pub fn new(csrf: CsrfConfig) -> Self {
        Self {
            csrf: Arc::new(csrf),
            last_count: Arc::new(AtomicU64::new(0)),
            prefetches: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn csrf(&self) -> &CsrfConfig {
        &self.csrf
    }

    /// Most recently synced value.
    pub fn last_count(&self) -> u64 {
        self.last_count.load(Ordering::SeqCst)
    }

    pub(crate) fn store_count(&self, count: u64) {
        self.last_count.store(count, Ordering::SeqCst);
    }

    /// Number of `HEAD` requests served so far.
    pub fn prefetches(&self) -> u64 {
        self.prefetches.load(Ordering::SeqCst)
    }

    pub(crate) fn record_prefetch(&self) {
        self.prefetches.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn build_router(state: ServerState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health))
        .route("/counter", get(handlers::counter_page))
        .route("/counter/widget", get(handlers::counter_widget))
        .route("/counter/sync", post(handlers::counter_sync))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            handlers::track_prefetch,
        ))
        .with_state(state)
}

pub struct SyncServer {
    listener: TcpListener,
    state: ServerState,
    shutdown: Arc<ShutdownManager>,
}

impl SyncServer {
    /// Bind the listener up front so callers can read the real port.
    pub async fn bind(config: &Config) -> Result<Self, ServerError> {
        let addr: SocketAddr =
            config
                .server
                .bind_addr
                .parse()
                .map_err(|_| ServerError::InvalidBindAddr {
                    addr: config.server.bind_addr.clone(),
                })?;
        let listener = TcpListener::bind(addr).await?;

        Ok(Self {
            listener,
            state: ServerState::new(config.csrf.clone()),
            shutdown: Arc::new(ShutdownManager::new()),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn state(&self) -> ServerState {
        self.state.clone()
    }

    pub fn shutdown_handle(&self) -> Arc<ShutdownManager> {
        self.shutdown.clone()
    }

    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.local_addr()?;
        tracing::info!("Sync server listening on {}", addr);

        let app = build_router(self.state);
        let shutdown = self.shutdown;
        axum::serve(self.listener, app)
            .with_graceful_shutdown(async move {
                if let Err(err) = shutdown.wait_for_shutdown().await {
                    tracing::warn!(error = %err, "Signal handler failed; shutting down");
                }
            })
            .await?;

        tracing::info!("Sync server stopped");
        Ok(())
    }
}
