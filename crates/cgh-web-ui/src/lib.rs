//! Dashboard web UI and REST API for CGH Monitor.
//!
//! This crate provides:
//! - HTTP REST API for reading the dashboard view and controlling polling
//! - WebSocket endpoint pushing the view after every poll event
//! - Prometheus metrics and the embedded dashboard page
//!
//! # Usage
//!
//! ```ignore
//! use cgh_web_ui::WebUiServer;
//!
//! let server = WebUiServer::new(Arc::clone(&session), &config)?;
//! server.start_with_shutdown(shutdown_signal).await?;
//! ```

mod api;
mod dashboard;
mod metrics;
mod state;
mod websocket;

pub use api::*;
pub use dashboard::*;
pub use metrics::*;
pub use state::*;
pub use websocket::*;

use anyhow::Context;
use axum::{
    routing::{get, post, Router},
    Extension,
};
use cgh_common::config::{MonitorConfig, WebConfig};
use cgh_poller::PollingSession;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

/// Web UI server for one polling session.
pub struct WebUiServer {
    config: WebConfig,
    state: Arc<SharedState>,
    broadcast_tx: broadcast::Sender<StateUpdate>,
    metrics: Arc<MonitorMetrics>,
    /// Subscribed at construction, taken by the first `spawn_bridge`.
    bridge: Mutex<Option<StateBridge>>,
}

impl WebUiServer {
    /// Create a server for `session` using the web and presentation
    /// settings of `config`.
    ///
    /// Session events are buffered from this point on, so metrics and
    /// clients see every event published after `new` returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics registry cannot be built.
    pub fn new(session: Arc<PollingSession>, config: &MonitorConfig) -> anyhow::Result<Self> {
        let (broadcast_tx, _) = broadcast::channel(config.web.ws_channel_capacity.max(1));
        let metrics = MonitorMetrics::new().context("failed to create metrics registry")?;

        let state = Arc::new(SharedState::new(session, config));
        let metrics = Arc::new(metrics);
        let bridge = StateBridge::new(
            Arc::clone(&state),
            broadcast_tx.clone(),
            Arc::clone(&metrics),
        );

        Ok(Self {
            config: config.web.clone(),
            state,
            broadcast_tx,
            metrics,
            bridge: Mutex::new(Some(bridge)),
        })
    }

    /// Prometheus metrics.
    pub fn metrics(&self) -> Arc<MonitorMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Shared state used by the handlers.
    pub fn shared_state(&self) -> Arc<SharedState> {
        Arc::clone(&self.state)
    }

    /// Subscribe to the messages pushed to WebSocket clients.
    pub fn subscribe(&self) -> broadcast::Receiver<StateUpdate> {
        self.broadcast_tx.subscribe()
    }

    /// Spawn the task forwarding session events to metrics and clients.
    pub fn spawn_bridge(&self) -> JoinHandle<()> {
        let pending = self
            .bridge
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let bridge = pending.unwrap_or_else(|| {
            StateBridge::new(
                Arc::clone(&self.state),
                self.broadcast_tx.clone(),
                Arc::clone(&self.metrics),
            )
        });
        tokio::spawn(bridge.run())
    }

    /// Build the axum router with all routes.
    pub fn router(&self) -> Router {
        let mut app = Router::new()
            .route("/", get(dashboard::dashboard_handler))
            .route("/dashboard", get(dashboard::dashboard_handler))
            .route("/health", get(api::health_check))
            .route("/api/state", get(api::get_state))
            .route("/api/options", get(api::get_options))
            .route("/api/refresh", post(api::refresh))
            .route("/api/polling/start", post(api::start_polling))
            .route("/api/polling/stop", post(api::stop_polling))
            .route("/metrics", get(metrics::metrics_handler))
            .route("/ws", get(websocket::ws_handler))
            .layer(Extension(Arc::clone(&self.state)))
            .layer(Extension(self.broadcast_tx.clone()))
            .layer(Extension(Arc::clone(&self.metrics)));

        if let Some(dir) = &self.config.static_dir {
            info!(path = %dir.display(), "Serving static files");
            app = app.nest_service("/static", ServeDir::new(dir));
        }

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            app = app.layer(cors);
        }

        app
    }

    /// Bind the configured address and serve until cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or serving fails.
    pub async fn start(self) -> anyhow::Result<()> {
        self.start_with_shutdown(std::future::pending()).await
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or serving fails.
    pub async fn start_with_shutdown<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_addr;
        info!(addr = %bind_addr, "Starting web UI server");

        let listener = TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("failed to bind web UI to {bind_addr}"))?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if serving fails.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr().context("listener has no address")?;
        let bridge = self.spawn_bridge();
        let app = self.router();

        info!(addr = %addr, "Web UI server listening");
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .context("web UI server failed");

        bridge.abort();
        info!("Web UI server stopped");
        result
    }
}
