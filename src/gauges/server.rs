//! # Metrics Server
//!
//! Runs an `axum` server exposing the gauge registry to a Prometheus scraper
//! on a single route, `GET /metrics`. Each scrape renders the registry's
//! current values; nothing is cached between scrapes.

use super::GaugeRegistry;
use axum::{extract::State, routing::get, Router};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, trace};

/// A server that exposes the gauge registry to a Prometheus scraper.
pub struct MetricsServer {
    listener: TcpListener,
    registry: Arc<GaugeRegistry>,
    shutdown_rx: watch::Receiver<bool>,
}

impl MetricsServer {
    /// Creates a new `MetricsServer` but does not spawn it.
    ///
    /// # Arguments
    ///
    /// * `listener` - A `TcpListener` that has already been bound to an address.
    /// * `registry` - The registry rendered on every scrape.
    /// * `shutdown_rx` - A watch channel receiver for graceful shutdown.
    pub fn new(
        listener: TcpListener,
        registry: Arc<GaugeRegistry>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            listener,
            registry,
            shutdown_rx,
        }
    }

    /// The router serving `/metrics`.
    pub fn router(registry: Arc<GaugeRegistry>) -> Router {
        Router::new()
            .route("/metrics", get(render_metrics))
            .with_state(registry)
    }

    /// Returns a future that runs the server until a shutdown signal is received.
    pub fn run(self) -> impl Future<Output = ()> {
        let app = Self::router(self.registry);
        let listener = self.listener;
        let mut shutdown_rx = self.shutdown_rx;

        async move {
            let shutdown = async move {
                // An error means the sender is gone, which is a shutdown too.
                let _ = shutdown_rx.changed().await;
                trace!("Metrics server received shutdown signal.");
            };

            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!(error = %e, "Metrics server error");
            }
            trace!("Metrics server task finished.");
        }
    }
}

async fn render_metrics(State(registry): State<Arc<GaugeRegistry>>) -> String {
    registry.render()
}
