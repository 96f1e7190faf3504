//! The main application logic, decoupled from the entry point.

use crate::{
    api::{MailcowApi, MailcowClient},
    collector::MetricsCollector,
    config::Config,
    gauges::{server::MetricsServer, GaugeRegistry},
    scheduler::Scheduler,
    task_manager::TaskManager,
};
use anyhow::{Context, Result};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

/// A handle to the running application, containing all its task handles.
pub struct App {
    task_manager: TaskManager,
    metrics_addr: SocketAddr,
    registry: Arc<GaugeRegistry>,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// The address the metrics server is bound to.
    pub fn metrics_addr(&self) -> SocketAddr {
        self.metrics_addr
    }

    pub fn registry(&self) -> Arc<GaugeRegistry> {
        self.registry.clone()
    }

    /// Waits for the shutdown signal and then for all tasks to finish.
    pub async fn run(self) -> Result<()> {
        let mut shutdown_rx = self.task_manager.get_shutdown_rx();
        shutdown_rx.changed().await.ok();
        info!("Shutdown signal received. Waiting for tasks to complete...");

        let panicked = self.task_manager.shutdown().await;
        if panicked > 0 {
            anyhow::bail!("{panicked} task(s) panicked during shutdown");
        }
        Ok(())
    }
}

/// Builder for the main application.
///
/// Components can be overridden for testing before calling `build`.
pub struct AppBuilder {
    config: Config,
    api_override: Option<Arc<dyn MailcowApi>>,
}

impl AppBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            api_override: None,
        }
    }

    /// Replaces the HTTP client for the mailcow API.
    pub fn api_override(mut self, api: Arc<dyn MailcowApi>) -> Self {
        self.api_override = Some(api);
        self
    }

    /// Binds the metrics server and spawns it together with the scheduler.
    #[instrument(skip_all)]
    pub async fn build(self, shutdown_rx: watch::Receiver<bool>) -> Result<App> {
        let config = self.config;
        let task_manager = TaskManager::new(shutdown_rx);
        let registry = Arc::new(GaugeRegistry::new());
        debug!(gauges = ?registry.names(), "Registered gauges");

        let api = match self.api_override {
            Some(api) => api,
            None => {
                let client =
                    MailcowClient::new(&config.base_url, &config.api_key, config.fetch_timeout())
                        .context("Failed to build HTTP client for the mailcow API")?;
                Arc::new(client) as Arc<dyn MailcowApi>
            }
        };

        let listen_addr = config.listen_addr();
        let listener = TcpListener::bind(listen_addr)
            .await
            .with_context(|| format!("Failed to bind metrics server to {listen_addr}"))?;
        let metrics_addr = listener.local_addr()?;

        let server = MetricsServer::new(listener, registry.clone(), task_manager.get_shutdown_rx());
        task_manager.spawn("MetricsServer", server.run());

        let collector = Arc::new(MetricsCollector::new(api, registry.clone()));
        let scheduler = Scheduler::new(collector, config.scrape_interval());
        task_manager.spawn("Scheduler", scheduler.run(task_manager.get_shutdown_rx()));

        info!(%metrics_addr, "Mailcow exporter initialized successfully.");

        Ok(App {
            task_manager,
            metrics_addr,
            registry,
        })
    }
}
