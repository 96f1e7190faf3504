//! mailcow-exporter - Prometheus exporter for the mailcow management API

use anyhow::Result;
use clap::Parser;
use mailcow_exporter::{app::App, cli::Cli, config::Config};
use std::io::IsTerminal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(filter: EnvFilter) {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        // RUST_LOG may be set to silence everything; this line must still print.
        init_logging(EnvFilter::new("error"));
        error!("Failed to load configuration: {}", err);
        std::process::exit(1);
    });

    init_logging(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
    );

    info!("Mailcow exporter starting up...");
    info!(
        base_url = %config.base_url,
        port = config.port,
        scrape_interval_secs = config.scrape_interval,
        fetch_timeout_secs = config.fetch_timeout,
        "Configuration loaded"
    );
    if config.fetch_timeout >= config.scrape_interval {
        warn!(
            fetch_timeout_secs = config.fetch_timeout,
            scrape_interval_secs = config.scrape_interval,
            "Fetch timeout is not below the scrape interval; passes may overrun"
        );
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let app = match App::builder(config).build(shutdown_rx).await {
        Ok(app) => app,
        Err(err) => {
            error!("Failed to start: {:#}", err);
            std::process::exit(1);
        }
    };
    info!(addr = %app.metrics_addr(), "Serving metrics on /metrics");

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down.");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                // Dropping the sender would stop the app, so keep it alive.
                error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
                drop(shutdown_tx);
            }
        }
    });

    app.run().await
}
