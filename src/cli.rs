//! Command-Line Interface (CLI) argument parsing.
//!
//! Flags given on the command line take precedence over the environment and
//! the config file. `Cli` is itself a `figment` provider so it can be merged
//! as the last configuration layer.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Prometheus exporter for the mailcow management API.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to an optional TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Port for the /metrics endpoint.
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Seconds between collection passes.
    #[arg(long, value_name = "SECONDS")]
    pub scrape_interval: Option<u64>,

    /// Timeout for each API request in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub fetch_timeout: Option<u64>,

    /// Default log filter (overridden by RUST_LOG).
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(port) = self.port {
            dict.insert("port".into(), Value::from(port));
        }
        if let Some(interval) = self.scrape_interval {
            dict.insert("scrape_interval".into(), Value::from(interval));
        }
        if let Some(timeout) = self.fetch_timeout {
            dict.insert("fetch_timeout".into(), Value::from(timeout));
        }
        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
