//! Configuration management for the mailcow exporter
//!
//! Settings are layered with `figment`, lowest precedence first: built-in
//! defaults, an optional TOML file, the process environment (`API_KEY`,
//! `BASE_URL`, `PORT`, `SCRAPE_INTERVAL`, `FETCH_TIMEOUT`, `LOG_LEVEL`), and
//! finally command-line flags.

use crate::cli::Cli;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    value::{Dict, Value},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variables holding numbers.
const NUMERIC_ENV_KEYS: [&str; 3] = ["port", "scrape_interval", "fetch_timeout"];

/// Environment variables taken verbatim as text, so that a key such as
/// `0123456` is not read as a number.
const TEXT_ENV_KEYS: [&str; 3] = ["api_key", "base_url", "log_level"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("API_KEY is not set")]
    MissingApiKey,

    #[error("BASE_URL is not set (expected e.g. https://mail.example.com/api/v1/get/)")]
    MissingBaseUrl,

    #[error("BASE_URL {0:?} is not an http(s) URL")]
    InvalidBaseUrl(String),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("Config file not found at specified path: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error(transparent)]
    Figment(#[from] Box<figment::Error>),
}

/// The main configuration struct for the application.
#[derive(Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Value sent in the `X-API-Key` header.
    pub api_key: String,
    /// API base including the version prefix, e.g. `https://host/api/v1/get/`.
    pub base_url: String,
    /// Port the `/metrics` endpoint listens on.
    pub port: u16,
    /// Seconds between collection passes.
    pub scrape_interval: u64,
    /// Per-request timeout for API calls, in seconds.
    pub fetch_timeout: u64,
    /// Default log filter, used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("port", &self.port)
            .field("scrape_interval", &self.scrape_interval)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: String::new(),
            port: 9999,
            scrape_interval: 1800,
            fetch_timeout: 30,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads and validates the configuration for the given command line.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(path) = &cli.config {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            figment = figment.merge(Toml::file(path));
        }

        let config: Config = figment
            .merge(Env::raw().only(&NUMERIC_ENV_KEYS))
            .merge(text_env())
            .merge(cli.clone())
            .extract()
            .map_err(Box::new)?;

        config.validate()?;
        Ok(config)
    }

    /// Checks the settings that have no usable default.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        match reqwest::Url::parse(&self.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return Err(ConfigError::InvalidBaseUrl(self.base_url.clone())),
        }
        if self.scrape_interval == 0 {
            return Err(ConfigError::ZeroDuration("SCRAPE_INTERVAL"));
        }
        if self.fetch_timeout == 0 {
            return Err(ConfigError::ZeroDuration("FETCH_TIMEOUT"));
        }
        Ok(())
    }

    pub fn scrape_interval(&self) -> Duration {
        Duration::from_secs(self.scrape_interval)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }

    /// The metrics endpoint binds on all interfaces.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

/// The text-valued environment variables as unparsed strings.
fn text_env() -> Serialized<Dict> {
    let values: Dict = Env::raw()
        .only(&TEXT_ENV_KEYS)
        .iter()
        .map(|(key, value)| (key.as_str().to_string(), Value::from(value)))
        .collect();
    Serialized::defaults(values)
}
