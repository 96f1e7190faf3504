//! Client for the mailcow read API.
//!
//! The collector only ever needs one operation from the API, "GET this path
//! and decode the JSON body", which is captured by the [`MailcowApi`] trait so
//! tests can substitute a fake.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

/// Header carrying the static API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// The API resources polled on every collection pass, in polling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Containers,
    Vmail,
    Solr,
    Mailboxes,
    Aliases,
    MailQueue,
    Quarantine,
    SyncJobs,
    Domains,
    ForwardingHosts,
}

impl Endpoint {
    pub const ALL: [Endpoint; 10] = [
        Endpoint::Containers,
        Endpoint::Vmail,
        Endpoint::Solr,
        Endpoint::Mailboxes,
        Endpoint::Aliases,
        Endpoint::MailQueue,
        Endpoint::Quarantine,
        Endpoint::SyncJobs,
        Endpoint::Domains,
        Endpoint::ForwardingHosts,
    ];

    /// The path relative to the configured base URL.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Containers => "status/containers",
            Endpoint::Vmail => "status/vmail",
            Endpoint::Solr => "status/solr",
            Endpoint::Mailboxes => "mailbox/all",
            Endpoint::Aliases => "alias/all",
            Endpoint::MailQueue => "mailq/all",
            Endpoint::Quarantine => "quarantine/all",
            Endpoint::SyncJobs => "syncjobs/all/no_log",
            Endpoint::Domains => "domain/all",
            Endpoint::ForwardingHosts => "fwdhost/all",
        }
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {path} failed: {source}")]
    Request {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {path} returned HTTP {status}")]
    Status {
        path: String,
        status: reqwest::StatusCode,
    },

    #[error("response from {path} is not valid JSON: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Fetches decoded JSON payloads from the mailcow API.
#[async_trait]
pub trait MailcowApi: Send + Sync {
    /// Issues a GET for `path` (relative to the base URL) and decodes the body.
    async fn fetch(&self, path: &str) -> Result<Value, FetchError>;
}

/// The production [`MailcowApi`] backed by `reqwest`.
pub struct MailcowClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MailcowClient {
    /// Creates a client for `base_url`, which must already contain the API
    /// prefix (e.g. `https://mail.example.com/api/v1/get/`).
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl MailcowApi for MailcowClient {
    #[instrument(skip(self))]
    async fn fetch(&self, path: &str) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(self.url_for(path))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                path: path.to_string(),
                status,
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Request {
            path: path.to_string(),
            source,
        })?;
        debug!(bytes = body.len(), "Received API response");

        serde_json::from_str(&body).map_err(|source| FetchError::Decode {
            path: path.to_string(),
            source,
        })
    }
}
