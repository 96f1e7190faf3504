//! The collection pass.
//!
//! A pass fetches every [`Endpoint`], turns each payload into a batch of
//! gauge updates and applies the batch. Payload extraction is pure and lives
//! in the `extract_*` functions below; [`MetricsCollector`] only sequences the
//! fetches, logs failures and writes to the registry.

use crate::{
    api::{Endpoint, MailcowApi},
    gauges::{GaugeId, GaugeRegistry, GaugeUpdate},
    size::{parse_size, SizeParseError},
    status::{classify_state, match_container_key},
};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, instrument, trace, warn};

/// A field in an otherwise valid payload that could not be interpreted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("field `{field}` has unexpected JSON type {found}")]
    WrongType { field: String, found: &'static str },

    #[error("field `{field}` value {value:?} is not a number")]
    NotNumeric { field: String, value: String },

    #[error("field `{field}`: {source}")]
    Size {
        field: String,
        #[source]
        source: SizeParseError,
    },

    #[error("container `{container}` has no `state`")]
    MissingState { container: String },
}

/// The updates extracted from one payload plus any fields that were skipped.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Extracted {
    pub updates: Vec<GaugeUpdate>,
    pub errors: Vec<FieldError>,
}

impl Extracted {
    fn set(&mut self, id: GaugeId, value: f64) {
        self.updates.push((id, value));
    }

    /// Keeps the update for a readable field and the error for an unreadable one.
    fn record(&mut self, id: GaugeId, field: Result<Option<f64>, FieldError>) {
        match field {
            Ok(Some(value)) => self.set(id, value),
            Ok(None) => {}
            Err(e) => self.errors.push(e),
        }
    }
}

/// Outcome of one collection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub duration: Duration,
}

/// Polls the mailcow API and publishes the results to a [`GaugeRegistry`].
pub struct MetricsCollector {
    api: Arc<dyn MailcowApi>,
    registry: Arc<GaugeRegistry>,
}

impl MetricsCollector {
    pub fn new(api: Arc<dyn MailcowApi>, registry: Arc<GaugeRegistry>) -> Self {
        Self { api, registry }
    }

    /// Runs one full collection pass.
    ///
    /// Failures are contained per endpoint: a failed fetch leaves that
    /// endpoint's gauges at their previous values, and an unreadable field
    /// leaves only its own gauge untouched.
    #[instrument(skip_all)]
    pub async fn collect_once(&self) -> CollectionSummary {
        let start = Instant::now();
        let mut succeeded = 0;
        let mut failed = 0;

        for endpoint in Endpoint::ALL {
            let path = endpoint.path();
            let payload = match self.api.fetch(path).await {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(path, error = %e, "Failed to fetch API resource, keeping previous values");
                    failed += 1;
                    continue;
                }
            };

            if let Some(message) = api_error_message(&payload) {
                warn!(path, msg = message, "API returned an error, keeping previous values");
                failed += 1;
                continue;
            }

            let extracted = extract(endpoint, &payload);
            for error in &extracted.errors {
                warn!(path, error = %error, "Skipping unreadable field");
            }
            trace!(path, updates = extracted.updates.len(), "Applying gauge updates");
            self.registry.apply(&extracted.updates);
            succeeded += 1;
        }

        self.registry.set(GaugeId::CollectionFailedFetches, failed as f64);

        let summary = CollectionSummary {
            succeeded,
            failed,
            duration: start.elapsed(),
        };
        info!(
            succeeded,
            failed,
            duration_ms = summary.duration.as_millis() as u64,
            "Collection pass finished"
        );
        debug!(snapshot = ?self.registry.snapshot(), "Gauge snapshot");
        summary
    }
}

/// Returns the message of mailcow's `{"type": "error", "msg": ...}` envelope.
pub fn api_error_message(payload: &Value) -> Option<&str> {
    let object = payload.as_object()?;
    if object.get("type")?.as_str()? != "error" {
        return None;
    }
    Some(
        object
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or("unspecified error"),
    )
}

/// Extracts the gauge updates carried by the payload of `endpoint`.
pub fn extract(endpoint: Endpoint, payload: &Value) -> Extracted {
    match endpoint {
        Endpoint::Containers => extract_containers(payload),
        Endpoint::Vmail => extract_vmail(payload),
        Endpoint::Solr => extract_solr(payload),
        Endpoint::Mailboxes => extract_mailboxes(payload),
        Endpoint::Aliases => extract_count(GaugeId::Aliases, "aliases", payload),
        Endpoint::MailQueue => extract_count(GaugeId::MailQueue, "mail queue", payload),
        Endpoint::Quarantine => extract_count(GaugeId::Quarantine, "quarantine", payload),
        Endpoint::SyncJobs => extract_count(GaugeId::SyncJobs, "sync jobs", payload),
        Endpoint::Domains => extract_count(GaugeId::Domains, "domains", payload),
        Endpoint::ForwardingHosts => {
            extract_count(GaugeId::ForwardingHosts, "forwarding hosts", payload)
        }
    }
}

/// Container states arrive keyed by container name, either as one object or
/// as a list of such objects.
pub fn extract_containers(payload: &Value) -> Extracted {
    let mut out = Extracted::default();
    let objects: Vec<&Map<String, Value>> = match payload {
        Value::Object(map) => vec![map],
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        other => {
            out.errors.push(FieldError::WrongType {
                field: "containers".to_string(),
                found: json_type(other),
            });
            return out;
        }
    };

    for (name, info) in objects.into_iter().flatten() {
        let Some(kind) = match_container_key(name) else {
            trace!(container = %name, "Ignoring unknown container");
            continue;
        };
        match info.get("state").and_then(Value::as_str) {
            Some(state) => out.set(GaugeId::ContainerUp(kind), classify_state(state).as_gauge_value()),
            None => out.errors.push(FieldError::MissingState {
                container: name.clone(),
            }),
        }
    }
    out
}

pub fn extract_vmail(payload: &Value) -> Extracted {
    let mut out = Extracted::default();
    out.record(GaugeId::VmailUsedPercent, percent_field(payload, "used_percent"));
    out.record(GaugeId::VmailTotalBytes, size_field(payload, "total"));
    out.record(GaugeId::VmailUsedBytes, size_field(payload, "used"));
    out
}

pub fn extract_solr(payload: &Value) -> Extracted {
    let mut out = Extracted::default();
    out.record(GaugeId::SolrDocuments, numeric_field(payload, "solr_documents"));
    out.record(GaugeId::SolrSizeBytes, size_field(payload, "solr_size"));
    out
}

/// Counts mailboxes and sums their `messages` fields.
///
/// A mailbox without `messages` contributes 0. If any mailbox carries a
/// value that is not a number, the total is left out of this batch.
pub fn extract_mailboxes(payload: &Value) -> Extracted {
    let mut out = Extracted::default();
    let mailboxes: Vec<&Value> = match payload {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        other => {
            out.errors.push(FieldError::WrongType {
                field: "mailboxes".to_string(),
                found: json_type(other),
            });
            return out;
        }
    };
    out.set(GaugeId::Mailboxes, mailboxes.len() as f64);

    let mut total = 0.0;
    let mut readable = true;
    for mailbox in &mailboxes {
        match numeric_field(mailbox, "messages") {
            Ok(Some(count)) => total += count,
            Ok(None) => {}
            Err(e) => {
                out.errors.push(e);
                readable = false;
            }
        }
    }
    if readable {
        out.set(GaugeId::MailboxMessages, total);
    }
    out
}

/// Sets `id` to the number of entries in a list payload.
///
/// mailcow answers some empty collections with `{}`, so objects are counted
/// by their number of keys.
pub fn extract_count(id: GaugeId, field: &str, payload: &Value) -> Extracted {
    let mut out = Extracted::default();
    match payload {
        Value::Array(items) => out.set(id, items.len() as f64),
        Value::Object(map) => out.set(id, map.len() as f64),
        other => out.errors.push(FieldError::WrongType {
            field: field.to_string(),
            found: json_type(other),
        }),
    }
    out
}

/// Reads a plain number, accepting numeric strings. Absent or `null` fields
/// yield `Ok(None)`.
fn numeric_field(payload: &Value, field: &str) -> Result<Option<f64>, FieldError> {
    match payload.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => s.trim().parse::<f64>().map(Some).map_err(|_| FieldError::NotNumeric {
            field: field.to_string(),
            value: s.clone(),
        }),
        Some(other) => Err(FieldError::WrongType {
            field: field.to_string(),
            found: json_type(other),
        }),
    }
}

/// Reads a percentage such as `"42%"`.
fn percent_field(payload: &Value, field: &str) -> Result<Option<f64>, FieldError> {
    match payload.get(field) {
        Some(Value::String(s)) => {
            let digits = s.trim().trim_end_matches('%').trim_end();
            digits.parse::<f64>().map(Some).map_err(|_| FieldError::NotNumeric {
                field: field.to_string(),
                value: s.clone(),
            })
        }
        _ => numeric_field(payload, field),
    }
}

/// Reads a byte size such as `"4.2GB"`. Bare numbers are taken as bytes.
fn size_field(payload: &Value, field: &str) -> Result<Option<f64>, FieldError> {
    match payload.get(field) {
        Some(Value::String(s)) => parse_size(s)
            .map(|bytes| Some(bytes as f64))
            .map_err(|source| FieldError::Size {
                field: field.to_string(),
                source,
            }),
        _ => numeric_field(payload, field),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
