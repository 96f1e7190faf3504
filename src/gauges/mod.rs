//! # Gauge Registry
//!
//! This module owns every metric the exporter publishes.
//!
//! ## Components:
//!
//! - **`GaugeId`**: A closed set of identifiers, one per published gauge,
//!   each with a fixed Prometheus name and help text.
//!
//! - **`GaugeRegistry`**: Registers all gauges once at construction on its own
//!   `PrometheusRecorder` and hands out atomic updates and renders. The
//!   recorder is never installed globally, so independent registries can live
//!   side by side (one per test, for instance).
//!
//! - **`MetricsServer`**: (Defined in `server.rs`) An `axum`-based web server
//!   that exposes the `/metrics` endpoint for Prometheus to scrape.

use crate::status::ServiceKind;
use metrics::{Gauge, Key, Level, Metadata, Recorder};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::collections::{BTreeMap, HashMap};

pub mod server;

/// A pending write of `value` to the gauge `id`.
pub type GaugeUpdate = (GaugeId, f64);

/// Identifies one gauge in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GaugeId {
    VmailUsedPercent,
    VmailTotalBytes,
    VmailUsedBytes,
    SolrDocuments,
    SolrSizeBytes,
    Mailboxes,
    MailboxMessages,
    Aliases,
    MailQueue,
    Quarantine,
    SyncJobs,
    Domains,
    ForwardingHosts,
    ContainerUp(ServiceKind),
    CollectionFailedFetches,
}

impl GaugeId {
    /// Every gauge the exporter publishes.
    pub fn all() -> Vec<GaugeId> {
        let mut ids = vec![
            GaugeId::VmailUsedPercent,
            GaugeId::VmailTotalBytes,
            GaugeId::VmailUsedBytes,
            GaugeId::SolrDocuments,
            GaugeId::SolrSizeBytes,
            GaugeId::Mailboxes,
            GaugeId::MailboxMessages,
            GaugeId::Aliases,
            GaugeId::MailQueue,
            GaugeId::Quarantine,
            GaugeId::SyncJobs,
            GaugeId::Domains,
            GaugeId::ForwardingHosts,
        ];
        ids.extend(ServiceKind::all().map(GaugeId::ContainerUp));
        ids.push(GaugeId::CollectionFailedFetches);
        ids
    }

    pub fn name(self) -> &'static str {
        match self {
            GaugeId::VmailUsedPercent => "mailcow_vmail_used_storage_percent",
            GaugeId::VmailTotalBytes => "mailcow_vmail_available_storage_bytes",
            GaugeId::VmailUsedBytes => "mailcow_vmail_used_storage_bytes",
            GaugeId::SolrDocuments => "mailcow_solr_documents_total",
            GaugeId::SolrSizeBytes => "mailcow_solr_size_bytes",
            GaugeId::Mailboxes => "mailcow_mailboxes_total",
            GaugeId::MailboxMessages => "mailcow_mailboxes_messages_total",
            GaugeId::Aliases => "mailcow_aliases_total",
            GaugeId::MailQueue => "mailcow_mailqueue_mails_total",
            GaugeId::Quarantine => "mailcow_quarantine_mails_total",
            GaugeId::SyncJobs => "mailcow_sync_jobs_total",
            GaugeId::Domains => "mailcow_domains_total",
            GaugeId::ForwardingHosts => "mailcow_forwarding_hosts_total",
            GaugeId::ContainerUp(kind) => kind.metric_name(),
            GaugeId::CollectionFailedFetches => "mailcow_exporter_collection_failed_fetches",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            GaugeId::VmailUsedPercent => "Shows the used storage from vmail in percent",
            GaugeId::VmailTotalBytes => "Shows the available storage for vmail in bytes",
            GaugeId::VmailUsedBytes => "Shows the used storage for vmail in bytes",
            GaugeId::SolrDocuments => "Total number of solr documents",
            GaugeId::SolrSizeBytes => "Size of solr in bytes",
            GaugeId::Mailboxes => "Total number of mailboxes",
            GaugeId::MailboxMessages => "Total number of messages",
            GaugeId::Aliases => "Total number of aliases",
            GaugeId::MailQueue => "Total number of mails in mail queue",
            GaugeId::Quarantine => "Total number of mails in quarantine",
            GaugeId::SyncJobs => "Total number of sync jobs",
            GaugeId::Domains => "Total number of domains",
            GaugeId::ForwardingHosts => "Total number of forwarding hosts",
            GaugeId::ContainerUp(kind) => kind.help(),
            GaugeId::CollectionFailedFetches => {
                "Number of API paths that failed during the last collection pass"
            }
        }
    }
}

/// The fixed set of gauges published by the exporter.
///
/// Every handle writes to an atomic cell inside the recorder's storage, so
/// rendering concurrently with an update never observes a torn value.
pub struct GaugeRegistry {
    gauges: HashMap<GaugeId, Gauge>,
    handle: PrometheusHandle,
}

impl std::fmt::Debug for GaugeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaugeRegistry")
            .field("gauges", &self.gauges.len())
            .finish_non_exhaustive()
    }
}

impl GaugeRegistry {
    /// Creates a registry with every [`GaugeId`] described and registered.
    pub fn new() -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let metadata = Metadata::new(module_path!(), Level::INFO, Some(module_path!()));

        let gauges = GaugeId::all()
            .into_iter()
            .map(|id| {
                recorder.describe_gauge(id.name().into(), None, id.help().into());
                let gauge = recorder.register_gauge(&Key::from_static_name(id.name()), &metadata);
                (id, gauge)
            })
            .collect();

        Self { gauges, handle }
    }

    /// Overwrites the current value of a gauge.
    pub fn set(&self, id: GaugeId, value: f64) {
        if let Some(gauge) = self.gauges.get(&id) {
            gauge.set(value);
        }
    }

    /// Applies a batch of updates produced from a single API payload.
    pub fn apply(&self, updates: &[GaugeUpdate]) {
        for (id, value) in updates {
            self.set(*id, *value);
        }
    }

    /// Renders every gauge in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Reads back the current value of every gauge, keyed by metric name.
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        self.render()
            .lines()
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let (name, value) = line.rsplit_once(' ')?;
                Some((name.to_string(), value.parse().ok()?))
            })
            .collect()
    }

    /// Reads back the current value of a single gauge.
    pub fn value(&self, id: GaugeId) -> Option<f64> {
        self.snapshot().get(id.name()).copied()
    }

    /// The metric names known to this registry.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.gauges.keys().map(|id| id.name()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for GaugeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
