//! mailcow-exporter - Prometheus exporter for the mailcow management API
//!
//! Polls the mailcow read API on a fixed interval and republishes container
//! health, storage usage and object counts as Prometheus gauges.

pub mod api;
pub mod app;
pub mod cli;
pub mod collector;
pub mod config;
pub mod gauges;
pub mod scheduler;
pub mod size;
pub mod status;
pub mod task_manager;

pub use collector::{CollectionSummary, MetricsCollector};
pub use gauges::{GaugeId, GaugeRegistry};
pub use size::parse_size;
pub use status::{classify_state, match_container_key, ServiceKind, ServiceStatus};
