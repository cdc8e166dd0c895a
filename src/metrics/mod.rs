//! Metrics for the lobby session
//!
//! Sessions record into a private Prometheus registry that the embedding
//! application can render or merge into its own exporter.

pub mod collector;

pub use collector::{ConnectionMetrics, LobbyMetrics, MetricsCollector};
