//! Lightweight in-process metrics for policy calls.
//!
//! Counters and histograms are stored as atomics and rendered in Prometheus
//! text format by whoever embeds the controller.

pub mod metrics;

pub use metrics::ControlMetrics;
