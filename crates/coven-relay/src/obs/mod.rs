//! Lightweight in-process metrics (dependency-free).
//!
//! Counts delivery attempts, routing denials, and connection churn so the
//! relay's behaviour can be observed without a log scrape.

pub mod metrics;

pub use metrics::RelayMetrics;
