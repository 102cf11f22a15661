//! Storage adapters wrap a [`BlockReader`](super::BlockReader) to observe its usage.
//!
//! Includes [performance metrics](performance_metrics::PerformanceMetricsBlockReader) and [usage log](usage_log::UsageLogBlockReader) adapters.

pub mod performance_metrics;
pub mod usage_log;
