//! Data models module
//!
//! Contains the benchmark result record and its display row.

pub mod result;

// Re-export commonly used types
pub use result::{BenchmarkResult, ResultRow, RunMetrics, TIMESTAMP_FORMAT};
