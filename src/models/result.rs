//! Benchmark result data models
//!
//! Contains the immutable record produced at the end of each run and
//! the display row handed to presentation layers.

use crate::util::units::{format_mhz, format_score};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Display format for result timestamps (local time, second precision)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Complete result of one benchmark run
///
/// Built once by the orchestrator when a run finishes and never modified
/// afterwards; fields are only reachable through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    timestamp: DateTime<Local>,
    processor: String,
    mean_speed_mhz: f64,
    score: u32,
    metrics: RunMetrics,
}

/// Raw measurements behind a score
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Sum of every worker counter after shutdown
    pub total_operations: u64,
    /// Number of workers that took part
    pub worker_count: usize,
    /// Time from pool start to the end of the window
    #[serde(with = "duration_serde")]
    pub elapsed_time: Duration,
    /// Number of frequency samples collected
    pub sample_count: usize,
    /// Workers that had to be killed after the grace period
    pub forced_stops: usize,
}

/// One row of the results table, already formatted for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub timestamp: String,
    pub processor: String,
    pub mean_speed: String,
    pub score: String,
}

impl BenchmarkResult {
    /// Create a result stamped with the current local time
    pub fn new(processor: String, mean_speed_mhz: f64, score: u32, metrics: RunMetrics) -> Self {
        Self::with_timestamp(Local::now(), processor, mean_speed_mhz, score, metrics)
    }

    /// Create a result with an explicit timestamp
    pub fn with_timestamp(
        timestamp: DateTime<Local>,
        processor: String,
        mean_speed_mhz: f64,
        score: u32,
        metrics: RunMetrics,
    ) -> Self {
        Self {
            timestamp,
            processor,
            mean_speed_mhz,
            score,
            metrics,
        }
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn processor(&self) -> &str {
        &self.processor
    }

    pub fn mean_speed_mhz(&self) -> f64 {
        self.mean_speed_mhz
    }

    /// Score in the closed range [0, 1000]
    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// Format the result as a results-table row
    pub fn to_row(&self) -> ResultRow {
        ResultRow {
            timestamp: self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            processor: self.processor.clone(),
            mean_speed: format_mhz(self.mean_speed_mhz),
            score: format_score(self.score),
        }
    }

    /// Get a human-readable one-line summary of the result
    pub fn summary(&self) -> String {
        let row = self.to_row();
        format!(
            "{} - {} - {} - {}",
            row.timestamp, row.processor, row.mean_speed, row.score
        )
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
