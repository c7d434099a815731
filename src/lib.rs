//! cpubench - Multi-core CPU throughput benchmark
//!
//! Runs one CPU-bound worker per logical processor for a fixed window,
//! samples the processor clock alongside, and converts the completed
//! operation count into a score out of 1000.

use thiserror::Error;

// Public re-exports
pub mod app;
pub mod bench;
pub mod config;
pub mod console;
pub mod logging;
pub mod models;
pub mod report;
pub mod system;
pub mod util;

/// Common error type
#[derive(Debug, Error)]
pub enum CpuBenchError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// Configuration validation or parsing error
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// A worker thread could not be launched
    #[error("Failed to spawn worker {id}: {source}")]
    WorkerSpawnFailure {
        /// Index of the worker that failed to start
        id: usize,
        /// Underlying OS error
        source: std::io::Error,
    },
    /// A worker terminated abnormally; its count cannot be trusted
    #[error("Worker error: {0}")]
    WorkerFailure(String),
    /// A start request arrived while another run was active
    #[error("A benchmark run is already in progress")]
    RunInProgress,
    /// Results persistence error
    #[error("Results persistence error: {0}")]
    PersistenceError(String),
    /// TUI rendering or interaction error
    #[error("TUI error: {0}")]
    TuiError(String),
}

impl From<serde_json::Error> for CpuBenchError {
    fn from(err: serde_json::Error) -> Self {
        CpuBenchError::PersistenceError(format!("JSON serialization error: {}", err))
    }
}

impl From<toml::de::Error> for CpuBenchError {
    fn from(err: toml::de::Error) -> Self {
        CpuBenchError::ConfigError(format!("TOML parsing error: {}", err))
    }
}

impl From<toml::ser::Error> for CpuBenchError {
    fn from(err: toml::ser::Error) -> Self {
        CpuBenchError::ConfigError(format!("TOML serialization error: {}", err))
    }
}

/// Result type alias for cpubench operations
pub type Result<T> = std::result::Result<T, CpuBenchError>;

/// Error handling utilities
pub mod error {
    use super::CpuBenchError;

    /// Convert error to user-friendly message with suggestions
    pub fn user_friendly_message(error: &CpuBenchError) -> String {
        match error {
            CpuBenchError::WorkerSpawnFailure { .. } => {
                "Could not start benchmark workers. Close other programs or lower the worker count."
                    .to_string()
            }
            CpuBenchError::WorkerFailure(_) => {
                "A benchmark worker crashed; the run was discarded. Please try again.".to_string()
            }
            CpuBenchError::RunInProgress => {
                "A test is already running. Wait for it to finish.".to_string()
            }
            CpuBenchError::ConfigError(msg) => {
                format!("Configuration error: {}. Check your settings.", msg)
            }
            CpuBenchError::PersistenceError(_) => {
                "Failed to save results. Check disk space and permissions.".to_string()
            }
            _ => error.to_string(),
        }
    }

    /// Whether the controlling surface can simply offer a retry
    pub fn is_retryable(error: &CpuBenchError) -> bool {
        !matches!(error, CpuBenchError::ConfigError(_))
    }
}

// Common types and constants
pub const APP_NAME: &str = "cpubench";
pub const CONFIG_FILE: &str = "cpubench.toml";
pub const RESULTS_FILE: &str = "results.json";
pub const LOG_FILE: &str = "cpubench.log";
pub const MAX_RESULTS_HISTORY: usize = 100;
/// Processor label used when the host cannot identify its CPU
pub const UNKNOWN_CPU: &str = "Unknown CPU";
