//! Results persistence module
//!
//! Keeps the history of finished runs in a versioned JSON file, newest
//! last, rotated at [`MAX_RESULTS_HISTORY`] entries.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::BenchmarkResult;
use crate::{CpuBenchError, Result, APP_NAME, MAX_RESULTS_HISTORY, RESULTS_FILE};

const RESULTS_FILE_VERSION: u32 = 1;

/// Per-user data directory for this application
pub fn app_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        CpuBenchError::PersistenceError("Unable to determine data directory".to_string())
    })?;
    Ok(data_dir.join(APP_NAME))
}

/// Results storage manager
#[derive(Debug, Clone)]
pub struct ResultsStorage {
    results_path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResultsFile {
    version: u32,
    results: Vec<BenchmarkResult>,
}

impl ResultsStorage {
    /// Storage at the standard location, `<data dir>/cpubench/results.json`
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(app_data_dir()?.join(RESULTS_FILE)))
    }

    pub fn with_path(results_path: impl Into<PathBuf>) -> Self {
        Self {
            results_path: results_path.into(),
        }
    }

    pub fn results_path(&self) -> &Path {
        &self.results_path
    }

    /// Load all results, oldest first; a missing file is an empty history
    pub fn load_results(&self) -> Result<Vec<BenchmarkResult>> {
        if !self.results_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.results_path).map_err(|e| {
            CpuBenchError::PersistenceError(format!(
                "Failed to read results file {}: {}",
                self.results_path.display(),
                e
            ))
        })?;

        let results_file: ResultsFile = serde_json::from_str(&content).map_err(|e| {
            CpuBenchError::PersistenceError(format!(
                "Failed to parse results file {}: {}",
                self.results_path.display(),
                e
            ))
        })?;

        if results_file.version != RESULTS_FILE_VERSION {
            return Err(CpuBenchError::PersistenceError(format!(
                "Unsupported results file version {} in {}",
                results_file.version,
                self.results_path.display()
            )));
        }

        Ok(results_file.results)
    }

    /// Append a result, dropping the oldest entries beyond the history cap
    pub fn append_result(&self, result: BenchmarkResult) -> Result<()> {
        let mut results = self.load_results()?;
        results.push(result);

        if results.len() > MAX_RESULTS_HISTORY {
            let excess = results.len() - MAX_RESULTS_HISTORY;
            results.drain(..excess);
        }

        self.save_results(results)
    }

    fn save_results(&self, results: Vec<BenchmarkResult>) -> Result<()> {
        if let Some(parent) = self.results_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CpuBenchError::PersistenceError(format!(
                    "Failed to create results directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let count = results.len();
        let content = serde_json::to_string_pretty(&ResultsFile {
            version: RESULTS_FILE_VERSION,
            results,
        })?;

        fs::write(&self.results_path, content).map_err(|e| {
            CpuBenchError::PersistenceError(format!(
                "Failed to write results file {}: {}",
                self.results_path.display(),
                e
            ))
        })?;

        debug!(path = %self.results_path.display(), count, "results saved");
        Ok(())
    }

    pub fn count_results(&self) -> Result<usize> {
        Ok(self.load_results()?.len())
    }

    /// Remove every stored result
    pub fn clear_results(&self) -> Result<()> {
        if self.results_path.exists() {
            fs::remove_file(&self.results_path).map_err(|e| {
                CpuBenchError::PersistenceError(format!(
                    "Failed to remove results file {}: {}",
                    self.results_path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// The most recent `count` results, oldest first
    pub fn get_recent_results(&self, count: usize) -> Result<Vec<BenchmarkResult>> {
        let mut results = self.load_results()?;
        if results.len() > count {
            results.drain(..results.len() - count);
        }
        Ok(results)
    }
}
