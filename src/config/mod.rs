//! Configuration management module
//!
//! Handles loading, saving, and validation of the run configuration.

use crate::{CpuBenchError, Result, APP_NAME, CONFIG_FILE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod persistence;

/// Length of the measurement window
pub const DEFAULT_DURATION: Duration = Duration::from_secs(30);
/// Generator iterations per worker pass
pub const DEFAULT_INTENSITY: u64 = 100_000_000;
/// Telemetry sampler cadence
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);
/// Grace period before workers are force-stopped
pub const DEFAULT_TERM_TIMEOUT: Duration = Duration::from_secs(5);
/// Operation count that maps to a full score of 1000
pub const DEFAULT_REFERENCE_OPS: u64 = 1_000_000_000;

const MAX_DURATION: Duration = Duration::from_secs(3600);
const MAX_TERM_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_WORKERS: usize = 1024;

/// Run configuration containing all benchmark parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Wall-clock length of the test window
    #[serde(with = "humantime_duration")]
    pub duration: Duration,
    /// Generator iterations per worker pass
    pub intensity: u64,
    /// Time between frequency samples
    #[serde(with = "humantime_duration")]
    pub sample_interval: Duration,
    /// Grace period for workers to exit before they are killed
    #[serde(with = "humantime_duration")]
    pub term_timeout: Duration,
    /// Scaling denominator for the score
    pub reference_ops: u64,
    /// Explicit worker count; one per logical processor when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    /// Generator passes per worker before it exits on its own; unbounded when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_passes: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION,
            intensity: DEFAULT_INTENSITY,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            term_timeout: DEFAULT_TERM_TIMEOUT,
            reference_ops: DEFAULT_REFERENCE_OPS,
            workers: None,
            max_passes: None,
        }
    }
}

impl RunConfig {
    /// Create a new run configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.duration.is_zero() {
            return Err(CpuBenchError::ConfigError(
                "Duration must be greater than 0".to_string(),
            ));
        }

        if self.duration > MAX_DURATION {
            return Err(CpuBenchError::ConfigError(format!(
                "Duration too long: {}s (max: {}s)",
                self.duration.as_secs(),
                MAX_DURATION.as_secs()
            )));
        }

        if self.sample_interval.is_zero() || self.sample_interval > self.duration {
            return Err(CpuBenchError::ConfigError(
                "Sample interval must be greater than 0 and no longer than the duration"
                    .to_string(),
            ));
        }

        if self.term_timeout > MAX_TERM_TIMEOUT {
            return Err(CpuBenchError::ConfigError(format!(
                "Termination timeout too long: {}s (max: {}s)",
                self.term_timeout.as_secs(),
                MAX_TERM_TIMEOUT.as_secs()
            )));
        }

        if self.intensity == 0 {
            return Err(CpuBenchError::ConfigError(
                "Intensity must be greater than 0".to_string(),
            ));
        }

        if self.reference_ops == 0 {
            return Err(CpuBenchError::ConfigError(
                "Reference operations must be greater than 0".to_string(),
            ));
        }

        if let Some(workers) = self.workers {
            if workers == 0 || workers > MAX_WORKERS {
                return Err(CpuBenchError::ConfigError(format!(
                    "Worker count must be between 1 and {} (omit it to use every logical processor)",
                    MAX_WORKERS
                )));
            }
        }

        if self.max_passes == Some(0) {
            return Err(CpuBenchError::ConfigError(
                "Max passes must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Number of workers to launch given the host's logical processor count
    pub fn resolve_worker_count(&self, detected: usize) -> usize {
        self.workers.unwrap_or(detected).max(1)
    }

    /// Set the test duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the generator iterations per pass
    pub fn with_intensity(mut self, intensity: u64) -> Self {
        self.intensity = intensity;
        self
    }

    /// Set the sampler cadence
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Set the termination grace period
    pub fn with_term_timeout(mut self, timeout: Duration) -> Self {
        self.term_timeout = timeout;
        self
    }

    /// Set the score scaling denominator
    pub fn with_reference_ops(mut self, reference_ops: u64) -> Self {
        self.reference_ops = reference_ops;
        self
    }

    /// Set an explicit worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Limit how many generator passes each worker runs
    pub fn with_max_passes(mut self, passes: u64) -> Self {
        self.max_passes = Some(passes);
        self
    }

    /// Load configuration from the standard config file location
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| {
            CpuBenchError::ConfigError(format!(
                "Failed to read config file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            CpuBenchError::ConfigError(format!(
                "Failed to parse config file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to the standard config file location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CpuBenchError::ConfigError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        fs::write(config_path, self.to_toml()?).map_err(|e| {
            CpuBenchError::ConfigError(format!(
                "Failed to write config file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the standard configuration file path
    /// Uses $CONFIG_HOME/cpubench/cpubench.toml
    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            CpuBenchError::ConfigError("Unable to determine config directory".to_string())
        })?;

        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}

// Durations are stored as "30s" / "500ms" rather than {secs, nanos} tables
mod humantime_duration {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_reference_constants() {
        let config = RunConfig::default();
        assert_eq!(config.duration, Duration::from_secs(30));
        assert_eq!(config.intensity, 100_000_000);
        assert_eq!(config.sample_interval, Duration::from_millis(500));
        assert_eq!(config.term_timeout, Duration::from_secs(5));
        assert_eq!(config.reference_ops, 1_000_000_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(RunConfig::new().with_duration(Duration::ZERO).validate().is_err());
        assert!(RunConfig::new().with_intensity(0).validate().is_err());
        assert!(RunConfig::new().with_reference_ops(0).validate().is_err());
        assert!(RunConfig::new().with_workers(0).validate().is_err());
        assert!(RunConfig::new().with_max_passes(0).validate().is_err());
        assert!(RunConfig::new()
            .with_sample_interval(Duration::from_secs(60))
            .validate()
            .is_err());
        assert!(RunConfig::new()
            .with_term_timeout(Duration::from_secs(120))
            .validate()
            .is_err());
    }

    #[test]
    fn test_zero_term_timeout_is_allowed() {
        let config = RunConfig::new().with_term_timeout(Duration::ZERO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_worker_count() {
        let auto = RunConfig::default();
        assert_eq!(auto.resolve_worker_count(8), 8);
        assert_eq!(auto.resolve_worker_count(0), 1);

        let explicit = RunConfig::default().with_workers(3);
        assert_eq!(explicit.resolve_worker_count(8), 3);
        assert_eq!(explicit.resolve_worker_count(0), 3);
    }

    #[test]
    fn test_toml_uses_readable_durations() {
        let config = RunConfig::default().with_workers(4);
        let toml_str = config.to_toml().unwrap();
        assert!(toml_str.contains("duration = \"30s\""));
        assert!(toml_str.contains("sample_interval = \"500ms\""));
        assert!(toml_str.contains("workers = 4"));
        assert!(!toml_str.contains("max_passes"));

        let parsed: RunConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let parsed: RunConfig = toml::from_str("duration = \"10s\"\n").unwrap();
        assert_eq!(parsed.duration, Duration::from_secs(10));
        assert_eq!(parsed.intensity, DEFAULT_INTENSITY);
        assert_eq!(parsed.workers, None);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("cpubench.toml");

        let config = RunConfig::default()
            .with_duration(Duration::from_secs(5))
            .with_max_passes(2);
        config.save_to(&path).unwrap();

        let loaded = RunConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = RunConfig::load_from(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, RunConfig::default());
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cpubench.toml");
        fs::write(&path, "intensity = 0\n").unwrap();
        assert!(matches!(
            RunConfig::load_from(&path),
            Err(CpuBenchError::ConfigError(_))
        ));
    }

    #[test]
    fn test_config_file_path() {
        let path = RunConfig::config_file_path();
        assert!(path.is_ok());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("cpubench"));
        assert!(path.to_string_lossy().ends_with("cpubench.toml"));
    }
}
