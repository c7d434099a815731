//! Benchmark orchestrator
//!
//! Drives one run through `Idle -> Running -> Finalizing -> Idle`: starts
//! the worker pool and the telemetry sampler together, holds the fixed
//! window open, shuts every worker down, then scores the run and hands
//! the result to the reporter.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

use super::sampler::{SpeedSample, TelemetrySampler};
use super::worker::WorkerPool;
use crate::config::RunConfig;
use crate::models::{BenchmarkResult, RunMetrics};
use crate::report::ResultReporter;
use crate::system::{FrequencySource, HostInfo, SysinfoProbe};
use crate::{CpuBenchError, Result, UNKNOWN_CPU};

/// Cadence of live progress updates
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

/// Upper bound of the score scale
pub const MAX_SCORE: u32 = 1000;

/// Lifecycle phase of the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running,
    Finalizing,
}

/// Live view of a run in progress
///
/// The operation count is a display-only snapshot read while workers are
/// still running; it never feeds the score.
#[derive(Debug, Clone, PartialEq)]
pub struct RunProgress {
    pub elapsed: Duration,
    pub duration: Duration,
    pub operations: u64,
    pub latest_mhz: f64,
    pub workers: usize,
}

impl RunProgress {
    /// Completed share of the window, in [0, 1]
    pub fn fraction(&self) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.elapsed)
    }
}

/// Scale a completed operation count to the `[0, MAX_SCORE]` range
///
/// Linear in `total_operations` and truncated toward zero; anything at or
/// above `reference_ops` scores the maximum.
pub fn compute_score(total_operations: u64, reference_ops: u64) -> u32 {
    let scaled =
        total_operations as u128 * MAX_SCORE as u128 / reference_ops.max(1) as u128;
    scaled.min(MAX_SCORE as u128) as u32
}

/// Arithmetic mean of the sampled speeds, 0 when nothing was sampled
pub fn mean_speed(samples: &[SpeedSample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s.mhz).sum::<f64>() / samples.len() as f64
}

/// Runs benchmarks, one at a time
pub struct BenchmarkRunner {
    config: RunConfig,
    frequency: Arc<dyn FrequencySource>,
    host: Arc<dyn HostInfo>,
    reporter: ResultReporter,
    phase: Arc<Mutex<RunPhase>>,
}

/// Holds the runner out of `Idle` until dropped
struct RunGuard {
    phase: Arc<Mutex<RunPhase>>,
}

impl RunGuard {
    fn set(&self, phase: RunPhase) {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner()) = phase;
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.set(RunPhase::Idle);
    }
}

impl BenchmarkRunner {
    pub fn new(
        config: RunConfig,
        frequency: Arc<dyn FrequencySource>,
        host: Arc<dyn HostInfo>,
        reporter: ResultReporter,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            frequency,
            host,
            reporter,
            phase: Arc::new(Mutex::new(RunPhase::Idle)),
        })
    }

    /// Runner backed by the host's real processor
    pub fn with_system_probe(config: RunConfig, reporter: ResultReporter) -> Result<Self> {
        let probe = Arc::new(SysinfoProbe::new());
        Self::new(config, probe.clone(), probe, reporter)
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn phase(&self) -> RunPhase {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_running(&self) -> bool {
        self.phase() != RunPhase::Idle
    }

    /// Launch a run in the background
    ///
    /// Fails with [`CpuBenchError::RunInProgress`] without touching the
    /// active run if one is already underway. The result is delivered
    /// through the reporter and also returned by the handle.
    pub fn start(
        self: &Arc<Self>,
        progress: Option<mpsc::Sender<RunProgress>>,
    ) -> Result<JoinHandle<Result<BenchmarkResult>>> {
        let guard = self.begin()?;
        let runner = Arc::clone(self);
        Ok(tokio::spawn(async move { runner.execute(guard, progress).await }))
    }

    /// Run to completion on the current task
    pub async fn run(
        &self,
        progress: Option<mpsc::Sender<RunProgress>>,
    ) -> Result<BenchmarkResult> {
        let guard = self.begin()?;
        self.execute(guard, progress).await
    }

    fn begin(&self) -> Result<RunGuard> {
        let mut phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
        if *phase != RunPhase::Idle {
            debug!(phase = ?*phase, "rejecting start request");
            return Err(CpuBenchError::RunInProgress);
        }
        *phase = RunPhase::Running;
        Ok(RunGuard {
            phase: Arc::clone(&self.phase),
        })
    }

    async fn execute(
        &self,
        guard: RunGuard,
        progress: Option<mpsc::Sender<RunProgress>>,
    ) -> Result<BenchmarkResult> {
        let config = &self.config;
        let detected = self.host.logical_processors();
        let worker_count = config.resolve_worker_count(detected);
        if detected == 0 {
            warn!("host reported no processors, falling back to one worker");
        }

        let mut pool = WorkerPool::new(config.intensity, config.max_passes);
        pool.start(worker_count)?;
        let started = Instant::now();
        let sampler = TelemetrySampler::spawn(Arc::clone(&self.frequency), config.sample_interval);
        info!(
            workers = worker_count,
            duration = %humantime::format_duration(config.duration),
            "benchmark run started"
        );

        let deadline = time::Instant::from_std(started + config.duration);
        match progress {
            Some(tx) => {
                let mut ticker = time::interval(PROGRESS_INTERVAL);
                loop {
                    tokio::select! {
                        _ = time::sleep_until(deadline) => break,
                        _ = ticker.tick() => {
                            // Drop the update if the receiver is behind
                            let _ = tx.try_send(RunProgress {
                                elapsed: started.elapsed(),
                                duration: config.duration,
                                operations: pool.total_operations(),
                                latest_mhz: sampler.latest_mhz(),
                                workers: worker_count,
                            });
                        }
                    }
                }
            }
            None => time::sleep_until(deadline).await,
        }

        // Counting ends with the window; joining may take longer
        pool.request_stop();
        let elapsed = started.elapsed();
        guard.set(RunPhase::Finalizing);
        debug!(elapsed_ms = elapsed.as_millis() as u64, "run window closed");

        let samples = sampler.finish().await;
        let term_timeout = config.term_timeout;
        let (pool, shutdown) = tokio::task::spawn_blocking(move || {
            let report = pool.stop_all(term_timeout);
            (pool, report)
        })
        .await
        .map_err(|e| CpuBenchError::WorkerFailure(format!("Worker shutdown task failed: {}", e)))?;

        if !shutdown.panicked.is_empty() {
            return Err(CpuBenchError::WorkerFailure(format!(
                "Workers {:?} panicked, discarding run",
                shutdown.panicked
            )));
        }

        let total_operations: u64 = pool.counters().iter().sum();
        let score = compute_score(total_operations, config.reference_ops);
        let mean_mhz = mean_speed(&samples);
        let processor = self
            .host
            .processor_label()
            .unwrap_or_else(|| UNKNOWN_CPU.to_string());

        let result = BenchmarkResult::new(
            processor,
            mean_mhz,
            score,
            RunMetrics {
                total_operations,
                worker_count,
                elapsed_time: elapsed,
                sample_count: samples.len(),
                forced_stops: shutdown.forced,
            },
        );
        info!(
            total_operations,
            score,
            mean_mhz = format_args!("{:.2}", mean_mhz),
            forced_stops = shutdown.forced,
            "benchmark run finished"
        );

        drop(guard);
        self.reporter.report(result.clone());
        Ok(result)
    }
}
