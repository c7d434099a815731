//! Benchmark worker management system
//!
//! Spawns one OS thread per worker, each looping over generator passes
//! and owning a single operation counter. Shutdown escalates from a
//! graceful stop request to a forced kill and always ends with every
//! thread joined.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::generator::{run_pass, PassOutcome, WorkerCounter};
use crate::{CpuBenchError, Result};

/// Poll period while waiting for workers to exit
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(5);
/// How often a kill is re-signalled to a worker that is still alive
const KILL_RESIGNAL_INTERVAL: Duration = Duration::from_secs(1);

const LEVEL_RUN: u8 = 0;
const LEVEL_STOP: u8 = 1;
const LEVEL_KILL: u8 = 2;

/// Pool-wide shutdown flag observed by every worker
///
/// Workers observe either level before every generator iteration. A
/// worker still running once the grace period is over gets the kill,
/// which is re-signalled until it exits.
#[derive(Debug, Default)]
pub struct ShutdownSignal(AtomicU8);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask workers to exit at their next iteration
    pub fn request_stop(&self) {
        let _ = self.0.compare_exchange(LEVEL_RUN, LEVEL_STOP, Ordering::SeqCst, Ordering::SeqCst);
    }

    /// Force workers to abandon their current pass
    pub fn kill(&self) {
        self.0.store(LEVEL_KILL, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed) >= LEVEL_STOP
    }

    #[inline]
    pub fn is_killed(&self) -> bool {
        self.0.load(Ordering::Relaxed) == LEVEL_KILL
    }
}

/// Worker status for tracking individual worker states
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerStatus {
    /// Worker is executing generator passes
    Running,
    /// Worker used up its pass budget and exited on its own
    Exhausted,
    /// Worker exited after a graceful stop request
    Stopped,
    /// Worker was killed after the grace period
    Killed,
    /// Worker thread panicked
    Panicked(String),
}

/// How a worker thread returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerExit {
    Exhausted,
    Stopped,
    Killed,
}

/// Individual worker information
#[derive(Debug)]
pub struct WorkerInfo {
    /// Unique worker ID
    pub id: usize,
    /// Current status of the worker
    pub status: WorkerStatus,
    counter: Arc<WorkerCounter>,
    handle: Option<JoinHandle<WorkerExit>>,
}

impl WorkerInfo {
    /// Check if the worker thread is still executing
    pub fn is_alive(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Current counter value
    pub fn operations(&self) -> u64 {
        self.counter.get()
    }
}

/// Outcome of [`WorkerPool::stop_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Workers that exited before the grace period ran out
    pub graceful: usize,
    /// Workers that had to be killed
    pub forced: usize,
    /// IDs of workers whose thread panicked
    pub panicked: Vec<usize>,
}

/// Pool of CPU-bound benchmark workers
#[derive(Debug)]
pub struct WorkerPool {
    intensity: u64,
    max_passes: Option<u64>,
    signal: Arc<ShutdownSignal>,
    workers: Vec<WorkerInfo>,
}

impl WorkerPool {
    /// Create an empty pool; `max_passes` of `None` loops until stopped
    pub fn new(intensity: u64, max_passes: Option<u64>) -> Self {
        Self {
            intensity,
            max_passes,
            signal: Arc::new(ShutdownSignal::new()),
            workers: Vec::new(),
        }
    }

    /// Launch `count` workers (at least one)
    ///
    /// If a thread cannot be spawned, the workers already running are
    /// killed and joined before the error is returned.
    pub fn start(&mut self, count: usize) -> Result<()> {
        if !self.workers.is_empty() {
            return Err(CpuBenchError::WorkerFailure(
                "Worker pool has already been started".to_string(),
            ));
        }

        let count = count.max(1);
        for id in 0..count {
            let counter = Arc::new(WorkerCounter::new());
            let signal = Arc::clone(&self.signal);
            let worker_counter = Arc::clone(&counter);
            let intensity = self.intensity;
            let max_passes = self.max_passes;

            let spawned = thread::Builder::new()
                .name(format!("cpubench-worker-{}", id))
                .spawn(move || worker_loop(&worker_counter, intensity, max_passes, &signal));

            match spawned {
                Ok(handle) => self.workers.push(WorkerInfo {
                    id,
                    status: WorkerStatus::Running,
                    counter,
                    handle: Some(handle),
                }),
                Err(source) => {
                    warn!(worker = id, error = %source, "failed to spawn worker, tearing down pool");
                    self.signal.kill();
                    self.join_all();
                    return Err(CpuBenchError::WorkerSpawnFailure { id, source });
                }
            }
        }

        info!(workers = count, intensity = self.intensity, "worker pool started");
        Ok(())
    }

    /// Signal every worker to stop counting without waiting for them
    ///
    /// Workers stop at their next iteration, so counters settle within
    /// one step of this call.
    pub fn request_stop(&self) {
        self.signal.request_stop();
    }

    /// Stop every worker and wait until all threads have exited
    ///
    /// Sends a graceful stop, waits up to `timeout`, kills whatever is
    /// still running, then joins every worker without a time limit.
    /// Calling it again after it returned is a no-op.
    pub fn stop_all(&mut self, timeout: Duration) -> ShutdownReport {
        let mut report = ShutdownReport::default();
        if self.workers.iter().all(|w| w.handle.is_none()) {
            return report;
        }

        self.signal.request_stop();
        let deadline = Instant::now() + timeout;
        while self.alive_count() > 0 && Instant::now() < deadline {
            thread::sleep(JOIN_POLL_INTERVAL);
        }

        let stragglers: Vec<usize> = self
            .workers
            .iter()
            .filter(|w| w.is_alive())
            .map(|w| w.id)
            .collect();
        if !stragglers.is_empty() {
            warn!(
                stragglers = stragglers.len(),
                timeout_ms = timeout.as_millis() as u64,
                "workers did not stop within the grace period, forcing termination"
            );
            self.signal.kill();
        }

        for worker in &mut self.workers {
            let Some(handle) = worker.handle.take() else {
                continue;
            };
            match join_unconditionally(worker.id, handle, &self.signal) {
                Ok(exit) if exit == WorkerExit::Killed || stragglers.contains(&worker.id) => {
                    worker.status = WorkerStatus::Killed;
                    report.forced += 1;
                }
                Ok(exit) => {
                    worker.status = match exit {
                        WorkerExit::Exhausted => WorkerStatus::Exhausted,
                        _ => WorkerStatus::Stopped,
                    };
                    report.graceful += 1;
                }
                Err(message) => {
                    warn!(worker = worker.id, %message, "worker panicked");
                    worker.status = WorkerStatus::Panicked(message);
                    report.panicked.push(worker.id);
                }
            }
        }

        debug!(?report, "worker pool stopped");
        report
    }

    /// Current value of every worker counter, in worker order
    ///
    /// Values are final once [`stop_all`](Self::stop_all) has returned.
    pub fn counters(&self) -> Vec<u64> {
        self.workers.iter().map(WorkerInfo::operations).collect()
    }

    /// Sum of all counters at this instant
    pub fn total_operations(&self) -> u64 {
        self.workers.iter().map(WorkerInfo::operations).sum()
    }

    /// Number of worker threads still executing
    pub fn alive_count(&self) -> usize {
        self.workers.iter().filter(|w| w.is_alive()).count()
    }

    /// Number of workers launched
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Get current worker statuses
    pub fn worker_statuses(&self) -> Vec<(usize, WorkerStatus)> {
        self.workers.iter().map(|w| (w.id, w.status.clone())).collect()
    }

    fn join_all(&mut self) {
        for worker in &mut self.workers {
            if let Some(handle) = worker.handle.take() {
                worker.status = match join_unconditionally(worker.id, handle, &self.signal) {
                    Ok(_) => WorkerStatus::Killed,
                    Err(message) => WorkerStatus::Panicked(message),
                };
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if self.workers.iter().any(|w| w.handle.is_some()) {
            warn!("worker pool dropped while running, killing workers");
            self.signal.kill();
            self.join_all();
        }
    }
}

fn worker_loop(
    counter: &WorkerCounter,
    intensity: u64,
    max_passes: Option<u64>,
    signal: &ShutdownSignal,
) -> WorkerExit {
    let mut passes = 0u64;
    loop {
        if signal.is_killed() {
            return WorkerExit::Killed;
        }
        if signal.stop_requested() {
            return WorkerExit::Stopped;
        }
        if max_passes.is_some_and(|max| passes >= max) {
            return WorkerExit::Exhausted;
        }
        match run_pass(counter, intensity, signal) {
            PassOutcome::Completed => {}
            PassOutcome::Stopped => return WorkerExit::Stopped,
            PassOutcome::Killed => return WorkerExit::Killed,
        }
        passes += 1;
    }
}

/// Wait for a worker thread with no deadline, re-signalling the kill
/// while it is still alive
fn join_unconditionally(
    id: usize,
    handle: JoinHandle<WorkerExit>,
    signal: &ShutdownSignal,
) -> std::result::Result<WorkerExit, String> {
    let mut last_signal = Instant::now();
    while !handle.is_finished() {
        if signal.is_killed() && last_signal.elapsed() >= KILL_RESIGNAL_INTERVAL {
            warn!(worker = id, "worker still alive after forced stop, re-signalling kill");
            signal.kill();
            last_signal = Instant::now();
        }
        thread::sleep(JOIN_POLL_INTERVAL);
    }

    handle.join().map_err(|panic| {
        panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| format!("worker {} panicked", id))
    })
}
