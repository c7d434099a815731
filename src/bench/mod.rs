//! Benchmark engine module
//!
//! Contains the integer workload, the worker pool that runs it on every
//! core, the frequency sampler and the orchestrator that ties a run
//! together.

pub mod generator;
pub mod orchestrator;
pub mod sampler;
pub mod worker;

// Re-export commonly used types
pub use orchestrator::{compute_score, mean_speed, BenchmarkRunner, RunPhase, RunProgress};
pub use sampler::{SpeedSample, TelemetrySampler};
pub use worker::{ShutdownReport, WorkerPool, WorkerStatus};
