//! Operation generator
//!
//! The per-worker integer kernel. Each iteration advances a fixed
//! recurrence and bumps the worker's counter by one.

use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};

use super::worker::ShutdownSignal;

/// Modulus of the recurrence `x -> (3x + 1) mod MODULUS`
pub const MODULUS: u64 = 123_456_789;

/// Operation counter owned by a single worker
///
/// Only the owning worker increments it. Other threads read it, and the
/// value is final once the worker has been joined.
#[derive(Debug, Default)]
pub struct WorkerCounter(AtomicU64);

impl WorkerCounter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Current value of the counter
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// How a generator pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// The full iteration budget was executed
    Completed,
    /// A stop request ended the pass early
    Stopped,
    /// The pool manager killed the worker mid-pass
    Killed,
}

/// One step of the recurrence
#[inline]
pub fn step(value: u64) -> u64 {
    (value * 3 + 1) % MODULUS
}

/// Run one generator pass of `intensity` iterations
///
/// The shutdown signal is checked before every iteration, so no
/// operation is counted once a stop or kill has been observed.
pub fn run_pass(counter: &WorkerCounter, intensity: u64, signal: &ShutdownSignal) -> PassOutcome {
    let mut value = 0u64;
    for _ in 0..intensity {
        if signal.stop_requested() {
            return if signal.is_killed() {
                PassOutcome::Killed
            } else {
                PassOutcome::Stopped
            };
        }
        value = black_box(step(black_box(value)));
        counter.increment();
    }
    black_box(value);
    PassOutcome::Completed
}
