//! Telemetry sampler
//!
//! Polls the processor frequency on a fixed cadence from a tokio task,
//! away from the worker threads. The run window is owned by the
//! orchestrator, which ends sampling through [`TelemetrySampler::finish`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use crate::system::FrequencySource;

/// A single frequency reading
///
/// The timestamp is implicit: `index * sample_interval` from the start of
/// sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedSample {
    pub index: usize,
    pub mhz: f64,
}

impl SpeedSample {
    /// Offset of this sample from the start of the run
    pub fn offset(&self, interval: Duration) -> Duration {
        interval.saturating_mul(u32::try_from(self.index).unwrap_or(u32::MAX))
    }
}

/// Handle to a running sampling loop
pub struct TelemetrySampler {
    stop_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Vec<SpeedSample>>,
    latest: Arc<AtomicU64>,
}

impl TelemetrySampler {
    /// Start sampling immediately, then once per `interval`
    pub fn spawn(source: Arc<dyn FrequencySource>, interval: Duration) -> Self {
        let (stop_tx, stop_rx) = oneshot::channel();
        let latest = Arc::new(AtomicU64::new(0f64.to_bits()));
        let handle = tokio::spawn(sample_loop(source, interval, stop_rx, Arc::clone(&latest)));

        Self {
            stop_tx: Some(stop_tx),
            handle,
            latest,
        }
    }

    /// Most recent reading in MHz, 0 before the first sample
    pub fn latest_mhz(&self) -> f64 {
        f64::from_bits(self.latest.load(Ordering::Relaxed))
    }

    /// End the sampling loop and take its sequence
    pub async fn finish(mut self) -> Vec<SpeedSample> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        match (&mut self.handle).await {
            Ok(samples) => samples,
            Err(e) => {
                warn!(error = %e, "telemetry sampler task failed, discarding samples");
                Vec::new()
            }
        }
    }
}

impl Drop for TelemetrySampler {
    fn drop(&mut self) {
        if self.stop_tx.is_some() {
            self.handle.abort();
        }
    }
}

async fn sample_loop(
    source: Arc<dyn FrequencySource>,
    interval: Duration,
    mut stop_rx: oneshot::Receiver<()>,
    latest: Arc<AtomicU64>,
) -> Vec<SpeedSample> {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut samples = Vec::new();

    loop {
        tokio::select! {
            biased;
            _ = &mut stop_rx => break,
            _ = ticker.tick() => {
                let mhz = source.current_frequency_mhz().unwrap_or(0.0);
                latest.store(mhz.to_bits(), Ordering::Relaxed);
                samples.push(SpeedSample {
                    index: samples.len(),
                    mhz,
                });
            }
        }
    }

    debug!(samples = samples.len(), "telemetry sampling finished");
    samples
}
