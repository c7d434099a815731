//! Result reporter
//!
//! Hands each finished [`BenchmarkResult`] to the presentation layer. The
//! reporter has no error conditions of its own: a sink that cannot accept
//! the result deals with it internally.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::models::BenchmarkResult;

/// Receiver of completed results
pub trait ResultSink: Send + Sync {
    fn deliver(&self, result: BenchmarkResult);
}

/// Forwards results to a single sink, once per completed run
#[derive(Clone)]
pub struct ResultReporter {
    sink: Arc<dyn ResultSink>,
}

impl ResultReporter {
    pub fn new(sink: Arc<dyn ResultSink>) -> Self {
        Self { sink }
    }

    /// Reporter that queues results onto a channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<BenchmarkResult>) {
        let (sink, rx) = ChannelSink::new();
        (Self::new(Arc::new(sink)), rx)
    }

    /// Pass a result to the sink
    ///
    /// The orchestrator calls this once per completed run.
    pub fn report(&self, result: BenchmarkResult) {
        debug!(summary = %result.summary(), "reporting result");
        self.sink.deliver(result);
    }
}

/// Queues results for the interactive surface's own event loop
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<BenchmarkResult>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BenchmarkResult>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ResultSink for ChannelSink {
    fn deliver(&self, result: BenchmarkResult) {
        if self.tx.send(result).is_err() {
            warn!("result receiver has gone away, dropping result");
        }
    }
}

/// Discards every result
#[derive(Debug, Default)]
pub struct NullSink;

impl ResultSink for NullSink {
    fn deliver(&self, _result: BenchmarkResult) {}
}
