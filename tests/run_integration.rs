//! End-to-end runs through the public API with fake host collaborators

use cpubench::bench::{BenchmarkRunner, RunPhase};
use cpubench::config::persistence::ResultsStorage;
use cpubench::config::RunConfig;
use cpubench::models::BenchmarkResult;
use cpubench::report::{ResultReporter, ResultSink};
use cpubench::system::{FrequencySource, HostInfo};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;

struct SteppedFrequency {
    readings: Mutex<Vec<f64>>,
}

impl FrequencySource for SteppedFrequency {
    fn current_frequency_mhz(&self) -> Option<f64> {
        let mut readings = self.readings.lock().unwrap();
        if readings.len() > 1 {
            Some(readings.remove(0))
        } else {
            readings.first().copied()
        }
    }
}

struct Host(usize);

impl HostInfo for Host {
    fn processor_label(&self) -> Option<String> {
        Some("Integration CPU".to_string())
    }

    fn logical_processors(&self) -> usize {
        self.0
    }
}

#[derive(Default)]
struct CountingSink {
    delivered: AtomicUsize,
    last: Mutex<Option<BenchmarkResult>>,
}

impl ResultSink for CountingSink {
    fn deliver(&self, result: BenchmarkResult) {
        self.delivered.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(result);
    }
}

fn single_pass_config() -> RunConfig {
    RunConfig::new()
        .with_duration(Duration::from_millis(250))
        .with_sample_interval(Duration::from_millis(50))
        .with_term_timeout(Duration::from_secs(1))
        .with_intensity(1000)
        .with_max_passes(1)
        .with_reference_ops(10_000)
}

#[tokio::test]
async fn test_full_run_delivers_one_scored_result() {
    let sink = Arc::new(CountingSink::default());
    let runner = BenchmarkRunner::new(
        single_pass_config(),
        Arc::new(SteppedFrequency {
            readings: Mutex::new(vec![2000.0]),
        }),
        Arc::new(Host(2)),
        ResultReporter::new(sink.clone()),
    )
    .expect("valid config");

    let result = runner.run(None).await.expect("run completes");

    assert_eq!(result.metrics().total_operations, 2000);
    assert_eq!(result.score(), 200);
    assert_eq!(result.processor(), "Integration CPU");
    assert_eq!(result.to_row().mean_speed, "2000.00 MHz");
    assert_eq!(runner.phase(), RunPhase::Idle);

    assert_eq!(sink.delivered.load(Ordering::SeqCst), 1);
    assert_eq!(sink.last.lock().unwrap().as_ref(), Some(&result));
}

#[tokio::test]
async fn test_background_run_rejects_overlap_and_feeds_history() {
    let temp_dir = TempDir::new().unwrap();
    let storage = ResultsStorage::with_path(temp_dir.path().join("results.json"));
    let (reporter, mut results_rx) = ResultReporter::channel();
    let runner = Arc::new(
        BenchmarkRunner::new(
            single_pass_config(),
            Arc::new(SteppedFrequency {
                readings: Mutex::new(vec![1000.0, 1200.0, 1400.0]),
            }),
            Arc::new(Host(0)),
            reporter,
        )
        .unwrap(),
    );

    let handle = runner.start(None).unwrap();
    assert!(runner.start(None).is_err());

    let delivered = results_rx.recv().await.expect("result delivered");
    storage.append_result(delivered.clone()).unwrap();
    let returned = handle.await.unwrap().unwrap();
    assert_eq!(delivered, returned);

    // Zero reported processors still runs one worker
    assert_eq!(returned.metrics().worker_count, 1);
    assert_eq!(returned.score(), 100);

    let history = storage.load_results().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].to_row(), returned.to_row());
}

#[tokio::test]
async fn test_heavy_workers_stop_counting_when_the_window_closes() {
    // A pass never ends on its own, and the grace period is far longer
    // than the window
    let config = RunConfig::new()
        .with_duration(Duration::from_millis(200))
        .with_sample_interval(Duration::from_millis(50))
        .with_term_timeout(Duration::from_secs(5))
        .with_intensity(u64::MAX)
        .with_workers(2);
    let (reporter, _rx) = ResultReporter::channel();
    let runner = BenchmarkRunner::new(
        config,
        Arc::new(SteppedFrequency {
            readings: Mutex::new(vec![1500.0]),
        }),
        Arc::new(Host(8)),
        reporter,
    )
    .unwrap();

    let started = Instant::now();
    let result = tokio::time::timeout(Duration::from_secs(10), runner.run(None))
        .await
        .expect("shutdown does not hang")
        .unwrap();
    let wall = started.elapsed();

    assert_eq!(result.metrics().worker_count, 2);
    assert_eq!(result.metrics().forced_stops, 0);
    assert!(result.metrics().total_operations > 0);
    assert!(
        wall < Duration::from_secs(2),
        "workers kept running for {:?} after a 200ms window",
        wall
    );
}
