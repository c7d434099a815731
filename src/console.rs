//! Plain terminal mode
//!
//! Runs one benchmark with an indicatif progress bar and prints the
//! result row, for use without the TUI.

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tracing::warn;

use crate::bench::{BenchmarkRunner, RunProgress};
use crate::config::persistence::ResultsStorage;
use crate::config::RunConfig;
use crate::models::{BenchmarkResult, ResultRow};
use crate::report::{NullSink, ResultReporter};
use crate::util::units::{calculate_ops_per_sec, format_mhz, format_operations, format_ops_rate};
use crate::Result;

const HEADERS: [&str; 4] = ["Timestamp", "CPU Model", "Mean CPU Speed (MHz)", "CPU Score"];

/// Run a benchmark on the real host, streaming progress to the terminal
///
/// The result is appended to `storage` when one is given. A failure to
/// save is logged and does not fail the run.
pub async fn run_benchmark(
    config: RunConfig,
    storage: Option<&ResultsStorage>,
) -> Result<BenchmarkResult> {
    let reporter = ResultReporter::new(Arc::new(NullSink));
    let runner = BenchmarkRunner::with_system_probe(config.clone(), reporter)?;
    let (tx, mut rx) = mpsc::channel::<RunProgress>(16);

    let total_ms = config.duration.as_millis() as u64;
    let pb = ProgressBar::new(total_ms);
    pb.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {percent:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let display = tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            pb.set_position((progress.elapsed.as_millis() as u64).min(total_ms));
            pb.set_message(format!(
                "{} workers, {}, {}",
                progress.workers,
                format_operations(progress.operations),
                format_mhz(progress.latest_mhz)
            ));
        }
        pb.finish_and_clear();
    });

    let result = runner.run(Some(tx)).await;
    display.await.ok();
    let result = result?;

    if let Some(storage) = storage {
        if let Err(e) = storage.append_result(result.clone()) {
            warn!(error = %e, "failed to save result");
            eprintln!("Warning: {}", crate::error::user_friendly_message(&e));
        }
    }

    Ok(result)
}

/// Print the standard results table
pub fn print_results(results: &[BenchmarkResult]) {
    let rows: Vec<ResultRow> = results.iter().map(BenchmarkResult::to_row).collect();
    print!("{}", render_table(&rows));
}

/// Print the row plus the raw measurements behind it
pub fn print_result_details(result: &BenchmarkResult) {
    print_results(std::slice::from_ref(result));
    let metrics = result.metrics();
    println!();
    println!(
        "Operations: {} across {} workers in {:.2}s ({})",
        format_operations(metrics.total_operations),
        metrics.worker_count,
        metrics.elapsed_time.as_secs_f64(),
        format_ops_rate(calculate_ops_per_sec(
            metrics.total_operations,
            metrics.elapsed_time
        ))
    );
    println!("Frequency samples: {}", metrics.sample_count);
    if metrics.forced_stops > 0 {
        println!("Workers force-stopped: {}", metrics.forced_stops);
    }
}

fn render_table(rows: &[ResultRow]) -> String {
    let mut widths = HEADERS.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row_cells(row)) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    let mut push_line = |cells: [&str; 4]| {
        let line: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    };

    push_line(HEADERS);
    for row in rows {
        push_line(row_cells(row));
    }
    out
}

fn row_cells(row: &ResultRow) -> [&str; 4] {
    [
        row.timestamp.as_str(),
        row.processor.as_str(),
        row.mean_speed.as_str(),
        row.score.as_str(),
    ]
}
