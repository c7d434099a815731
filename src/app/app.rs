//! Main application controller
//!
//! Owns the runner, the screens and the channels a run reports through.
//! Runs are started off the UI loop; their results are picked up from
//! the reporter's queue on the next tick.

use crate::{
    app::{
        screens::{HomeScreen, RunningScreen, StatusMessage, START_LABEL},
        state::{AppState, NavigationAction, StateManager},
        tui::Tui,
    },
    bench::{BenchmarkRunner, RunProgress},
    config::{persistence::ResultsStorage, RunConfig},
    error::{is_retryable, user_friendly_message},
    models::BenchmarkResult,
    report::ResultReporter,
    util::units::format_score,
    CpuBenchError, Result,
};
use ratatui::Frame;
use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{error, info, warn};

const PROGRESS_CHANNEL_SIZE: usize = 16;

/// TUI application controller
pub struct App {
    state_manager: StateManager,
    runner: Arc<BenchmarkRunner>,
    results_rx: mpsc::UnboundedReceiver<BenchmarkResult>,
    progress_rx: Option<mpsc::Receiver<RunProgress>>,
    run_handle: Option<JoinHandle<Result<BenchmarkResult>>>,
    storage: Option<ResultsStorage>,
    home_screen: HomeScreen,
    running_screen: RunningScreen,
}

impl App {
    /// Create the controller around a runner whose reporter feeds `results_rx`
    ///
    /// Saved results are loaded into the table; a history that cannot be
    /// read is reported on the status line.
    pub fn new(
        runner: Arc<BenchmarkRunner>,
        results_rx: mpsc::UnboundedReceiver<BenchmarkResult>,
        storage: Option<ResultsStorage>,
    ) -> Self {
        let mut home_screen = HomeScreen::new();
        if let Some(storage) = &storage {
            match storage.load_results() {
                Ok(results) => home_screen.set_results(&results),
                Err(e) => {
                    warn!(error = %e, "failed to load result history");
                    home_screen.set_status(StatusMessage::Error(user_friendly_message(&e)));
                }
            }
        }

        Self {
            state_manager: StateManager::new(),
            runner,
            results_rx,
            progress_rx: None,
            run_handle: None,
            storage,
            home_screen,
            running_screen: RunningScreen::new(),
        }
    }

    /// Controller for the real host
    pub fn with_system_probe(config: RunConfig, storage: Option<ResultsStorage>) -> Result<Self> {
        let (reporter, results_rx) = ResultReporter::channel();
        let runner = Arc::new(BenchmarkRunner::with_system_probe(config, reporter)?);
        Ok(Self::new(runner, results_rx, storage))
    }

    pub fn state(&self) -> AppState {
        self.state_manager.current_state()
    }

    pub fn should_quit(&self) -> bool {
        self.state_manager.should_quit()
    }

    pub fn home_screen(&self) -> &HomeScreen {
        &self.home_screen
    }

    pub fn running_screen(&self) -> &RunningScreen {
        &self.running_screen
    }

    /// Run the main application loop until the user quits
    pub async fn run(&mut self, tui: &mut Tui) -> Result<()> {
        while !self.should_quit() {
            self.process_updates().await;
            tui.draw(|f| self.render(f))?;
            if let Some(key) = tui.next_key()? {
                self.handle_action(StateManager::key_to_navigation(key));
            }
        }

        if self.run_handle.is_some() {
            info!("quitting with a run in progress");
        }
        Ok(())
    }

    fn render(&mut self, f: &mut Frame) {
        match self.state_manager.current_state() {
            AppState::Home => self.home_screen.render(f),
            AppState::Running => self.running_screen.render(f),
        }
    }

    /// Apply one navigation action to the current screen
    pub fn handle_action(&mut self, action: NavigationAction) {
        self.state_manager.handle_navigation(action);
        if self.should_quit() {
            return;
        }

        match (self.state_manager.current_state(), action) {
            (AppState::Home, NavigationAction::Select) => self.start_run(),
            (AppState::Home, NavigationAction::Up) => self.home_screen.select_previous(),
            (AppState::Home, NavigationAction::Down) => self.home_screen.select_next(),
            _ => {}
        }
    }

    fn start_run(&mut self) {
        if !self.home_screen.is_start_enabled() {
            return;
        }

        let (tx, rx) = mpsc::channel(PROGRESS_CHANNEL_SIZE);
        match self.runner.start(Some(tx)) {
            Ok(handle) => {
                self.run_handle = Some(handle);
                self.progress_rx = Some(rx);
                self.running_screen.reset();
                self.home_screen.set_run_active(true);
                self.home_screen.clear_status();
                self.state_manager.transition_to(AppState::Running);
            }
            Err(e) => {
                warn!(error = %e, "could not start a run");
                self.home_screen.set_status(run_failure_status(&e));
            }
        }
    }

    /// Pull progress, results and run completion off their channels
    pub async fn process_updates(&mut self) {
        if let Some(rx) = &mut self.progress_rx {
            while let Ok(progress) = rx.try_recv() {
                self.running_screen.update_progress(progress);
            }
        }

        if self.run_handle.as_ref().is_some_and(JoinHandle::is_finished) {
            if let Some(handle) = self.run_handle.take() {
                match handle.await {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => {
                        error!(error = %e, "benchmark run failed");
                        self.home_screen.set_status(run_failure_status(&e));
                    }
                    Err(e) => {
                        error!(error = %e, "benchmark task aborted");
                        self.home_screen.set_status(StatusMessage::Error(format!(
                            "The test stopped unexpectedly: {}",
                            e
                        )));
                    }
                }
            }
            self.progress_rx = None;
            self.home_screen.set_run_active(false);
            self.state_manager.transition_to(AppState::Home);
        }

        while let Ok(result) = self.results_rx.try_recv() {
            self.on_result(result);
        }
    }

    fn on_result(&mut self, result: BenchmarkResult) {
        self.home_screen.push_result(&result);

        let saved = match &self.storage {
            Some(storage) => storage.append_result(result.clone()),
            None => Ok(()),
        };
        let status = match saved {
            Ok(()) => StatusMessage::Info(format!(
                "Test complete: {}",
                format_score(result.score())
            )),
            Err(e) => {
                warn!(error = %e, "failed to save result");
                StatusMessage::Error(user_friendly_message(&e))
            }
        };
        self.home_screen.set_status(status);
    }
}

/// Status line for a run that could not start or did not finish
fn run_failure_status(error: &CpuBenchError) -> StatusMessage {
    let message = user_friendly_message(error);
    if is_retryable(error) {
        StatusMessage::Error(format!("{} Select {} to try again.", message, START_LABEL))
    } else {
        StatusMessage::Error(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::{FrequencySource, HostInfo};
    use std::time::Duration;
    use tempfile::TempDir;

    struct FakeProbe;

    impl FrequencySource for FakeProbe {
        fn current_frequency_mhz(&self) -> Option<f64> {
            Some(1800.0)
        }
    }

    impl HostInfo for FakeProbe {
        fn processor_label(&self) -> Option<String> {
            Some("Fake CPU".to_string())
        }

        fn logical_processors(&self) -> usize {
            2
        }
    }

    fn test_app(storage: Option<ResultsStorage>) -> App {
        let config = RunConfig::new()
            .with_duration(Duration::from_millis(200))
            .with_sample_interval(Duration::from_millis(50))
            .with_term_timeout(Duration::from_secs(1))
            .with_intensity(1000)
            .with_max_passes(1)
            .with_reference_ops(10_000);
        let (reporter, results_rx) = ResultReporter::channel();
        let probe = Arc::new(FakeProbe);
        let runner = BenchmarkRunner::new(config, probe.clone(), probe, reporter).unwrap();
        App::new(Arc::new(runner), results_rx, storage)
    }

    async fn wait_for_home(app: &mut App) {
        for _ in 0..100 {
            app.process_updates().await;
            if app.state() == AppState::Home {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("run did not finish");
    }

    #[tokio::test]
    async fn test_run_appends_row_and_saves() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ResultsStorage::with_path(temp_dir.path().join("results.json"));
        let mut app = test_app(Some(storage.clone()));

        app.handle_action(NavigationAction::Select);
        assert_eq!(app.state(), AppState::Running);
        assert!(!app.home_screen().is_start_enabled());

        wait_for_home(&mut app).await;

        assert!(app.home_screen().is_start_enabled());
        assert_eq!(app.home_screen().rows().len(), 1);
        assert_eq!(app.home_screen().rows()[0].score, "200 / 1000");
        assert_eq!(app.home_screen().rows()[0].processor, "Fake CPU");
        assert_eq!(storage.count_results().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_select_while_running_does_not_start_twice() {
        let mut app = test_app(None);

        app.handle_action(NavigationAction::Select);
        app.handle_action(NavigationAction::Select);
        wait_for_home(&mut app).await;

        assert_eq!(app.home_screen().rows().len(), 1);
    }

    #[tokio::test]
    async fn test_history_is_loaded_at_startup() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ResultsStorage::with_path(temp_dir.path().join("results.json"));
        storage
            .append_result(BenchmarkResult::new(
                "Old CPU".to_string(),
                900.0,
                42,
                Default::default(),
            ))
            .unwrap();

        let app = test_app(Some(storage));
        assert_eq!(app.home_screen().rows().len(), 1);
        assert_eq!(app.home_screen().rows()[0].processor, "Old CPU");
    }

    #[tokio::test]
    async fn test_unreadable_history_shows_status() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("results.json");
        std::fs::write(&path, "{").unwrap();

        let app = test_app(Some(ResultsStorage::with_path(path)));
        assert!(matches!(
            app.home_screen().status(),
            Some(StatusMessage::Error(_))
        ));
        assert!(app.home_screen().rows().is_empty());
    }

    #[tokio::test]
    async fn test_busy_runner_offers_a_retry() {
        let mut app = test_app(None);
        let other_run = app.runner.start(None).unwrap();

        app.handle_action(NavigationAction::Select);

        assert_eq!(app.state(), AppState::Home);
        match app.home_screen().status() {
            Some(StatusMessage::Error(text)) => {
                assert!(text.contains("already running"), "{}", text);
                assert!(text.contains("try again"), "{}", text);
            }
            other => panic!("unexpected status {:?}", other),
        }
        other_run.await.unwrap().unwrap();
    }

    #[test]
    fn test_config_errors_are_not_offered_a_retry() {
        let status = run_failure_status(&CpuBenchError::ConfigError("bad value".into()));
        match status {
            StatusMessage::Error(text) => assert!(!text.contains("try again"), "{}", text),
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_quit_and_back() {
        let mut app = test_app(None);
        app.handle_action(NavigationAction::Back);
        assert!(app.should_quit());
    }
}
