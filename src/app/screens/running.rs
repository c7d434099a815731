//! Running screen implementation
//!
//! Live view of the active run: a countdown gauge plus the operation
//! count, latest clock reading and worker count.

use crate::bench::RunProgress;
use crate::util::units::{
    calculate_ops_per_sec, format_duration, format_mhz, format_operations, format_ops_rate,
};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Gauge, Paragraph, Row, Table},
    Frame,
};

/// Running screen component
#[derive(Debug, Default)]
pub struct RunningScreen {
    current_progress: Option<RunProgress>,
}

impl RunningScreen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous run's figures
    pub fn reset(&mut self) {
        self.current_progress = None;
    }

    pub fn update_progress(&mut self, progress: RunProgress) {
        self.current_progress = Some(progress);
    }

    pub fn progress(&self) -> Option<&RunProgress> {
        self.current_progress.as_ref()
    }

    /// Whether the window has elapsed and the run is being scored
    pub fn is_finalizing(&self) -> bool {
        self.current_progress
            .as_ref()
            .is_some_and(|p| p.remaining().is_zero())
    }

    /// Render the running screen
    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(3), // Countdown
                Constraint::Min(7),    // Metrics
                Constraint::Length(3), // Help
            ])
            .split(f.size());

        self.render_title(f, chunks[0]);
        self.render_countdown(f, chunks[1]);
        self.render_metrics(f, chunks[2]);
        self.render_help(f, chunks[3]);
    }

    fn render_title(&self, f: &mut Frame, area: Rect) {
        let title = if self.is_finalizing() {
            "Test Running - Finalizing..."
        } else {
            "Test Running"
        };

        let title_widget = Paragraph::new(title)
            .style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            );
        f.render_widget(title_widget, area);
    }

    fn render_countdown(&self, f: &mut Frame, area: Rect) {
        let (ratio, label) = match &self.current_progress {
            Some(progress) => (
                progress.fraction(),
                format!(
                    "{} remaining of {}",
                    format_duration(progress.remaining()),
                    format_duration(progress.duration)
                ),
            ),
            None => (0.0, "Starting workers...".to_string()),
        };

        let gauge = Gauge::default()
            .block(Block::default().title("Time").borders(Borders::ALL))
            .gauge_style(Style::default().fg(Color::Green))
            .ratio(ratio)
            .label(label);
        f.render_widget(gauge, area);
    }

    fn render_metrics(&self, f: &mut Frame, area: Rect) {
        let cells = match &self.current_progress {
            Some(progress) => [
                format_operations(progress.operations),
                format_ops_rate(calculate_ops_per_sec(progress.operations, progress.elapsed)),
                format_mhz(progress.latest_mhz),
                progress.workers.to_string(),
                format_duration(progress.elapsed),
            ],
            None => [
                "0 ops".to_string(),
                "0 ops/s".to_string(),
                format_mhz(0.0),
                "-".to_string(),
                "0ms".to_string(),
            ],
        };

        let labels = ["Operations:", "Rate:", "CPU Speed:", "Workers:", "Elapsed:"];
        let rows: Vec<Row> = labels
            .iter()
            .zip(cells)
            .map(|(label, value)| Row::new(vec![label.to_string(), value]))
            .collect();

        let table = Table::new(rows, [Constraint::Length(14), Constraint::Min(20)])
            .block(
                Block::default()
                    .title("Live Metrics")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .column_spacing(2);
        f.render_widget(table, area);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let help = Paragraph::new("The test runs for its full duration. Q quits.")
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow)),
            );
        f.render_widget(help, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    fn sample_progress(elapsed_secs: u64) -> RunProgress {
        RunProgress {
            elapsed: Duration::from_secs(elapsed_secs),
            duration: Duration::from_secs(30),
            operations: 2_500_000,
            latest_mhz: 3400.5,
            workers: 8,
        }
    }

    #[test]
    fn test_finalizing_detection() {
        let mut screen = RunningScreen::new();
        assert!(!screen.is_finalizing());

        screen.update_progress(sample_progress(10));
        assert!(!screen.is_finalizing());

        screen.update_progress(sample_progress(30));
        assert!(screen.is_finalizing());

        screen.reset();
        assert!(screen.progress().is_none());
    }

    #[test]
    fn test_render_live_metrics() {
        let mut screen = RunningScreen::new();
        screen.update_progress(sample_progress(10));

        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|f| screen.render(f)).unwrap();
        let content: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();

        assert!(content.contains("2.50M ops"));
        assert!(content.contains("3400.50 MHz"));
        assert!(content.contains("20s remaining of 30s"));
    }
}
