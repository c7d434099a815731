//! Home screen implementation
//!
//! The main window: title, the Start Test button, and the table of
//! completed runs with one row appended per result.

use crate::models::{BenchmarkResult, ResultRow};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, TableState},
    Frame,
};

pub const TITLE: &str = "CPU Performance Test";
pub const START_LABEL: &str = "Start Test";

const COLUMNS: [&str; 4] = ["Timestamp", "CPU Model", "Mean CPU Speed (MHz)", "CPU Score"];

/// Message shown under the results table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    Info(String),
    Error(String),
}

/// Home screen component
#[derive(Debug, Default)]
pub struct HomeScreen {
    rows: Vec<ResultRow>,
    table_state: TableState,
    run_active: bool,
    status: Option<StatusMessage>,
}

impl HomeScreen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the table contents, oldest first
    pub fn set_results(&mut self, results: &[BenchmarkResult]) {
        self.rows = results.iter().map(BenchmarkResult::to_row).collect();
        self.select_last();
    }

    /// Append the row of a newly finished run and select it
    pub fn push_result(&mut self, result: &BenchmarkResult) {
        self.rows.push(result.to_row());
        self.select_last();
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    /// Disable the start button while a run is active
    pub fn set_run_active(&mut self, active: bool) {
        self.run_active = active;
    }

    pub fn is_start_enabled(&self) -> bool {
        !self.run_active
    }

    pub fn set_status(&mut self, status: StatusMessage) {
        self.status = Some(status);
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn selected(&self) -> Option<usize> {
        self.table_state.selected()
    }

    pub fn select_previous(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let index = match self.table_state.selected() {
            Some(0) | None => self.rows.len() - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(index));
    }

    pub fn select_next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let index = match self.table_state.selected() {
            Some(i) if i + 1 < self.rows.len() => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(index));
    }

    fn select_last(&mut self) {
        self.table_state
            .select(self.rows.len().checked_sub(1));
    }

    /// Render the home screen
    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(3), // Start button
                Constraint::Min(6),    // Results table
                Constraint::Length(3), // Status
                Constraint::Length(3), // Help
            ])
            .split(f.size());

        self.render_title(f, chunks[0]);
        self.render_start_button(f, chunks[1]);
        self.render_results(f, chunks[2]);
        self.render_status(f, chunks[3]);
        self.render_help(f, chunks[4]);
    }

    fn render_title(&self, f: &mut Frame, area: Rect) {
        let title = Paragraph::new(TITLE)
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
        f.render_widget(title, area);
    }

    fn render_start_button(&self, f: &mut Frame, area: Rect) {
        let button_area = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(START_LABEL.len() as u16 + 6),
                Constraint::Min(0),
            ])
            .split(area)[1];

        let style = if self.is_start_enabled() {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let button = Paragraph::new(START_LABEL)
            .style(style)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_style(style));
        f.render_widget(button, button_area);
    }

    fn render_results(&mut self, f: &mut Frame, area: Rect) {
        let header = Row::new(COLUMNS.to_vec()).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let rows: Vec<Row> = self
            .rows
            .iter()
            .map(|row| {
                Row::new(vec![
                    row.timestamp.clone(),
                    row.processor.clone(),
                    row.mean_speed.clone(),
                    row.score.clone(),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(19),
                Constraint::Min(20),
                Constraint::Length(20),
                Constraint::Length(11),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .title(format!("Results ({})", self.rows.len()))
                .borders(Borders::ALL),
        )
        .highlight_style(Style::default().bg(Color::Cyan).fg(Color::Black))
        .column_spacing(2);

        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn render_status(&self, f: &mut Frame, area: Rect) {
        let (text, color) = match &self.status {
            Some(StatusMessage::Info(msg)) => (msg.as_str(), Color::Green),
            Some(StatusMessage::Error(msg)) => (msg.as_str(), Color::Red),
            None if self.run_active => ("Test running...", Color::Yellow),
            None => ("Ready", Color::White),
        };

        let status = Paragraph::new(text)
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
            .block(Block::default().title("Status").borders(Borders::ALL));
        f.render_widget(status, area);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let key = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let help = Paragraph::new(Line::from(vec![
            Span::styled("Enter", key),
            Span::raw(" Start Test  "),
            Span::styled("↑↓", key),
            Span::raw(" Scroll  "),
            Span::styled("Q", key),
            Span::raw(" Quit"),
        ]))
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
    use crate::models::RunMetrics;
    use ratatui::{backend::TestBackend, Terminal};

    fn result(score: u32) -> BenchmarkResult {
        BenchmarkResult::new("Test CPU".to_string(), 1200.0, score, RunMetrics::default())
    }

    fn render_to_string(screen: &mut HomeScreen) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| screen.render(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_rows_are_appended_in_order() {
        let mut screen = HomeScreen::new();
        screen.set_results(&[result(100), result(200)]);
        screen.push_result(&result(300));

        let scores: Vec<&str> = screen.rows().iter().map(|r| r.score.as_str()).collect();
        assert_eq!(scores, ["100 / 1000", "200 / 1000", "300 / 1000"]);
        assert_eq!(screen.selected(), Some(2));
    }

    #[test]
    fn test_start_button_state() {
        let mut screen = HomeScreen::new();
        assert!(screen.is_start_enabled());

        screen.set_run_active(true);
        assert!(!screen.is_start_enabled());

        screen.set_run_active(false);
        assert!(screen.is_start_enabled());
    }

    #[test]
    fn test_selection_wraps() {
        let mut screen = HomeScreen::new();
        screen.select_next();
        assert_eq!(screen.selected(), None);

        screen.set_results(&[result(1), result(2)]);
        screen.select_next();
        assert_eq!(screen.selected(), Some(0));
        screen.select_previous();
        assert_eq!(screen.selected(), Some(1));
    }

    #[test]
    fn test_render_shows_title_button_and_columns() {
        let mut screen = HomeScreen::new();
        screen.push_result(&result(200));

        let content = render_to_string(&mut screen);
        assert!(content.contains(TITLE));
        assert!(content.contains(START_LABEL));
        assert!(content.contains("CPU Model"));
        assert!(content.contains("Mean CPU Speed (MHz)"));
        assert!(content.contains("200 / 1000"));
        assert!(content.contains("1200.00 MHz"));
    }

    #[test]
    fn test_render_shows_status() {
        let mut screen = HomeScreen::new();
        screen.set_status(StatusMessage::Error("Failed to save".to_string()));
        assert!(render_to_string(&mut screen).contains("Failed to save"));

        screen.clear_status();
        assert!(screen.status().is_none());
    }
}
