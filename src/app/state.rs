//! Application state management
//!
//! Tracks which screen is shown and maps keyboard events to navigation
//! actions for the TUI application.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Application screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    /// Start button and results table
    #[default]
    Home,
    /// Live view of the run in progress
    Running,
}

/// Navigation actions that can be triggered by keyboard input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationAction {
    /// Move selection up (arrow up, k)
    Up,
    /// Move selection down (arrow down, j)
    Down,
    /// Confirm selection (Enter, Space, s)
    Select,
    /// Go back (Esc, Backspace)
    Back,
    /// Quit application (q, Q, Ctrl+C)
    Quit,
    /// No action
    None,
}

/// Application state manager
#[derive(Debug, Default)]
pub struct StateManager {
    current_state: AppState,
    should_quit: bool,
}

impl StateManager {
    /// Create a new state manager starting at the home screen
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_state(&self) -> AppState {
        self.current_state
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn transition_to(&mut self, new_state: AppState) {
        self.current_state = new_state;
    }

    /// Apply the screen-independent part of an action
    ///
    /// Quit always exits. Back exits from the home screen only; a run
    /// cannot be abandoned from the running screen.
    pub fn handle_navigation(&mut self, action: NavigationAction) {
        match (self.current_state, action) {
            (_, NavigationAction::Quit) => self.should_quit = true,
            (AppState::Home, NavigationAction::Back) => self.should_quit = true,
            _ => {}
        }
    }

    /// Convert keyboard event to navigation action
    pub fn key_to_navigation(key: KeyEvent) -> NavigationAction {
        if key.kind == KeyEventKind::Release {
            return NavigationAction::None;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => NavigationAction::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                NavigationAction::Quit
            }

            KeyCode::Up | KeyCode::Char('k') => NavigationAction::Up,
            KeyCode::Down | KeyCode::Char('j') => NavigationAction::Down,

            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('s') => NavigationAction::Select,

            KeyCode::Esc | KeyCode::Backspace => NavigationAction::Back,

            _ => NavigationAction::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_state_manager_creation() {
        let state_manager = StateManager::new();
        assert_eq!(state_manager.current_state(), AppState::Home);
        assert!(!state_manager.should_quit());
    }

    #[test]
    fn test_state_transitions() {
        let mut state_manager = StateManager::new();

        state_manager.transition_to(AppState::Running);
        assert_eq!(state_manager.current_state(), AppState::Running);

        state_manager.transition_to(AppState::Home);
        assert_eq!(state_manager.current_state(), AppState::Home);
    }

    #[test]
    fn test_back_from_home_quits() {
        let mut state_manager = StateManager::new();
        state_manager.handle_navigation(NavigationAction::Back);
        assert!(state_manager.should_quit());
    }

    #[test]
    fn test_back_while_running_is_ignored() {
        let mut state_manager = StateManager::new();
        state_manager.transition_to(AppState::Running);

        state_manager.handle_navigation(NavigationAction::Back);
        assert!(!state_manager.should_quit());
        assert_eq!(state_manager.current_state(), AppState::Running);

        state_manager.handle_navigation(NavigationAction::Quit);
        assert!(state_manager.should_quit());
    }

    #[test]
    fn test_key_to_navigation() {
        assert_eq!(
            StateManager::key_to_navigation(key(KeyCode::Char('q'))),
            NavigationAction::Quit
        );
        assert_eq!(
            StateManager::key_to_navigation(KeyEvent::new(
                KeyCode::Char('c'),
                KeyModifiers::CONTROL
            )),
            NavigationAction::Quit
        );
        assert_eq!(
            StateManager::key_to_navigation(key(KeyCode::Char('c'))),
            NavigationAction::None
        );
        assert_eq!(
            StateManager::key_to_navigation(key(KeyCode::Up)),
            NavigationAction::Up
        );
        assert_eq!(
            StateManager::key_to_navigation(key(KeyCode::Char('j'))),
            NavigationAction::Down
        );
        assert_eq!(
            StateManager::key_to_navigation(key(KeyCode::Enter)),
            NavigationAction::Select
        );
        assert_eq!(
            StateManager::key_to_navigation(key(KeyCode::Char('s'))),
            NavigationAction::Select
        );
        assert_eq!(
            StateManager::key_to_navigation(key(KeyCode::Esc)),
            NavigationAction::Back
        );
    }

    #[test]
    fn test_key_release_is_ignored() {
        let mut release = key(KeyCode::Enter);
        release.kind = KeyEventKind::Release;
        assert_eq!(
            StateManager::key_to_navigation(release),
            NavigationAction::None
        );
    }
}
