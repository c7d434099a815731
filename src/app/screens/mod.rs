//! TUI screens
//!
//! The home screen with the results table and the live running screen.

pub mod home;
pub mod running;

pub use home::{HomeScreen, StatusMessage, START_LABEL};
pub use running::RunningScreen;
