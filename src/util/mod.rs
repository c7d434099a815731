//! Utility functions module
//!
//! Contains helper functions for units formatting and duration parsing.

pub mod units;

// Re-export commonly used functions
pub use units::{
    calculate_ops_per_sec, format_duration, format_mhz, format_operations, format_ops_rate,
    format_score, parse_duration,
};
