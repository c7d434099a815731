//! Units formatting and conversion utilities
//!
//! Provides functions for human-readable formatting of clock speeds,
//! scores, operation counts and durations.

use std::time::Duration;

/// Format a clock frequency in MHz with two decimals
///
/// # Examples
/// ```
/// use cpubench::util::units::format_mhz;
///
/// assert_eq!(format_mhz(1200.0), "1200.00 MHz");
/// assert_eq!(format_mhz(0.0), "0.00 MHz");
/// ```
pub fn format_mhz(mhz: f64) -> String {
    format!("{:.2} MHz", mhz)
}

/// Format a score out of the 1000 maximum
///
/// # Examples
/// ```
/// use cpubench::util::units::format_score;
///
/// assert_eq!(format_score(200), "200 / 1000");
/// ```
pub fn format_score(score: u32) -> String {
    format!("{} / 1000", score)
}

/// Format an operation count with a decimal SI suffix
///
/// # Examples
/// ```
/// use cpubench::util::units::format_operations;
///
/// assert_eq!(format_operations(950), "950 ops");
/// assert_eq!(format_operations(1_500_000_000), "1.50G ops");
/// ```
pub fn format_operations(operations: u64) -> String {
    let value = operations as f64;
    if value >= 1e12 {
        format!("{:.2}T ops", value / 1e12)
    } else if value >= 1e9 {
        format!("{:.2}G ops", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.2}M ops", value / 1e6)
    } else if value >= 1e3 {
        format!("{:.1}K ops", value / 1e3)
    } else {
        format!("{} ops", operations)
    }
}

/// Calculate operations per second from a count and a duration
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use cpubench::util::units::calculate_ops_per_sec;
///
/// let rate = calculate_ops_per_sec(1000, Duration::from_millis(500));
/// assert!((rate - 2000.0).abs() < 0.01);
/// ```
pub fn calculate_ops_per_sec(operations: u64, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 0.0;
    }

    operations as f64 / duration.as_secs_f64()
}

/// Format an operation rate with a decimal SI suffix
pub fn format_ops_rate(ops_per_sec: f64) -> String {
    if ops_per_sec >= 1e9 {
        format!("{:.2}G ops/s", ops_per_sec / 1e9)
    } else if ops_per_sec >= 1e6 {
        format!("{:.2}M ops/s", ops_per_sec / 1e6)
    } else if ops_per_sec >= 1e3 {
        format!("{:.1}K ops/s", ops_per_sec / 1e3)
    } else {
        format!("{:.0} ops/s", ops_per_sec)
    }
}

/// Format duration into human-readable string
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use cpubench::util::units::format_duration;
///
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 3600 {
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if total_secs >= 60 {
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;
        format!("{}m {}s", minutes, seconds)
    } else if total_secs > 0 {
        if millis > 0 {
            format!("{}.{:02}s", total_secs, millis / 10)
        } else {
            format!("{}s", total_secs)
        }
    } else {
        format!("{}ms", millis)
    }
}

/// Parse duration string into Duration
///
/// Accepts humantime syntax such as "30s", "1m 30s" or "500ms".
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use cpubench::util::units::parse_duration;
///
/// assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
/// assert_eq!(parse_duration("1m 30s").unwrap(), Duration::from_secs(90));
/// ```
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    humantime::parse_duration(input.trim())
        .map_err(|e| format!("Invalid duration '{}': {}", input.trim(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_format_mhz() {
        assert_eq!(format_mhz(1200.0), "1200.00 MHz");
        assert_eq!(format_mhz(2394.567), "2394.57 MHz");
        assert_eq!(format_mhz(0.0), "0.00 MHz");
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(0), "0 / 1000");
        assert_eq!(format_score(1000), "1000 / 1000");
    }

    #[test]
    fn test_format_operations() {
        assert_eq!(format_operations(0), "0 ops");
        assert_eq!(format_operations(2000), "2.0K ops");
        assert_eq!(format_operations(12_340_000), "12.34M ops");
        assert_eq!(format_operations(3_000_000_000_000), "3.00T ops");
    }

    #[test]
    fn test_calculate_ops_per_sec() {
        assert_eq!(calculate_ops_per_sec(1000, Duration::ZERO), 0.0);
        let rate = calculate_ops_per_sec(3_000_000, Duration::from_secs(3));
        assert!((rate - 1_000_000.0).abs() < 0.01);
    }

    #[test]
    fn test_format_ops_rate() {
        assert_eq!(format_ops_rate(500.0), "500 ops/s");
        assert_eq!(format_ops_rate(1500.0), "1.5K ops/s");
        assert_eq!(format_ops_rate(2_500_000_000.0), "2.50G ops/s");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m 1s");
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration(" 1m 30s ").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));

        assert!(parse_duration("invalid").is_err());
        assert!(parse_duration("1x").is_err());
    }
}
