//! Utilities module for error handling, logging and display helpers

pub mod error;
pub mod logging;

pub use error::{PlantDocError, Result};
pub use logging::init_logging;

/// Format a probability as a percentage with two decimals
pub fn format_percent(p: f32) -> String {
    format!("{:.2}%", p * 100.0)
}

/// Format a duration given in milliseconds in a human-readable way
pub fn format_millis(ms: f64) -> String {
    if ms < 1000.0 {
        format!("{:.1} ms", ms)
    } else {
        format!("{:.2} s", ms / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.5), "50.00%");
        assert_eq!(format_percent(1.0), "100.00%");
    }

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(12.34), "12.3 ms");
        assert_eq!(format_millis(1500.0), "1.50 s");
    }
}
