//! Timestamp and duration-format helpers

use std::time::{SystemTime, UNIX_EPOCH};

pub fn current_timestamp_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

pub fn current_timestamp_micros() -> u64 {
    current_timestamp_nanos() / 1_000
}

pub fn format_duration_ns(nanos: u64) -> String {
    if nanos < 1_000 {
        format!("{}ns", nanos)
    } else if nanos < 1_000_000 {
        format!("{:.2}us", nanos as f64 / 1_000.0)
    } else if nanos < 1_000_000_000 {
        format!("{:.2}ms", nanos as f64 / 1_000_000.0)
    } else {
        format!("{:.2}s", nanos as f64 / 1_000_000_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_advance() {
        let nanos = current_timestamp_nanos();
        let micros = current_timestamp_micros();
        assert!(nanos > 0);
        assert!(micros <= nanos / 1_000);
    }

    #[test]
    fn test_format_duration_units() {
        assert_eq!(format_duration_ns(500), "500ns");
        assert_eq!(format_duration_ns(1_500), "1.50us");
        assert_eq!(format_duration_ns(2_250_000), "2.25ms");
        assert_eq!(format_duration_ns(90_000_000_000), "90.00s");
    }

    #[test]
    fn test_format_duration_boundaries() {
        assert_eq!(format_duration_ns(999), "999ns");
        assert_eq!(format_duration_ns(1_000), "1.00us");
        assert_eq!(format_duration_ns(1_000_000), "1.00ms");
        assert_eq!(format_duration_ns(1_000_000_000), "1.00s");
    }
}
