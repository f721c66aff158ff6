//! Human readable byte counts

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count using the largest unit that keeps the value >= 1.
///
/// `None` renders as `"Unknown size"` and zero as `"0B"`. Values are rounded
/// to two decimals and printed in their shortest form (`1.5 KB`, `1 KB`).
pub fn format_size(bytes: Option<u64>) -> String {
    let bytes = match bytes {
        None => return "Unknown size".to_string(),
        Some(0) => return "0B".to_string(),
        Some(b) => b,
    };

    // floor(log1024(bytes)) without float error at exact powers
    let mut index = 0;
    let mut scale: u64 = 1;
    while index < UNITS.len() - 1 && bytes / scale >= 1024 {
        scale *= 1024;
        index += 1;
    }

    let value = ((bytes as f64 / scale as f64) * 100.0).round() / 100.0;
    format!("{} {}", value, UNITS[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_and_zero() {
        assert_eq!(format_size(None), "Unknown size");
        assert_eq!(format_size(Some(0)), "0B");
    }

    #[test]
    fn test_kilobytes() {
        assert_eq!(format_size(Some(1536)), "1.5 KB");
        assert_eq!(format_size(Some(1024)), "1 KB");
    }

    #[test]
    fn test_bytes_below_one_kb() {
        assert_eq!(format_size(Some(1)), "1 B");
        assert_eq!(format_size(Some(1023)), "1023 B");
    }

    #[test]
    fn test_rounding_to_two_decimals() {
        // 1.234 MB
        let bytes = (1.234 * 1024.0 * 1024.0) as u64;
        assert_eq!(format_size(Some(bytes)), "1.23 MB");
    }

    #[test]
    fn test_large_values_cap_at_tb() {
        let tb = 1024u64.pow(4);
        assert_eq!(format_size(Some(tb)), "1 TB");
        assert_eq!(format_size(Some(tb * 2048)), "2048 TB");
    }

    #[test]
    fn test_unit_is_monotonic() {
        let unit_rank = |s: String| {
            let unit = s.rsplit(' ').next().unwrap().to_string();
            UNITS.iter().position(|u| *u == unit).unwrap()
        };
        let mut last = 0;
        for exp in 0..50u32 {
            let rank = unit_rank(format_size(Some(1u64 << exp)));
            assert!(rank >= last, "unit shrank at 2^{}", exp);
            last = rank;
        }
    }
}
