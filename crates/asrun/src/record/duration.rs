//! Duration evaluation for the as-run `duration` field.

use super::error::FormatError;

/// Parses the first 8 characters of `duration` as `HH:MM:SS` and returns
/// the total in whole seconds. Trailing characters (frames) are ignored.
pub fn duration_in_seconds(duration: &str) -> Result<u32, FormatError> {
    let hms: String = duration.chars().take(8).collect();
    let bytes = hms.as_bytes();

    let well_formed = bytes.len() == 8
        && bytes[2] == b':'
        && bytes[5] == b':'
        && [0, 1, 3, 4, 6, 7].iter().all(|&i| bytes[i].is_ascii_digit());
    if !well_formed {
        return Err(FormatError::Pattern { value: hms });
    }

    let hours = two_digits(&bytes[0..2]);
    let minutes = two_digits(&bytes[3..5]);
    let seconds = two_digits(&bytes[6..8]);

    let out_of_range = if hours > 23 {
        Some("hours")
    } else if minutes > 59 {
        Some("minutes")
    } else if seconds > 59 {
        Some("seconds")
    } else {
        None
    };
    if let Some(component) = out_of_range {
        return Err(FormatError::OutOfRange {
            value: hms,
            component,
        });
    }

    Ok(hours * 3600 + minutes * 60 + seconds)
}

fn two_digits(pair: &[u8]) -> u32 {
    u32::from(pair[0] - b'0') * 10 + u32::from(pair[1] - b'0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_neighbours() {
        assert_eq!(duration_in_seconds("00:00:30:00").unwrap(), 30);
        assert_eq!(duration_in_seconds("00:00:31:00").unwrap(), 31);
    }

    #[test]
    fn test_hours_and_minutes() {
        assert_eq!(duration_in_seconds("00:01:05:00").unwrap(), 65);
        assert_eq!(duration_in_seconds("01:00:00").unwrap(), 3600);
        assert_eq!(duration_in_seconds("23:59:59:24").unwrap(), 86_399);
    }

    #[test]
    fn test_rejects_short_input() {
        assert_eq!(
            duration_in_seconds("00:00:"),
            Err(FormatError::Pattern {
                value: "00:00:".to_string()
            })
        );
        assert!(duration_in_seconds("").is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(duration_in_seconds("        ").is_err());
        assert!(duration_in_seconds("00-00-30").is_err());
        assert!(duration_in_seconds("0a:00:30").is_err());
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(
            duration_in_seconds("24:00:00"),
            Err(FormatError::OutOfRange {
                value: "24:00:00".to_string(),
                component: "hours"
            })
        );
        assert!(duration_in_seconds("00:60:00").is_err());
        assert!(duration_in_seconds("00:00:60").is_err());
    }

    #[test]
    fn test_multibyte_prefix_is_pattern_error() {
        assert!(matches!(
            duration_in_seconds("ÄÄ:00:30"),
            Err(FormatError::Pattern { .. })
        ));
    }
}
