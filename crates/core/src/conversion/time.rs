//! Conversions between `Duration` and ffmpeg's `HH:MM:SS.mmm` notation.

use std::time::Duration;

/// Formats a duration as `HH:MM:SS.mmm`.
pub fn format_time(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

/// Strictly parses `H+:MM:SS[.fraction]`.
///
/// Minutes and seconds must be below 60 and every component must be numeric.
/// Returns `None` for anything else, including negative values.
pub fn parse_time(value: &str) -> Option<Duration> {
    let mut parts = value.trim().split(':');
    let hours = parts.next()?;
    let minutes = parts.next()?;
    let seconds = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    if !is_digits(hours) || !is_digits(minutes) || minutes.len() != 2 {
        return None;
    }
    let (whole, fraction) = match seconds.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (seconds, None),
    };
    if !is_digits(whole) || whole.len() != 2 {
        return None;
    }

    let hours: u64 = hours.parse().ok()?;
    let minutes: u64 = minutes.parse().ok()?;
    let whole: u64 = whole.parse().ok()?;
    if minutes >= 60 || whole >= 60 {
        return None;
    }

    let nanos = match fraction {
        Some(f) if !is_digits(f) => return None,
        Some(f) => {
            let padded: String = f.chars().chain(std::iter::repeat('0')).take(9).collect();
            padded.parse::<u32>().ok()?
        }
        None => 0,
    };

    let secs = hours
        .checked_mul(3600)?
        .checked_add(minutes * 60)?
        .checked_add(whole)?;
    Some(Duration::new(secs, nanos))
}

/// Parses either `HH:MM:SS[.f]` or a plain number of seconds (`12.5`).
pub fn parse_time_or_seconds(value: &str) -> Option<Duration> {
    if let Some(duration) = parse_time(value) {
        return Some(duration);
    }
    let seconds: f64 = value.trim().parse().ok()?;
    Duration::try_from_secs_f64(seconds).ok()
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(Duration::from_millis(0)), "00:00:00.000");
        assert_eq!(format_time(Duration::from_millis(3_723_456)), "01:02:03.456");
        assert_eq!(format_time(Duration::from_secs(100 * 3600)), "100:00:00.000");
    }

    #[test]
    fn test_parse_time_valid() {
        assert_eq!(parse_time("00:00:13.00"), Some(Duration::from_secs(13)));
        assert_eq!(parse_time("01:02:03.5"), Some(Duration::from_millis(3_723_500)));
        assert_eq!(parse_time("00:01:00"), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_parse_time_rejects_garbage() {
        assert_eq!(parse_time("00:61:00"), None);
        assert_eq!(parse_time("00:00:75.00"), None);
        assert_eq!(parse_time("-577014:32:22.77"), None);
        assert_eq!(parse_time("ab:cd:ef"), None);
        assert_eq!(parse_time("1:2:3"), None);
        assert_eq!(parse_time("00:00:01.x"), None);
    }

    #[test]
    fn test_format_then_parse() {
        let d = Duration::from_millis(45_250);
        assert_eq!(parse_time(&format_time(d)), Some(d));
    }

    #[test]
    fn test_parse_time_or_seconds() {
        assert_eq!(parse_time_or_seconds("12.5"), Some(Duration::from_millis(12_500)));
        assert_eq!(parse_time_or_seconds("00:00:02.000"), Some(Duration::from_secs(2)));
        assert_eq!(parse_time_or_seconds("-1"), None);
        assert_eq!(parse_time_or_seconds("soon"), None);
    }

    #[test]
    fn test_parse_time_rejects_overflowing_hours() {
        assert_eq!(parse_time("18446744073709551615:00:00"), None);
        assert_eq!(parse_time("5124095576030431:00:00"), None);
    }

    #[test]
    fn test_parse_time_or_seconds_rejects_huge_values() {
        assert_eq!(parse_time_or_seconds("1e300"), None);
        assert_eq!(parse_time_or_seconds("inf"), None);
        assert_eq!(parse_time_or_seconds("NaN"), None);
    }
}
