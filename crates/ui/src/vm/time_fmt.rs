use chrono::{DateTime, Utc};

#[must_use]
pub fn format_datetime(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

/// Play-screen countdown, `m:ss`.
#[must_use]
pub fn format_countdown(remaining_secs: u32) -> String {
    format!("{}:{:02}", remaining_secs / 60, remaining_secs % 60)
}

/// Results-screen duration: `1h 2m 3s`, `2m 3s` or `3s`.
#[must_use]
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;

    #[test]
    fn countdown_pads_seconds() {
        assert_eq!(format_countdown(0), "0:00");
        assert_eq!(format_countdown(9), "0:09");
        assert_eq!(format_countdown(75), "1:15");
    }

    #[test]
    fn duration_drops_empty_leading_units() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(25), "25s");
        assert_eq!(format_duration(60), "1m 0s");
        assert_eq!(format_duration(3725), "1h 2m 5s");
        assert_eq!(format_duration(3600), "1h 0m 0s");
    }

    #[test]
    fn datetime_is_rfc3339() {
        assert_eq!(format_datetime(fixed_now()), "2023-11-14T22:13:20+00:00");
    }
}
