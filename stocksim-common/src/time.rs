//! Timestamp utilities

use chrono::{DateTime, Local, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Wall-clock time of day for console output (`HH:MM:SS`, local time)
pub fn clock_label(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Full local date and time for alert banners (`YYYY-MM-DD HH:MM:SS`)
pub fn datetime_label(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_labels_share_local_clock() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 5).unwrap();
        let datetime = datetime_label(ts);
        assert!(datetime.ends_with(&clock_label(ts)));
        // Zone offsets are whole minutes
        assert_eq!(&datetime[17..], "05");
    }

    #[test]
    fn test_clock_label_shape() {
        let label = clock_label(now());
        assert_eq!(label.len(), 8);
        assert_eq!(label.matches(':').count(), 2);
    }

    #[test]
    fn test_datetime_label_shape() {
        let label = datetime_label(now());
        assert_eq!(label.len(), 19);
        assert_eq!(&label[4..5], "-");
        assert_eq!(&label[10..11], " ");
    }
}
