use chrono::{DateTime, Duration, NaiveTime, TimeZone};
use now::DateTimeNow;

/// Returns start of the next day.
pub fn next_day_start<Tz: TimeZone>(date: DateTime<Tz>) -> DateTime<Tz> {
    (date.clone() + Duration::days(1))
        .with_time(NaiveTime::MIN)
        .earliest()
        .unwrap_or_else(|| date.end_of_day())
}

/// Half-open range `[start of day, start of next day)` containing `date`.
pub fn day_bounds<Tz: TimeZone>(date: &DateTime<Tz>) -> (DateTime<Tz>, DateTime<Tz>) {
    (date.beginning_of_day(), next_day_start(date.clone()))
}

/// Renders whole seconds the way listings show them, e.g. `1h2m3s`.
pub fn format_duration(v: Duration) -> String {
    if v.num_hours() > 0 {
        format!(
            "{}h{}m{}s",
            v.num_hours(),
            v.num_minutes() % 60,
            v.num_seconds() % 60
        )
    } else if v.num_minutes() > 0 {
        format!("{}m{}s", v.num_minutes() % 60, v.num_seconds() % 60)
    } else {
        format!("{}s", v.num_seconds() % 60)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, FixedOffset, TimeZone};

    use super::{day_bounds, format_duration};

    #[test]
    fn day_bounds_follow_the_offset() {
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        let moment = tz.with_ymd_and_hms(2024, 3, 10, 23, 30, 0).unwrap();

        let (start, end) = day_bounds(&moment);

        assert_eq!(start, tz.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap());
        assert_eq!(end, tz.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap());
    }

    #[test]
    fn format_duration_picks_largest_unit() {
        assert_eq!(format_duration(Duration::seconds(0)), "0s");
        assert_eq!(format_duration(Duration::seconds(59)), "59s");
        assert_eq!(format_duration(Duration::seconds(61)), "1m1s");
        assert_eq!(format_duration(Duration::seconds(3723)), "1h2m3s");
    }
}
