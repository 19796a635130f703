use chrono::{DateTime, Duration, NaiveDate, TimeZone};

/// Dates are stored in the activity log in this format.
pub fn format_record_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Wall clock time of a record, minutes precision.
pub fn format_clock_time<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format("%H:%M").to_string()
}

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

/// Serializes [chrono::NaiveTime] as `HH:MM`. Seconds are accepted when reading.
pub mod hour_minute {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&s, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
    use serde::{Deserialize, Serialize};

    use super::{format_clock_time, format_duration, format_record_date};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Wrapper(#[serde(with = "super::hour_minute")] NaiveTime);

    #[test]
    fn test_hour_minute_format() {
        let time = NaiveTime::from_hms_opt(7, 5, 0).unwrap();
        assert_eq!(serde_json::to_string(&Wrapper(time)).unwrap(), "\"07:05\"");
        assert_eq!(
            serde_json::from_str::<Wrapper>("\"07:05:00\"").unwrap(),
            Wrapper(time)
        );
        assert!(serde_json::from_str::<Wrapper>("\"seven\"").is_err());
    }

    #[test]
    fn test_record_formats() {
        let date = NaiveDate::from_ymd_opt(2018, 7, 4).unwrap();
        assert_eq!(format_record_date(date), "2018-07-04");
        let time = Utc.with_ymd_and_hms(2018, 7, 4, 13, 9, 59).unwrap();
        assert_eq!(format_clock_time(&time), "13:09");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::seconds(42)), "42s");
        assert_eq!(format_duration(Duration::seconds(125)), "2m5s");
        assert_eq!(format_duration(Duration::seconds(3725)), "1h2m5s");
    }
}
