use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    context::weather::Theme,
    utils::time::{format_clock_time, format_record_date},
};

/// A stay at a place, as shown in the schedule.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct ActivityEntity {
    pub location: Arc<str>,
    pub event_type: Arc<str>,
    /// `HH:MM` local time.
    pub start_time: String,
    /// `HH:MM` local time.
    pub end_time: String,
    /// Whole seconds.
    pub duration: i64,
    /// `YYYY-MM-DD` local date of the end of the stay.
    pub date: String,
    /// Exact start, used to recognize records of the same stay. Missing in older logs.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_seconds_option"
    )]
    pub started_at: Option<DateTime<Utc>>,
}

impl ActivityEntity {
    pub fn new(
        location: Arc<str>,
        event_type: Arc<str>,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Self {
        let start = started_at.with_timezone(&Local);
        let end = ended_at.with_timezone(&Local);
        Self {
            location,
            event_type,
            start_time: format_clock_time(&start),
            end_time: format_clock_time(&end),
            duration: (ended_at - started_at).num_seconds().max(0),
            date: format_record_date(end.date_naive()),
            started_at: Some(started_at),
        }
    }
}

/// Layout of `activities.json`.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Default)]
pub struct ActivityLogDocument {
    #[serde(default)]
    pub activities: Vec<ActivityEntity>,
}

/// One line of the tracking log.
#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
pub struct TrackingLogEntry {
    pub moment: DateTime<Utc>,
    pub title: String,
    #[serde(default)]
    pub duration: Option<String>,
    pub detail: String,
}

/// Live state of the daemon.
#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
pub struct StatusEntity {
    pub updated_at: DateTime<Utc>,
    pub speed: f64,
    pub speed_threshold: f64,
    pub theme: Theme,
    /// Newest entry last.
    pub log: Vec<TrackingLogEntry>,
}
