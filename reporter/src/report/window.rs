use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, Utc};
use thiserror::Error;

use crate::models::ReportWindow;

/// Layout of the stored `date_created` strings. Zero-padded and fixed width, so
/// lexicographic order equals chronological order.
pub const STORE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const LABEL_FORMAT: &str = "%Y-%m-%d";
const MAX_OFFSET_HOURS: i32 = 23;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("malformed trigger timestamp `{0}`")]
    MalformedTrigger(String),
    #[error("display offset {0}h is outside -23..=23")]
    InvalidOffset(i32),
}

/// A fixed UTC offset used only for the report label. No DST rules apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayZone {
    offset_hours: i32,
    name: String,
}

impl DisplayZone {
    pub fn new(offset_hours: i32, name: impl Into<String>) -> Result<Self, WindowError> {
        if !(-MAX_OFFSET_HOURS..=MAX_OFFSET_HOURS).contains(&offset_hours) {
            return Err(WindowError::InvalidOffset(offset_hours));
        }
        Ok(Self {
            offset_hours,
            name: name.into(),
        })
    }
}

/// Parses an ISO-8601 trigger. Offsets are normalized to UTC; a timestamp
/// without an offset is taken as UTC.
pub fn parse_trigger(raw: &str) -> Result<DateTime<Utc>, WindowError> {
    let trimmed = raw.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.and_utc()))
        .map_err(|_| WindowError::MalformedTrigger(raw.to_string()))
}

/// The UTC calendar day containing `trigger`, as `[00:00:00, 23:59:59]`.
pub fn resolve(trigger: DateTime<Utc>, zone: &DisplayZone) -> ReportWindow {
    let start = trigger.date_naive().and_time(NaiveTime::MIN).and_utc();
    let end = start + Duration::days(1) - Duration::seconds(1);
    let label = (start + Duration::hours(i64::from(zone.offset_hours)))
        .format(LABEL_FORMAT)
        .to_string();

    ReportWindow {
        start,
        end,
        label,
        zone_name: zone.name.clone(),
    }
}
