use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::db::DateRange;
use crate::error::MeetmindError;

/// `start_date` / `end_date` as given, plus the parsed window.
///
/// The window only applies when both bounds are present.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportPeriod {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(skip)]
    pub range: Option<DateRange>,
}

impl ReportPeriod {
    pub fn parse(start: Option<String>, end: Option<String>) -> Result<Self, MeetmindError> {
        let start = start.filter(|s| !s.trim().is_empty());
        let end = end.filter(|s| !s.trim().is_empty());

        let start_at = start
            .as_deref()
            .map(|s| parse_bound(s, false))
            .transpose()
            .map_err(MeetmindError::BadRequest)?;
        let end_at = end
            .as_deref()
            .map(|s| parse_bound(s, true))
            .transpose()
            .map_err(MeetmindError::BadRequest)?;

        let range = match (start_at, end_at) {
            (Some(start), Some(end)) if start > end => {
                return Err(MeetmindError::bad_request(
                    "start_date must not be after end_date",
                ));
            }
            (Some(start), Some(end)) => Some(DateRange { start, end }),
            _ => None,
        };

        Ok(Self {
            start_date: start,
            end_date: end,
            range,
        })
    }

    /// Whole days covered by the window, rounded up.
    pub fn days(&self) -> Option<i64> {
        self.range.map(|r| {
            let ms = (r.end - r.start).num_milliseconds();
            (ms + 86_399_999) / 86_400_000
        })
    }
}

/// Parses `YYYY-MM-DD` or RFC 3339. A bare date used as an end bound covers
/// the whole day.
pub fn parse_bound(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{raw}' (expected YYYY-MM-DD or RFC 3339)"))?;
    let time = if end_of_day {
        NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
    } else {
        Some(NaiveTime::MIN)
    };
    let time = time.ok_or_else(|| format!("Invalid date '{raw}'"))?;
    Ok(date.and_time(time).and_utc())
}
