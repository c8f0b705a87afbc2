//! Google Calendar `events.insert` payloads.
//!
//! A client that already holds an OAuth token can post these bodies directly;
//! one body covers every weekday of an event through BYDAY.

use chrono::{NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::date_range::Window;
use crate::error::ScheduleResult;
use crate::event::CanonicalEvent;
use crate::recurrence::{end_day, first_on_or_after, localize};
use crate::time::parse_hhmm;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleDateTime {
    /// Local wall time, `YYYY-MM-DDTHH:MM:SS`
    pub date_time: String,
    pub time_zone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEvent {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: GoogleDateTime,
    pub end: GoogleDateTime,
    pub recurrence: Vec<String>,
}

/// Render an event as an `events.insert` body.
///
/// Returns `None` when none of the event's days fall inside its window.
pub fn to_google_event(
    event: &CanonicalEvent,
    tz: Tz,
    window: Window,
) -> ScheduleResult<Option<GoogleEvent>> {
    let (start_date, end_date) = event.effective_dates(window.start, window.end)?;

    // Google anchors the series at `start`, so it must itself be a meeting day
    let Some(first) = event
        .days
        .iter()
        .filter_map(|&day| first_on_or_after(start_date, day))
        .filter(|first| *first <= end_date)
        .min()
    else {
        return Ok(None);
    };

    let start_time = parse_hhmm(&event.start_time)?;
    let end_time = parse_hhmm(&event.end_time)?;
    let end_day = end_day(first, start_time, end_time)?;

    let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    let until = localize(tz, end_date.and_time(last_second))?.with_timezone(&Utc);

    let byday = event
        .days
        .iter()
        .map(|day| day.code())
        .collect::<Vec<_>>()
        .join(",");

    let wall = |dt: chrono::NaiveDateTime| GoogleDateTime {
        date_time: dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        time_zone: tz.name().to_string(),
    };

    Ok(Some(GoogleEvent {
        summary: event.title.clone(),
        location: event.location.clone(),
        description: event.description(),
        start: wall(first.and_time(start_time)),
        end: wall(end_day.and_time(end_time)),
        recurrence: vec![format!(
            "RRULE:FREQ=WEEKLY;BYDAY={byday};UNTIL={}",
            until.format("%Y%m%dT%H%M%SZ")
        )],
    }))
}
