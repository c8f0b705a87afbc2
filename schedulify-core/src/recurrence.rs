//! Weekly recurrence planning.
//!
//! Each weekday of each event becomes its own [`RecurrenceEntry`], anchored
//! at the first matching date inside the event's window. An MWF class in a
//! term that starts on a Wednesday gets three entries starting Wed, Fri and
//! the following Mon.

use chrono::offset::LocalResult;
use chrono::{Datelike, DateTime, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;

use crate::date_range::Window;
use crate::days::Day;
use crate::error::{ScheduleError, ScheduleResult};
use crate::event::CanonicalEvent;
use crate::ics::generate_calendar;
use crate::time::parse_hhmm;

/// One weekly-repeating calendar component.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrenceEntry {
    pub uid: String,
    pub title: String,
    pub day: Day,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    /// Last instant of the term, 23:59:59 local on the end date.
    pub until: DateTime<Utc>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl RecurrenceEntry {
    /// RRULE value, e.g. `FREQ=WEEKLY;UNTIL=20250303T075959Z`.
    pub fn rrule(&self) -> String {
        format!("FREQ=WEEKLY;UNTIL={}", self.until.format("%Y%m%dT%H%M%SZ"))
    }

    pub fn timezone(&self) -> Tz {
        self.start.timezone()
    }
}

/// The first date on or after `start` that falls on `day`; `None` when that
/// would be past the last representable date.
pub fn first_on_or_after(start: NaiveDate, day: Day) -> Option<NaiveDate> {
    let delta = (day.index() + 7 - start.weekday().num_days_from_monday()) % 7;
    start.checked_add_days(Days::new(u64::from(delta)))
}

/// The day a block ending at `end` ends on, given that it starts on `first`.
/// An end time before the start time runs past midnight.
pub(crate) fn end_day(first: NaiveDate, start: NaiveTime, end: NaiveTime) -> ScheduleResult<NaiveDate> {
    if end >= start {
        return Ok(first);
    }
    first
        .succ_opt()
        .ok_or_else(|| ScheduleError::out_of_range(format!("the day after {first}")))
}

/// Attach a timezone to a wall-clock time.
///
/// Ambiguous times (DST fall-back) take the earlier instant. Times inside a
/// spring-forward gap are shifted forward by an hour.
pub fn localize(tz: Tz, naive: NaiveDateTime) -> ScheduleResult<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => naive
            .checked_add_signed(Duration::hours(1))
            .and_then(|shifted| tz.from_local_datetime(&shifted).earliest())
            .ok_or_else(|| ScheduleError::out_of_range(format!("{naive} in {}", tz.name()))),
    }
}

fn entry_uid(title: &str, day: Day, first: NaiveDate, start: NaiveTime) -> String {
    format!(
        "{}-{}-{}-{}@schedulify",
        slug::slugify(title),
        day.code().to_lowercase(),
        first.format("%Y%m%d"),
        start.format("%H%M")
    )
}

/// Expand events into per-weekday recurrence entries.
pub fn plan_recurrences(
    events: &[CanonicalEvent],
    tz: Tz,
    window: Window,
) -> ScheduleResult<Vec<RecurrenceEntry>> {
    let mut entries = Vec::new();

    for event in events {
        if event.days.is_empty() {
            continue;
        }

        let (start_date, end_date) = event.effective_dates(window.start, window.end)?;
        let start_time = parse_hhmm(&event.start_time)?;
        let end_time = parse_hhmm(&event.end_time)?;

        let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        let until = localize(tz, end_date.and_time(last_second))?.with_timezone(&Utc);
        let description = event.description();

        for &day in &event.days {
            let Some(first) = first_on_or_after(start_date, day).filter(|first| *first <= end_date) else {
                tracing::debug!(title = %event.title, %day, %end_date, "no meeting before term end");
                continue;
            };

            let end_day = end_day(first, start_time, end_time)?;

            entries.push(RecurrenceEntry {
                uid: entry_uid(&event.title, day, first, start_time),
                title: event.title.clone(),
                day,
                start: localize(tz, first.and_time(start_time))?,
                end: localize(tz, end_day.and_time(end_time))?,
                until,
                location: event.location.clone(),
                description: description.clone(),
            });
        }
    }

    Ok(entries)
}

/// Build a complete calendar file for a batch of events.
pub fn build_calendar(
    events: &[CanonicalEvent],
    tz: Tz,
    window: Window,
    calendar_name: &str,
) -> ScheduleResult<Vec<u8>> {
    let entries = plan_recurrences(events, tz, window)?;
    tracing::debug!(events = events.len(), entries = entries.len(), "planned recurrences");

    Ok(generate_calendar(&entries, tz, calendar_name).into_bytes())
}

/// Build the rrule crate's input for an entry.
fn build_rrule_string(entry: &RecurrenceEntry) -> String {
    let dtstart = if entry.timezone() == chrono_tz::UTC {
        format!(
            "DTSTART:{}",
            entry.start.with_timezone(&Utc).format("%Y%m%dT%H%M%SZ")
        )
    } else {
        format!(
            "DTSTART;TZID={}:{}",
            entry.timezone().name(),
            entry.start.naive_local().format("%Y%m%dT%H%M%S")
        )
    };

    format!("{dtstart}\nRRULE:{}", entry.rrule())
}

/// Concrete local start times of an entry, at most `limit` of them.
pub fn expand_occurrences(entry: &RecurrenceEntry, limit: u16) -> ScheduleResult<Vec<DateTime<Tz>>> {
    let rrule_set: RRuleSet = build_rrule_string(entry).parse().map_err(|e| {
        ScheduleError::IcsGenerate(format!("Failed to expand RRULE for '{}': {}", entry.uid, e))
    })?;

    let tz = entry.timezone();
    Ok(rrule_set
        .all(limit)
        .dates
        .iter()
        .map(|dt| dt.with_timezone(&tz))
        .collect())
}
