//! Term window inference.

use chrono::{Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::constants::FALLBACK_TIMEZONE;
use crate::error::{ScheduleError, ScheduleResult};
use crate::event::CanonicalEvent;

/// Resolve a timezone: explicit argument, then the configured default, then UTC.
pub fn resolve_timezone(explicit: Option<&str>, default: Option<&str>) -> ScheduleResult<Tz> {
    let name = [explicit, default]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|name| !name.is_empty())
        .unwrap_or(FALLBACK_TIMEZONE);

    name.parse::<Tz>()
        .map_err(|_| ScheduleError::UnknownTimezone(name.to_string()))
}

/// The local calendar date right now in `tz`.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Fill in whichever window bound is missing with a `weeks`-long window.
pub fn infer_range_from(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
    weeks: i64,
) -> ScheduleResult<(NaiveDate, NaiveDate)> {
    let span = Duration::try_weeks(weeks)
        .and_then(|span| span.checked_sub(&Duration::days(1)))
        .ok_or_else(|| ScheduleError::out_of_range(format!("a {weeks}-week window")))?;

    let forward = |from: NaiveDate| {
        from.checked_add_signed(span)
            .ok_or_else(|| ScheduleError::out_of_range(format!("{weeks} weeks after {from}")))
    };

    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        (Some(start), None) => Ok((start, forward(start)?)),
        (None, Some(end)) => {
            let start = end
                .checked_sub_signed(span)
                .ok_or_else(|| ScheduleError::out_of_range(format!("{weeks} weeks before {end}")))?;
            Ok((start, end))
        }
        (None, None) => Ok((today, forward(today)?)),
    }
}

/// Resolve the window and timezone for a request, anchoring "today" in the
/// resolved timezone when neither bound is given.
pub fn infer_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    timezone: Option<&str>,
    settings: &Settings,
) -> ScheduleResult<(NaiveDate, NaiveDate, Tz)> {
    let tz = resolve_timezone(timezone, settings.default_timezone.as_deref())?;
    let (start, end) = infer_range_from(start, end, today_in(tz), settings.default_weeks)?;
    Ok((start, end, tz))
}

/// Window bounds for a batch, either of which may still be unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl Window {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Window {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Explicit bounds win; otherwise the earliest per-event start and the
    /// latest per-event end.
    pub fn resolve(
        events: &[CanonicalEvent],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Self {
        Window {
            start: start.or_else(|| events.iter().filter_map(|e| e.start_date).min()),
            end: end.or_else(|| events.iter().filter_map(|e| e.end_date).max()),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Concrete bounds, for callers that are about to export.
    pub fn require(&self) -> ScheduleResult<(NaiveDate, NaiveDate)> {
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return Err(ScheduleError::MissingRange(
                "the schedule: provide start_date and end_date (either globally or per event)"
                    .into(),
            ));
        };

        if start > end {
            return Err(ScheduleError::Order {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        Ok((start, end))
    }
}
