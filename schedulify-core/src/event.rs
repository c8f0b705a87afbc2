//! Canonical class-meeting events.
//!
//! An [`EventCandidate`] is whatever an extraction source handed us, with all
//! fields still raw text. [`build_event`] normalizes and validates one
//! candidate into a [`CanonicalEvent`], the only representation the
//! recurrence builder accepts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::TimeOrderRule;
use crate::constants::DEFAULT_TITLE;
use crate::days::{Day, normalize_days};
use crate::error::{ScheduleError, ScheduleResult};
use crate::time::normalize_time;

/// Raw fields for one class block, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventCandidate {
    pub title: Option<String>,
    /// Day tokens exactly as extracted ("MWF", "Tu", "Monday", ...).
    pub days: Vec<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub instructor: Option<String>,
    pub notes: Option<String>,
    pub term_label: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// One validated weekly class meeting pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    pub title: String,
    pub days: Vec<Day>,
    /// `HH:MM`, 24-hour
    pub start_time: String,
    /// `HH:MM`, 24-hour
    pub end_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(
        default,
        rename = "termLabel",
        alias = "term_label",
        skip_serializing_if = "Option::is_none"
    )]
    pub term_label: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Trim free text, treating blank as absent.
pub(crate) fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn required_time(field: &'static str, value: Option<&str>) -> ScheduleResult<String> {
    let value = value.ok_or(ScheduleError::MissingField(field))?;
    normalize_time(value).map_err(|err| match err {
        ScheduleError::Format { message, .. } => ScheduleError::Format { field, message },
        ScheduleError::MissingField(_) => ScheduleError::MissingField(field),
        other => other,
    })
}

/// Normalize and validate a single candidate.
///
/// A candidate whose days normalize to nothing fails with
/// [`ScheduleError::NoMeetingDays`]; batch callers skip those rows. Date
/// ordering is not checked here, see [`CanonicalEvent::effective_dates`].
pub fn build_event(candidate: &EventCandidate, time_order: TimeOrderRule) -> ScheduleResult<CanonicalEvent> {
    let title = clean_text(candidate.title.as_deref()).unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let days = normalize_days(&candidate.days);
    if days.is_empty() {
        return Err(ScheduleError::NoMeetingDays(title));
    }

    let start_time = required_time("start_time", candidate.start_time.as_deref())?;
    let end_time = required_time("end_time", candidate.end_time.as_deref())?;

    // HH:MM compares correctly as text
    if time_order == TimeOrderRule::Reject && end_time < start_time {
        return Err(ScheduleError::TimeOrder {
            title,
            start: start_time,
            end: end_time,
        });
    }

    Ok(CanonicalEvent {
        title,
        days,
        start_time,
        end_time,
        location: clean_text(candidate.location.as_deref()),
        instructor: clean_text(candidate.instructor.as_deref()),
        notes: clean_text(candidate.notes.as_deref()),
        term_label: None,
        start_date: candidate.start_date,
        end_date: candidate.end_date,
    })
}

/// Build every candidate in a batch, dropping rows without meeting days.
///
/// Any other validation failure (a malformed time, say) aborts the batch,
/// since it means the payload itself is wrong rather than noisy.
pub fn build_events(
    candidates: &[EventCandidate],
    time_order: TimeOrderRule,
) -> ScheduleResult<Vec<CanonicalEvent>> {
    let mut events = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        match build_event(candidate, time_order) {
            Ok(event) => events.push(event.with_term_label(candidate.term_label.as_deref())),
            Err(ScheduleError::NoMeetingDays(title)) => {
                tracing::debug!(%title, days = ?candidate.days, "skipping row without meeting days");
            }
            Err(err) => return Err(err),
        }
    }

    Ok(events)
}

impl CanonicalEvent {
    pub fn with_term_label(self, label: Option<&str>) -> Self {
        CanonicalEvent {
            term_label: clean_text(label),
            ..self
        }
    }

    /// Apply window dates to whichever of this event's dates are absent.
    pub fn fill_missing_dates(self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        CanonicalEvent {
            start_date: self.start_date.or(start),
            end_date: self.end_date.or(end),
            ..self
        }
    }

    /// This event's own dates, falling back to the window's.
    pub fn effective_dates(
        &self,
        window_start: Option<NaiveDate>,
        window_end: Option<NaiveDate>,
    ) -> ScheduleResult<(NaiveDate, NaiveDate)> {
        let start = self.start_date.or(window_start);
        let end = self.end_date.or(window_end);

        let (Some(start), Some(end)) = (start, end) else {
            return Err(ScheduleError::MissingRange(self.title.clone()));
        };

        if start > end {
            return Err(ScheduleError::DateRange(self.title.clone()));
        }

        Ok((start, end))
    }

    /// DESCRIPTION text: instructor, notes and term, one per line.
    pub fn description(&self) -> Option<String> {
        let mut lines = Vec::new();

        if let Some(ref instructor) = self.instructor {
            lines.push(format!("Instructor: {instructor}"));
        }
        if let Some(ref notes) = self.notes {
            lines.push(notes.clone());
        }
        if let Some(ref term) = self.term_label {
            lines.push(format!("Term: {term}"));
        }

        (!lines.is_empty()).then(|| lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(days: &[&str], start: &str, end: &str) -> EventCandidate {
        EventCandidate {
            title: Some("MATH 101".to_string()),
            days: days.iter().map(|d| d.to_string()).collect(),
            start_time: Some(start.to_string()),
            end_time: Some(end.to_string()),
            ..Default::default()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn builds_normalized_event() {
        let mut c = candidate(&["MWF"], "9am", "9:50am");
        c.location = Some("  Room 204 ".to_string());
        c.notes = Some("   ".to_string());

        let event = build_event(&c, TimeOrderRule::Allow).unwrap();
        assert_eq!(event.days, vec![Day::Monday, Day::Wednesday, Day::Friday]);
        assert_eq!(event.start_time, "09:00");
        assert_eq!(event.end_time, "09:50");
        assert_eq!(event.location.as_deref(), Some("Room 204"));
        assert_eq!(event.notes, None);
    }

    #[test]
    fn missing_title_gets_placeholder() {
        let mut c = candidate(&["Tu"], "10:00", "11:00");
        c.title = Some(" ".to_string());
        assert_eq!(build_event(&c, TimeOrderRule::Allow).unwrap().title, "Class");
    }

    #[test]
    fn empty_days_is_noise() {
        let c = candidate(&["xyz", "?"], "10:00", "11:00");
        assert!(matches!(
            build_event(&c, TimeOrderRule::Allow),
            Err(ScheduleError::NoMeetingDays(_))
        ));
    }

    #[test]
    fn missing_time_names_the_field() {
        let mut c = candidate(&["M"], "10:00", "11:00");
        c.end_time = None;
        assert!(matches!(
            build_event(&c, TimeOrderRule::Allow),
            Err(ScheduleError::MissingField("end_time"))
        ));
    }

    #[test]
    fn malformed_time_names_the_field() {
        let c = candidate(&["M"], "26:00", "11:00");
        match build_event(&c, TimeOrderRule::Allow) {
            Err(ScheduleError::Format { field, .. }) => assert_eq!(field, "start_time"),
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn reversed_times_follow_rule() {
        let c = candidate(&["F"], "11pm", "1am");
        assert!(build_event(&c, TimeOrderRule::Allow).is_ok());
        assert!(matches!(
            build_event(&c, TimeOrderRule::Reject),
            Err(ScheduleError::TimeOrder { .. })
        ));
    }

    #[test]
    fn batch_skips_noise_rows() {
        let rows = vec![
            EventCandidate {
                days: vec!["???".to_string()],
                ..candidate(&[], "9am", "10am")
            },
            EventCandidate {
                term_label: Some("Fall 2025".to_string()),
                ..candidate(&["TuTh"], "1pm", "2:15pm")
            },
        ];

        let events = build_events(&rows, TimeOrderRule::Allow).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].term_label.as_deref(), Some("Fall 2025"));
    }

    #[test]
    fn batch_surfaces_bad_times() {
        let rows = vec![candidate(&["M"], "9am", "10am"), candidate(&["W"], "99:00", "10am")];
        assert!(build_events(&rows, TimeOrderRule::Allow).is_err());
    }

    #[test]
    fn fill_missing_dates_only_fills_absent() {
        let mut event = build_event(&candidate(&["M"], "9am", "10am"), TimeOrderRule::Allow).unwrap();
        event.start_date = Some(date(2025, 2, 1));

        let filled = event.fill_missing_dates(Some(date(2025, 1, 6)), Some(date(2025, 3, 2)));
        assert_eq!(filled.start_date, Some(date(2025, 2, 1)));
        assert_eq!(filled.end_date, Some(date(2025, 3, 2)));
    }

    #[test]
    fn effective_dates_checks_order_lazily() {
        let mut event = build_event(&candidate(&["M"], "9am", "10am"), TimeOrderRule::Allow).unwrap();
        event.start_date = Some(date(2025, 4, 1));

        assert!(matches!(
            event.effective_dates(None, Some(date(2025, 3, 1))),
            Err(ScheduleError::DateRange(_))
        ));
        assert!(matches!(
            event.effective_dates(None, None),
            Err(ScheduleError::MissingRange(_))
        ));
        assert_eq!(
            event.effective_dates(None, Some(date(2025, 5, 1))).unwrap(),
            (date(2025, 4, 1), date(2025, 5, 1))
        );
    }

    #[test]
    fn description_lines() {
        let event = build_event(
            &EventCandidate {
                instructor: Some("Dr. Ng".to_string()),
                notes: Some("Bring laptop".to_string()),
                ..candidate(&["M"], "9am", "10am")
            },
            TimeOrderRule::Allow,
        )
        .unwrap()
        .with_term_label(Some("Spring 2025"));

        assert_eq!(
            event.description().as_deref(),
            Some("Instructor: Dr. Ng\nBring laptop\nTerm: Spring 2025")
        );
    }

    #[test]
    fn serializes_term_label_in_camel_case() {
        let event = build_event(&candidate(&["M"], "9am", "10am"), TimeOrderRule::Allow)
            .unwrap()
            .with_term_label(Some("Fall 2025"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["termLabel"], "Fall 2025");
        assert_eq!(json["days"], serde_json::json!(["MO"]));
        assert_eq!(json["start_date"], serde_json::Value::Null);
    }
}
