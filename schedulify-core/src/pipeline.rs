//! End-to-end flows shared by the CLI and the HTTP service.
//!
//! Extraction flows produce an [`ExtractionReport`] for review and never fail
//! on a missing window. Export flows require a complete window.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapter::{FieldDefaults, adapt_events};
use crate::config::Settings;
use crate::constants::MISSING_DATES_NOTE;
use crate::date_range::{Window, infer_range, resolve_timezone};
use crate::error::ScheduleResult;
use crate::event::{CanonicalEvent, build_events};
use crate::heuristic::{TermInfo, detect_blocks, detect_term};
use crate::recurrence::build_calendar;

/// Extracted events plus what is known about their window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub events: Vec<CanonicalEvent>,
    pub timezone: String,
    pub inferred_start: Option<NaiveDate>,
    pub inferred_end: Option<NaiveDate>,
    pub needs_dates: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Term metadata found by the offline text path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<TermInfo>,
}

/// A batch of events to export, as posted by a client or read from disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarRequest {
    /// Canonical events or raw rows, in any shape the adapter accepts.
    pub events: Value,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub calendar_name: Option<String>,
}

impl CalendarRequest {
    /// Validate the rows. Rows here were reviewed by a person, so times are required.
    pub fn canonical_events(&self, settings: &Settings) -> ScheduleResult<Vec<CanonicalEvent>> {
        adapt_events(&self.events, &FieldDefaults::strict(), settings.time_order)
    }
}

/// Give every event without its own dates the explicit window dates.
pub fn apply_window_dates(
    events: Vec<CanonicalEvent>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<CanonicalEvent> {
    events
        .into_iter()
        .map(|event| event.fill_missing_dates(start, end))
        .collect()
}

/// Summarize extracted events for review.
pub fn build_report(
    events: Vec<CanonicalEvent>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    timezone: Option<&str>,
    settings: &Settings,
) -> ScheduleResult<ExtractionReport> {
    let tz = resolve_timezone(timezone, settings.default_timezone.as_deref())?;
    let events = apply_window_dates(events, start, end);

    let has_start = start.is_some() || events.iter().any(|e| e.start_date.is_some());
    let has_end = end.is_some() || events.iter().any(|e| e.end_date.is_some());
    let needs_dates = !(has_start && has_end);

    let (inferred_start, inferred_end) = if start.is_some() || end.is_some() {
        let (start, end, _) = infer_range(start, end, Some(tz.name()), settings)?;
        (Some(start), Some(end))
    } else {
        let window = Window::resolve(&events, None, None);
        (window.start, window.end)
    };

    tracing::debug!(
        events = events.len(),
        timezone = tz.name(),
        ?inferred_start,
        ?inferred_end,
        needs_dates,
        "built extraction report"
    );

    Ok(ExtractionReport {
        events,
        timezone: tz.name().to_string(),
        inferred_start,
        inferred_end,
        needs_dates,
        note: needs_dates.then(|| MISSING_DATES_NOTE.to_string()),
        term: None,
    })
}

/// Adapt a model payload and summarize it.
pub fn report_from_payload(
    raw: &Value,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    timezone: Option<&str>,
    settings: &Settings,
) -> ScheduleResult<ExtractionReport> {
    let events = adapt_events(raw, &FieldDefaults::from_settings(settings), settings.time_order)?;
    build_report(events, start, end, timezone, settings)
}

/// Offline path: heuristic blocks and term detection over OCR text.
///
/// Detected term dates stand in for explicit bounds that were not given, and
/// the detected label is attached to every event.
pub fn report_from_text(
    text: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    timezone: Option<&str>,
    settings: &Settings,
) -> ScheduleResult<ExtractionReport> {
    let term = detect_term(text);
    let candidates = detect_blocks(text);

    let events: Vec<CanonicalEvent> = build_events(&candidates, settings.time_order)?
        .into_iter()
        .map(|event| event.with_term_label(term.label.as_deref()))
        .collect();

    let mut report = build_report(
        events,
        start.or(term.start_date),
        end.or(term.end_date),
        timezone,
        settings,
    )?;
    report.term = Some(term);
    Ok(report)
}

/// Produce calendar file bytes, failing when no complete window can be resolved.
pub fn export_calendar(
    events: Vec<CanonicalEvent>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    timezone: Option<&str>,
    calendar_name: Option<&str>,
    settings: &Settings,
) -> ScheduleResult<Vec<u8>> {
    let tz = resolve_timezone(timezone, settings.default_timezone.as_deref())?;
    let events = apply_window_dates(events, start, end);

    let (start, end) = Window::resolve(&events, start, end).require()?;
    tracing::info!(events = events.len(), %start, %end, timezone = tz.name(), "exporting calendar");

    build_calendar(
        &events,
        tz,
        Window::new(start, end),
        calendar_name.unwrap_or(&settings.calendar_name),
    )
}

/// Export a [`CalendarRequest`].
pub fn export_request(request: &CalendarRequest, settings: &Settings) -> ScheduleResult<Vec<u8>> {
    export_calendar(
        request.canonical_events(settings)?,
        request.start_date,
        request.end_date,
        request.timezone.as_deref(),
        request.calendar_name.as_deref(),
        settings,
    )
}
