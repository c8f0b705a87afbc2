//! Extraction payload adapter.
//!
//! Language models and hand-edited uploads hand back JSON in a handful of
//! shapes. [`Payload::parse`] recognizes the known ones in a fixed priority
//! order and [`adapt`] turns each object row into an [`EventCandidate`].
//! Rows that are not objects are skipped.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::config::{Settings, TimeOrderRule};
use crate::days::{Day, split_day_tokens};
use crate::error::{ScheduleError, ScheduleResult};
use crate::event::{CanonicalEvent, EventCandidate, build_events};

/// Keys an object may carry its row array under, highest priority first.
const WRAPPER_KEYS: [&str; 3] = ["classes", "events", "items"];

/// The recognized top-level shapes of an extraction payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payload<'a> {
    /// `[{...}, {...}]`
    Array(&'a [Value]),
    /// `{"events": [{...}]}` and friends
    Wrapped {
        key: &'static str,
        items: &'a [Value],
    },
}

impl<'a> Payload<'a> {
    pub fn parse(value: &'a Value) -> ScheduleResult<Self> {
        match value {
            Value::Array(items) => Ok(Payload::Array(items)),
            Value::Object(map) => {
                // An empty list defers to the next key
                let mut empty = None;
                for key in WRAPPER_KEYS {
                    match map.get(key) {
                        Some(Value::Array(items)) if items.is_empty() => {
                            empty.get_or_insert(Payload::Wrapped { key, items });
                        }
                        Some(Value::Array(items)) => return Ok(Payload::Wrapped { key, items }),
                        None | Some(Value::Null) => continue,
                        Some(_) => {
                            return Err(ScheduleError::Shape(format!(
                                "expected a list under '{key}'"
                            )));
                        }
                    }
                }
                empty.ok_or_else(|| {
                    ScheduleError::Shape(format!(
                        "object has none of the keys {}",
                        WRAPPER_KEYS.join(", ")
                    ))
                })
            }
            other => Err(ScheduleError::Shape(format!(
                "expected a list or an object, got {}",
                json_kind(other)
            ))),
        }
    }

    pub fn items(&self) -> &'a [Value] {
        match self {
            Payload::Array(items) => items,
            Payload::Wrapped { items, .. } => items,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Values filled into candidates that arrive without them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDefaults {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl FieldDefaults {
    /// Defaults for model output, which routinely omits times.
    pub fn from_settings(settings: &Settings) -> Self {
        FieldDefaults {
            start_time: Some(settings.default_start_time.clone()),
            end_time: Some(settings.default_end_time.clone()),
        }
    }

    /// No defaults: rows edited by a person must carry their own times.
    pub fn strict() -> Self {
        FieldDefaults::default()
    }
}

fn text(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn date(map: &Map<String, Value>, key: &'static str) -> ScheduleResult<Option<NaiveDate>> {
    let Some(raw) = text(map, key).filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };

    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ScheduleError::format(key, format!("'{raw}' is not a YYYY-MM-DD date")))
}

/// Flatten a `days` value into tokens for the normalizer.
///
/// A string is passed through whole; list elements are split on delimiters,
/// and integers 0..=6 are read as weekday indices.
fn day_tokens(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(elements)) => elements
            .iter()
            .flat_map(|element| match element {
                Value::String(s) => split_day_tokens(s),
                Value::Number(n) => n
                    .as_u64()
                    .and_then(|i| u32::try_from(i).ok())
                    .and_then(Day::from_index)
                    .map(|day| vec![day.code().to_string()])
                    .unwrap_or_default(),
                _ => Vec::new(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn candidate_from_object(
    map: &Map<String, Value>,
    defaults: &FieldDefaults,
) -> ScheduleResult<EventCandidate> {
    let days = match map.get("days") {
        None | Some(Value::Null) => day_tokens(map.get("day")),
        days => day_tokens(days),
    };

    Ok(EventCandidate {
        title: text(map, "title"),
        days,
        start_time: text(map, "start_time").or_else(|| defaults.start_time.clone()),
        end_time: text(map, "end_time").or_else(|| defaults.end_time.clone()),
        location: text(map, "location"),
        instructor: text(map, "instructor"),
        notes: text(map, "notes"),
        term_label: text(map, "termLabel").or_else(|| text(map, "term_label")),
        start_date: date(map, "start_date")?,
        end_date: date(map, "end_date")?,
    })
}

/// Turn a raw extraction payload into candidates.
pub fn adapt(raw: &Value, defaults: &FieldDefaults) -> ScheduleResult<Vec<EventCandidate>> {
    let payload = Payload::parse(raw)?;

    let mut candidates = Vec::new();
    for item in payload.items() {
        let Value::Object(map) = item else {
            tracing::debug!(kind = json_kind(item), "skipping non-object row");
            continue;
        };
        candidates.push(candidate_from_object(map, defaults)?);
    }

    Ok(candidates)
}

/// Adapt and validate in one step, dropping rows without meeting days.
pub fn adapt_events(
    raw: &Value,
    defaults: &FieldDefaults,
    time_order: TimeOrderRule,
) -> ScheduleResult<Vec<CanonicalEvent>> {
    let candidates = adapt(raw, defaults)?;
    let events = build_events(&candidates, time_order)?;

    tracing::debug!(
        rows = candidates.len(),
        events = events.len(),
        "adapted extraction payload"
    );

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lenient() -> FieldDefaults {
        FieldDefaults::from_settings(&Settings::default())
    }

    #[test]
    fn bare_array() {
        let raw = json!([{"title": "CS 101", "days": "MWF", "start_time": "9am", "end_time": "9:50am"}]);
        let candidates = adapt(&raw, &lenient()).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].days, vec!["MWF"]);
    }

    #[test]
    fn wrapper_keys_in_priority_order() {
        let raw = json!({
            "items": [{"title": "from items", "days": "M"}],
            "classes": [{"title": "from classes", "days": "M"}],
        });
        assert!(matches!(
            Payload::parse(&raw).unwrap(),
            Payload::Wrapped { key: "classes", .. }
        ));

        let raw = json!({"events": [], "timezone": "UTC"});
        assert!(matches!(
            Payload::parse(&raw).unwrap(),
            Payload::Wrapped { key: "events", .. }
        ));
    }

    #[test]
    fn empty_list_defers_to_next_key() {
        let raw = json!({
            "classes": [],
            "events": [{"title": "Studio", "days": "W", "start_time": "2pm", "end_time": "5pm"}],
        });
        let candidates = adapt(&raw, &lenient()).unwrap();
        assert_eq!(candidates.len(), 1, "{candidates:#?}");
        assert_eq!(candidates[0].title.as_deref(), Some("Studio"));

        let raw = json!({"classes": [], "items": []});
        assert!(matches!(
            Payload::parse(&raw).unwrap(),
            Payload::Wrapped { key: "classes", .. }
        ));
    }

    #[test]
    fn unknown_shapes_are_rejected() {
        for raw in [json!("hello"), json!(42), json!({"rows": []}), json!({"events": "MWF"})] {
            assert!(
                matches!(adapt(&raw, &lenient()), Err(ScheduleError::Shape(_))),
                "expected shape error for {raw}"
            );
        }
    }

    #[test]
    fn junk_rows_are_skipped() {
        let raw = json!(["noise", 3, null, {"title": "Lab", "days": ["Tu"], "start_time": "1pm", "end_time": "3pm"}]);
        let candidates = adapt(&raw, &lenient()).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title.as_deref(), Some("Lab"));
    }

    #[test]
    fn day_lists_are_split_and_indices_read() {
        let raw = json!([{"days": ["Mon, Wed", "Fri/Sat", 6, 9, true]}]);
        let candidates = adapt(&raw, &lenient()).unwrap();
        assert_eq!(candidates[0].days, vec!["Mon", "Wed", "Fri", "Sat", "SU"]);
    }

    #[test]
    fn legacy_day_key() {
        let raw = json!([{"day": "Thursday"}]);
        let candidates = adapt(&raw, &lenient()).unwrap();
        assert_eq!(candidates[0].days, vec!["Thursday"]);
    }

    #[test]
    fn missing_times_use_defaults_only_when_lenient() {
        let raw = json!([{"title": "Seminar", "days": "F"}]);

        let lenient = adapt(&raw, &lenient()).unwrap();
        assert_eq!(lenient[0].start_time.as_deref(), Some("09:00"));
        assert_eq!(lenient[0].end_time.as_deref(), Some("10:00"));

        let strict = adapt(&raw, &FieldDefaults::strict()).unwrap();
        assert_eq!(strict[0].start_time, None);
    }

    #[test]
    fn per_row_dates_and_term_label() {
        let raw = json!([{
            "days": ["MO"],
            "start_date": "2025-01-06",
            "end_date": null,
            "termLabel": "Winter 2025"
        }]);
        let candidates = adapt(&raw, &lenient()).unwrap();
        assert_eq!(candidates[0].start_date, NaiveDate::from_ymd_opt(2025, 1, 6));
        assert_eq!(candidates[0].end_date, None);
        assert_eq!(candidates[0].term_label.as_deref(), Some("Winter 2025"));

        let bad = json!([{"days": "M", "start_date": "Jan 6"}]);
        assert!(matches!(
            adapt(&bad, &lenient()),
            Err(ScheduleError::Format { field: "start_date", .. })
        ));
    }

    #[test]
    fn one_noisy_row_does_not_sink_the_batch() {
        let raw = json!({"classes": [
            {"title": "Office hours", "days": "TBA", "start_time": "1pm", "end_time": "2pm"},
            {"title": "Chem 210", "days": "??", "start_time": "1pm", "end_time": "2pm"},
            {"title": "Bio 101", "days": "TuTh", "start_time": "10:30am", "end_time": "11:45am", "termLabel": "Fall 2025"}
        ]});

        let events = adapt_events(&raw, &lenient(), TimeOrderRule::Allow).unwrap();
        let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
        // "TBA" still yields Tuesday through the compact scan; "??" yields nothing
        assert_eq!(titles, vec!["Office hours", "Bio 101"]);
        assert_eq!(events[1].term_label.as_deref(), Some("Fall 2025"));
        assert_eq!(events[1].start_time, "10:30");
    }
}
