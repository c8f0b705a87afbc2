//! Time-of-day parsing.

use chrono::NaiveTime;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ScheduleError, ScheduleResult};

static TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})(?::?(\d{2}))?\s*(am|pm)?$").expect("valid time pattern"));

/// Normalize a fuzzy time ("9am", "14:30", "2:45PM", "9.30") into 24-hour `HH:MM`.
pub fn normalize_time(value: &str) -> ScheduleResult<String> {
    let s = value.trim().to_lowercase();
    if s.is_empty() {
        return Err(ScheduleError::MissingField("time"));
    }

    let s = s.replace("a.m.", "am").replace("p.m.", "pm").replace('.', ":");

    let caps = TIME.captures(&s).ok_or_else(|| {
        ScheduleError::format("time", format!("'{value}' must look like 9:00, 9am, 9:30pm"))
    })?;

    let mut hour: u32 = caps[1]
        .parse()
        .map_err(|_| ScheduleError::format("time", format!("bad hour in '{value}'")))?;
    let minute: u32 = match caps.get(2) {
        Some(m) => m
            .as_str()
            .parse()
            .map_err(|_| ScheduleError::format("time", format!("bad minute in '{value}'")))?,
        None => 0,
    };

    match caps.get(3).map(|m| m.as_str()) {
        Some("pm") if hour != 12 => hour += 12,
        Some("am") if hour == 12 => hour = 0,
        _ => {}
    }

    if hour > 23 || minute > 59 {
        return Err(ScheduleError::format(
            "time",
            format!("'{value}' is out of range"),
        ));
    }

    Ok(format!("{hour:02}:{minute:02}"))
}

/// Parse an already-normalized `HH:MM` string.
pub fn parse_hhmm(value: &str) -> ScheduleResult<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| ScheduleError::format("time", format!("'{value}' is not HH:MM")))
}
