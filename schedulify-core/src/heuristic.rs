//! Offline schedule detection from OCR text.
//!
//! No model involved: lines are accumulated until the buffer contains both a
//! day token and an am/pm time range, at which point the buffer becomes one
//! block. Titles come out noisy (the whole buffer) and are meant to be cleaned
//! up by the person reviewing the extraction.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::event::EventCandidate;

/// Day aliases plus the fused runs schedules actually print. Deliberately a
/// subset of the normalizer's table: single letters are too noisy in prose.
static DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tues|tue|wed|thurs|thur|thu|fri|sat|sun|mtwthf|mwf|tuth|tth|mw|wf|mf)\b",
    )
    .expect("valid day pattern")
});

static TIME_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2}(?::\d{2})?)\s*([ap])\.?m\.?\s*(?:-|–|—|\bto\b)\s*(\d{1,2}(?::\d{2})?)\s*([ap])\.?m\.?",
    )
    .expect("valid time range pattern")
});

static TERM_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:spring|summer|fall|autumn|winter)(?:\s+(?:semester|quarter|term|session))?\s+\d{4}\b")
        .expect("valid term pattern")
});

const DATE: &str = r"(?:[A-Za-z]{3,9}\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4}|\d{1,2}/\d{1,2}/\d{2,4}|\d{4}-\d{1,2}-\d{1,2})";

static DATE_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)({DATE})\s*(?:-|–|—|\bto\b|\bthrough\b|\bthru\b)\s*({DATE})"
    ))
    .expect("valid date range pattern")
});

static NAMED_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]{3,9})\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})$")
        .expect("valid named date pattern")
});

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

/// Term metadata found anywhere in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermInfo {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub label: Option<String>,
}

/// Segment text into class blocks by day + time-range co-occurrence.
pub fn detect_blocks(text: &str) -> Vec<EventCandidate> {
    let mut blocks = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        buffer.push(line);
        let joined = buffer.join("\n");

        let days: Vec<String> = DAY
            .find_iter(&joined)
            .map(|m| m.as_str().to_string())
            .collect();
        if days.is_empty() {
            continue;
        }

        let Some(range) = TIME_RANGE.captures(&joined) else {
            continue;
        };

        blocks.push(EventCandidate {
            start_time: Some(format!("{}{}m", &range[1], range[2].to_lowercase())),
            end_time: Some(format!("{}{}m", &range[3], range[4].to_lowercase())),
            title: Some(joined),
            days,
            ..Default::default()
        });
        buffer.clear();
    }

    if !buffer.is_empty() {
        tracing::debug!(lines = buffer.len(), "trailing text did not form a block");
    }

    blocks
}

fn month_number(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    MONTHS
        .iter()
        .position(|month| name.len() >= 3 && month.starts_with(&name))
        .map(|i| i as u32 + 1)
}

/// Parse one absolute date as printed on a schedule.
pub fn parse_loose_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Some(caps) = NAMED_DATE.captures(raw) {
        let month = month_number(&caps[1])?;
        let day = caps[2].parse().ok()?;
        let year = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Find a term label ("Fall 2025") and a date range anywhere in `text`.
pub fn detect_term(text: &str) -> TermInfo {
    let label = TERM_LABEL
        .find(text)
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "));

    let range = DATE_RANGE.captures_iter(text).find_map(|caps| {
        let start = parse_loose_date(&caps[1])?;
        let end = parse_loose_date(&caps[2])?;
        Some((start, end))
    });

    TermInfo {
        start_date: range.map(|(start, _)| start),
        end_date: range.map(|(_, end)| end),
        label,
    }
}
