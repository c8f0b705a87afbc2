//! Weekday parsing.
//!
//! Every path that turns free text into meeting days (extraction payloads,
//! hand-edited event rows, heuristic text blocks) goes through
//! [`normalize_days`], so there is exactly one alias table and one compact-run
//! scan in the crate.

use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::ScheduleError;

/// A meeting day. Index 0 is Monday, matching `chrono::Weekday::num_days_from_monday`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

const ALIASES: &[(&str, Day)] = &[
    ("m", Day::Monday),
    ("mo", Day::Monday),
    ("mon", Day::Monday),
    ("monday", Day::Monday),
    ("t", Day::Tuesday),
    ("tu", Day::Tuesday),
    ("tue", Day::Tuesday),
    ("tues", Day::Tuesday),
    ("tuesday", Day::Tuesday),
    ("w", Day::Wednesday),
    ("we", Day::Wednesday),
    ("wed", Day::Wednesday),
    ("wednesday", Day::Wednesday),
    ("th", Day::Thursday),
    ("thu", Day::Thursday),
    ("thur", Day::Thursday),
    ("thurs", Day::Thursday),
    ("thursday", Day::Thursday),
    ("f", Day::Friday),
    ("fr", Day::Friday),
    ("fri", Day::Friday),
    ("friday", Day::Friday),
    ("sa", Day::Saturday),
    ("sat", Day::Saturday),
    ("saturday", Day::Saturday),
    ("su", Day::Sunday),
    ("sun", Day::Sunday),
    ("sunday", Day::Sunday),
];

/// Two-letter prefixes matched before single letters inside a compact run,
/// so "TuTh" is Tuesday+Thursday rather than T, u, T, h.
const DIGRAPHS: &[&str] = &["th", "tu", "su", "sa", "mo"];

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub fn from_index(index: u32) -> Option<Day> {
        Day::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u32 {
        self as u32
    }

    /// RFC 5545 two-letter code (MO, TU, ...).
    pub fn code(self) -> &'static str {
        match self {
            Day::Monday => "MO",
            Day::Tuesday => "TU",
            Day::Wednesday => "WE",
            Day::Thursday => "TH",
            Day::Friday => "FR",
            Day::Saturday => "SA",
            Day::Sunday => "SU",
        }
    }

    pub fn weekday(self) -> Weekday {
        match self {
            Day::Monday => Weekday::Mon,
            Day::Tuesday => Weekday::Tue,
            Day::Wednesday => Weekday::Wed,
            Day::Thursday => Weekday::Thu,
            Day::Friday => Weekday::Fri,
            Day::Saturday => Weekday::Sat,
            Day::Sunday => Weekday::Sun,
        }
    }

    /// Look up a single alias ("thu", "F", "Monday", "MO").
    pub fn from_alias(token: &str) -> Option<Day> {
        let token = token.trim().to_lowercase();
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == token)
            .map(|(_, day)| *day)
    }
}

impl From<Weekday> for Day {
    fn from(weekday: Weekday) -> Self {
        Day::ALL[weekday.num_days_from_monday() as usize]
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Day {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Day::from_alias(s).ok_or_else(|| ScheduleError::format("day", format!("unknown day '{s}'")))
    }
}

impl Serialize for Day {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Day {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Split a token on the delimiters schedules use between days (`,` `/` whitespace).
pub fn split_day_tokens(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Scan a run like "mwf" or "tuth" left to right. Unknown characters are skipped.
fn expand_compact(token: &str, out: &mut Vec<Day>) {
    let chars: Vec<char> = token.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if i + 1 < chars.len() {
            let pair: String = chars[i..i + 2].iter().collect();
            if DIGRAPHS.contains(&pair.as_str()) {
                out.extend(Day::from_alias(&pair));
                i += 2;
                continue;
            }
        }

        out.extend(Day::from_alias(&chars[i].to_string()));
        i += 1;
    }
}

/// Normalize free-form day tokens into an ordered, de-duplicated day list.
///
/// Tokens that map to nothing are dropped silently; an empty result is the
/// caller's signal that the row was noise.
pub fn normalize_days<I, S>(tokens: I) -> Vec<Day>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut days = Vec::new();

    for token in tokens {
        let token = token.as_ref().trim().to_lowercase();
        if token.is_empty() {
            continue;
        }

        if let Some(day) = Day::from_alias(&token) {
            days.push(day);
            continue;
        }

        for part in split_day_tokens(&token) {
            match Day::from_alias(&part) {
                Some(day) => days.push(day),
                None => expand_compact(&part, &mut days),
            }
        }
    }

    let mut ordered: Vec<Day> = Vec::with_capacity(days.len());
    for day in days {
        if !ordered.contains(&day) {
            ordered.push(day);
        }
    }
    ordered
}
