//! Recovering JSON from language model replies.
//!
//! Models asked for "JSON only" still wrap it in markdown fences, prefix it
//! with prose, or answer with a bullet list. [`parse_model_output`] tries, in
//! order: a fenced block, the first complete object or array, the whole reply,
//! and finally bullet lines of the form
//! `* CS 4661-01 LEC (92211): Friday 12:00PM - 2:45PM, ASCB 132`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Value, json};

use crate::error::{ScheduleError, ScheduleResult};

static FENCED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)```(?:json)?\s*(\{[\s\S]*?\}|\[[\s\S]*?\])\s*```").expect("valid fence pattern")
});

static BULLET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        ^\s*[-*•]\s*
        (?P<title>[^:]+?)\s*:\s*
        (?P<day>\b(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tues|tue|wed|thurs|thur|thu|fri|sat|sun)\b)\s+
        (?P<start>[\d:]+(?:\s?[ap]m)?)\s*-\s*(?P<end>[\d:]+(?:\s?[ap]m)?)\s*,\s*
        (?P<loc>.+?)\s*$",
    )
    .expect("valid bullet pattern")
});

/// The first `{` or `[` in `text` that opens a complete JSON value, parsed.
/// Trailing prose after the value is ignored.
fn first_json_value(text: &str) -> Option<Value> {
    text.char_indices()
        .filter(|&(_, c)| c == '{' || c == '[')
        .find_map(|(start, _)| {
            serde_json::Deserializer::from_str(&text[start..])
                .into_iter::<Value>()
                .next()
                .and_then(Result::ok)
        })
}

/// Parse bullet summaries into row objects. `None` when no line matched.
pub fn parse_bullet_lines(text: &str) -> Option<Vec<Value>> {
    let rows: Vec<Value> = text
        .lines()
        .filter_map(|line| BULLET.captures(line))
        .map(|caps| {
            json!({
                "title": caps["title"].trim(),
                "days": caps["day"].trim(),
                "start_time": caps["start"].trim().to_uppercase(),
                "end_time": caps["end"].trim().to_uppercase(),
                "location": caps["loc"].trim(),
            })
        })
        .collect();

    (!rows.is_empty()).then_some(rows)
}

/// Extract a JSON payload from a noisy model reply.
pub fn parse_model_output(text: &str) -> ScheduleResult<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ScheduleError::ExternalExtraction {
            message: "Empty model response".into(),
            raw: String::new(),
        });
    }

    let fenced = FENCED
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok());

    if let Some(value) = fenced
        .or_else(|| first_json_value(trimmed))
        .or_else(|| serde_json::from_str::<Value>(trimmed).ok())
    {
        return Ok(value);
    }

    if let Some(rows) = parse_bullet_lines(trimmed) {
        tracing::debug!(rows = rows.len(), "model reply parsed as bullet list");
        return Ok(Value::Array(rows));
    }

    Err(ScheduleError::ExternalExtraction {
        message: "Could not parse JSON from model response".into(),
        raw: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_json() {
        let value = parse_model_output(r#"[{"title": "A"}]"#).unwrap();
        assert_eq!(value[0]["title"], "A");
    }

    #[test]
    fn fenced_block_wins() {
        let reply = "Here you go:\n```json\n{\"events\": [{\"title\": \"B\"}]}\n```\nLet me know {if} you need more.";
        let value = parse_model_output(reply).unwrap();
        assert_eq!(value["events"][0]["title"], "B");
    }

    #[test]
    fn embedded_in_prose() {
        let reply = "Sure! The schedule is [{\"title\": \"C\", \"days\": \"MW\"}] as requested.";
        let value = parse_model_output(reply).unwrap();
        assert_eq!(value[0]["days"], "MW");
    }

    #[test]
    fn stray_braces_before_the_payload() {
        let reply = r#"I found {2} classes: [{"title":"A","days":"M"}] and {one} note."#;
        let value = parse_model_output(reply).unwrap();
        assert_eq!(value, serde_json::json!([{"title": "A", "days": "M"}]));

        let reply = r#"Result {see below}: {"classes": [{"title": "B"}]}"#;
        let value = parse_model_output(reply).unwrap();
        assert_eq!(value["classes"][0]["title"], "B");
    }

    #[test]
    fn bullet_fallback() {
        let reply = "I found these classes:\n\
            * CS 4661-01 LEC (92211): Friday 12:00PM - 2:45PM, ASCB 132\n\
            - MATH 2550: Tue 9:00am - 10:15am, Online\n\
            Hope that helps.";

        let value = parse_model_output(reply).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["title"], "CS 4661-01 LEC (92211)");
        assert_eq!(rows[0]["days"], "Friday");
        assert_eq!(rows[0]["start_time"], "12:00PM");
        assert_eq!(rows[0]["location"], "ASCB 132");
        assert_eq!(rows[1]["end_time"], "10:15AM");
    }

    #[test]
    fn unparseable_reply_keeps_raw_text() {
        let reply = "I'm sorry, I can't read this image.";
        match parse_model_output(reply) {
            Err(ScheduleError::ExternalExtraction { raw, .. }) => assert_eq!(raw, reply),
            other => panic!("expected extraction failure, got {other:?}"),
        }
    }

    #[test]
    fn empty_reply() {
        assert!(matches!(
            parse_model_output("  \n"),
            Err(ScheduleError::ExternalExtraction { .. })
        ));
    }
}
