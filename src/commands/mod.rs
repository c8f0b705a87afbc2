pub mod extract;
pub mod google;
pub mod ics;
pub mod preview;
pub mod term;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use schedulify_core::CalendarRequest;
use serde_json::Value;

use crate::WindowArgs;

/// Read a file, or stdin when the path is "-".
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }

    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Load an events file as a calendar request.
///
/// Accepts a saved extraction report or request (an object with `events`),
/// or any payload the adapter understands. Command-line window options win
/// over values stored in the file.
pub fn read_request(path: &Path, window: &WindowArgs) -> Result<CalendarRequest> {
    let text = read_input(path)?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let mut request = match value {
        Value::Object(ref map) if map.contains_key("events") => {
            serde_json::from_value::<CalendarRequest>(value)
                .with_context(|| format!("Failed to read events from {}", path.display()))?
        }
        events => CalendarRequest {
            events,
            ..Default::default()
        },
    };

    if window.tz.is_some() {
        request.timezone = window.tz.clone();
    }
    request.start_date = window.start.or(request.start_date);
    request.end_date = window.end.or(request.end_date);

    Ok(request)
}
