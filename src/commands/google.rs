use std::path::Path;

use anyhow::Result;
use schedulify_core::Settings;
use schedulify_core::date_range::{Window, resolve_timezone};
use schedulify_core::google::to_google_event;
use schedulify_core::pipeline::apply_window_dates;

use crate::WindowArgs;
use crate::commands::read_request;

pub fn run(input: &Path, window: &WindowArgs, settings: &Settings) -> Result<()> {
    let request = read_request(input, window)?;
    let tz = resolve_timezone(
        request.timezone.as_deref(),
        settings.default_timezone.as_deref(),
    )?;

    let events = apply_window_dates(
        request.canonical_events(settings)?,
        request.start_date,
        request.end_date,
    );
    let window = Window::resolve(&events, request.start_date, request.end_date);

    let mut bodies = Vec::new();
    for event in &events {
        match to_google_event(event, tz, window)? {
            Some(body) => bodies.push(body),
            None => tracing::warn!(title = %event.title, "no meeting inside the term, skipped"),
        }
    }

    println!("{}", serde_json::to_string_pretty(&bodies)?);
    Ok(())
}
