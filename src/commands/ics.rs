use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use schedulify_core::Settings;
use schedulify_core::pipeline::export_calendar;

use crate::WindowArgs;
use crate::commands::read_request;

pub fn run(
    input: &Path,
    output: &Path,
    name: Option<&str>,
    window: &WindowArgs,
    settings: &Settings,
) -> Result<()> {
    let request = read_request(input, window)?;
    let events = request.canonical_events(settings)?;
    let count = events.len();

    let bytes = export_calendar(
        events,
        request.start_date,
        request.end_date,
        request.timezone.as_deref(),
        name.or(request.calendar_name.as_deref()),
        settings,
    )?;

    if output == Path::new("-") {
        std::io::stdout().write_all(&bytes)?;
        return Ok(());
    }

    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let meetings = bytes
        .split(|b| *b == b'\n')
        .filter(|line| line.starts_with(b"BEGIN:VEVENT"))
        .count();

    println!(
        "{} Wrote {} ({} {}, {} weekly {})",
        "✓".green(),
        output.display().bold(),
        count,
        pluralize("class", count),
        meetings,
        pluralize("series", meetings),
    );

    Ok(())
}

fn pluralize(word: &str, count: usize) -> String {
    match (word, count) {
        (_, 1) => word.to_string(),
        ("series", _) => word.to_string(),
        (w, _) if w.ends_with('s') => format!("{}es", w),
        (w, _) => format!("{}s", w),
    }
}
