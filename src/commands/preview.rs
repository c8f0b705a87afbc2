use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use schedulify_core::Settings;
use schedulify_core::date_range::{Window, resolve_timezone};
use schedulify_core::pipeline::apply_window_dates;
use schedulify_core::recurrence::{expand_occurrences, plan_recurrences};

use crate::WindowArgs;
use crate::commands::read_request;
use crate::render::{Render, render_occurrence};

pub fn run(input: &Path, limit: u16, window: &WindowArgs, settings: &Settings) -> Result<()> {
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
    let (start, end) = Window::resolve(&events, request.start_date, request.end_date).require()?;

    let entries = plan_recurrences(&events, tz, Window::new(start, end))?;
    if entries.is_empty() {
        println!("{}", "No meetings fall inside the term".dimmed());
        return Ok(());
    }

    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", entry.render());

        let occurrences = expand_occurrences(entry, limit)?;
        for occurrence in &occurrences {
            println!("  {}", render_occurrence(occurrence));
        }
        if occurrences.len() == usize::from(limit) {
            println!("  {}", "…".dimmed());
        }
    }

    Ok(())
}
