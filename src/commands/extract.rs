use std::path::Path;

use anyhow::Result;
use schedulify_core::Settings;
use schedulify_core::pipeline::report_from_text;

use crate::WindowArgs;
use crate::commands::read_input;
use crate::render::Render;

/// Print the report as JSON on stdout, and a summary on stderr so the JSON
/// can be piped straight into `schedulify ics -`.
pub fn run(input: &Path, window: &WindowArgs, settings: &Settings) -> Result<()> {
    let text = read_input(input)?;

    let report = report_from_text(
        &text,
        window.start,
        window.end,
        window.tz.as_deref(),
        settings,
    )?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    eprintln!("{}", report.render());

    Ok(())
}
