//! Terminal rendering for schedulify-core types.
//!
//! Extension traits that add colored output using owo_colors.

use chrono::DateTime;
use chrono_tz::Tz;
use owo_colors::OwoColorize;
use schedulify_core::ExtractionReport;
use schedulify_core::heuristic::TermInfo;
use schedulify_core::recurrence::RecurrenceEntry;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for TermInfo {
    fn render(&self) -> String {
        let label = match self.label {
            Some(ref label) => label.bold().to_string(),
            None => "no term label found".dimmed().to_string(),
        };

        let range = match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => format!("{} → {}", start, end),
            _ => "no date range found".dimmed().to_string(),
        };

        format!("📚 {}\n   {}", label, range)
    }
}

impl Render for RecurrenceEntry {
    fn render(&self) -> String {
        let time = format!(
            "{}–{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        );
        let place = self
            .location
            .as_deref()
            .map(|loc| format!(" @ {}", loc))
            .unwrap_or_default();

        format!(
            "{} {} {}{}",
            self.day.code().cyan(),
            self.title.bold(),
            time.dimmed(),
            place.dimmed()
        )
    }
}

impl Render for ExtractionReport {
    fn render(&self) -> String {
        let mut lines = vec![format!(
            "{} {} {} in {}",
            "✓".green(),
            self.events.len(),
            if self.events.len() == 1 { "class" } else { "classes" },
            self.timezone
        )];

        if let (Some(start), Some(end)) = (self.inferred_start, self.inferred_end) {
            lines.push(format!("  term {} → {}", start, end));
        }

        if let Some(ref note) = self.note {
            lines.push(format!("{} {}", "!".yellow(), note.yellow()));
        }

        lines.join("\n")
    }
}

/// One concrete meeting, e.g. "Mon Jan 6  09:00 PST".
pub fn render_occurrence(occurrence: &DateTime<Tz>) -> String {
    format!(
        "{}  {}",
        occurrence.format("%a %b %-d"),
        occurrence.format("%H:%M %Z").dimmed()
    )
}
