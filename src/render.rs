//! Colored terminal output for build results.

use calbuild_core::pipeline::{BuildSummary, CalendarOutcome};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for CalendarOutcome {
    fn render(&self) -> String {
        match self {
            CalendarOutcome::Written { path } => {
                format!("{} {}", "✓".green(), path.display())
            }
            CalendarOutcome::Skipped { reason } => {
                format!("{} calendar skipped: {}", "!".yellow(), reason.dimmed())
            }
        }
    }
}

impl Render for BuildSummary {
    fn render(&self) -> String {
        let lines = [
            format!(
                "Loaded {} {}, wrote {} {}",
                self.records_loaded,
                pluralize("record", self.records_loaded),
                self.events_written.bold(),
                pluralize("event", self.events_written),
            ),
            format!("{} {}", "✓".green(), self.events_path.display()),
            self.calendar.render(),
        ];
        lines.join("\n")
    }
}

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("event", 1), "event");
        assert_eq!(pluralize("event", 0), "events");
        assert_eq!(pluralize("record", 3), "records");
    }

    #[test]
    fn test_summary_mentions_both_artifacts() {
        let summary = BuildSummary {
            records_loaded: 3,
            events_normalized: 3,
            events_written: 2,
            events_path: PathBuf::from("public/events.json"),
            calendar: CalendarOutcome::Skipped {
                reason: "Invalid start date 'soon'".into(),
            },
        };

        let rendered = summary.render();
        assert!(rendered.contains("public/events.json"), "Got: {}", rendered);
        assert!(rendered.contains("calendar skipped"), "Got: {}", rendered);
        assert!(rendered.contains("3 records"), "Got: {}", rendered);
    }
}
