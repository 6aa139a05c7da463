//! One full build: load, normalize, merge, export.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::config::BuildConfig;
use crate::date::Zone;
use crate::error::CalBuildResult;
use crate::event::CanonicalEvent;
use crate::export::{IcsOptions, generate_calendar, render_json};
use crate::merge::merge;
use crate::normalize::Normalizer;
use crate::report::{Diagnostic, Reporter};
use crate::source::{ParserRegistry, SourceLoader};

/// What happened to the .ics artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarOutcome {
    Written { path: PathBuf },
    Skipped { reason: String },
}

/// Counts and paths of a finished build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    /// Raw records read from all source files
    pub records_loaded: usize,
    /// Records that became canonical events
    pub events_normalized: usize,
    /// Events left after deduplication, as written to the JSON feed
    pub events_written: usize,
    pub events_path: PathBuf,
    pub calendar: CalendarOutcome,
}

pub struct Pipeline<'a> {
    config: BuildConfig,
    zone: Zone,
    stamp: DateTime<Utc>,
    registry: ParserRegistry,
    reporter: &'a dyn Reporter,
}

impl<'a> Pipeline<'a> {
    /// Fails only if the configured time zone is unknown.
    pub fn new(config: BuildConfig, reporter: &'a dyn Reporter) -> CalBuildResult<Self> {
        let zone = config.zone()?;
        Ok(Pipeline {
            config,
            zone,
            stamp: Utc::now(),
            registry: ParserRegistry::standard(),
            reporter,
        })
    }

    /// DTSTAMP written into every VEVENT.
    pub fn with_stamp(mut self, stamp: DateTime<Utc>) -> Self {
        self.stamp = stamp;
        self
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// Run the build.
    ///
    /// Errors only when the JSON feed cannot be written. Calendar problems
    /// are reported and show up as [`CalendarOutcome::Skipped`].
    pub async fn run(&self) -> CalBuildResult<BuildSummary> {
        let source_dir = self.config.source_path();
        tracing::debug!(dir = %source_dir.display(), zone = %self.zone, "Loading sources");

        let records = SourceLoader::new(&self.registry, self.reporter)
            .load(&source_dir)
            .await;
        let records_loaded = records.len();

        let events = Normalizer::new(self.zone, self.reporter).normalize_all(records);
        let events_normalized = events.len();

        let events = merge(events, &self.zone);
        tracing::debug!(
            loaded = records_loaded,
            normalized = events_normalized,
            merged = events.len(),
            "Merged events"
        );

        tokio::fs::create_dir_all(self.config.output_path()).await?;

        let events_path = self.config.events_path();
        let json = render_json(&events)?;
        tokio::fs::write(&events_path, json).await?;

        let calendar = self.write_calendar(&events).await;

        Ok(BuildSummary {
            records_loaded,
            events_normalized,
            events_written: events.len(),
            events_path,
            calendar,
        })
    }

    /// Publish the calendar. On failure any earlier calendar file is removed.
    async fn write_calendar(&self, events: &[CanonicalEvent]) -> CalendarOutcome {
        let path = self.config.calendar_path();

        match self.publish_calendar(events, &path).await {
            Ok(()) => CalendarOutcome::Written { path },
            Err(e) => {
                remove_if_present(&path).await;
                let reason = e.to_string();
                self.reporter.report(Diagnostic::CalendarSkipped {
                    message: reason.clone(),
                });
                CalendarOutcome::Skipped { reason }
            }
        }
    }

    /// Encode everything, then swap the file in with a rename.
    async fn publish_calendar(&self, events: &[CanonicalEvent], path: &Path) -> CalBuildResult<()> {
        let options = IcsOptions {
            zone: self.zone,
            stamp: self.stamp,
            calendar_name: self.config.calendar_name.clone(),
        };
        let ics = generate_calendar(events, &options)?;

        let tmp = staging_path(path);
        let written = match tokio::fs::write(&tmp, ics).await {
            Ok(()) => tokio::fs::rename(&tmp, path).await,
            Err(e) => Err(e),
        };
        if written.is_err() {
            remove_if_present(&tmp).await;
        }
        written.map_err(Into::into)
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut staged = path.as_os_str().to_owned();
    staged.push(".tmp");
    PathBuf::from(staged)
}

async fn remove_if_present(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed calendar file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Could not remove calendar file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{CollectingReporter, Severity};
    use chrono::TimeZone;
    use tempfile::TempDir;

    struct Fixture {
        tmp: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            std::fs::create_dir(tmp.path().join("tasks")).unwrap();
            Fixture { tmp }
        }

        fn source(&self, name: &str, content: &str) {
            std::fs::write(self.tmp.path().join("tasks").join(name), content).unwrap();
        }

        fn config(&self) -> BuildConfig {
            BuildConfig {
                source_dir: self.tmp.path().join("tasks"),
                output_dir: self.tmp.path().join("public"),
                timezone: Some("UTC".into()),
                ..Default::default()
            }
        }

        fn output(&self, name: &str) -> PathBuf {
            self.tmp.path().join("public").join(name)
        }

        fn events(&self) -> Vec<CanonicalEvent> {
            let json = std::fs::read_to_string(self.output("events.json")).unwrap();
            serde_json::from_str(&json).unwrap()
        }
    }

    async fn build(fixture: &Fixture, reporter: &CollectingReporter) -> BuildSummary {
        Pipeline::new(fixture.config(), reporter)
            .unwrap()
            .with_stamp(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
            .run()
            .await
            .expect("Build should succeed")
    }

    const TEAM_ICS: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
UID:review-1\r\n\
SUMMARY:Sprint review\r\n\
DTSTART:20240604T130000Z\r\n\
DTEND:20240604T140000Z\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:holiday-1\r\n\
SUMMARY:Holiday\r\n\
DTSTART;VALUE=DATE:20240704\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    #[tokio::test]
    async fn test_mixed_sources_merge_into_both_artifacts() {
        let fixture = Fixture::new();
        fixture.source(
            "a.json",
            r#"[{"title":"Standup","start":"2024-06-03T09:00:00Z"},{"title":"Standup","start":"2024-06-03T09:00:00Z"}]"#,
        );
        fixture.source("b.yaml", "- summary: Planning\n  dtstart: 2024-06-05T14:00:00Z\n");
        fixture.source("c.ics", TEAM_ICS);
        fixture.source("notes.md", "# not events");

        let reporter = CollectingReporter::new();
        let summary = build(&fixture, &reporter).await;

        assert_eq!(summary.records_loaded, 5);
        assert_eq!(summary.events_normalized, 5);
        assert_eq!(summary.events_written, 4);
        assert_eq!(
            summary.calendar,
            CalendarOutcome::Written {
                path: fixture.output("calendar.ics")
            }
        );

        let titles: Vec<String> = fixture.events().into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["Standup", "Sprint review", "Planning", "Holiday"]);

        let ics = std::fs::read_to_string(fixture.output("calendar.ics")).unwrap();
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 4);
        assert!(ics.contains("DTSTART;VALUE=DATE:20240704"), "ICS:\n{}", ics);
        assert!(ics.contains("DTSTART:20240603T090000Z"), "ICS:\n{}", ics);
    }

    #[tokio::test]
    async fn test_invalid_file_does_not_block_siblings() {
        let fixture = Fixture::new();
        fixture.source("a.json", r#"{"title":"Kept","start":"2024-06-03"}"#);
        fixture.source("b.json", r#"{"title": "Broken", "start": "#);
        fixture.source("c.yml", "title: [unclosed\n");

        let reporter = CollectingReporter::new();
        let summary = build(&fixture, &reporter).await;

        assert_eq!(summary.events_written, 1);
        assert_eq!(fixture.events()[0].title, "Kept");
        assert_eq!(reporter.count(Severity::Error), 2);
    }

    #[tokio::test]
    async fn test_unparseable_start_skips_only_the_calendar() {
        let fixture = Fixture::new();
        fixture.source(
            "a.json",
            r#"[{"title":"Fine","start":"2024-06-03T09:00:00Z"},{"title":"Vague","start":"sometime in June"}]"#,
        );

        let reporter = CollectingReporter::new();
        let summary = build(&fixture, &reporter).await;

        assert!(
            matches!(summary.calendar, CalendarOutcome::Skipped { .. }),
            "Got: {:?}",
            summary.calendar
        );
        assert!(!fixture.output("calendar.ics").exists());

        let events = fixture.events();
        assert_eq!(events.len(), 2);
        // Unparseable start sorts last
        assert_eq!(events[1].title, "Vague");

        let diagnostics = reporter.diagnostics();
        assert!(diagnostics.iter().any(|d| matches!(d, Diagnostic::DateShape { .. })));
        assert!(diagnostics.iter().any(|d| matches!(d, Diagnostic::CalendarSkipped { .. })));
    }

    #[tokio::test]
    async fn test_skipped_calendar_removes_previous_file() {
        let fixture = Fixture::new();
        fixture.source("a.json", r#"{"title":"Old","start":"2024-06-03T09:00:00Z"}"#);

        let reporter = CollectingReporter::new();
        let first = build(&fixture, &reporter).await;
        assert!(matches!(first.calendar, CalendarOutcome::Written { .. }));
        assert!(fixture.output("calendar.ics").exists());

        fixture.source(
            "a.json",
            r#"[{"title":"New","start":"2024-06-04T09:00:00Z"},{"title":"Bad","start":"someday"}]"#,
        );
        let second = build(&fixture, &reporter).await;

        assert!(
            matches!(second.calendar, CalendarOutcome::Skipped { .. }),
            "Got: {:?}",
            second.calendar
        );
        assert!(!fixture.output("calendar.ics").exists());
        assert!(!fixture.output("calendar.ics.tmp").exists());
        let titles: Vec<String> = fixture.events().into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["New", "Bad"]);
    }

    #[tokio::test]
    async fn test_written_calendar_leaves_no_staging_file() {
        let fixture = Fixture::new();
        fixture.source("a.json", r#"{"title":"A","start":"2024-06-03"}"#);

        let reporter = CollectingReporter::new();
        build(&fixture, &reporter).await;

        assert!(fixture.output("calendar.ics").is_file());
        assert!(!fixture.output("calendar.ics.tmp").exists());
    }

    #[tokio::test]
    async fn test_rebuild_is_byte_identical() {
        let fixture = Fixture::new();
        fixture.source(
            "a.json",
            r#"[{"title":"B","start":"2024-06-04"},{"title":"A","start":"2024-06-03T10:00"}]"#,
        );
        fixture.source("b.ics", TEAM_ICS);

        let reporter = CollectingReporter::new();
        build(&fixture, &reporter).await;
        let first_json = std::fs::read(fixture.output("events.json")).unwrap();
        let first_ics = std::fs::read(fixture.output("calendar.ics")).unwrap();

        build(&fixture, &reporter).await;
        assert_eq!(std::fs::read(fixture.output("events.json")).unwrap(), first_json);
        assert_eq!(std::fs::read(fixture.output("calendar.ics")).unwrap(), first_ics);
    }

    #[tokio::test]
    async fn test_missing_source_dir_builds_empty_feed() {
        let fixture = Fixture::new();
        let mut config = fixture.config();
        config.source_dir = fixture.tmp.path().join("missing");

        let reporter = CollectingReporter::new();
        let summary = Pipeline::new(config, &reporter).unwrap().run().await.unwrap();

        assert_eq!(summary.events_written, 0);
        assert!(fixture.tmp.path().join("missing").is_dir());
        assert_eq!(std::fs::read_to_string(fixture.output("events.json")).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_output_count_never_exceeds_records() {
        let fixture = Fixture::new();
        fixture.source(
            "a.json",
            r#"[{"title":"A","start":"2024-06-03"},{"start":"2024-06-03"},{"title":"A","start":"2024-06-03"},"junk"]"#,
        );

        let reporter = CollectingReporter::new();
        let summary = build(&fixture, &reporter).await;

        assert_eq!(summary.records_loaded, 4);
        assert_eq!(summary.events_normalized, 2);
        assert_eq!(summary.events_written, 1);
        assert!(summary.events_written <= summary.records_loaded);
    }

    #[tokio::test]
    async fn test_unwritable_output_is_fatal() {
        let fixture = Fixture::new();
        fixture.source("a.json", r#"{"title":"A","start":"2024-06-03"}"#);
        // A file where the output directory should be
        let blocker = fixture.tmp.path().join("public");
        std::fs::write(&blocker, "not a directory").unwrap();

        let reporter = CollectingReporter::new();
        let result = Pipeline::new(fixture.config(), &reporter).unwrap().run().await;
        assert!(result.is_err());
        assert!(blocker.is_file());
    }

    #[test]
    fn test_unknown_timezone_is_rejected_up_front() {
        let config = BuildConfig {
            timezone: Some("Atlantis/Capital".into()),
            ..Default::default()
        };
        let reporter = CollectingReporter::new();
        assert!(Pipeline::new(config, &reporter).is_err());
    }
}
