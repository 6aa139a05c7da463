//! Raw record → canonical event.

use chrono_tz::Tz;

use crate::date::{Zone, format_date, format_utc};
use crate::event::CanonicalEvent;
use crate::raw::{DocumentRecord, IcsTime, RawRecord, SourceRecord, VEventRecord, coerce_text};
use crate::report::{Diagnostic, Reporter};

/// Title given to VEVENTs without a SUMMARY
pub const UNTITLED: &str = "Untitled";

/// Converts raw records into canonical events, reporting what it drops.
pub struct Normalizer<'a> {
    zone: Zone,
    reporter: &'a dyn Reporter,
}

impl<'a> Normalizer<'a> {
    pub fn new(zone: Zone, reporter: &'a dyn Reporter) -> Self {
        Normalizer { zone, reporter }
    }

    /// Normalize every record, keeping input order.
    pub fn normalize_all(&self, records: Vec<SourceRecord>) -> Vec<CanonicalEvent> {
        records
            .into_iter()
            .filter_map(|source| self.normalize(&source.record, &source.origin))
            .collect()
    }

    /// Normalize one record, or `None` if it lacks a title or start.
    pub fn normalize(&self, raw: &RawRecord, origin: &str) -> Option<CanonicalEvent> {
        let event = match raw {
            RawRecord::Document(doc) => resolve_document(doc),
            RawRecord::Calendar(vevent) => self.resolve_vevent(vevent, origin),
        };

        let Some(event) = event else {
            self.reporter.report(Diagnostic::RecordRejected {
                origin: origin.to_string(),
                raw: raw.describe(),
            });
            return None;
        };

        for (field, value) in event.malformed_dates() {
            self.reporter.report(Diagnostic::DateShape {
                origin: origin.to_string(),
                field,
                value: value.to_string(),
            });
        }

        Some(event)
    }

    fn resolve_vevent(&self, vevent: &VEventRecord, origin: &str) -> Option<CanonicalEvent> {
        let start = self.convert_time("start", vevent.dtstart.as_ref(), origin);
        let end = self.convert_time("end", vevent.dtend.as_ref(), origin);
        let title = vevent
            .summary
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());

        // VALUE=DATE is an explicit all-day marker
        let all_day = matches!(vevent.dtstart, Some(IcsTime::Date(_))).then_some(true);

        Some(
            CanonicalEvent::new(Some(title), start)?
                .with_end(end)
                .with_description(vevent.description.clone())
                .with_location(vevent.location.clone())
                .with_url(vevent.url.clone())
                .with_all_day(all_day),
        )
    }

    /// Render a calendar time as text. Values that do not name a valid
    /// instant are reported and treated as absent.
    fn convert_time(
        &self,
        field: &'static str,
        time: Option<&IcsTime>,
        origin: &str,
    ) -> Option<String> {
        let time = time?;
        let converted = match time {
            IcsTime::Date(date) => Some(format_date(*date)),
            IcsTime::Utc(dt) => Some(format_utc(*dt)),
            IcsTime::Floating(naive) => self.zone.anchor(*naive).map(format_utc),
            IcsTime::Zoned { datetime, tzid } => tzid
                .parse::<Tz>()
                .ok()
                .and_then(|tz| Zone::Named(tz).anchor(*datetime))
                .map(format_utc),
            IcsTime::Unreadable(_) => None,
        };

        if converted.is_none() {
            self.reporter.report(Diagnostic::InvalidInstant {
                origin: origin.to_string(),
                field,
                value: describe_time(time),
            });
        }
        converted
    }
}

fn resolve_document(doc: &DocumentRecord) -> Option<CanonicalEvent> {
    let description = doc.description.as_ref().and_then(coerce_text);
    let location = doc.location.as_ref().and_then(coerce_text);
    let url = doc.url.as_ref().and_then(coerce_text);

    Some(
        CanonicalEvent::new(doc.resolve_title(), doc.resolve_start())?
            .with_end(doc.resolve_end())
            .with_description(description)
            .with_location(location)
            .with_url(url)
            .with_all_day(doc.resolve_all_day()),
    )
}

fn describe_time(time: &IcsTime) -> String {
    match time {
        IcsTime::Date(date) => format_date(*date),
        IcsTime::Utc(dt) => format_utc(*dt),
        IcsTime::Floating(naive) => naive.format("%Y-%m-%dT%H:%M:%S").to_string(),
        IcsTime::Zoned { datetime, tzid } => {
            format!("{} ({tzid})", datetime.format("%Y-%m-%dT%H:%M:%S"))
        }
        IcsTime::Unreadable(raw) => raw.clone(),
    }
}

/// Convenience for callers holding a single record; equivalent to
/// `Normalizer::new(zone, reporter).normalize(raw, origin)`.
pub fn normalize(
    raw: &RawRecord,
    origin: &str,
    zone: Zone,
    reporter: &dyn Reporter,
) -> Option<CanonicalEvent> {
    Normalizer::new(zone, reporter).normalize(raw, origin)
}
