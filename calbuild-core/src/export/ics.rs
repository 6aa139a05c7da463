//! .ics calendar generation.

use chrono::{DateTime, Utc};
use icalendar::{Calendar, Component, EventLike, Property, ValueType};
use uuid::Uuid;

use crate::date::{DateParts, Zone};
use crate::error::{CalBuildError, CalBuildResult};
use crate::event::CanonicalEvent;

pub const PRODID: &str = "-//calbuild//EN";

/// Settings for calendar generation.
#[derive(Debug, Clone)]
pub struct IcsOptions {
    /// Zone wall-clock times are decomposed in
    pub zone: Zone,
    /// DTSTAMP for every VEVENT
    pub stamp: DateTime<Utc>,
    /// Optional X-WR-CALNAME
    pub calendar_name: Option<String>,
}

impl IcsOptions {
    pub fn new(zone: Zone) -> Self {
        IcsOptions {
            zone,
            stamp: Utc::now(),
            calendar_name: None,
        }
    }
}

/// Generate a calendar holding one VEVENT per event.
///
/// Fails on the first event whose dates cannot be encoded; a calendar is only
/// ever produced for the full event list.
pub fn generate_calendar(events: &[CanonicalEvent], options: &IcsOptions) -> CalBuildResult<String> {
    let mut cal = Calendar::new();
    if let Some(ref name) = options.calendar_name {
        cal.name(name);
    }

    for event in events {
        cal.push(encode_event(event, options)?);
    }

    let cal = cal.done();
    Ok(strip_ics_bloat(&cal.to_string()))
}

fn encode_event(event: &CanonicalEvent, options: &IcsOptions) -> CalBuildResult<icalendar::Event> {
    let all_day = event.is_all_day();
    let start = decompose("start", &event.start, all_day, &options.zone)?;
    // All-day events carry their start day only; `end` is never read for them
    let end = event
        .end
        .as_deref()
        .filter(|_| !all_day)
        .map(|end| decompose("end", end, all_day, &options.zone))
        .transpose()?;

    let mut ics_event = icalendar::Event::new();
    ics_event.uid(&event_uid(event));
    ics_event.add_property("DTSTAMP", options.stamp.format("%Y%m%dT%H%M%SZ").to_string());
    ics_event.summary(&event.title);

    add_date_property(&mut ics_event, "DTSTART", &start, &options.zone)?;
    if let Some(ref end) = end {
        add_date_property(&mut ics_event, "DTEND", end, &options.zone)?;
    }

    if let Some(ref desc) = event.description {
        ics_event.description(desc);
    }

    if let Some(ref loc) = event.location {
        ics_event.location(loc);
    }

    if let Some(ref url) = event.url {
        ics_event.add_property("URL", url);
    }

    Ok(ics_event.done())
}

fn decompose(field: &'static str, text: &str, all_day: bool, zone: &Zone) -> CalBuildResult<DateParts> {
    DateParts::decompose(text, all_day, zone).ok_or_else(|| CalBuildError::InvalidDate {
        field,
        value: text.to_string(),
    })
}

/// Write decomposed parts as a DATE, or as a UTC DATE-TIME after anchoring
/// the wall-clock parts in `zone`.
fn add_date_property(
    ics_event: &mut icalendar::Event,
    name: &str,
    parts: &DateParts,
    zone: &Zone,
) -> CalBuildResult<()> {
    let invalid = || CalBuildError::IcsGenerate(format!("{name} {parts:?} is not a valid date"));

    match parts {
        DateParts::Day { .. } => {
            let date = parts.date().ok_or_else(invalid)?;
            let mut prop = Property::new(name, date.format("%Y%m%d").to_string());
            prop.append_parameter(ValueType::Date);
            ics_event.append_property(prop);
        }
        DateParts::Minute { .. } => {
            let instant = parts
                .wall_time()
                .and_then(|wall| zone.anchor(wall))
                .ok_or_else(invalid)?;
            ics_event.add_property(name, instant.format("%Y%m%dT%H%M%SZ").to_string());
        }
    }
    Ok(())
}

/// Stable UID derived from the identity triple, so rebuilding does not churn
/// subscribers' copies of unchanged events.
fn event_uid(event: &CanonicalEvent) -> String {
    let key = event.identity();
    let name = format!("{}\u{1f}{}\u{1f}{}", key.title, key.start, key.end);
    format!("{}@calbuild", Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()))
}

/// Clean up ICS output from the icalendar crate
/// - Replace PRODID with our own
/// - Remove CALSCALE:GREGORIAN (it's the default)
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(PRODID);
            result.push_str("\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}
