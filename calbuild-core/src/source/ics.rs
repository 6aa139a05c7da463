//! .ics file parsing using the icalendar crate's parser.

use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, Property, read_calendar, unfold},
};

use super::SourceParser;
use crate::error::{CalBuildError, CalBuildResult};
use crate::raw::{IcsTime, RawRecord, VEventRecord};

/// Every VEVENT in a calendar file; other components are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct IcsParser;

impl SourceParser for IcsParser {
    fn extensions(&self) -> &'static [&'static str] {
        &["ics"]
    }

    fn parse(&self, bytes: &[u8]) -> CalBuildResult<Vec<RawRecord>> {
        let content =
            std::str::from_utf8(bytes).map_err(|e| CalBuildError::IcsParse(e.to_string()))?;
        let unfolded = unfold(content);
        let calendar = read_calendar(&unfolded).map_err(CalBuildError::IcsParse)?;

        let mut records = Vec::new();
        collect_vevents(&calendar.components, &mut records);
        Ok(records)
    }
}

/// Walk components, descending into a VCALENDAR wrapper if the parser kept one.
fn collect_vevents(components: &[Component], records: &mut Vec<RawRecord>) {
    for component in components {
        if component.name == "VEVENT" {
            records.push(RawRecord::Calendar(vevent_record(component)));
        } else if component.name == "VCALENDAR" {
            collect_vevents(&component.components, records);
        }
    }
}

fn vevent_record(vevent: &Component) -> VEventRecord {
    let text = |name: &str| vevent.find_prop(name).map(|p| p.val.to_string());

    VEventRecord {
        summary: text("SUMMARY"),
        dtstart: vevent.find_prop("DTSTART").map(to_ics_time),
        dtend: vevent.find_prop("DTEND").map(to_ics_time),
        description: text("DESCRIPTION"),
        location: text("LOCATION"),
        url: text("URL"),
    }
}

/// Convert a DTSTART/DTEND property, keeping unreadable values visible so the
/// normalizer can report them.
fn to_ics_time(prop: &Property) -> IcsTime {
    match DatePerhapsTime::try_from(prop) {
        Ok(DatePerhapsTime::Date(d)) => IcsTime::Date(d),
        Ok(DatePerhapsTime::DateTime(cal_dt)) => match cal_dt {
            CalendarDateTime::Utc(dt) => IcsTime::Utc(dt),
            CalendarDateTime::Floating(naive) => IcsTime::Floating(naive),
            CalendarDateTime::WithTimezone { date_time, tzid } => IcsTime::Zoned {
                datetime: date_time,
                tzid,
            },
        },
        Err(_) => IcsTime::Unreadable(prop.val.to_string()),
    }
}
