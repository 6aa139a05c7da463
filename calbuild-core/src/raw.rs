//! Raw records as read from source files, before normalization.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// A record from a JSON or YAML document.
///
/// Every key the field resolution policy looks at is listed explicitly;
/// anything else in the source object is ignored. Values stay untyped until
/// they are coerced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dtstart: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dtend: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Value>,
    #[serde(rename = "allDay", skip_serializing_if = "Option::is_none")]
    pub all_day: Option<Value>,
}

impl DocumentRecord {
    /// Read one element of a document. Non-objects yield an empty record,
    /// which then fails normalization like any record without a title.
    ///
    /// `allDay` is preferred over `all_day` when an object carries both.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return DocumentRecord::default();
        };
        let all_day = map.remove("allDay").or_else(|| map.remove("all_day"));

        DocumentRecord {
            title: map.remove("title"),
            summary: map.remove("summary"),
            name: map.remove("name"),
            start: map.remove("start"),
            dtstart: map.remove("dtstart"),
            end: map.remove("end"),
            dtend: map.remove("dtend"),
            description: map.remove("description"),
            location: map.remove("location"),
            url: map.remove("url"),
            all_day,
        }
    }

    pub fn resolve_title(&self) -> Option<String> {
        first_text([&self.title, &self.summary, &self.name])
    }

    pub fn resolve_start(&self) -> Option<String> {
        first_text([&self.start, &self.dtstart])
    }

    pub fn resolve_end(&self) -> Option<String> {
        first_text([&self.end, &self.dtend])
    }

    pub fn resolve_all_day(&self) -> Option<bool> {
        self.all_day.as_ref().and_then(coerce_flag)
    }
}

fn first_text<const N: usize>(candidates: [&Option<Value>; N]) -> Option<String> {
    candidates
        .into_iter()
        .find_map(|value| value.as_ref().and_then(coerce_text))
}

/// Coerce a scalar to trimmed, non-empty text.
///
/// Null, arrays and objects have no text form.
pub fn coerce_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Coerce a scalar to a flag.
pub fn coerce_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" | "false" | "no" | "0" => Some(false),
            _ => Some(true),
        },
        Value::Null => None,
        Value::Array(_) | Value::Object(_) => Some(true),
    }
}

/// A DTSTART/DTEND value as found in an .ics file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IcsTime {
    Date(NaiveDate),
    Utc(DateTime<Utc>),
    Floating(NaiveDateTime),
    Zoned { datetime: NaiveDateTime, tzid: String },
    /// Present but not readable as a date or date-time
    Unreadable(String),
}

/// A VEVENT component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VEventRecord {
    pub summary: Option<String>,
    pub dtstart: Option<IcsTime>,
    pub dtend: Option<IcsTime>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawRecord {
    Document(DocumentRecord),
    Calendar(VEventRecord),
}

impl RawRecord {
    /// A one-line rendering for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            RawRecord::Document(doc) => {
                serde_json::to_string(doc).unwrap_or_else(|_| format!("{doc:?}"))
            }
            RawRecord::Calendar(vevent) => format!("{vevent:?}"),
        }
    }
}

/// A raw record tagged with the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub origin: String,
    pub record: RawRecord,
}
