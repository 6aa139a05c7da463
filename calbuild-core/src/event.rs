//! The canonical event shared by every source and sink.

use serde::{Deserialize, Serialize};

use crate::date::{BARE_DATE_LEN, has_accepted_shape};

/// A normalized event.
///
/// Dates stay textual; they are only parsed when sorting and when encoding
/// the calendar file. Field order here is the key order of the JSON feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    pub title: String,
    pub start: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "allDay", default, skip_serializing_if = "Option::is_none")]
    pub all_day: Option<bool>,
}

/// The (title, start, end) triple two events must share to be duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub title: String,
    pub start: String,
    pub end: String,
}

impl CanonicalEvent {
    /// Build an event from resolved fields.
    ///
    /// Returns `None` unless both title and start are non-empty after
    /// trimming. Optional text fields that trim to nothing are dropped.
    pub fn new(title: Option<String>, start: Option<String>) -> Option<Self> {
        let title = non_empty(title)?;
        let start = non_empty(start)?;

        Some(CanonicalEvent {
            title,
            start,
            end: None,
            description: None,
            location: None,
            url: None,
            all_day: None,
        })
    }

    pub fn with_end(mut self, end: Option<String>) -> Self {
        self.end = non_empty(end);
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = non_empty(description);
        self
    }

    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = non_empty(location);
        self
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = non_empty(url);
        self
    }

    pub fn with_all_day(mut self, all_day: Option<bool>) -> Self {
        self.all_day = all_day;
        self
    }

    pub fn identity(&self) -> IdentityKey {
        IdentityKey {
            title: self.title.clone(),
            start: self.start.clone(),
            end: self.end.clone().unwrap_or_default(),
        }
    }

    /// Explicit `allDay` wins; otherwise a bare-date-length start with no end
    /// counts as all-day.
    pub fn is_all_day(&self) -> bool {
        match self.all_day {
            Some(all_day) => all_day,
            None => self.start.len() == BARE_DATE_LEN && self.end.is_none(),
        }
    }

    /// Date fields whose text matches neither accepted shape.
    pub fn malformed_dates(&self) -> Vec<(&'static str, &str)> {
        let mut malformed = Vec::new();
        if !has_accepted_shape(&self.start) {
            malformed.push(("start", self.start.as_str()));
        }
        if let Some(end) = self.end.as_deref() {
            if !has_accepted_shape(end) {
                malformed.push(("end", end));
            }
        }
        malformed
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
