//! Output artifacts.
//!
//! The JSON feed is a direct re-encoding of the canonical events. The .ics
//! calendar maps each event to a VEVENT with its own all-day and date rules.

mod ics;
mod json;

pub use ics::{IcsOptions, generate_calendar};
pub use json::render_json;
