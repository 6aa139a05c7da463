//! Core pipeline for calbuild.
//!
//! This crate turns a directory of loosely structured event files into a
//! canonical event list and renders it as JSON and as an iCalendar file:
//! - `source` enumerates and parses input files into raw records
//! - `normalize` resolves raw records into `CanonicalEvent`s
//! - `merge` deduplicates and sorts them
//! - `export` writes the JSON feed and the .ics calendar
//! - `pipeline` runs all of the above for one build

pub mod config;
pub mod date;
pub mod error;
pub mod event;
pub mod export;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod raw;
pub mod report;
pub mod source;

pub use error::{CalBuildError, CalBuildResult};
pub use event::CanonicalEvent;
