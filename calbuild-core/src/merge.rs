//! Deduplication and ordering of canonical events.

use std::collections::HashSet;

use crate::date::{Zone, parse_instant};
use crate::event::CanonicalEvent;

/// Drop duplicates and sort by start.
///
/// The first event with a given (title, start, end) triple wins outright.
/// Survivors are stably sorted by parsed start instant; events whose start
/// does not parse go last, in the order they came in.
pub fn merge(events: Vec<CanonicalEvent>, zone: &Zone) -> Vec<CanonicalEvent> {
    let mut merged = dedup(events);
    merged.sort_by_cached_key(|event| {
        let instant = parse_instant(&event.start, zone);
        (instant.is_none(), instant)
    });
    merged
}

fn dedup(events: Vec<CanonicalEvent>) -> Vec<CanonicalEvent> {
    let mut seen = HashSet::new();
    events
        .into_iter()
        .filter(|event| seen.insert(event.identity()))
        .collect()
}
