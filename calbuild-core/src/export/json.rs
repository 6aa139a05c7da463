//! JSON feed generation.

use crate::error::CalBuildResult;
use crate::event::CanonicalEvent;

/// Pretty-printed array with two-space indentation, absent fields omitted.
pub fn render_json(events: &[CanonicalEvent]) -> CalBuildResult<String> {
    Ok(serde_json::to_string_pretty(events)?)
}
