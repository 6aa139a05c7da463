//! JSON event documents.

use serde_json::Value;

use super::SourceParser;
use crate::error::CalBuildResult;
use crate::raw::{DocumentRecord, RawRecord};

/// A single event object or an array of them.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl SourceParser for JsonParser {
    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn parse(&self, bytes: &[u8]) -> CalBuildResult<Vec<RawRecord>> {
        let document: Value = serde_json::from_slice(bytes)?;
        Ok(document_records(document))
    }
}

/// Split a parsed document into one record per element.
pub(crate) fn document_records(document: Value) -> Vec<RawRecord> {
    match document {
        Value::Array(items) => items
            .into_iter()
            .map(|item| RawRecord::Document(DocumentRecord::from_value(item)))
            .collect(),
        other => vec![RawRecord::Document(DocumentRecord::from_value(other))],
    }
}
