//! YAML event documents.

use serde_json::Value;

use super::SourceParser;
use super::json::document_records;
use crate::error::CalBuildResult;
use crate::raw::RawRecord;

/// Same shapes as JSON documents, in YAML syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlParser;

impl SourceParser for YamlParser {
    fn extensions(&self) -> &'static [&'static str] {
        &["yml", "yaml"]
    }

    fn parse(&self, bytes: &[u8]) -> CalBuildResult<Vec<RawRecord>> {
        // An empty document has nothing in it
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        let document: Value = serde_yaml::from_slice(bytes)?;
        Ok(document_records(document))
    }
}
