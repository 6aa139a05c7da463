//! Source discovery and parsing.
//!
//! A source directory holds event files in several formats. Each format is a
//! [`SourceParser`] registered under its file extensions; the loader picks one
//! by lookup and never needs to know what the formats are.

mod ics;
mod json;
mod yaml;

pub use ics::IcsParser;
pub use json::JsonParser;
pub use yaml::YamlParser;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::CalBuildResult;
use crate::raw::{RawRecord, SourceRecord};
use crate::report::{Diagnostic, Reporter};

/// Turns the bytes of one file into raw records.
pub trait SourceParser: Send + Sync {
    /// Lower-case extensions, without the dot
    fn extensions(&self) -> &'static [&'static str];

    fn parse(&self, bytes: &[u8]) -> CalBuildResult<Vec<RawRecord>>;
}

/// Maps file extensions to parsers.
pub struct ParserRegistry {
    parsers: HashMap<&'static str, Box<dyn SourceParser>>,
}

impl ParserRegistry {
    pub fn empty() -> Self {
        ParserRegistry {
            parsers: HashMap::new(),
        }
    }

    /// JSON, YAML and iCalendar.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(JsonParser);
        registry.register(YamlParser);
        registry.register(IcsParser);
        registry
    }

    pub fn register<P: SourceParser + Clone + 'static>(&mut self, parser: P) {
        for ext in parser.extensions() {
            self.parsers.insert(*ext, Box::new(parser.clone()));
        }
    }

    /// Parser for a path, by its case-insensitive extension.
    pub fn for_path(&self, path: &Path) -> Option<&dyn SourceParser> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.parsers.get(ext.as_str()).map(|p| p.as_ref())
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Reads every event file in a directory.
pub struct SourceLoader<'a> {
    registry: &'a ParserRegistry,
    reporter: &'a dyn Reporter,
}

impl<'a> SourceLoader<'a> {
    pub fn new(registry: &'a ParserRegistry, reporter: &'a dyn Reporter) -> Self {
        SourceLoader { registry, reporter }
    }

    /// Load all records from `dir`, in file-name order.
    ///
    /// A file that fails to read or parse contributes nothing; everything
    /// gathered from other files is kept. A missing directory is created and
    /// yields no records.
    pub async fn load(&self, dir: &Path) -> Vec<SourceRecord> {
        let files = match self.list_files(dir).await {
            Ok(files) => files,
            Err(e) => {
                self.reporter.report(Diagnostic::SourceDirUnreadable {
                    path: dir.display().to_string(),
                    message: e.to_string(),
                });
                return Vec::new();
            }
        };

        let mut records = Vec::new();
        for path in files {
            let file = file_name(&path);

            let Some(parser) = self.registry.for_path(&path) else {
                self.reporter.report(Diagnostic::FileSkipped { file });
                continue;
            };

            match read_and_parse(parser, &path).await {
                Ok(parsed) => {
                    tracing::debug!(file = %file, records = parsed.len(), "Parsed source file");
                    records.extend(parsed.into_iter().map(|record| SourceRecord {
                        origin: file.clone(),
                        record,
                    }));
                }
                Err(e) => self.reporter.report(Diagnostic::FileFailed {
                    file,
                    message: e.to_string(),
                }),
            }
        }

        records
    }

    /// Regular, non-hidden files in `dir`, sorted by name.
    async fn list_files(&self, dir: &Path) -> CalBuildResult<Vec<PathBuf>> {
        if !tokio::fs::try_exists(dir).await? {
            tokio::fs::create_dir_all(dir).await?;
            self.reporter.report(Diagnostic::SourceDirCreated {
                path: dir.display().to_string(),
            });
            return Ok(Vec::new());
        }

        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if hidden || !entry.file_type().await?.is_file() {
                continue;
            }
            files.push(entry.path());
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }
}

async fn read_and_parse(parser: &dyn SourceParser, path: &Path) -> CalBuildResult<Vec<RawRecord>> {
    let bytes = tokio::fs::read(path).await?;
    parser.parse(&bytes)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CollectingReporter;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_registry_lookup_is_case_insensitive() {
        let registry = ParserRegistry::standard();
        assert!(registry.for_path(Path::new("a.JSON")).is_some());
        assert!(registry.for_path(Path::new("a.yml")).is_some());
        assert!(registry.for_path(Path::new("a.Yaml")).is_some());
        assert!(registry.for_path(Path::new("a.ics")).is_some());
        assert!(registry.for_path(Path::new("a.txt")).is_none());
        assert!(registry.for_path(Path::new("README")).is_none());
    }

    #[tokio::test]
    async fn test_load_in_name_order_and_skip_unknown() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "b.json", r#"{"title":"B","start":"2024-01-02"}"#);
        write(tmp.path(), "a.yaml", "title: A\nstart: 2024-01-01\n");
        write(tmp.path(), "notes.txt", "not an event");
        write(tmp.path(), ".hidden.json", r#"{"title":"Hidden","start":"2024-01-03"}"#);
        std::fs::create_dir(tmp.path().join("nested.json")).unwrap();

        let registry = ParserRegistry::standard();
        let reporter = CollectingReporter::new();
        let records = SourceLoader::new(&registry, &reporter).load(tmp.path()).await;

        let origins: Vec<&str> = records.iter().map(|r| r.origin.as_str()).collect();
        assert_eq!(origins, vec!["a.yaml", "b.json"]);
        assert_eq!(
            reporter.diagnostics(),
            vec![Diagnostic::FileSkipped {
                file: "notes.txt".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_broken_file_does_not_affect_siblings() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.json", r#"[{"title":"A","start":"2024-01-01"}]"#);
        write(tmp.path(), "b.json", r#"[{"title":"B","start":"#);
        write(tmp.path(), "c.json", r#"{"title":"C","start":"2024-01-03"}"#);

        let registry = ParserRegistry::standard();
        let reporter = CollectingReporter::new();
        let records = SourceLoader::new(&registry, &reporter).load(tmp.path()).await;

        assert_eq!(records.len(), 2);
        let diagnostics = reporter.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert!(
            matches!(&diagnostics[0], Diagnostic::FileFailed { file, .. } if file == "b.json"),
            "Got: {:?}",
            diagnostics
        );
    }

    #[tokio::test]
    async fn test_missing_directory_is_created() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("tasks");

        let registry = ParserRegistry::standard();
        let reporter = CollectingReporter::new();
        let records = SourceLoader::new(&registry, &reporter).load(&dir).await;

        assert!(records.is_empty());
        assert!(dir.is_dir());
        assert!(matches!(
            reporter.diagnostics().as_slice(),
            [Diagnostic::SourceDirCreated { .. }]
        ));
    }
}
