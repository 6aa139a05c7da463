//! Build configuration.
//!
//! Settings are layered: built-in defaults, then an optional `calbuild.toml`,
//! then `CALBUILD_*` environment variables. The binary applies its own flags
//! on top.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::date::Zone;
use crate::error::{CalBuildError, CalBuildResult};

pub const DEFAULT_CONFIG_FILE: &str = "calbuild.toml";
pub const ENV_PREFIX: &str = "CALBUILD";

static DEFAULT_SOURCE_DIR: &str = "tasks";
static DEFAULT_OUTPUT_DIR: &str = "public";
static DEFAULT_EVENTS_FILE: &str = "events.json";
static DEFAULT_CALENDAR_FILE: &str = "calendar.ics";

fn default_source_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SOURCE_DIR)
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_events_file() -> String {
    DEFAULT_EVENTS_FILE.to_string()
}

fn default_calendar_file() -> String {
    DEFAULT_CALENDAR_FILE.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Directory scanned for event files
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Directory the artifacts are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_events_file")]
    pub events_file: String,

    #[serde(default = "default_calendar_file")]
    pub calendar_file: String,

    /// IANA zone for wall-clock times; the system zone when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    /// X-WR-CALNAME of the generated calendar
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_name: Option<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            source_dir: default_source_dir(),
            output_dir: default_output_dir(),
            events_file: default_events_file(),
            calendar_file: default_calendar_file(),
            timezone: None,
            calendar_name: None,
        }
    }
}

impl BuildConfig {
    /// Load from `calbuild.toml` in the working directory (if present) and
    /// the environment.
    pub fn load() -> CalBuildResult<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE), false)
    }

    /// Load with an explicit config file. A `required` file that does not
    /// exist is an error.
    pub fn load_from(path: &Path, required: bool) -> CalBuildResult<Self> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(required))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .map_err(|e| CalBuildError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalBuildError::Config(e.to_string()))
    }

    pub fn source_path(&self) -> PathBuf {
        expand(&self.source_dir)
    }

    pub fn output_path(&self) -> PathBuf {
        expand(&self.output_dir)
    }

    pub fn events_path(&self) -> PathBuf {
        self.output_path().join(&self.events_file)
    }

    pub fn calendar_path(&self) -> PathBuf {
        self.output_path().join(&self.calendar_file)
    }

    /// The configured zone, or the system zone.
    pub fn zone(&self) -> CalBuildResult<Zone> {
        match self.timezone.as_deref() {
            Some(name) if !name.trim().is_empty() => Zone::from_name(name),
            _ => Ok(Zone::Local),
        }
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}
