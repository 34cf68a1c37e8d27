use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{SearchError, SearchResult};

/// What a worker does with chunk bytes that are not valid UTF-8.
///
/// Counting always runs over the raw bytes; the mode only decides whether the
/// content is checked first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Bytes are counted as-is, no validation
    #[default]
    Raw,
    /// Invalid UTF-8 aborts the run with `SearchError::EncodingError`
    FailFast,
    /// Invalid UTF-8 is counted anyway and a warning is logged
    Lossy,
}

impl std::str::FromStr for EncodingMode {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "failfast" | "fail-fast" => Ok(Self::FailFast),
            "lossy" => Ok(Self::Lossy),
            other => Err(SearchError::invalid_argument(format!(
                "unknown encoding mode '{}' (expected raw|failfast|lossy)",
                other
            ))),
        }
    }
}

/// Configuration for a single scan run.
///
/// # Configuration Locations
///
/// Values are layered in order of increasing precedence:
/// 1. Global `$HOME/.config/chunkscout/config.yaml`
/// 2. Local `.chunkscout.yaml` in the current directory
/// 3. Custom config file specified via `--config`
/// 4. Command-line arguments (see [`ScanConfig::merge_with_cli`])
///
/// # Configuration Format
///
/// ```yaml
/// # Literal keyword to count
/// keyword: "TODO"
///
/// # File to scan
/// path: "logs/app.log"
///
/// # Number of workers (default: CPU cores, clamped to the line count)
/// worker_count: 4
///
/// # Give up if the workers have not all reported within this long.
/// # Omit to wait indefinitely.
/// worker_timeout: "30s"
///
/// # raw | failfast | lossy
/// encoding_mode: "raw"
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// File to split and scan
    #[serde(default)]
    pub path: PathBuf,

    /// Literal keyword; must not be empty
    #[serde(default)]
    pub keyword: String,

    /// Requested number of workers. Zero is rejected when the run starts.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Deadline for collecting every worker result. `None` blocks until all report.
    #[serde(
        default,
        deserialize_with = "deserialize_timeout",
        serialize_with = "serialize_timeout"
    )]
    pub worker_timeout: Option<Duration>,

    /// Policy for chunk contents that are not valid UTF-8
    #[serde(default)]
    pub encoding_mode: EncodingMode,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_worker_count() -> usize {
    num_cpus::get()
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn deserialize_timeout<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| {
        humantime::parse_duration(&s).map_err(<D::Error as serde::de::Error>::custom)
    })
    .transpose()
}

fn serialize_timeout<S>(timeout: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match timeout {
        Some(d) => serializer.serialize_some(&humantime::format_duration(*d).to_string()),
        None => serializer.serialize_none(),
    }
}

/// Values given on the command line. `None` means the flag was absent and the
/// configuration file keeps its say.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub path: PathBuf,
    pub keyword: String,
    pub worker_count: usize,
    pub worker_timeout: Option<Duration>,
    pub encoding_mode: Option<EncodingMode>,
    pub log_level: Option<String>,
}

impl CliOverrides {
    /// Overrides carrying only the three positional values
    pub fn new(worker_count: usize, keyword: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            keyword: keyword.into(),
            worker_count,
            ..Self::default()
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            keyword: String::new(),
            worker_count: default_worker_count(),
            worker_timeout: None,
            encoding_mode: EncodingMode::default(),
            log_level: default_log_level(),
        }
    }
}

impl ScanConfig {
    /// Builds a config for the three positional values the CLI takes
    pub fn new(worker_count: usize, keyword: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            keyword: keyword.into(),
            worker_count,
            ..Self::default()
        }
    }

    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration from the default locations plus an optional explicit file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            dirs::config_dir().map(|p| p.join("chunkscout/config.yaml")),
            Some(PathBuf::from(".chunkscout.yaml")),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicitly requested file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values.
    /// CLI values take precedence wherever they were actually given.
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if !cli.path.as_os_str().is_empty() {
            self.path = cli.path;
        }
        if !cli.keyword.is_empty() {
            self.keyword = cli.keyword;
        }
        // The worker count is positional on the command line, so it always wins
        self.worker_count = cli.worker_count;
        if let Some(timeout) = cli.worker_timeout {
            self.worker_timeout = Some(timeout);
        }
        if let Some(mode) = cli.encoding_mode {
            self.encoding_mode = mode;
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        self
    }

    /// Rejects values no run could succeed with, before any file I/O happens
    pub fn validate(&self) -> SearchResult<()> {
        if self.worker_count == 0 {
            return Err(SearchError::invalid_argument(
                "worker count must be at least 1",
            ));
        }
        if self.keyword.is_empty() {
            return Err(SearchError::invalid_pattern("keyword must not be empty"));
        }
        if self.path.as_os_str().is_empty() {
            return Err(SearchError::invalid_argument("no input path given"));
        }
        Ok(())
    }
}
