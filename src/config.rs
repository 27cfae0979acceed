use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Importer configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    /// Number of decode workers in the pipeline
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// TOML translation table replacing the built-in one
    #[serde(default)]
    pub translations: Option<PathBuf>,
    /// Keep category tokens missing from the translation table
    #[serde(default = "default_keep_unknown_categories")]
    pub keep_unknown_categories: bool,
    /// Export settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            translations: None,
            keep_unknown_categories: default_keep_unknown_categories(),
            output: OutputConfig::default(),
        }
    }
}

/// Where and how decoded recipes are written
#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Directory receiving the export files
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
    /// Largest persisted record accepted by the SQL sink, in bytes
    #[serde(default = "default_max_record_bytes")]
    pub max_record_bytes: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            directory: default_output_directory(),
            max_record_bytes: default_max_record_bytes(),
        }
    }
}

/// Export encodings
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Rxf,
    Json,
    Sql,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Rxf => "rxf",
            OutputFormat::Json => "json",
            OutputFormat::Sql => "sql",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Default value functions
fn default_workers() -> usize {
    4
}

fn default_keep_unknown_categories() -> bool {
    true
}

fn default_output_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_record_bytes() -> usize {
    32 * 1024
}

/// Load configuration from file and environment variables
///
/// Configuration is loaded with the following priority (highest to lowest):
/// 1. Environment variables with RXF_IMPORT__ prefix
/// 2. rxf-import.toml file in current directory
/// 3. Default values
///
/// Environment variable format: RXF_IMPORT__OUTPUT__FORMAT=json
pub fn load_config() -> Result<ImportConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("rxf-import").required(false))
        // Use double underscore for nested: RXF_IMPORT__OUTPUT__DIRECTORY
        .add_source(
            Environment::with_prefix("RXF_IMPORT")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
