use thiserror::Error;

/// Errors that can occur while importing recipe files
#[derive(Error, Debug)]
pub enum ImportError {
    /// Failed to read an input file or write an export
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No known recipe banner was found in the input
    #[error("No recognizable recipe format in {0}")]
    UnknownFormat(String),

    /// Configuration or translation table could not be loaded
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    /// Failed to serialize a recipe
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A recipe's persisted form exceeds the configured record limit
    #[error("Recipe '{name}' is {size} bytes, exceeding the {limit} byte record limit")]
    RecordTooLarge {
        name: String,
        size: usize,
        limit: usize,
    },

    /// A sink rejected a recipe
    #[error("Sink error: {0}")]
    SinkError(String),

    /// A worker or queue failure in the import pipeline
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}
