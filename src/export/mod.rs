mod json;
mod rxf;
mod sql;

pub use json::JsonSink;
pub use rxf::{encode_rxf, RxfSink};
pub use sql::{recipe_statements, SqlSink};

use async_trait::async_trait;
use std::path::Path;

use crate::config::{OutputConfig, OutputFormat};
use crate::error::ImportError;
use crate::model::Recipe;

/// Destination for decoded recipes
#[async_trait]
pub trait RecipeSink: Send + Sync {
    /// Sink name (e.g., "rxf", "sql")
    fn name(&self) -> &str;

    /// Take one decoded recipe
    async fn accept(&mut self, recipe: &Recipe) -> Result<(), ImportError>;

    /// Flush everything accepted so far to the destination
    async fn finish(&mut self) -> Result<(), ImportError>;
}

pub struct SinkFactory;

impl SinkFactory {
    /// Create the sink selected by the output configuration
    pub fn create(config: &OutputConfig) -> Box<dyn RecipeSink> {
        Self::create_for(config.format, config)
    }

    pub fn create_for(format: OutputFormat, config: &OutputConfig) -> Box<dyn RecipeSink> {
        let directory = config.directory.as_path();
        match format {
            OutputFormat::Rxf => Box::new(RxfSink::new(directory)),
            OutputFormat::Json => Box::new(JsonSink::new(directory)),
            OutputFormat::Sql => Box::new(SqlSink::new(directory, config.max_record_bytes)),
        }
    }

    /// Create a sink from its name (see [`SinkFactory::available_sinks`])
    pub fn create_named(name: &str, config: &OutputConfig) -> Result<Box<dyn RecipeSink>, ImportError> {
        let format = match name {
            "rxf" => OutputFormat::Rxf,
            "json" => OutputFormat::Json,
            "sql" => OutputFormat::Sql,
            _ => return Err(ImportError::SinkError(format!("Unknown sink: {}", name))),
        };
        Ok(Self::create_for(format, config))
    }

    /// List all available sink names
    pub fn available_sinks() -> Vec<&'static str> {
        vec!["rxf", "json", "sql"]
    }
}

/// Write a finished export file, creating its directory first.
async fn write_output(directory: &Path, file_name: &str, contents: &str) -> Result<(), ImportError> {
    tokio::fs::create_dir_all(directory).await?;
    let path = directory.join(file_name);
    tokio::fs::write(&path, contents).await?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn output_config(format: OutputFormat) -> OutputConfig {
        OutputConfig {
            format,
            directory: PathBuf::from("out"),
            max_record_bytes: 1024,
        }
    }

    #[test]
    fn test_create_sink_by_format() {
        for (format, name) in [
            (OutputFormat::Rxf, "rxf"),
            (OutputFormat::Json, "json"),
            (OutputFormat::Sql, "sql"),
        ] {
            let sink = SinkFactory::create(&output_config(format));
            assert_eq!(sink.name(), name);
        }
    }

    #[test]
    fn test_available_sinks_can_be_created_by_name() {
        let config = output_config(OutputFormat::Rxf);
        for name in SinkFactory::available_sinks() {
            let sink = SinkFactory::create_named(name, &config).unwrap();
            assert_eq!(sink.name(), name);
        }
    }

    #[test]
    fn test_create_unknown_sink() {
        let result = SinkFactory::create_named("xml", &output_config(OutputFormat::Rxf));
        assert!(matches!(result, Err(ImportError::SinkError(_))));
    }
}
