//! Importer for plain-text recipe exports (Meal-Master, MasterCook, BigOven
//! and RXF).
//!
//! Text is split into per-recipe blocks by banner sniffing, each block is
//! decoded by its format's line state machine into a [`Recipe`], and the
//! records are handed to export sinks.

pub mod accumulate;
pub mod auip;
pub mod config;
pub mod decoders;
pub mod error;
pub mod export;
pub mod model;
pub mod pipeline;
pub mod sniff;
pub mod text;
pub mod translate;

use log::debug;
use std::path::{Path, PathBuf};

pub use config::{load_config, ImportConfig, OutputConfig, OutputFormat};
pub use decoders::{all_decoders, decoder_for, DecodeContext, Decoder, Format};
pub use error::ImportError;
pub use export::{RecipeSink, SinkFactory};
pub use model::{Auip, AuipKind, Facet, Recipe, Yield};
pub use pipeline::{Pipeline, Rcb};
pub use translate::{CategoryLookup, TranslationTable};

/// Decode every recipe found in `text`, in order of appearance.
///
/// `source` names the text in log lines and in the `UnknownFormat` error.
pub fn decode_text(text: &str, source: &str, ctx: &DecodeContext<'_>) -> Result<Vec<Recipe>, ImportError> {
    let blocks = sniff::split_recipes(text, &all_decoders(), source)?;
    Ok(blocks
        .into_iter()
        .map(|mut block| {
            let recipe = decoder_for(block.format).decode(&mut block.lines, ctx);
            debug!("{}: decoded {} recipe '{}'", source, block.format, recipe.display_name());
            recipe
        })
        .collect())
}

/// Read a file and decode every recipe in it
pub async fn decode_file(path: &Path, ctx: &DecodeContext<'_>) -> Result<Vec<Recipe>, ImportError> {
    let bytes = tokio::fs::read(path).await?;
    let text = String::from_utf8_lossy(&bytes);
    decode_text(&text, &path.display().to_string(), ctx)
}

/// Run the configured pipeline over `paths` and return the recipes in input
/// order. Output goes to the sink named by `config.output`.
pub async fn import_files(paths: &[PathBuf], config: &ImportConfig) -> Result<Vec<Recipe>, ImportError> {
    let mut pipeline = Pipeline::from_config(config)?.with_sink(SinkFactory::create(&config.output));
    let rcbs = pipeline.run_files(paths).await?;
    Ok(rcbs.into_iter().filter_map(|rcb| rcb.recipe).collect())
}

/// Decode with the built-in translation table and default settings
pub fn decode_with_builtin_table(text: &str, source: &str) -> Result<Vec<Recipe>, ImportError> {
    let table = TranslationTable::builtin()?;
    decode_text(text, source, &DecodeContext::new(&table))
}
