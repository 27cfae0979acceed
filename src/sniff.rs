//! Split a text file into per-recipe line queues.

use log::{debug, info};
use std::collections::VecDeque;

use crate::decoders::{Decoder, Format};
use crate::error::ImportError;

/// Lines of one recipe, tagged with the format that claimed them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeBlock {
    pub format: Format,
    pub lines: VecDeque<String>,
}

/// First decoder, in registry order, whose start banner matches `line`
pub fn classify_line<'d>(line: &str, decoders: &'d [Box<dyn Decoder>]) -> Option<&'d dyn Decoder> {
    decoders
        .iter()
        .map(|decoder| decoder.as_ref())
        .find(|decoder| decoder.is_start(line))
}

/// Walk `text` and cut it into recipe blocks.
///
/// A block opens at any start banner and runs until its format's end marker,
/// the next start banner, or the end of the text. Text outside blocks is
/// dropped. `source` only labels the error when nothing is found.
pub fn split_recipes(
    text: &str,
    decoders: &[Box<dyn Decoder>],
    source: &str,
) -> Result<Vec<RecipeBlock>, ImportError> {
    let mut blocks = Vec::new();
    let mut current: Option<(&dyn Decoder, VecDeque<String>)> = None;
    let mut skipped = 0usize;

    for line in text.lines() {
        if let Some(decoder) = classify_line(line, decoders) {
            if let Some((open, lines)) = current.take() {
                debug!("{} block closed by next start banner", open.format());
                blocks.push(RecipeBlock {
                    format: open.format(),
                    lines,
                });
            }
            current = Some((decoder, VecDeque::from([line.to_string()])));
            continue;
        }

        match current.as_mut() {
            Some((decoder, lines)) => {
                lines.push_back(line.to_string());
                if decoder.is_end(line) {
                    if let Some((decoder, lines)) = current.take() {
                        blocks.push(RecipeBlock {
                            format: decoder.format(),
                            lines,
                        });
                    }
                }
            }
            None => skipped += 1,
        }
    }

    if let Some((decoder, lines)) = current {
        blocks.push(RecipeBlock {
            format: decoder.format(),
            lines,
        });
    }

    if blocks.is_empty() {
        return Err(ImportError::UnknownFormat(source.to_string()));
    }
    info!(
        "{}: {} recipe block(s), {} line(s) outside any recipe",
        source,
        blocks.len(),
        skipped
    );
    Ok(blocks)
}
