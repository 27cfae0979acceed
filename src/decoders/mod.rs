use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::model::{Facet, Recipe, ScalarField, Yield};
use crate::text::{cleanup_name, split_list, title_case};
use crate::translate::CategoryLookup;

mod bof;
mod mmf;
mod mxp;
mod rxf;

pub use self::bof::BofDecoder;
pub use self::mmf::{reformat_split_line, MmfDecoder};
pub use self::mxp::MxpDecoder;
pub use self::rxf::{RxfDecoder, RXF_END, RXF_RECIPE_DATA, RXF_SOURCE_INFO, RXF_START};

/// Upper bound on re-dispatching one line through successive states
const MAX_REPROCESS: usize = 8;

/// Source formats the importer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// BigOven text export
    Bof,
    /// Meal-Master
    Mmf,
    /// MasterCook export
    Mxp,
    /// Native recipe exchange format
    Rxf,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Bof => "BOF",
            Format::Mmf => "MMF",
            Format::Mxp => "MXP",
            Format::Rxf => "RXF",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, read-only inputs of a decode
#[derive(Clone, Copy)]
pub struct DecodeContext<'a> {
    pub lookup: &'a dyn CategoryLookup,
    /// Keep category tokens the lookup does not know instead of dropping them
    pub keep_unknown_categories: bool,
}

impl<'a> DecodeContext<'a> {
    pub fn new(lookup: &'a dyn CategoryLookup) -> Self {
        DecodeContext {
            lookup,
            keep_unknown_categories: true,
        }
    }

    pub fn keep_unknown_categories(mut self, keep: bool) -> Self {
        self.keep_unknown_categories = keep;
        self
    }
}

/// One source format: banner sniffing plus the line-driven decoder
pub trait Decoder: Send + Sync {
    fn format(&self) -> Format;

    /// Does this line open a recipe in this format?
    fn is_start(&self, line: &str) -> bool;

    /// Does this line close a recipe in this format?
    fn is_end(&self, line: &str) -> bool;

    /// Consume lines for one recipe and return whatever was decoded.
    ///
    /// Stops at the format's end marker, at a new start banner (left on the
    /// queue) or when the queue runs dry.
    fn decode(&self, lines: &mut VecDeque<String>, ctx: &DecodeContext<'_>) -> Recipe;
}

/// Every decoder, in classification priority order
pub fn all_decoders() -> Vec<Box<dyn Decoder>> {
    vec![
        Box::new(MmfDecoder),
        Box::new(MxpDecoder),
        Box::new(RxfDecoder),
        Box::new(BofDecoder),
    ]
}

pub fn decoder_for(format: Format) -> Box<dyn Decoder> {
    match format {
        Format::Bof => Box::new(BofDecoder),
        Format::Mmf => Box::new(MmfDecoder),
        Format::Mxp => Box::new(MxpDecoder),
        Format::Rxf => Box::new(RxfDecoder),
    }
}

/// What a state handler wants done after seeing a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition<S> {
    /// Line consumed, state unchanged
    Stay,
    /// Line consumed, move on
    Next(S),
    /// Move on and hand the same line to the new state
    Reprocess(S),
}

/// Line-driven state machine shared shape.
///
/// Each line first goes through `check_markers`, which may force a state
/// change whatever the current state is, then to `dispatch` for the
/// (possibly new) current state.
pub(crate) trait StateMachine {
    type State: Copy + PartialEq + fmt::Debug;

    fn format(&self) -> Format;
    fn state(&self) -> Self::State;
    fn set_state(&mut self, state: Self::State);
    fn check_markers(&self, line: &str) -> Option<Self::State>;
    fn dispatch(&mut self, line: &str) -> Transition<Self::State>;
    fn has_started(&self) -> bool;
    fn is_complete(&self) -> bool;
    fn finish(self) -> Recipe;

    fn feed(&mut self, line: &str) {
        if let Some(next) = self.check_markers(line) {
            if next != self.state() {
                debug!("{}: {:?} -> {:?} on marker", self.format(), self.state(), next);
            }
            self.set_state(next);
        }

        for _ in 0..MAX_REPROCESS {
            match self.dispatch(line) {
                Transition::Stay => return,
                Transition::Next(next) => {
                    self.set_state(next);
                    return;
                }
                Transition::Reprocess(next) => {
                    debug!("{}: {:?} -> {:?}, re-reading line", self.format(), self.state(), next);
                    self.set_state(next);
                }
            }
        }
        debug!("{}: dropping line after repeated re-dispatch: {:?}", self.format(), line);
    }
}

/// Feed queued lines to `machine` until it completes or the queue is empty.
pub(crate) fn run_machine<M: StateMachine>(
    decoder: &dyn Decoder,
    mut machine: M,
    lines: &mut VecDeque<String>,
) -> Recipe {
    while let Some(line) = lines.pop_front() {
        if machine.has_started() && decoder.is_start(&line) {
            debug!("{}: next recipe begins, ending current one", decoder.format());
            lines.push_front(line);
            break;
        }
        machine.feed(&line);
        if machine.is_complete() {
            break;
        }
    }
    machine.finish()
}

/// Clean, title-case and store a recipe name; first name wins.
pub(crate) fn set_title(recipe: &mut Recipe, raw: &str) {
    let name = title_case(&cleanup_name(raw));
    recipe.set_once(ScalarField::Name, &name, "Title");
}

/// Extend the free-text description with one more line.
pub(crate) fn append_description(recipe: &mut Recipe, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    match recipe.description.as_mut() {
        Some(description) => {
            description.push(' ');
            description.push_str(line);
        }
        None => recipe.description = Some(line.to_string()),
    }
}

/// Facet prefixes a translated category may carry, in match order
const FACET_PREFIXES: &[(&str, Facet)] = &[
    ("Appliance:", Facet::Appliance),
    ("Diet:", Facet::Diet),
    ("Course:", Facet::Course),
    ("Cuisine:", Facet::Cuisine),
    ("Occasion:", Facet::Occasion),
    ("Category:", Facet::Chapter),
];

/// Split a `Diet: Vegan` style value into its facet and bare name
pub(crate) fn split_facet_prefix(value: &str) -> (Option<Facet>, &str) {
    FACET_PREFIXES
        .iter()
        .find_map(|(prefix, facet)| {
            value
                .strip_prefix(prefix)
                .map(|rest| (Some(*facet), rest.trim()))
        })
        .unwrap_or((None, value.trim()))
}

/// Translate one raw category token, honouring the unknown-token policy.
pub(crate) fn translate_category(
    ctx: &DecodeContext<'_>,
    recipe: &mut Recipe,
    raw: &str,
) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match ctx.lookup.lookup_category(raw) {
        Some(canonical) => Some(canonical),
        None if ctx.keep_unknown_categories => {
            debug!("No translation for category {:?}, keeping it", raw);
            Some(raw.to_string())
        }
        None => {
            recipe.warn(format!("dropping untranslated category '{}'", raw));
            None
        }
    }
}

/// Comma-separated tag value filed into the facet named by the tag.
///
/// A facet prefix on the translated value is dropped; the tag decides.
pub(crate) fn file_category_list(
    ctx: &DecodeContext<'_>,
    recipe: &mut Recipe,
    text: &str,
    facet: Facet,
) {
    for token in split_list(text) {
        if let Some(canonical) = translate_category(ctx, recipe, &token) {
            let (_, name) = split_facet_prefix(&canonical);
            if !name.is_empty() {
                recipe.facet_mut(facet).push(name.to_string());
            }
        }
    }
}

/// File one raw category token into the facet its translation names.
pub(crate) fn file_dispatched_category(ctx: &DecodeContext<'_>, recipe: &mut Recipe, raw: &str) {
    if let Some(canonical) = translate_category(ctx, recipe, raw) {
        let (facet, name) = split_facet_prefix(&canonical);
        if !name.is_empty() {
            recipe
                .facet_mut(facet.unwrap_or(Facet::Chapter))
                .push(name.to_string());
        }
    }
}

/// Two-token yield scan: an amount, then an optional unit.
///
/// A unit of `servings` means a head count. A missing unit counts as a head
/// count only for servings-style tags.
pub fn parse_yield(text: &str, servings_tag: bool) -> Option<Yield> {
    let mut tokens = text.split_whitespace();
    let amount = tokens.next()?.to_string();
    let unit = tokens.next();

    match unit {
        Some(unit) if unit.to_uppercase() == "SERVINGS" => Some(Yield::Serves(amount)),
        None if servings_tag => Some(Yield::Serves(amount)),
        unit => Some(Yield::Makes {
            amount,
            unit: unit.map(str::to_string),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::TranslationTable;

    #[test]
    fn test_parse_yield() {
        assert_eq!(
            parse_yield("4 servings", false),
            Some(Yield::Serves("4".to_string()))
        );
        assert_eq!(
            parse_yield("6 SERVINGS", false),
            Some(Yield::Serves("6".to_string()))
        );
        assert_eq!(parse_yield("4", true), Some(Yield::Serves("4".to_string())));
        assert_eq!(
            parse_yield("2 loaves", false),
            Some(Yield::Makes {
                amount: "2".to_string(),
                unit: Some("loaves".to_string())
            })
        );
        assert_eq!(
            parse_yield("12", false),
            Some(Yield::Makes {
                amount: "12".to_string(),
                unit: None
            })
        );
        assert_eq!(parse_yield("   ", true), None);
    }

    #[test]
    fn test_split_facet_prefix() {
        assert_eq!(
            split_facet_prefix("Diet: Low Fat"),
            (Some(Facet::Diet), "Low Fat")
        );
        assert_eq!(
            split_facet_prefix("Category:Soups"),
            (Some(Facet::Chapter), "Soups")
        );
        assert_eq!(split_facet_prefix("Soups"), (None, "Soups"));
    }

    #[test]
    fn test_file_category_list_uses_tag_facet() {
        let table = TranslationTable::from_pairs(
            [("soup", "Soups"), ("vegetarian", "Diet: Vegetarian")],
            [],
        );
        let ctx = DecodeContext::new(&table);
        let mut recipe = Recipe::default();
        file_category_list(&ctx, &mut recipe, "Soup, Vegetarian, , Casserole", Facet::Chapter);
        assert_eq!(recipe.chapter, vec!["Soups", "Vegetarian", "Casserole"]);
        assert!(recipe.diet.is_empty());
    }

    #[test]
    fn test_unknown_categories_dropped_when_configured() {
        let table = TranslationTable::from_pairs([("soup", "Soups")], []);
        let ctx = DecodeContext::new(&table).keep_unknown_categories(false);
        let mut recipe = Recipe::default();
        file_category_list(&ctx, &mut recipe, "Soup, Casserole", Facet::Chapter);
        assert_eq!(recipe.chapter, vec!["Soups"]);
        assert_eq!(recipe.warnings.len(), 1);
    }

    #[test]
    fn test_dispatched_category_goes_to_one_facet() {
        let table = TranslationTable::from_pairs([("vegan", "Diet: Vegan")], []);
        let ctx = DecodeContext::new(&table);
        let mut recipe = Recipe::default();
        file_dispatched_category(&ctx, &mut recipe, "Vegan");
        file_dispatched_category(&ctx, &mut recipe, "Breads");
        assert_eq!(recipe.diet, vec!["Vegan"]);
        assert_eq!(recipe.chapter, vec!["Breads"]);
        assert!(recipe.course.is_empty());
    }

    #[test]
    fn test_registry_covers_every_format() {
        let formats: Vec<Format> = all_decoders().iter().map(|d| d.format()).collect();
        assert_eq!(
            formats,
            vec![Format::Mmf, Format::Mxp, Format::Rxf, Format::Bof]
        );
        for format in formats {
            assert_eq!(decoder_for(format).format(), format);
        }
    }
}
