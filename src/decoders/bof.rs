//! BigOven text export decoder.

use log::debug;
use std::collections::VecDeque;

use super::{
    append_description, file_category_list, run_machine, set_title, DecodeContext, Decoder,
    Format, StateMachine, Transition,
};
use crate::accumulate::TextAccumulator;
use crate::auip::AuipFormatter;
use crate::model::{Facet, Recipe, ScalarField};
use crate::text::{is_blank, skip_whitespace, strip_tag};

const START_BANNER: &str = "----- Exported from BigOven";
const PRE_END_BANNER: &str = "----- Nutrition";
const END_BANNER: &str = "----- End of BigOven Recipe";

const BY_TAG: &str = "Recipe By:";
const SERVING_TAG: &str = "Serving Size:";
const CUISINE_TAG: &str = "Cuisine:";
const MAIN_TAG: &str = "Main Ingredient:";
const CATEGORY_TAG: &str = "Categories:";
const INGREDIENTS_BANNER: &str = "Ingredients:";
const INSTRUCTIONS_BANNER: &str = "Instructions:";

/// Segment markers honoured in every state, first match wins
const SEGMENT_MARKERS: &[(&str, State)] = &[
    (BY_TAG, State::By),
    (SERVING_TAG, State::Serving),
    (CUISINE_TAG, State::Cuisine),
    (MAIN_TAG, State::Main),
    (CATEGORY_TAG, State::Category),
    (INGREDIENTS_BANNER, State::Ingredients),
    (INSTRUCTIONS_BANNER, State::Instructions),
    (PRE_END_BANNER, State::PreEnd),
    (END_BANNER, State::End),
];

pub struct BofDecoder;

impl Decoder for BofDecoder {
    fn format(&self) -> Format {
        Format::Bof
    }

    fn is_start(&self, line: &str) -> bool {
        // Quoted lines come from forwarded mail, not from the exporter
        if line.starts_with('>') {
            return false;
        }
        skip_whitespace(line).starts_with(START_BANNER)
    }

    fn is_end(&self, line: &str) -> bool {
        skip_whitespace(line).starts_with(END_BANNER)
    }

    fn decode(&self, lines: &mut VecDeque<String>, ctx: &DecodeContext<'_>) -> Recipe {
        run_machine(self, BofMachine::new(*ctx), lines)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Title,
    NextSegment,
    By,
    Serving,
    Cuisine,
    Main,
    Category,
    Ingredients,
    Auip,
    Instructions,
    Directions,
    PreEnd,
    Trailer,
    End,
}

struct BofMachine<'a> {
    ctx: DecodeContext<'a>,
    auip: AuipFormatter<'a>,
    recipe: Recipe,
    state: State,
    directions: TextAccumulator,
}

impl<'a> BofMachine<'a> {
    fn new(ctx: DecodeContext<'a>) -> Self {
        BofMachine {
            ctx,
            auip: AuipFormatter::new(ctx.lookup),
            recipe: Recipe::default(),
            state: State::Start,
            directions: TextAccumulator::new(),
        }
    }

    fn handle_title(&mut self, line: &str) -> Transition<State> {
        if is_blank(line) {
            return Transition::Stay;
        }
        set_title(&mut self.recipe, line);
        Transition::Next(State::NextSegment)
    }

    /// Text between the title and the first segment describes the dish.
    fn handle_next_segment(&mut self, line: &str) -> Transition<State> {
        if !is_blank(line) {
            if self.recipe.ingredients.is_empty() {
                append_description(&mut self.recipe, line);
            } else {
                debug!("BOF: ignoring line outside any segment: {:?}", line);
            }
        }
        Transition::Stay
    }

    fn handle_scalar(&mut self, line: &str, tag: &str, field: ScalarField) -> Transition<State> {
        let value = strip_tag(skip_whitespace(line), tag).unwrap_or_default();
        self.recipe
            .set_once(field, value, tag.trim_end_matches(':'));
        Transition::Next(State::NextSegment)
    }

    /// Shared by the cuisine, main ingredient and category tags
    fn handle_category(&mut self, line: &str, facet: Facet) -> Transition<State> {
        let text = match line.find(':') {
            Some(pos) => &line[pos + 1..],
            None => "",
        };
        file_category_list(&self.ctx, &mut self.recipe, text, facet);
        Transition::Next(State::NextSegment)
    }

    fn handle_auip(&mut self, line: &str) -> Transition<State> {
        if !is_blank(line) {
            self.auip.format_line(&mut self.recipe, line, Format::Bof);
        }
        Transition::Stay
    }

    fn handle_directions(&mut self, line: &str) -> Transition<State> {
        if BofDecoder.is_end(line) {
            self.directions.flush();
            return Transition::Next(State::End);
        }
        self.directions.push(&mut self.recipe.directions, line);
        Transition::Stay
    }
}

impl StateMachine for BofMachine<'_> {
    type State = State;

    fn format(&self) -> Format {
        Format::Bof
    }

    fn state(&self) -> State {
        self.state
    }

    fn set_state(&mut self, state: State) {
        self.state = state;
    }

    fn check_markers(&self, line: &str) -> Option<State> {
        if matches!(self.state, State::Start | State::End) {
            return None;
        }
        let line = skip_whitespace(line);
        SEGMENT_MARKERS
            .iter()
            .find(|(marker, _)| line.starts_with(marker))
            .map(|(_, state)| *state)
    }

    fn dispatch(&mut self, line: &str) -> Transition<State> {
        match self.state {
            State::Start => {
                if BofDecoder.is_start(line) {
                    Transition::Next(State::Title)
                } else {
                    Transition::Stay
                }
            }
            State::Title => self.handle_title(line),
            State::NextSegment => self.handle_next_segment(line),
            State::By => self.handle_scalar(line, BY_TAG, ScalarField::Author),
            State::Serving => self.handle_scalar(line, SERVING_TAG, ScalarField::Serves),
            State::Cuisine => self.handle_category(line, Facet::Cuisine),
            State::Main => self.handle_category(line, Facet::Chapter),
            State::Category => self.handle_category(line, Facet::Chapter),
            State::Ingredients => Transition::Next(State::Auip),
            State::Auip => self.handle_auip(line),
            State::Instructions => Transition::Next(State::Directions),
            State::Directions => self.handle_directions(line),
            State::PreEnd => {
                self.directions.flush();
                Transition::Next(State::Trailer)
            }
            State::Trailer => {
                debug!("BOF: skipping trailer line: {:?}", line);
                Transition::Stay
            }
            State::End => {
                self.directions.flush();
                Transition::Stay
            }
        }
    }

    fn has_started(&self) -> bool {
        self.state != State::Start
    }

    fn is_complete(&self) -> bool {
        self.state == State::End
    }

    fn finish(mut self) -> Recipe {
        self.directions.flush();
        self.recipe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::TranslationTable;

    fn decode(lines: &[&str]) -> Recipe {
        let table = TranslationTable::builtin().unwrap();
        let ctx = DecodeContext::new(&table);
        let mut queue: VecDeque<String> = lines.iter().map(|l| l.to_string()).collect();
        BofDecoder.decode(&mut queue, &ctx)
    }

    #[test]
    fn test_start_rejects_forwarded_quote() {
        assert!(BofDecoder.is_start("----- Exported from BigOven (www.bigoven.com) -----"));
        assert!(!BofDecoder.is_start("> ----- Exported from BigOven -----"));
        assert!(!BofDecoder.is_start("Exported from BigOven"));
    }

    #[test]
    fn test_full_recipe() {
        let recipe = decode(&[
            "Some mail header noise",
            "----- Exported from BigOven -----",
            "",
            "chicken tortilla soup",
            "A quick weeknight soup.",
            "Recipe By: Ana Lopez",
            "Serving Size: 6",
            "Cuisine: Mexican, Tex-Mex",
            "Main Ingredient: Chicken",
            "Categories: Soup, Crockpot",
            "",
            "Ingredients:",
            "2 cups cooked chicken, shredded",
            "",
            "1 can black beans",
            "Instructions:",
            "Combine everything in the pot.",
            "",
            "Simmer for 30 minutes.",
            "----- Nutrition -----",
            "Calories: 250",
            "----- End of BigOven Recipe -----",
            "trailing junk",
        ]);

        assert_eq!(recipe.name.as_deref(), Some("Chicken Tortilla Soup"));
        assert_eq!(recipe.description.as_deref(), Some("A quick weeknight soup."));
        assert_eq!(recipe.author.as_deref(), Some("Ana Lopez"));
        assert_eq!(recipe.serves.as_deref(), Some("6"));
        assert_eq!(recipe.cuisine, vec!["Mexican", "Tex-Mex"]);
        assert_eq!(recipe.chapter, vec!["Poultry", "Soups", "Slow Cooker"]);
        assert!(recipe.appliance.is_empty());

        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.ingredients[0].amount.as_deref(), Some("2"));
        assert_eq!(recipe.ingredients[0].unit.as_deref(), Some("cup"));
        assert_eq!(
            recipe.ingredients[0].ingredient.as_deref(),
            Some("cooked chicken")
        );
        assert_eq!(recipe.ingredients[0].preparation.as_deref(), Some("shredded"));
        assert_eq!(
            recipe.ingredients[1].ingredient.as_deref(),
            Some("black beans")
        );

        assert_eq!(
            recipe.directions,
            vec!["Combine everything in the pot.", "", "Simmer for 30 minutes."]
        );
        assert!(recipe.notes.is_empty());
    }

    #[test]
    fn test_duplicate_author_warns_and_keeps_first() {
        let recipe = decode(&[
            "----- Exported from BigOven -----",
            "Lemonade",
            "Recipe By: First Cook",
            "Recipe By: Second Cook",
            "----- End of BigOven Recipe -----",
        ]);
        assert_eq!(recipe.author.as_deref(), Some("First Cook"));
        assert_eq!(recipe.warnings.len(), 1);
        assert!(recipe.warnings[0].contains("Second Cook"));
    }

    #[test]
    fn test_title_waits_for_non_blank_line() {
        let recipe = decode(&[
            "----- Exported from BigOven -----",
            "",
            "   ",
            "  iced TEA  ",
            "----- End of BigOven Recipe -----",
        ]);
        assert_eq!(recipe.name.as_deref(), Some("Iced TEA"));
    }

    #[test]
    fn test_directions_without_end_banner() {
        let recipe = decode(&[
            "----- Exported from BigOven -----",
            "Toast",
            "Instructions:",
            "Toast the bread.",
        ]);
        assert_eq!(recipe.directions, vec!["Toast the bread."]);
    }
}
