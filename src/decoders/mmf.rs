//! Meal-Master decoder.
//!
//! Meal-Master files carry no section banners between the header and the
//! directions: the ingredient table simply ends at the first blank line that
//! is followed by text. Separator lines double as end-of-recipe markers and,
//! when they carry a label (`MMMMM-----SAUCE-----`), as sub-recipe titles.

use log::debug;
use std::collections::VecDeque;

use super::{
    file_category_list, parse_yield, run_machine, set_title, DecodeContext, Decoder, Format,
    StateMachine, Transition,
};
use crate::accumulate::TextAccumulator;
use crate::auip::AuipFormatter;
use crate::model::{Facet, Recipe};
use crate::text::{skip_whitespace, starts_with_ci, strip_tag};

const START_BANNERS: &[&str] = &[
    "---------- Recipe via Meal-Master",
    "MMMMM----- Recipe via Meal-Master",
    "-----  Recipe via Meal-Master",
    "---------- Meal-Master",
    "MMMMM----- Meal-Master",
    "---------- Now You're Cooking!",
    "MMMMM----- Now You're Cooking!",
    "----- Recipe Extracted from Meal-Master",
    "@@@@@ Now You're Cooking!",
    "Recipe via Meal-Master",
];

/// Openings that announce a banner when followed by a program name
const BANNER_OPENINGS: &[&str] = &["-----", "MMMMM", "- -----"];
const PROGRAM_NAMES: &[&str] = &["Meal-Master", "Now You're Cooking!"];

/// End-of-recipe markers, valid only when the line is exactly the marker
const END_MARKERS: &[&str] = &["MMMMM", "-----", "- -----", "=====", "@@@@@"];

const TITLE_TAG: &str = "Title:";
const CATEGORIES_TAG: &str = "Categories:";
const SERVINGS_TAG: &str = "Servings:";
const YIELD_TAG: &str = "Yield:";

pub struct MmfDecoder;

impl Decoder for MmfDecoder {
    fn format(&self) -> Format {
        Format::Mmf
    }

    fn is_start(&self, line: &str) -> bool {
        let line = skip_whitespace(line);
        START_BANNERS.iter().any(|banner| line.starts_with(banner))
            || (BANNER_OPENINGS.iter().any(|opening| line.starts_with(opening))
                && PROGRAM_NAMES.iter().any(|name| line.contains(name)))
    }

    fn is_end(&self, line: &str) -> bool {
        let line = line.trim();
        END_MARKERS
            .iter()
            .any(|marker| starts_with_ci(line, marker) && line.len() == marker.len())
    }

    fn decode(&self, lines: &mut VecDeque<String>, ctx: &DecodeContext<'_>) -> Recipe {
        run_machine(self, MmfMachine::new(*ctx), lines)
    }
}

/// An end-marker prefix followed by more text: a labelled separator.
pub fn is_split_line(line: &str) -> bool {
    let line = line.trim();
    END_MARKERS
        .iter()
        .any(|marker| starts_with_ci(line, marker) && line.len() > marker.len())
}

/// Turn a labelled separator into a `** label **` sub-recipe title.
///
/// Returns `None` when the separator carries no text (a plain dashed rule).
pub fn reformat_split_line(line: &str) -> Option<String> {
    let text = skip_whitespace(line)
        .trim_start_matches(|c: char| c == 'M' || c == 'm')
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .trim_end_matches(|c: char| matches!(c, '-' | '=' | '@' | '*') || c.is_whitespace());

    if text.is_empty() {
        None
    } else {
        Some(format!("** {} **", text))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Header,
    Title,
    Categories,
    Yield,
    Auip,
    Directions,
    End,
}

struct MmfMachine<'a> {
    ctx: DecodeContext<'a>,
    auip: AuipFormatter<'a>,
    recipe: Recipe,
    state: State,
    directions: TextAccumulator,
    prev_blank: bool,
    first_auip_seen: bool,
}

impl<'a> MmfMachine<'a> {
    fn new(ctx: DecodeContext<'a>) -> Self {
        MmfMachine {
            ctx,
            auip: AuipFormatter::new(ctx.lookup),
            recipe: Recipe::default(),
            state: State::Start,
            directions: TextAccumulator::new(),
            prev_blank: false,
            first_auip_seen: false,
        }
    }

    fn handle_header(&mut self, line: &str) -> Transition<State> {
        if line.trim().is_empty() {
            return Transition::Stay;
        }
        // An untagged line after the header starts the ingredient table
        Transition::Reprocess(State::Auip)
    }

    fn handle_title(&mut self, line: &str) -> Transition<State> {
        let title = strip_tag(skip_whitespace(line), TITLE_TAG).unwrap_or_default();
        set_title(&mut self.recipe, title);
        Transition::Next(State::Header)
    }

    fn handle_categories(&mut self, line: &str) -> Transition<State> {
        let text = strip_tag(skip_whitespace(line), CATEGORIES_TAG).unwrap_or_default();
        file_category_list(&self.ctx, &mut self.recipe, text, Facet::Chapter);
        Transition::Next(State::Header)
    }

    fn handle_yield(&mut self, line: &str) -> Transition<State> {
        let line = skip_whitespace(line);
        let (tag, text, servings_tag) = match strip_tag(line, SERVINGS_TAG) {
            Some(text) => ("Servings", text, true),
            None => ("Yield", strip_tag(line, YIELD_TAG).unwrap_or_default(), false),
        };
        match parse_yield(text, servings_tag) {
            Some(value) => self.recipe.set_yield(value, tag),
            None => debug!("MMF: empty {} line", tag),
        }
        Transition::Next(State::Auip)
    }

    fn handle_auip(&mut self, line: &str) -> Transition<State> {
        if line.trim().is_empty() {
            self.prev_blank = true;
            return Transition::Stay;
        }

        let split = is_split_line(line);
        if self.first_auip_seen && self.prev_blank && !split {
            // Blank line then prose: the unlabelled start of the directions
            return Transition::Reprocess(State::Directions);
        }

        if split {
            match reformat_split_line(line) {
                Some(heading) => self.auip.format_line(&mut self.recipe, &heading, Format::Mmf),
                None => debug!("MMF: unlabelled separator in ingredients"),
            }
        } else {
            self.auip.format_line(&mut self.recipe, line, Format::Mmf);
        }
        self.first_auip_seen = true;
        self.prev_blank = false;
        Transition::Stay
    }

    fn handle_directions(&mut self, line: &str) -> Transition<State> {
        if MmfDecoder.is_end(line) {
            self.directions.flush();
            return Transition::Next(State::End);
        }
        if is_split_line(line) {
            if let Some(heading) = reformat_split_line(line) {
                self.directions.push(&mut self.recipe.directions, &heading);
            }
            return Transition::Stay;
        }
        self.directions.push(&mut self.recipe.directions, line);
        Transition::Stay
    }
}

impl StateMachine for MmfMachine<'_> {
    type State = State;

    fn format(&self) -> Format {
        Format::Mmf
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
        if MmfDecoder.is_end(line) {
            return Some(State::End);
        }

        let line = skip_whitespace(line);
        if line.starts_with(TITLE_TAG) {
            Some(State::Title)
        } else if line.starts_with(CATEGORIES_TAG) {
            Some(State::Categories)
        } else if line.starts_with(SERVINGS_TAG) || line.starts_with(YIELD_TAG) {
            Some(State::Yield)
        } else {
            None
        }
    }

    fn dispatch(&mut self, line: &str) -> Transition<State> {
        match self.state {
            State::Start => {
                if MmfDecoder.is_start(line) {
                    Transition::Next(State::Header)
                } else {
                    Transition::Stay
                }
            }
            State::Header => self.handle_header(line),
            State::Title => self.handle_title(line),
            State::Categories => self.handle_categories(line),
            State::Yield => self.handle_yield(line),
            State::Auip => self.handle_auip(line),
            State::Directions => self.handle_directions(line),
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
