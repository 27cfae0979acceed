//! Native recipe exchange format decoder.
//!
//! Layout:
//!
//! ```text
//! ----- Begin Recipe (RXF) -----
//! Title (blank when the recipe has none)
//! optional description lines
//!
//! amount | unit | ingredient | preparation
//!
//! directions...
//! ----- Recipe Data -----
//! Author: ...
//! ----- Source Info -----
//! Source: ...
//! ----- End Recipe (RXF) -----
//! ```

use log::debug;
use std::collections::VecDeque;

use super::{
    append_description, file_category_list, parse_yield, run_machine, set_title, DecodeContext,
    Decoder, Format, StateMachine, Transition,
};
use crate::accumulate::TextAccumulator;
use crate::auip::AuipFormatter;
use crate::model::{Facet, Recipe, ScalarField};
use crate::text::{is_blank, skip_whitespace, strip_tag};

pub const RXF_START: &str = "----- Begin Recipe (RXF) -----";
pub const RXF_END: &str = "----- End Recipe (RXF) -----";
pub const RXF_RECIPE_DATA: &str = "----- Recipe Data -----";
pub const RXF_SOURCE_INFO: &str = "----- Source Info -----";

/// What a data key fills in
#[derive(Debug, Clone, Copy)]
enum DataField {
    Scalar(ScalarField),
    Yield,
    Notes,
    Facet(Facet),
}

/// Keys of the data and source sections, tested in order
const DATA_KEYS: &[(&str, DataField)] = &[
    ("Author:", DataField::Scalar(ScalarField::Author)),
    ("Serves:", DataField::Scalar(ScalarField::Serves)),
    ("PrepTime:", DataField::Scalar(ScalarField::PrepTime)),
    ("CookTime:", DataField::Scalar(ScalarField::CookTime)),
    ("WaitTime:", DataField::Scalar(ScalarField::WaitTime)),
    ("RestTime:", DataField::Scalar(ScalarField::RestTime)),
    ("Yield:", DataField::Yield),
    ("Source:", DataField::Scalar(ScalarField::Source)),
    ("Notes:", DataField::Notes),
    ("Cuisine:", DataField::Facet(Facet::Cuisine)),
    ("Occasion:", DataField::Facet(Facet::Occasion)),
    ("Course:", DataField::Facet(Facet::Course)),
    ("Diet:", DataField::Facet(Facet::Diet)),
    ("Appliance:", DataField::Facet(Facet::Appliance)),
    ("Chapter:", DataField::Facet(Facet::Chapter)),
    ("Copyright:", DataField::Scalar(ScalarField::Copyright)),
    ("SkillLevel:", DataField::Scalar(ScalarField::SkillLevel)),
    ("Rating:", DataField::Scalar(ScalarField::Rating)),
    ("RecipeId:", DataField::Scalar(ScalarField::Id)),
    ("Description:", DataField::Scalar(ScalarField::Description)),
];

fn match_data_key(line: &str) -> Option<(&'static str, DataField, &str)> {
    let line = skip_whitespace(line);
    DATA_KEYS.iter().find_map(|(key, field)| {
        strip_tag(line, key).map(|value| (*key, *field, value))
    })
}

pub struct RxfDecoder;

impl Decoder for RxfDecoder {
    fn format(&self) -> Format {
        Format::Rxf
    }

    fn is_start(&self, line: &str) -> bool {
        skip_whitespace(line).starts_with(RXF_START)
    }

    fn is_end(&self, line: &str) -> bool {
        skip_whitespace(line).starts_with(RXF_END)
    }

    fn decode(&self, lines: &mut VecDeque<String>, ctx: &DecodeContext<'_>) -> Recipe {
        run_machine(self, RxfMachine::new(*ctx), lines)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Title,
    Description,
    Auip,
    Directions,
    Data,
    SourceInfo,
    End,
}

struct RxfMachine<'a> {
    ctx: DecodeContext<'a>,
    auip: AuipFormatter<'a>,
    recipe: Recipe,
    state: State,
    /// Set by `Notes:`; unkeyed lines then belong to the notes
    in_notes: bool,
    directions: TextAccumulator,
    notes: TextAccumulator,
}

impl<'a> RxfMachine<'a> {
    fn new(ctx: DecodeContext<'a>) -> Self {
        RxfMachine {
            ctx,
            auip: AuipFormatter::new(ctx.lookup),
            recipe: Recipe::default(),
            state: State::Start,
            in_notes: false,
            directions: TextAccumulator::new(),
            notes: TextAccumulator::new(),
        }
    }

    fn close_sections(&mut self) {
        self.directions.flush();
        self.notes.flush();
        self.in_notes = false;
    }

    /// The line after the banner is always the title line.
    fn handle_title(&mut self, line: &str) -> Transition<State> {
        if !is_blank(line) {
            set_title(&mut self.recipe, line);
        }
        Transition::Next(State::Description)
    }

    fn handle_description(&mut self, line: &str) -> Transition<State> {
        if is_blank(line) {
            return Transition::Next(State::Auip);
        }
        append_description(&mut self.recipe, line);
        Transition::Stay
    }

    /// The table runs to the next blank line, even when it is empty.
    fn handle_auip(&mut self, line: &str) -> Transition<State> {
        if is_blank(line) {
            return Transition::Next(State::Directions);
        }
        self.auip.format_line(&mut self.recipe, line, Format::Rxf);
        Transition::Stay
    }

    fn handle_directions(&mut self, line: &str) -> Transition<State> {
        self.directions.push(&mut self.recipe.directions, line);
        Transition::Stay
    }

    /// Keyed fields of the data and source sections
    fn handle_data(&mut self, line: &str) -> Transition<State> {
        let trimmed = line.trim();
        if trimmed == RXF_RECIPE_DATA || trimmed == RXF_SOURCE_INFO {
            self.close_sections();
            return Transition::Stay;
        }

        let Some((key, field, value)) = match_data_key(line) else {
            if self.in_notes {
                self.notes.push(&mut self.recipe.notes, line);
            } else if !is_blank(line) {
                debug!("RXF: ignoring unkeyed line: {:?}", line);
            }
            return Transition::Stay;
        };

        if self.in_notes {
            self.notes.flush();
            self.in_notes = false;
        }

        let tag = key.trim_end_matches(':');
        match field {
            DataField::Scalar(field) => {
                self.recipe.set_once(field, value, tag);
            }
            DataField::Yield => {
                if let Some(value) = parse_yield(value, false) {
                    self.recipe.set_yield(value, tag);
                }
            }
            DataField::Notes => {
                self.in_notes = true;
                self.notes.push(&mut self.recipe.notes, value);
            }
            DataField::Facet(facet) => {
                file_category_list(&self.ctx, &mut self.recipe, value, facet);
            }
        }
        Transition::Stay
    }
}

impl StateMachine for RxfMachine<'_> {
    type State = State;

    fn format(&self) -> Format {
        Format::Rxf
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
        let line = line.trim();
        if line.starts_with(RXF_RECIPE_DATA) {
            Some(State::Data)
        } else if line.starts_with(RXF_SOURCE_INFO) {
            Some(State::SourceInfo)
        } else if line.starts_with(RXF_END) {
            Some(State::End)
        } else {
            None
        }
    }

    fn dispatch(&mut self, line: &str) -> Transition<State> {
        match self.state {
            State::Start => {
                if RxfDecoder.is_start(line) {
                    Transition::Next(State::Title)
                } else {
                    Transition::Stay
                }
            }
            State::Title => self.handle_title(line),
            State::Description => self.handle_description(line),
            State::Auip => self.handle_auip(line),
            State::Directions => self.handle_directions(line),
            State::Data | State::SourceInfo => self.handle_data(line),
            State::End => {
                self.close_sections();
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
        self.close_sections();
        self.recipe
    }
}
