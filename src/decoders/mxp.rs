//! MasterCook export decoder.
//!
//! MasterCook writes labelled header fields (`Recipe By`, `Serving Size`,
//! `Preparation Time`, `Categories`), a columnar ingredient table under an
//! `Amount / Measure / Ingredient` header and a dashed rule, free-text
//! directions closed by a `- - - -` rule, and a trailer of notes and
//! nutrition blocks. Exports have no end marker: a recipe ends where the next
//! banner starts or where the input ends.

use log::debug;
use std::collections::VecDeque;

use super::{
    file_dispatched_category, parse_yield, run_machine, set_title, DecodeContext, Decoder,
    Format, StateMachine, Transition,
};
use crate::accumulate::TextAccumulator;
use crate::auip::{AuipFormatter, MxpColumns};
use crate::model::{Recipe, ScalarField};
use crate::text::{after_colon, char_slice, is_blank, skip_whitespace, starts_with_ci};

/// Banners written by the MasterCook family of programs
const START_BANNERS: &[&str] = &[
    "*  Exported from  MasterCook  *",
    "*  Exported from  MasterCook II  *",
    "*  Exported from  MasterCook Mac  *",
    "*  Exported from  MasterCook Buster  *",
    "*  Exported from  MasterCook Deluxe  *",
    "*  Exported from  MasterCook Plus  *",
    "*  Exported from  MasterCook 5  *",
    "* Exported from MasterCook *",
    "*  Exported from  CookWorks  *",
    "*  Exported from  Living Cookbook  *",
];

const RECIPE_BY_TAG: &str = "Recipe By";
const SERVING_SIZE_TAG: &str = "Serving Size";
const PREP_TIME_TAG: &str = "Preparation Time";
const CATEGORIES_TAG: &str = "Categories";

/// Width of the label column in header and category lines
const LABEL_WIDTH: usize = 16;
/// Width of one category cell
const SIZE_CATEGORY: usize = 33;

/// Columns that must hold a dash in the ingredient table's rule line
const DASH_POSITIONS: [usize; 5] = [0, 7, 10, 21, 24];

const DIRECTIONS_END: &str = "- - - - - - - - - -";

pub struct MxpDecoder;

impl Decoder for MxpDecoder {
    fn format(&self) -> Format {
        Format::Mxp
    }

    fn is_start(&self, line: &str) -> bool {
        let line = line.trim();
        let generic = line
            .strip_prefix('*')
            .is_some_and(|rest| rest.contains("Exported") && rest.contains("from"));
        generic || START_BANNERS.contains(&line)
    }

    /// MasterCook exports carry no end-of-recipe marker.
    fn is_end(&self, _line: &str) -> bool {
        false
    }

    fn decode(&self, lines: &mut VecDeque<String>, ctx: &DecodeContext<'_>) -> Recipe {
        run_machine(self, MxpMachine::new(*ctx), lines)
    }
}

/// The `Amount  Measure  Ingredient -- Preparation Method` table header
fn is_ingredient_header(line: &str) -> bool {
    line.contains("Amount") && line.contains("Measure") && line.contains("Ingredient")
}

fn is_dash_separator(line: &str) -> bool {
    let chars: Vec<char> = line.chars().collect();
    DASH_POSITIONS
        .iter()
        .all(|&pos| chars.get(pos) == Some(&'-'))
}

fn is_directions_end(line: &str) -> bool {
    line.trim().starts_with(DIRECTIONS_END)
}

/// Fixed-width category cells of one line.
///
/// The tag line contributes the cells after its `:`; continuation lines
/// must be indented past the label column.
fn category_cells(line: &str, tag_line: bool) -> Option<Vec<String>> {
    let content = if tag_line {
        let pos = line.find(':')?;
        let rest = &line[pos + 1..];
        rest.strip_prefix(' ').unwrap_or(rest)
    } else {
        if !char_slice(line, 0, Some(LABEL_WIDTH)).trim().is_empty() {
            return None;
        }
        char_slice(line, LABEL_WIDTH, None)
    };

    let chars: Vec<char> = content.chars().collect();
    Some(
        chars
            .chunks(SIZE_CATEGORY)
            .map(|cell| cell.iter().collect::<String>().trim().to_string())
            .filter(|cell| !cell.is_empty())
            .collect(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Title,
    RecipeBy,
    SrvSize,
    PrepTime,
    Categories,
    Auip,
    Directions,
    Notes,
    End,
    Complete,
}

/// Category list progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CategoryScan {
    Idle,
    Started,
    Complete,
}

/// Ingredient table progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuipScan {
    Idle,
    Text,
    Dash,
    Amip,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectionScan {
    Idle,
    Started,
}

/// Sub-section of the trailer after the directions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoteSection {
    Idle,
    PerServing,
    NutrAssoc,
    Notes,
    Wine,
    ServingIdeas,
}

impl NoteSection {
    fn is_kept(self) -> bool {
        matches!(self, NoteSection::Notes | NoteSection::ServingIdeas)
    }
}

/// What a trailer tag does
#[derive(Debug, Clone, Copy)]
enum TrailerTag {
    Section(NoteSection),
    Field(ScalarField),
    Yield,
}

/// Trailer tags, matched case-insensitively in order. The flag says whether
/// a `:` must follow the tag.
const TRAILER_TAGS: &[(&str, bool, TrailerTag)] = &[
    ("Per Serving", false, TrailerTag::Section(NoteSection::PerServing)),
    ("Nutr. Assoc.", false, TrailerTag::Section(NoteSection::NutrAssoc)),
    ("NOTES", true, TrailerTag::Section(NoteSection::Notes)),
    ("Suggested Wine", true, TrailerTag::Section(NoteSection::Wine)),
    ("Serving Ideas", true, TrailerTag::Section(NoteSection::ServingIdeas)),
    ("Source", true, TrailerTag::Field(ScalarField::Source)),
    ("Copyright", true, TrailerTag::Field(ScalarField::Copyright)),
    ("Yield", true, TrailerTag::Yield),
];

fn match_trailer_tag(line: &str) -> Option<(&'static str, TrailerTag)> {
    let line = skip_whitespace(line);
    TRAILER_TAGS
        .iter()
        .find(|(tag, needs_colon, _)| {
            starts_with_ci(line, tag)
                && (!*needs_colon || line[tag.len()..].trim_start().starts_with(':'))
        })
        .map(|(tag, _, action)| (*tag, *action))
}

struct MxpMachine<'a> {
    ctx: DecodeContext<'a>,
    auip: AuipFormatter<'a>,
    recipe: Recipe,
    state: State,
    category_scan: CategoryScan,
    auip_scan: AuipScan,
    direction_scan: DirectionScan,
    note_section: NoteSection,
    directions: TextAccumulator,
    notes: TextAccumulator,
}

impl<'a> MxpMachine<'a> {
    fn new(ctx: DecodeContext<'a>) -> Self {
        MxpMachine {
            ctx,
            auip: AuipFormatter::new(ctx.lookup),
            recipe: Recipe::default(),
            state: State::Idle,
            category_scan: CategoryScan::Idle,
            auip_scan: AuipScan::Idle,
            direction_scan: DirectionScan::Idle,
            note_section: NoteSection::Idle,
            directions: TextAccumulator::new(),
            notes: TextAccumulator::new(),
        }
    }

    /// A header line whose field normally comes earlier goes back to it.
    fn revisit_header(line: &str) -> Option<State> {
        let text = skip_whitespace(line);
        if text.starts_with(RECIPE_BY_TAG) {
            Some(State::RecipeBy)
        } else if text.starts_with(SERVING_SIZE_TAG) {
            Some(State::SrvSize)
        } else if line.contains(PREP_TIME_TAG) {
            Some(State::PrepTime)
        } else {
            None
        }
    }

    fn handle_title(&mut self, line: &str) -> Transition<State> {
        if is_blank(line) {
            return Transition::Stay;
        }
        set_title(&mut self.recipe, line);
        Transition::Next(State::RecipeBy)
    }

    /// Header fields may be missing; hand the line to whichever state expects it.
    fn skip_to_header_field(&self, line: &str, current: State) -> Transition<State> {
        let text = skip_whitespace(line);
        let next = if text.starts_with(SERVING_SIZE_TAG) {
            State::SrvSize
        } else if line.contains(PREP_TIME_TAG) {
            State::PrepTime
        } else if text.starts_with(CATEGORIES_TAG) || is_ingredient_header(line) {
            State::Categories
        } else {
            debug!("MXP: ignoring header line: {:?}", line);
            return Transition::Stay;
        };
        if next == current {
            Transition::Stay
        } else {
            Transition::Reprocess(next)
        }
    }

    fn handle_recipe_by(&mut self, line: &str) -> Transition<State> {
        if is_blank(line) {
            return Transition::Stay;
        }
        if skip_whitespace(line).starts_with(RECIPE_BY_TAG) {
            self.recipe
                .set_once(ScalarField::Author, after_colon(line), RECIPE_BY_TAG);
            return Transition::Next(State::SrvSize);
        }
        self.skip_to_header_field(line, State::RecipeBy)
    }

    fn handle_serving_size(&mut self, line: &str) -> Transition<State> {
        if is_blank(line) {
            return Transition::Stay;
        }
        let text = skip_whitespace(line);
        if text.starts_with(RECIPE_BY_TAG) {
            return Transition::Reprocess(State::RecipeBy);
        }
        if !text.starts_with(SERVING_SIZE_TAG) {
            return Transition::Reprocess(State::PrepTime);
        }

        let value = after_colon(line).split_whitespace().next().unwrap_or_default();
        self.recipe
            .set_once(ScalarField::Serves, value, SERVING_SIZE_TAG);

        // Preparation time usually shares the serving size line
        if line.contains(PREP_TIME_TAG) {
            Transition::Reprocess(State::PrepTime)
        } else {
            Transition::Next(State::PrepTime)
        }
    }

    fn handle_prep_time(&mut self, line: &str) -> Transition<State> {
        if is_blank(line) {
            return Transition::Stay;
        }
        let Some(pos) = line.find(PREP_TIME_TAG) else {
            let next = Self::revisit_header(line).unwrap_or(State::Categories);
            return Transition::Reprocess(next);
        };
        let value = after_colon(&line[pos..]);
        self.recipe
            .set_once(ScalarField::PrepTime, value, PREP_TIME_TAG);
        Transition::Next(State::Categories)
    }

    fn handle_categories(&mut self, line: &str) -> Transition<State> {
        match self.category_scan {
            CategoryScan::Idle => {
                if is_blank(line) {
                    return Transition::Stay;
                }
                if let Some(header) = Self::revisit_header(line) {
                    return Transition::Reprocess(header);
                }
                if !skip_whitespace(line).starts_with(CATEGORIES_TAG) {
                    self.category_scan = CategoryScan::Complete;
                    return Transition::Reprocess(State::Auip);
                }
                self.category_scan = CategoryScan::Started;
                self.file_cells(line, true);
                Transition::Stay
            }
            CategoryScan::Started => {
                if is_blank(line) {
                    self.category_scan = CategoryScan::Complete;
                    return Transition::Next(State::Auip);
                }
                if is_ingredient_header(line) || !self.file_cells(line, false) {
                    self.category_scan = CategoryScan::Complete;
                    return Transition::Reprocess(State::Auip);
                }
                Transition::Stay
            }
            CategoryScan::Complete => Transition::Reprocess(State::Auip),
        }
    }

    /// File the category cells of a line; false when the line holds none.
    fn file_cells(&mut self, line: &str, tag_line: bool) -> bool {
        match category_cells(line, tag_line) {
            Some(cells) if !cells.is_empty() => {
                for cell in cells {
                    file_dispatched_category(&self.ctx, &mut self.recipe, &cell);
                }
                true
            }
            _ => tag_line,
        }
    }

    fn handle_auip(&mut self, line: &str) -> Transition<State> {
        match self.auip_scan {
            AuipScan::Idle | AuipScan::Text => {
                if is_ingredient_header(line) {
                    self.auip_scan = AuipScan::Dash;
                } else if !is_blank(line) {
                    debug!("MXP: text before ingredient header: {:?}", line);
                    self.auip_scan = AuipScan::Text;
                }
                Transition::Stay
            }
            AuipScan::Dash => {
                if is_dash_separator(line) {
                    if let Some(columns) = MxpColumns::from_separator(line) {
                        self.auip.set_mxp_columns(columns);
                    }
                    self.auip_scan = AuipScan::Amip;
                } else {
                    debug!("MXP: expected ingredient rule, got {:?}", line);
                }
                Transition::Stay
            }
            AuipScan::Amip => {
                if is_blank(line) {
                    self.auip_scan = AuipScan::Complete;
                    return Transition::Next(State::Directions);
                }
                self.auip.format_line(&mut self.recipe, line, Format::Mxp);
                Transition::Stay
            }
            AuipScan::Complete => Transition::Reprocess(State::Directions),
        }
    }

    fn handle_directions(&mut self, line: &str) -> Transition<State> {
        if is_directions_end(line) {
            self.directions.flush();
            return Transition::Next(State::Notes);
        }
        match self.direction_scan {
            DirectionScan::Idle if is_blank(line) => Transition::Stay,
            DirectionScan::Idle | DirectionScan::Started => {
                self.direction_scan = DirectionScan::Started;
                self.directions.push(&mut self.recipe.directions, line);
                Transition::Stay
            }
        }
    }

    /// Kept sections run across blank lines until the next trailer tag.
    fn handle_notes(&mut self, line: &str) -> Transition<State> {
        if is_blank(line) {
            if self.note_section.is_kept() {
                self.notes.push(&mut self.recipe.notes, line);
            } else {
                self.note_section = NoteSection::Idle;
            }
            return Transition::Stay;
        }

        if let Some((tag, action)) = match_trailer_tag(line) {
            self.notes.flush();
            let value = after_colon(skip_whitespace(line));
            match action {
                TrailerTag::Section(section) => {
                    self.note_section = section;
                    if section.is_kept() {
                        self.notes.push(&mut self.recipe.notes, value);
                    }
                }
                TrailerTag::Field(field) => {
                    self.note_section = NoteSection::Idle;
                    self.recipe.set_once(field, value, tag);
                }
                TrailerTag::Yield => {
                    self.note_section = NoteSection::Idle;
                    if let Some(value) = parse_yield(value, false) {
                        self.recipe.set_yield(value, tag);
                    }
                }
            }
            return Transition::Stay;
        }

        if self.note_section.is_kept() {
            self.notes.push(&mut self.recipe.notes, line);
        } else if self.note_section == NoteSection::Idle {
            debug!("MXP: ignoring trailer line: {:?}", line);
        }
        Transition::Stay
    }
}

impl StateMachine for MxpMachine<'_> {
    type State = State;

    fn format(&self) -> Format {
        Format::Mxp
    }

    fn state(&self) -> State {
        self.state
    }

    fn set_state(&mut self, state: State) {
        self.state = state;
    }

    /// MasterCook has no banners inside a recipe; the next start banner is
    /// handled by the driver.
    fn check_markers(&self, _line: &str) -> Option<State> {
        None
    }

    fn dispatch(&mut self, line: &str) -> Transition<State> {
        match self.state {
            State::Idle => {
                if MxpDecoder.is_start(line) {
                    Transition::Next(State::Title)
                } else {
                    Transition::Stay
                }
            }
            State::Title => self.handle_title(line),
            State::RecipeBy => self.handle_recipe_by(line),
            State::SrvSize => self.handle_serving_size(line),
            State::PrepTime => self.handle_prep_time(line),
            State::Categories => self.handle_categories(line),
            State::Auip => self.handle_auip(line),
            State::Directions => self.handle_directions(line),
            State::Notes => self.handle_notes(line),
            State::End => {
                self.directions.flush();
                self.notes.flush();
                Transition::Next(State::Complete)
            }
            State::Complete => Transition::Stay,
        }
    }

    fn has_started(&self) -> bool {
        self.state != State::Idle
    }

    fn is_complete(&self) -> bool {
        self.state == State::Complete
    }

    fn finish(mut self) -> Recipe {
        if self.state != State::Complete {
            self.set_state(State::End);
            self.dispatch("");
        }
        self.recipe
    }
}
