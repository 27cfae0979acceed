//! Ingredient-table row parsing.
//!
//! Every decoder forwards its ingredient lines here. The owning format picks
//! the column layout: Meal-Master fixed columns, MasterCook columns measured
//! from the dashed header separator, pipe-delimited RXF rows, or the
//! free-form fallback used by BigOven and by any row that does not fit its
//! format's columns.

use log::debug;

use crate::decoders::Format;
use crate::model::{Auip, AuipKind, Recipe};
use crate::text::char_slice;
use crate::translate::CategoryLookup;

/// Meal-Master two-letter unit codes
const MMF_UNIT_CODES: &[&str] = &[
    "x", "sm", "md", "lg", "cn", "pk", "pn", "dr", "ds", "ct", "bn", "sl", "ea", "t", "ts", "T",
    "tb", "fl", "c", "pt", "qt", "ga", "oz", "lb", "ml", "cb", "cl", "dl", "l", "dg", "cg", "kg",
    "mg", "g",
];

const MMF_AMOUNT_WIDTH: usize = 7;
const MMF_UNIT_START: usize = 8;
const MMF_INGREDIENT_START: usize = 11;
const MMF_COLUMN_WIDTH: usize = 41;

/// Column start positions of a MasterCook ingredient table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MxpColumns {
    pub measure_start: usize,
    pub ingredient_start: usize,
}

impl Default for MxpColumns {
    fn default() -> Self {
        MxpColumns {
            measure_start: 10,
            ingredient_start: 24,
        }
    }
}

impl MxpColumns {
    /// Measure the columns from a `--------  ------------  -----` separator.
    pub fn from_separator(line: &str) -> Option<Self> {
        let mut runs = Vec::new();
        let mut in_run = false;
        for (pos, c) in line.chars().enumerate() {
            match (c == '-', in_run) {
                (true, false) => {
                    runs.push(pos);
                    in_run = true;
                }
                (false, true) => in_run = false,
                _ => {}
            }
        }
        match runs.as_slice() {
            [0, measure, ingredient, ..] => Some(MxpColumns {
                measure_start: *measure,
                ingredient_start: *ingredient,
            }),
            _ => None,
        }
    }
}

/// Parses ingredient rows onto a recipe
pub struct AuipFormatter<'a> {
    lookup: &'a dyn CategoryLookup,
    mxp_columns: MxpColumns,
}

impl<'a> AuipFormatter<'a> {
    pub fn new(lookup: &'a dyn CategoryLookup) -> Self {
        AuipFormatter {
            lookup,
            mxp_columns: MxpColumns::default(),
        }
    }

    pub fn set_mxp_columns(&mut self, columns: MxpColumns) {
        self.mxp_columns = columns;
    }

    /// Append the entries found in one ingredient-table row.
    pub fn format_line(&self, recipe: &mut Recipe, raw_line: &str, format: Format) {
        let line = raw_line.trim_end();
        if line.trim().is_empty() {
            return;
        }

        if let Some(heading) = heading_text(line.trim()) {
            recipe.ingredients.push(Auip::heading(heading));
            return;
        }

        match format {
            Format::Mmf => self.format_mmf(recipe, line),
            Format::Mxp => {
                let entry = self
                    .parse_mxp(line)
                    .unwrap_or_else(|| self.parse_free_form(line));
                recipe.ingredients.push(entry);
            }
            Format::Rxf if line.contains('|') => recipe.ingredients.push(self.parse_rxf(line)),
            Format::Rxf | Format::Bof => recipe.ingredients.push(self.parse_free_form(line)),
        }
    }

    fn format_mmf(&self, recipe: &mut Recipe, line: &str) {
        let Some(left) = self.parse_mmf_column(line) else {
            recipe.ingredients.push(self.parse_free_form(line));
            return;
        };

        let right_text = char_slice(line, MMF_COLUMN_WIDTH, None);
        let right = if line.chars().count() > MMF_COLUMN_WIDTH + MMF_INGREDIENT_START {
            self.parse_mmf_column(right_text)
                .filter(|entry| entry.amount.is_some())
        } else {
            None
        };

        let left = match right {
            Some(_) => {
                let left_only = char_slice(line, 0, Some(MMF_COLUMN_WIDTH));
                self.parse_mmf_column(left_only).unwrap_or(left)
            }
            None => left,
        };

        for entry in std::iter::once(left).chain(right) {
            push_mmf_entry(recipe, entry);
        }
    }

    /// Fixed-column Meal-Master row, `None` when the line does not fit the columns.
    fn parse_mmf_column(&self, line: &str) -> Option<Auip> {
        let chars: Vec<char> = line.chars().collect();
        if chars.len() <= MMF_INGREDIENT_START
            || chars[MMF_AMOUNT_WIDTH] != ' '
            || chars[MMF_INGREDIENT_START - 1] != ' '
        {
            return None;
        }

        let amount = char_slice(line, 0, Some(MMF_AMOUNT_WIDTH)).trim();
        let unit = char_slice(line, MMF_UNIT_START, Some(MMF_INGREDIENT_START - 1)).trim();
        let rest = char_slice(line, MMF_INGREDIENT_START, None).trim();

        if !amount.is_empty() && !is_amount(amount) {
            return None;
        }
        if !unit.is_empty() && !MMF_UNIT_CODES.contains(&unit) {
            return None;
        }
        if rest.is_empty() {
            return None;
        }

        let (ingredient, preparation) = split_preparation(rest);
        Some(Auip {
            kind: AuipKind::Ingredient,
            amount: non_empty(amount),
            unit: non_empty(unit).map(|code| self.mmf_unit(&code)),
            ingredient: non_empty(ingredient),
            preparation: preparation.and_then(non_empty),
        })
    }

    fn mmf_unit(&self, code: &str) -> String {
        match code {
            "T" | "tb" => "tablespoon".to_string(),
            "t" | "ts" => "teaspoon".to_string(),
            _ => self.canonical_unit(code),
        }
    }

    fn parse_mxp(&self, line: &str) -> Option<Auip> {
        let MxpColumns {
            measure_start,
            ingredient_start,
        } = self.mxp_columns;
        let chars: Vec<char> = line.chars().collect();
        if chars.len() <= ingredient_start
            || chars[measure_start - 1] != ' '
            || chars[ingredient_start - 1] != ' '
        {
            return None;
        }

        let amount = char_slice(line, 0, Some(measure_start)).trim();
        let unit = char_slice(line, measure_start, Some(ingredient_start)).trim();
        let rest = char_slice(line, ingredient_start, None).trim();
        if !amount.is_empty() && !is_amount(amount) {
            return None;
        }

        let (ingredient, preparation) = match rest.split_once("--") {
            Some((ingredient, preparation)) => (ingredient.trim(), Some(preparation.trim())),
            None => (rest, None),
        };
        Some(Auip {
            kind: AuipKind::Ingredient,
            amount: non_empty(amount),
            unit: non_empty(unit).map(|u| self.canonical_unit(&u)),
            ingredient: non_empty(ingredient),
            preparation: preparation.and_then(non_empty),
        })
    }

    fn parse_rxf(&self, line: &str) -> Auip {
        let mut fields = line.split('|').map(str::trim);
        let amount = fields.next().and_then(non_empty);
        let unit = fields
            .next()
            .and_then(non_empty)
            .map(|u| self.canonical_unit(&u));
        let ingredient = fields.next().and_then(non_empty);
        let preparation = fields.collect::<Vec<_>>().join(" | ");
        Auip {
            kind: AuipKind::Ingredient,
            amount,
            unit,
            ingredient,
            preparation: non_empty(&preparation),
        }
    }

    /// Whitespace-tokenized row: amount tokens, an optional known unit, then text.
    pub fn parse_free_form(&self, line: &str) -> Auip {
        let trimmed = line.trim();
        if !trimmed.chars().any(char::is_alphanumeric) {
            debug!("Keeping unparseable ingredient row verbatim: {:?}", trimmed);
            return Auip::text(trimmed);
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        let mut index = 0;

        let mut amount_tokens = Vec::new();
        while index < tokens.len() && amount_tokens.len() < 2 && is_amount(tokens[index]) {
            amount_tokens.push(tokens[index]);
            index += 1;
        }
        // "1 (16 oz) can" keeps the package size with the amount
        if !amount_tokens.is_empty() && index < tokens.len() && tokens[index].starts_with('(') {
            let start = index;
            while index < tokens.len() && !tokens[index].ends_with(')') {
                index += 1;
            }
            if index < tokens.len() {
                index += 1;
                amount_tokens.extend(&tokens[start..index]);
            } else {
                index = start;
            }
        }

        let mut unit = None;
        if index + 1 < tokens.len() {
            if let Some(canonical) = self.lookup.lookup_unit(tokens[index]) {
                unit = Some(canonical);
                index += 1;
            }
        }

        let rest = tokens[index..].join(" ");
        let (ingredient, preparation) = split_preparation(&rest);
        Auip {
            kind: AuipKind::Ingredient,
            amount: non_empty(&amount_tokens.join(" ")),
            unit,
            ingredient: non_empty(ingredient),
            preparation: preparation.and_then(non_empty),
        }
    }

    fn canonical_unit(&self, raw: &str) -> String {
        self.lookup
            .lookup_unit(raw)
            .unwrap_or_else(|| raw.to_string())
    }
}

/// Meal-Master continuation rows (`-chopped`) extend the previous entry.
fn push_mmf_entry(recipe: &mut Recipe, entry: Auip) {
    let continuation = entry.amount.is_none()
        && entry.unit.is_none()
        && entry
            .ingredient
            .as_deref()
            .is_some_and(|text| text.starts_with('-'));

    if continuation {
        if let Some(previous) = recipe
            .ingredients
            .last_mut()
            .filter(|prev| prev.kind == AuipKind::Ingredient)
        {
            let extra = entry
                .ingredient
                .as_deref()
                .unwrap_or_default()
                .trim_start_matches('-')
                .trim();
            let target = if previous.preparation.is_some() {
                &mut previous.preparation
            } else {
                &mut previous.ingredient
            };
            *target = Some(match target.take() {
                Some(existing) => format!("{} {}", existing, extra),
                None => extra.to_string(),
            });
            return;
        }
    }
    recipe.ingredients.push(entry);
}

/// Section titles inside an ingredient table: `** SAUCE **` or `For the sauce:`
fn heading_text(line: &str) -> Option<String> {
    if let Some(inner) = line
        .strip_prefix("**")
        .and_then(|rest| rest.strip_suffix("**"))
    {
        let inner = inner.trim();
        return (!inner.is_empty()).then(|| inner.to_string());
    }

    let first = line.chars().next()?;
    if line.ends_with(':') && first.is_alphabetic() && !line.contains("  ") {
        return Some(line.trim_end_matches(':').trim().to_string());
    }
    None
}

/// Numbers, fractions and ranges such as `1`, `1/2`, `1.5`, `2-3`, `½`
pub fn is_amount(token: &str) -> bool {
    let token = token.trim();
    !token.is_empty()
        && token
            .chars()
            .any(|c| c.is_ascii_digit() || "½¼¾⅓⅔⅛".contains(c))
        && token
            .split_whitespace()
            .flat_map(str::chars)
            .all(|c| c.is_ascii_digit() || "/.-½¼¾⅓⅔⅛".contains(c))
}

fn split_preparation(text: &str) -> (&str, Option<&str>) {
    for separator in [" -- ", ";", ", "] {
        if let Some((ingredient, preparation)) = text.split_once(separator) {
            return (ingredient.trim(), Some(preparation.trim()));
        }
    }
    (text.trim(), None)
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::TranslationTable;

    fn table() -> TranslationTable {
        TranslationTable::from_pairs(
            [],
            [
                ("cup", "cup"),
                ("cups", "cup"),
                ("c", "cup"),
                ("lb", "pound"),
                ("can", "can"),
            ],
        )
    }

    fn format(lines: &[&str], format: Format) -> Vec<Auip> {
        let table = table();
        let formatter = AuipFormatter::new(&table);
        let mut recipe = Recipe::default();
        for line in lines {
            formatter.format_line(&mut recipe, line, format);
        }
        recipe.ingredients
    }

    #[test]
    fn test_free_form_amount_unit_ingredient() {
        let entries = format(&["1 cup  peas"], Format::Bof);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].amount.as_deref(), Some("1"));
        assert_eq!(entries[0].unit.as_deref(), Some("cup"));
        assert_eq!(entries[0].ingredient.as_deref(), Some("peas"));
        assert!(entries[0].preparation.is_none());
    }

    #[test]
    fn test_free_form_mixed_fraction_and_preparation() {
        let entries = format(&["1 1/2 lb ground beef, browned"], Format::Bof);
        assert_eq!(entries[0].amount.as_deref(), Some("1 1/2"));
        assert_eq!(entries[0].unit.as_deref(), Some("pound"));
        assert_eq!(entries[0].ingredient.as_deref(), Some("ground beef"));
        assert_eq!(entries[0].preparation.as_deref(), Some("browned"));
    }

    #[test]
    fn test_free_form_package_size() {
        let entries = format(&["1 (16 oz) can black beans"], Format::Bof);
        assert_eq!(entries[0].amount.as_deref(), Some("1 (16 oz)"));
        assert_eq!(entries[0].unit.as_deref(), Some("can"));
        assert_eq!(entries[0].ingredient.as_deref(), Some("black beans"));
    }

    #[test]
    fn test_free_form_without_amount() {
        let entries = format(&["salt and pepper to taste"], Format::Bof);
        assert!(entries[0].amount.is_none());
        assert!(entries[0].unit.is_none());
        assert_eq!(
            entries[0].ingredient.as_deref(),
            Some("salt and pepper to taste")
        );
    }

    #[test]
    fn test_mmf_fixed_columns_and_continuation() {
        let entries = format(
            &[
                "  1 1/2 c  flour",
                "      2 T  butter; softened",
                "           -at room temperature",
                "      1    onion",
            ],
            Format::Mmf,
        );
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].amount.as_deref(), Some("1 1/2"));
        assert_eq!(entries[0].unit.as_deref(), Some("cup"));
        assert_eq!(entries[0].ingredient.as_deref(), Some("flour"));
        assert_eq!(entries[1].unit.as_deref(), Some("tablespoon"));
        assert_eq!(
            entries[1].preparation.as_deref(),
            Some("softened at room temperature")
        );
        assert!(entries[2].unit.is_none());
        assert_eq!(entries[2].ingredient.as_deref(), Some("onion"));
    }

    #[test]
    fn test_mmf_two_column_row() {
        let left = format!("{:<41}", "      1 c  sugar");
        let line = format!("{}      2 t  vanilla", left);
        let entries = format(&[line.as_str()], Format::Mmf);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].ingredient.as_deref(), Some("sugar"));
        assert_eq!(entries[1].amount.as_deref(), Some("2"));
        assert_eq!(entries[1].unit.as_deref(), Some("teaspoon"));
        assert_eq!(entries[1].ingredient.as_deref(), Some("vanilla"));
    }

    #[test]
    fn test_heading_rows() {
        let entries = format(&["** SAUCE **", "For the topping:"], Format::Mmf);
        assert_eq!(entries[0], Auip::heading("SAUCE"));
        assert_eq!(entries[1], Auip::heading("For the topping"));
    }

    #[test]
    fn test_mxp_columns_from_separator() {
        let columns =
            MxpColumns::from_separator("--------  ------------  --------------------------------")
                .unwrap();
        assert_eq!(columns, MxpColumns::default());
        assert!(MxpColumns::from_separator("  ----").is_none());
    }

    #[test]
    fn test_mxp_row_with_preparation() {
        let entries = format(
            &["   1      cup           peas -- frozen", "                        salt"],
            Format::Mxp,
        );
        assert_eq!(entries[0].amount.as_deref(), Some("1"));
        assert_eq!(entries[0].unit.as_deref(), Some("cup"));
        assert_eq!(entries[0].ingredient.as_deref(), Some("peas"));
        assert_eq!(entries[0].preparation.as_deref(), Some("frozen"));
        assert!(entries[1].amount.is_none());
        assert_eq!(entries[1].ingredient.as_deref(), Some("salt"));
    }

    #[test]
    fn test_rxf_pipe_row() {
        let entries = format(&["2 | cups | peas | rinsed", "| | salt |"], Format::Rxf);
        assert_eq!(entries[0].amount.as_deref(), Some("2"));
        assert_eq!(entries[0].unit.as_deref(), Some("cup"));
        assert_eq!(entries[0].preparation.as_deref(), Some("rinsed"));
        assert!(entries[1].amount.is_none());
        assert_eq!(entries[1].ingredient.as_deref(), Some("salt"));
        assert!(entries[1].preparation.is_none());
    }

    #[test]
    fn test_is_amount() {
        assert!(is_amount("1"));
        assert!(is_amount("1/2"));
        assert!(is_amount("2-3"));
        assert!(is_amount("1 1/2"));
        assert!(is_amount("½"));
        assert!(!is_amount("-"));
        assert!(!is_amount("cup"));
    }
}
