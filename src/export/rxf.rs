use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{write_output, RecipeSink};
use crate::decoders::{RXF_END, RXF_RECIPE_DATA, RXF_SOURCE_INFO, RXF_START};
use crate::error::ImportError;
use crate::model::{AuipKind, Facet, Recipe};

const OUTPUT_FILE: &str = "recipes.rxf";

/// Writes every accepted recipe to `recipes.rxf`
pub struct RxfSink {
    directory: PathBuf,
    buffer: String,
}

impl RxfSink {
    pub fn new(directory: &Path) -> Self {
        RxfSink {
            directory: directory.to_path_buf(),
            buffer: String::new(),
        }
    }
}

#[async_trait]
impl RecipeSink for RxfSink {
    fn name(&self) -> &str {
        "rxf"
    }

    async fn accept(&mut self, recipe: &Recipe) -> Result<(), ImportError> {
        self.buffer.push_str(&encode_rxf(recipe));
        self.buffer.push('\n');
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), ImportError> {
        write_output(&self.directory, OUTPUT_FILE, &self.buffer).await
    }
}

/// Pipes separate ingredient columns, so they cannot appear inside one
fn cell(value: Option<&str>) -> String {
    value.unwrap_or_default().replace('|', "/")
}

/// Facet values are comma-separated, so a comma inside one is escaped
fn facet_list(values: &[String]) -> String {
    values
        .iter()
        .map(|value| value.replace(',', "\\,"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn push_field(out: &mut String, key: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        out.push_str(key);
        out.push(' ');
        out.push_str(value);
        out.push('\n');
    }
}

/// Render one recipe as an RXF block that decodes back to the same record
pub fn encode_rxf(recipe: &Recipe) -> String {
    let mut out = String::new();
    out.push_str(RXF_START);
    out.push('\n');
    out.push_str(recipe.name.as_deref().unwrap_or_default());
    out.push('\n');
    if let Some(description) = recipe.description.as_deref() {
        out.push_str(description);
        out.push('\n');
    }
    out.push('\n');

    for entry in &recipe.ingredients {
        let ingredient = entry.ingredient.as_deref();
        let row = match entry.kind {
            AuipKind::Heading => format!("** {} **", ingredient.unwrap_or_default()),
            AuipKind::Text => ingredient.unwrap_or_default().to_string(),
            AuipKind::Ingredient => format!(
                "{} | {} | {} | {}",
                cell(entry.amount.as_deref()),
                cell(entry.unit.as_deref()),
                cell(ingredient),
                cell(entry.preparation.as_deref()),
            ),
        };
        out.push_str(row.trim_end());
        out.push('\n');
    }
    out.push('\n');

    for line in &recipe.directions {
        out.push_str(line);
        out.push('\n');
    }

    out.push_str(RXF_RECIPE_DATA);
    out.push('\n');
    push_field(&mut out, "RecipeId:", recipe.id.as_deref());
    push_field(&mut out, "Author:", recipe.author.as_deref());
    push_field(&mut out, "Serves:", recipe.serves.as_deref());
    if let Some(makes) = recipe.makes.as_deref() {
        let value = match recipe.makes_unit.as_deref() {
            Some(unit) => format!("{} {}", makes, unit),
            None => makes.to_string(),
        };
        push_field(&mut out, "Yield:", Some(&value));
    }
    push_field(&mut out, "PrepTime:", recipe.prep_time.as_deref());
    push_field(&mut out, "CookTime:", recipe.cook_time.as_deref());
    push_field(&mut out, "WaitTime:", recipe.wait_time.as_deref());
    push_field(&mut out, "RestTime:", recipe.rest_time.as_deref());
    push_field(&mut out, "SkillLevel:", recipe.skill_level.as_deref());
    push_field(&mut out, "Rating:", recipe.rating.as_deref());
    for facet in Facet::ALL {
        let values = recipe.facet(facet);
        if !values.is_empty() {
            let key = format!("{}:", facet.as_str());
            push_field(&mut out, &key, Some(&facet_list(values)));
        }
    }
    if let Some((first, rest)) = recipe.notes.split_first() {
        out.push_str("Notes: ");
        out.push_str(first);
        out.push('\n');
        for line in rest {
            out.push_str(line);
            out.push('\n');
        }
    }

    out.push_str(RXF_SOURCE_INFO);
    out.push('\n');
    push_field(&mut out, "Source:", recipe.source.as_deref());
    push_field(&mut out, "Copyright:", recipe.copyright.as_deref());
    out.push_str(RXF_END);
    out.push('\n');
    out
}
