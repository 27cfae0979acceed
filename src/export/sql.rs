//! Persistence as SQL `INSERT` statements.
//!
//! Tables: `recipe`, `ingredient`, `direction`, `note` and `category`
//! (one row per facet value). Rows reference their recipe by numeric id.

use async_trait::async_trait;
use log::error;
use std::path::{Path, PathBuf};

use super::{write_output, RecipeSink};
use crate::error::ImportError;
use crate::model::{AuipKind, Facet, Recipe};

const OUTPUT_FILE: &str = "recipes.sql";

/// Accumulates statements for `recipes.sql`
pub struct SqlSink {
    directory: PathBuf,
    max_record_bytes: usize,
    next_id: u64,
    buffer: String,
}

impl SqlSink {
    pub fn new(directory: &Path, max_record_bytes: usize) -> Self {
        SqlSink {
            directory: directory.to_path_buf(),
            max_record_bytes,
            next_id: 1,
            buffer: String::new(),
        }
    }
}

#[async_trait]
impl RecipeSink for SqlSink {
    fn name(&self) -> &str {
        "sql"
    }

    async fn accept(&mut self, recipe: &Recipe) -> Result<(), ImportError> {
        let statements = recipe_statements(recipe, self.next_id, self.max_record_bytes)
            .inspect_err(|e| error!("SQL sink: {}", e))?;
        self.next_id += 1;
        self.buffer.push_str(&statements);
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), ImportError> {
        write_output(&self.directory, OUTPUT_FILE, &self.buffer).await
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn nullable(value: Option<&str>) -> String {
    value.map(quote).unwrap_or_else(|| "NULL".to_string())
}

fn kind_name(kind: AuipKind) -> &'static str {
    match kind {
        AuipKind::Ingredient => "ingredient",
        AuipKind::Heading => "heading",
        AuipKind::Text => "text",
    }
}

/// Statements persisting one recipe under `id`.
///
/// Fails with [`ImportError::RecordTooLarge`] when they exceed `limit` bytes.
pub fn recipe_statements(recipe: &Recipe, id: u64, limit: usize) -> Result<String, ImportError> {
    let mut sql = String::new();

    let scalars = [
        recipe.name.as_deref(),
        recipe.id.as_deref(),
        recipe.author.as_deref(),
        recipe.serves.as_deref(),
        recipe.makes.as_deref(),
        recipe.makes_unit.as_deref(),
        recipe.prep_time.as_deref(),
        recipe.cook_time.as_deref(),
        recipe.wait_time.as_deref(),
        recipe.rest_time.as_deref(),
        recipe.source.as_deref(),
        recipe.copyright.as_deref(),
        recipe.skill_level.as_deref(),
        recipe.rating.as_deref(),
        recipe.description.as_deref(),
    ]
    .map(nullable)
    .join(", ");
    sql.push_str(&format!(
        "INSERT INTO recipe (id, name, external_id, author, serves, makes, makes_unit, \
         prep_time, cook_time, wait_time, rest_time, source, copyright, skill_level, rating, \
         description) VALUES ({}, {});\n",
        id, scalars
    ));

    for (position, entry) in recipe.ingredients.iter().enumerate() {
        sql.push_str(&format!(
            "INSERT INTO ingredient (recipe_id, position, kind, amount, unit, ingredient, \
             preparation) VALUES ({}, {}, {}, {}, {}, {}, {});\n",
            id,
            position,
            quote(kind_name(entry.kind)),
            nullable(entry.amount.as_deref()),
            nullable(entry.unit.as_deref()),
            nullable(entry.ingredient.as_deref()),
            nullable(entry.preparation.as_deref()),
        ));
    }

    for (table, lines) in [("direction", &recipe.directions), ("note", &recipe.notes)] {
        for (position, text) in lines.iter().enumerate() {
            sql.push_str(&format!(
                "INSERT INTO {} (recipe_id, position, text) VALUES ({}, {}, {});\n",
                table,
                id,
                position,
                quote(text)
            ));
        }
    }

    for facet in Facet::ALL {
        for name in recipe.facet(facet) {
            sql.push_str(&format!(
                "INSERT INTO category (recipe_id, facet, name) VALUES ({}, {}, {});\n",
                id,
                quote(facet.as_str()),
                quote(name)
            ));
        }
    }

    if sql.len() > limit {
        return Err(ImportError::RecordTooLarge {
            name: recipe.display_name().to_string(),
            size: sql.len(),
            limit,
        });
    }
    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Auip;

    fn sample() -> Recipe {
        Recipe {
            name: Some("Mom's Stew".to_string()),
            serves: Some("4".to_string()),
            ingredients: vec![Auip::heading("STEW")],
            directions: vec!["Stir.".to_string()],
            diet: vec!["Low Fat".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_statements_escape_quotes() {
        let sql = recipe_statements(&sample(), 7, 32768).unwrap();
        let lines: Vec<&str> = sql.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("INSERT INTO recipe"));
        assert!(lines[0].contains("VALUES (7, 'Mom''s Stew', NULL, NULL, '4',"));
        assert_eq!(
            lines[1],
            "INSERT INTO ingredient (recipe_id, position, kind, amount, unit, ingredient, \
             preparation) VALUES (7, 0, 'heading', NULL, NULL, 'STEW', NULL);"
        );
        assert_eq!(
            lines[2],
            "INSERT INTO direction (recipe_id, position, text) VALUES (7, 0, 'Stir.');"
        );
        assert_eq!(
            lines[3],
            "INSERT INTO category (recipe_id, facet, name) VALUES (7, 'Diet', 'Low Fat');"
        );
    }

    #[test]
    fn test_oversized_record_is_rejected() {
        let err = recipe_statements(&sample(), 1, 64).unwrap_err();
        match err {
            ImportError::RecordTooLarge { name, size, limit } => {
                assert_eq!(name, "Mom's Stew");
                assert!(size > limit);
                assert_eq!(limit, 64);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_sink_numbers_recipes() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = SqlSink::new(dir.path(), 32768);
        sink.accept(&sample()).await.unwrap();
        sink.accept(&sample()).await.unwrap();
        sink.finish().await.unwrap();

        let written = std::fs::read_to_string(dir.path().join(OUTPUT_FILE)).unwrap();
        assert!(written.contains("VALUES (1, 'Mom''s Stew'"));
        assert!(written.contains("VALUES (2, 'Mom''s Stew'"));
    }
}
