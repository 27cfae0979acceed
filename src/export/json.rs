use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{write_output, RecipeSink};
use crate::error::ImportError;
use crate::model::Recipe;

const OUTPUT_FILE: &str = "recipes.jsonl";

/// One JSON document per line in `recipes.jsonl`
pub struct JsonSink {
    directory: PathBuf,
    buffer: String,
}

impl JsonSink {
    pub fn new(directory: &Path) -> Self {
        JsonSink {
            directory: directory.to_path_buf(),
            buffer: String::new(),
        }
    }
}

#[async_trait]
impl RecipeSink for JsonSink {
    fn name(&self) -> &str {
        "json"
    }

    async fn accept(&mut self, recipe: &Recipe) -> Result<(), ImportError> {
        self.buffer.push_str(&serde_json::to_string(recipe)?);
        self.buffer.push('\n');
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), ImportError> {
        write_output(&self.directory, OUTPUT_FILE, &self.buffer).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writes_one_document_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonSink::new(dir.path());

        for name in ["Toast", "Tea"] {
            let recipe = Recipe {
                name: Some(name.to_string()),
                ..Default::default()
            };
            sink.accept(&recipe).await.unwrap();
        }
        sink.finish().await.unwrap();

        let written = std::fs::read_to_string(dir.path().join(OUTPUT_FILE)).unwrap();
        let names: Vec<String> = written
            .lines()
            .map(|line| serde_json::from_str::<Recipe>(line).unwrap())
            .filter_map(|recipe| recipe.name)
            .collect();
        assert_eq!(names, vec!["Toast", "Tea"]);
    }
}
