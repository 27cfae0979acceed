//! Concurrent import pipeline.
//!
//! Files are read and cut into recipe control blocks (`Rcb`), the blocks are
//! queued on a shared channel, and a pool of worker tasks decodes them. Each
//! worker holds the block's line queue lock for the whole decode. Finished
//! blocks come back to the caller's task, which hands them to the sinks in
//! input order.

use log::{debug, info, warn};
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use crate::config::ImportConfig;
use crate::decoders::{all_decoders, decoder_for, DecodeContext, Decoder, Format};
use crate::error::ImportError;
use crate::export::RecipeSink;
use crate::model::Recipe;
use crate::sniff::split_recipes;
use crate::translate::{CategoryLookup, TranslationTable};

/// Recipe control block: one recipe's lines on their way through the pipeline
#[derive(Debug)]
pub struct Rcb {
    /// Position in the input, used to restore ordering
    pub id: usize,
    /// Name of the file the lines came from
    pub source: String,
    pub format: Format,
    pub lines: Arc<Mutex<VecDeque<String>>>,
    /// Set once a worker has decoded the block
    pub recipe: Option<Recipe>,
}

impl Rcb {
    pub fn new(id: usize, source: impl Into<String>, format: Format, lines: VecDeque<String>) -> Self {
        Rcb {
            id,
            source: source.into(),
            format,
            lines: Arc::new(Mutex::new(lines)),
            recipe: None,
        }
    }
}

pub struct Pipeline {
    workers: usize,
    lookup: Arc<dyn CategoryLookup>,
    keep_unknown_categories: bool,
    decoders: Vec<Box<dyn Decoder>>,
    sinks: Vec<Box<dyn RecipeSink>>,
}

impl Pipeline {
    pub fn new(lookup: Arc<dyn CategoryLookup>) -> Self {
        Pipeline {
            workers: 1,
            lookup,
            keep_unknown_categories: true,
            decoders: all_decoders(),
            sinks: Vec::new(),
        }
    }

    /// Pipeline with the configured worker count and translation table, no sinks
    pub fn from_config(config: &ImportConfig) -> Result<Self, ImportError> {
        let table = match &config.translations {
            Some(path) => TranslationTable::from_path(path)?,
            None => TranslationTable::builtin()?,
        };
        debug!("Translation table holds {} entries", table.len());
        Ok(Self::new(Arc::new(table))
            .with_workers(config.workers)
            .keep_unknown_categories(config.keep_unknown_categories))
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn keep_unknown_categories(mut self, keep: bool) -> Self {
        self.keep_unknown_categories = keep;
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn RecipeSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Cut one text into blocks numbered from `first_id`
    pub fn classify_text(&self, source: &str, text: &str, first_id: usize) -> Result<Vec<Rcb>, ImportError> {
        let blocks = split_recipes(text, &self.decoders, source)?;
        Ok(blocks
            .into_iter()
            .enumerate()
            .map(|(offset, block)| Rcb::new(first_id + offset, source, block.format, block.lines))
            .collect())
    }

    /// Read one file and cut it into blocks numbered from `first_id`
    pub async fn classify_file(&self, path: &Path, first_id: usize) -> Result<Vec<Rcb>, ImportError> {
        let bytes = tokio::fs::read(path).await?;
        // Old exports are often Latin-1; keep what decodes
        let text = String::from_utf8_lossy(&bytes);
        self.classify_text(&path.display().to_string(), &text, first_id)
    }

    /// Import every file, skipping files with no recognizable recipe.
    pub async fn run_files(&mut self, paths: &[PathBuf]) -> Result<Vec<Rcb>, ImportError> {
        let mut rcbs = Vec::new();
        for path in paths {
            match self.classify_file(path, rcbs.len()).await {
                Ok(blocks) => rcbs.extend(blocks),
                Err(ImportError::UnknownFormat(source)) => {
                    warn!("Skipping {}: no recognizable recipe format", source);
                }
                Err(e) => return Err(e),
            }
        }
        self.run(rcbs).await
    }

    /// Decode the blocks on the worker pool and feed the sinks in input order.
    pub async fn run(&mut self, rcbs: Vec<Rcb>) -> Result<Vec<Rcb>, ImportError> {
        let total = rcbs.len();
        let (work_tx, work_rx) = mpsc::unbounded_channel::<Rcb>();
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Rcb>();
        let work_rx = Arc::new(Mutex::new(work_rx));

        let first_id = rcbs.iter().map(|rcb| rcb.id).min().unwrap_or(0);
        for rcb in rcbs {
            work_tx
                .send(rcb)
                .map_err(|e| ImportError::PipelineError(format!("work queue closed: {}", e)))?;
        }
        drop(work_tx);

        let mut handles = Vec::with_capacity(self.workers);
        for worker in 0..self.workers.min(total.max(1)) {
            handles.push(tokio::spawn(decode_worker(
                worker,
                Arc::clone(&work_rx),
                done_tx.clone(),
                Arc::clone(&self.lookup),
                self.keep_unknown_categories,
            )));
        }
        drop(done_tx);

        // Reorder finished blocks and forward them as soon as they are next in line
        let mut pending = BTreeMap::new();
        let mut finished = Vec::with_capacity(total);
        let mut next_id = first_id;
        while let Some(rcb) = done_rx.recv().await {
            pending.insert(rcb.id, rcb);
            while let Some(rcb) = pending.remove(&next_id) {
                self.forward(&rcb).await?;
                finished.push(rcb);
                next_id += 1;
            }
        }
        // Ids need not be contiguous when callers build their own blocks
        for (_, rcb) in std::mem::take(&mut pending) {
            self.forward(&rcb).await?;
            finished.push(rcb);
        }

        for handle in handles {
            handle
                .await
                .map_err(|e| ImportError::PipelineError(format!("decode worker failed: {}", e)))?;
        }
        if finished.len() != total {
            return Err(ImportError::PipelineError(format!(
                "{} of {} recipes were not decoded",
                total - finished.len(),
                total
            )));
        }

        for sink in self.sinks.iter_mut() {
            sink.finish().await?;
        }
        Ok(finished)
    }

    async fn forward(&mut self, rcb: &Rcb) -> Result<(), ImportError> {
        let Some(recipe) = rcb.recipe.as_ref() else {
            return Ok(());
        };
        info!(
            "{} [{}] {}: {} ingredient(s), {} direction line(s)",
            rcb.source,
            rcb.format,
            recipe.display_name(),
            recipe.ingredients.len(),
            recipe.directions.len()
        );
        for sink in self.sinks.iter_mut() {
            sink.accept(recipe).await?;
        }
        Ok(())
    }
}

async fn decode_worker(
    worker: usize,
    work_rx: Arc<Mutex<mpsc::UnboundedReceiver<Rcb>>>,
    done_tx: mpsc::UnboundedSender<Rcb>,
    lookup: Arc<dyn CategoryLookup>,
    keep_unknown_categories: bool,
) {
    loop {
        // Release the queue before decoding so other workers can pull
        let next = work_rx.lock().await.recv().await;
        let Some(mut rcb) = next else {
            break;
        };

        let ctx = DecodeContext::new(lookup.as_ref()).keep_unknown_categories(keep_unknown_categories);
        let decoder = decoder_for(rcb.format);
        let recipe = {
            let mut lines = rcb.lines.lock().await;
            let recipe = decoder.decode(&mut lines, &ctx);
            if !lines.is_empty() {
                debug!("worker {}: {} line(s) left after recipe {}", worker, lines.len(), rcb.id);
            }
            recipe
        };
        rcb.recipe = Some(recipe);

        if done_tx.send(rcb).is_err() {
            debug!("worker {}: result channel closed, stopping", worker);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoders::{RXF_END, RXF_START};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    struct CollectSink {
        names: Arc<StdMutex<Vec<String>>>,
        finished: Arc<StdMutex<bool>>,
    }

    #[async_trait]
    impl RecipeSink for CollectSink {
        fn name(&self) -> &str {
            "collect"
        }

        async fn accept(&mut self, recipe: &Recipe) -> Result<(), ImportError> {
            self.names.lock().unwrap().push(recipe.display_name().to_string());
            Ok(())
        }

        async fn finish(&mut self) -> Result<(), ImportError> {
            *self.finished.lock().unwrap() = true;
            Ok(())
        }
    }

    fn rxf_text(names: &[&str]) -> String {
        names
            .iter()
            .map(|name| format!("{}\n{}\n\n1 | | egg |\n\nCook.\n{}\n", RXF_START, name, RXF_END))
            .collect()
    }

    #[tokio::test]
    async fn test_results_come_back_in_input_order() {
        let names = ["Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot"];
        let collected = Arc::new(StdMutex::new(Vec::new()));
        let finished = Arc::new(StdMutex::new(false));
        let mut pipeline = Pipeline::new(Arc::new(TranslationTable::builtin().unwrap()))
            .with_workers(3)
            .with_sink(Box::new(CollectSink {
                names: Arc::clone(&collected),
                finished: Arc::clone(&finished),
            }));

        let rcbs = pipeline.classify_text("batch.rxf", &rxf_text(&names), 0).unwrap();
        let done = pipeline.run(rcbs).await.unwrap();

        let decoded: Vec<&str> = done
            .iter()
            .map(|rcb| rcb.recipe.as_ref().unwrap().display_name())
            .collect();
        assert_eq!(decoded, names);
        assert_eq!(*collected.lock().unwrap(), names);
        assert!(*finished.lock().unwrap());
        assert!(done.iter().all(|rcb| rcb.source == "batch.rxf"));
    }

    #[tokio::test]
    async fn test_empty_run_finishes_sinks() {
        let finished = Arc::new(StdMutex::new(false));
        let mut pipeline = Pipeline::new(Arc::new(TranslationTable::default())).with_sink(
            Box::new(CollectSink {
                names: Arc::new(StdMutex::new(Vec::new())),
                finished: Arc::clone(&finished),
            }),
        );
        let done = pipeline.run(Vec::new()).await.unwrap();
        assert!(done.is_empty());
        assert!(*finished.lock().unwrap());
    }

    #[test]
    fn test_worker_count_is_at_least_one() {
        let pipeline = Pipeline::new(Arc::new(TranslationTable::default())).with_workers(0);
        assert_eq!(pipeline.workers, 1);
    }
}
