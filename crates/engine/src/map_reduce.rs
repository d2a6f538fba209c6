//! Map-reduce summarization: summarize overlapping chunks independently with
//! bounded concurrency, then reduce the per-chunk summaries into one report.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{info, warn};

use booksum_core::error::AppResult;
use booksum_llm::client::{shared_prompts, SummarizationProvider, SummaryOptions};
use booksum_prompt::Language;

use crate::chunker;
use crate::progress::ProgressReporter;
use crate::report;
use crate::types::{Chunk, ChunkResult, SummaryResult};

const CHUNK_SIZE: usize = 1000;
const CHUNK_OVERLAP: usize = 100;

const MAP_MAX_LENGTH: u32 = 150;
const MAP_MIN_LENGTH: u32 = 30;
const REDUCE_MAX_LENGTH: u32 = 500;
const REDUCE_MIN_LENGTH: u32 = 150;

pub struct MapReduceEngine {
    provider: Arc<dyn SummarizationProvider>,
    language: Language,
    focus: Option<String>,
    progress: ProgressReporter,
}

impl MapReduceEngine {
    pub fn new(
        provider: Arc<dyn SummarizationProvider>,
        language: Language,
        focus: Option<String>,
        progress: ProgressReporter,
    ) -> Self {
        Self {
            provider,
            language,
            focus: focus.filter(|f| !f.trim().is_empty()),
            progress,
        }
    }

    /// Map chunks in parallel, then reduce. A failed map chunk degrades to an
    /// empty contribution instead of aborting; only the reduce call is fatal.
    pub async fn run(&self, text: &str) -> AppResult<SummaryResult> {
        let pieces = chunker::split_with_overlap(text, CHUNK_SIZE, CHUNK_OVERLAP);
        if pieces.is_empty() {
            return Ok(SummaryResult::empty());
        }
        let original_chars = text.chars().count();
        let chunks: Vec<Chunk> = pieces
            .into_iter()
            .enumerate()
            .map(|(i, t)| Chunk::new(i, t))
            .collect();
        let total = chunks.len();
        let workers = self.provider.chunk_profile().map_workers.max(1);
        info!(
            provider = self.provider.name(),
            chunks = total,
            workers,
            "Running map-reduce summarization"
        );

        let map_options = SummaryOptions::new(self.language).with_lengths(MAP_MAX_LENGTH, MAP_MIN_LENGTH);
        let map_futures: Vec<_> = chunks
            .iter()
            .map(|chunk| {
                let provider = Arc::clone(&self.provider);
                let options = map_options.clone();
                let chunk_text = chunk.text.clone();
                let index = chunk.index;
                async move {
                    match provider.summarize(&chunk_text, &options).await {
                        Ok(summary) => (summary, false),
                        Err(err) => {
                            warn!(
                                chunk = index + 1,
                                error = %err,
                                "Map chunk failed; contributing empty summary"
                            );
                            (String::new(), true)
                        }
                    }
                }
            })
            .collect();

        // buffered() preserves input order, so summaries line up with chunks
        let mut mapped = futures::stream::iter(map_futures).buffered(workers);
        let mut summaries: Vec<String> = Vec::with_capacity(total);
        let mut degraded_chunks = 0usize;
        while let Some((summary, failed)) = mapped.next().await {
            if failed {
                degraded_chunks += 1;
            }
            summaries.push(summary);
            self.progress.emit(summaries.len(), total);
        }
        drop(mapped);

        let body = if total == 1 {
            summaries.remove(0)
        } else {
            let combined = summaries.join("\n");
            let reduce_prompt = shared_prompts()?.reduce(self.language, &combined)?;
            let reduce_options = SummaryOptions::new(self.language)
                .with_focus(self.focus.clone())
                .with_lengths(REDUCE_MAX_LENGTH, REDUCE_MIN_LENGTH);
            self.provider.summarize(&reduce_prompt, &reduce_options).await?
        };

        let results = if total == 1 {
            Vec::new()
        } else {
            chunks
                .iter()
                .zip(&summaries)
                .map(|(chunk, summary)| ChunkResult {
                    chunk_number: chunk.index + 1,
                    text_preview: chunk.preview.clone(),
                    summary: summary.clone(),
                })
                .collect()
        };

        Ok(SummaryResult {
            summary: report::assemble(
                self.language,
                total,
                original_chars,
                self.focus.as_deref(),
                &body,
            ),
            chunks: results,
            degraded_chunks,
        })
    }
}
