//! Refine fallback for providers that only expose the baseline `summarize`
//! capability. The loop is the same shape as iterative refinement, but every
//! step goes through `summarize` with a generic seed/refine wrapper prompt.

use std::sync::Arc;

use tracing::info;

use booksum_core::error::AppResult;
use booksum_llm::client::{shared_prompts, SummarizationProvider, SummaryOptions};
use booksum_prompt::Language;

use crate::chunker;
use crate::progress::ProgressReporter;
use crate::report;
use crate::types::{Chunk, ChunkResult, SummaryResult};

const CHUNK_SIZE: usize = 4000;
const CHUNK_OVERLAP: usize = 200;

const SEED_MAX_LENGTH: u32 = 400;
const SEED_MIN_LENGTH: u32 = 100;
const REFINE_MAX_LENGTH: u32 = 500;
const REFINE_MIN_LENGTH: u32 = 200;

pub struct GenericRefineEngine {
    provider: Arc<dyn SummarizationProvider>,
    language: Language,
    focus: Option<String>,
    progress: ProgressReporter,
}

impl GenericRefineEngine {
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
        info!(
            provider = self.provider.name(),
            chunks = total,
            "Running generic refine fallback"
        );

        let prompts = shared_prompts()?;
        let mut results = Vec::with_capacity(total);
        let mut running = String::new();

        for chunk in &chunks {
            let (wrapped, options) = if chunk.index == 0 {
                (
                    prompts.generic_seed(self.language, &chunk.text)?,
                    SummaryOptions::new(self.language)
                        .with_focus(self.focus.clone())
                        .with_lengths(SEED_MAX_LENGTH, SEED_MIN_LENGTH),
                )
            } else {
                (
                    prompts.generic_refine(self.language, &running, &chunk.text)?,
                    SummaryOptions::new(self.language)
                        .with_focus(self.focus.clone())
                        .with_lengths(REFINE_MAX_LENGTH, REFINE_MIN_LENGTH),
                )
            };
            running = self.provider.summarize(&wrapped, &options).await?;
            results.push(ChunkResult {
                chunk_number: chunk.index + 1,
                text_preview: chunk.preview.clone(),
                summary: running.clone(),
            });
            self.progress.emit(chunk.index + 1, total);
        }

        if total == 1 {
            results.clear();
        }
        Ok(SummaryResult {
            summary: report::assemble(
                self.language,
                total,
                original_chars,
                self.focus.as_deref(),
                &running,
            ),
            chunks: results,
            degraded_chunks: 0,
        })
    }
}
