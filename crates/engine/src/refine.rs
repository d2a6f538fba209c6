//! Iterative refinement: carry a running summary across chunks, folding each
//! new chunk into it with a provider call per chunk.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

use booksum_core::error::{AppError, AppResult};
use booksum_llm::client::{
    shared_prompts, ChunkStrategy, GenerationOptions, SummarizationProvider, SummaryOptions,
    TextStream,
};
use booksum_prompt::Language;

use crate::chunker;
use crate::progress::ProgressReporter;
use crate::report;
use crate::types::{Chunk, ChunkResult, RefineMode, SummaryResult};

/// How much of the accumulated output the windowed mode carries into the
/// next refine prompt.
const WINDOW_CONTEXT_CHARS: usize = 1000;

/// Token limits when the whole input fits in one chunk and the refine loop
/// collapses to a single summarize call.
const SINGLE_PASS_MAX_TOKENS: u32 = 2048;
const SINGLE_PASS_MIN_TOKENS: u32 = 50;

pub struct RefineEngine {
    provider: Arc<dyn SummarizationProvider>,
    language: Language,
    focus: Option<String>,
    mode: RefineMode,
    progress: ProgressReporter,
}

impl RefineEngine {
    pub fn new(
        provider: Arc<dyn SummarizationProvider>,
        language: Language,
        focus: Option<String>,
        mode: RefineMode,
        progress: ProgressReporter,
    ) -> Self {
        Self {
            provider,
            language,
            focus: focus.filter(|f| !f.trim().is_empty()),
            mode,
            progress,
        }
    }

    fn split(&self, text: &str) -> Vec<String> {
        let profile = self.provider.chunk_profile();
        match profile.strategy {
            ChunkStrategy::Semantic => chunker::split_semantic(text, profile.max_chunk_size),
            ChunkStrategy::FixedWidth => chunker::split_fixed(text, profile.max_chunk_size),
        }
    }

    async fn pace(&self, chunk_index: usize) {
        if chunk_index == 0 {
            return;
        }
        if let Some(delay) = self.provider.chunk_profile().request_delay {
            debug!(delay_ms = delay.as_millis() as u64, "Pacing before next chunk");
            tokio::time::sleep(delay).await;
        }
    }

    /// Prompt for one refine step. `carry` is the whole summary so far in
    /// full-carry mode and the concatenated parts so far in windowed mode;
    /// windowed prompts see only its trailing window.
    fn step_prompt(&self, carry: &str, chunk: &Chunk) -> AppResult<String> {
        let prompts = shared_prompts()?;
        let focus = self.focus.as_deref();
        if chunk.index == 0 {
            return prompts.seed(self.language, &chunk.text, focus);
        }
        match self.mode {
            RefineMode::FullCarry => prompts.refine(self.language, carry, &chunk.text, focus),
            RefineMode::Windowed => prompts.windowed(
                self.language,
                tail_chars(carry, WINDOW_CONTEXT_CHARS),
                &chunk.text,
                focus,
            ),
        }
    }

    /// Fold one step's output into the context carried to the next step.
    fn advance_carry(&self, carry: &mut String, output: String) {
        match self.mode {
            RefineMode::FullCarry => *carry = output,
            RefineMode::Windowed => {
                if !carry.is_empty() {
                    carry.push_str("\n\n");
                }
                carry.push_str(&output);
            }
        }
    }

    /// Run the refine loop to completion and return the assembled report.
    ///
    /// Any step failure aborts the run; partial chunk summaries are discarded
    /// because later steps would have refined them away anyway.
    pub async fn run(&self, text: &str) -> AppResult<SummaryResult> {
        let pieces = self.split(text);
        if pieces.is_empty() {
            return Ok(SummaryResult::empty());
        }
        let original_chars = text.chars().count();

        if pieces.len() == 1 {
            let body = self.single_pass(text).await?;
            self.progress.emit(1, 1);
            return Ok(SummaryResult {
                summary: report::assemble(
                    self.language,
                    1,
                    original_chars,
                    self.focus.as_deref(),
                    &body,
                ),
                chunks: Vec::new(),
                degraded_chunks: 0,
            });
        }

        let chunks: Vec<Chunk> = pieces
            .into_iter()
            .enumerate()
            .map(|(i, t)| Chunk::new(i, t))
            .collect();
        let total = chunks.len();
        info!(
            provider = self.provider.name(),
            chunks = total,
            mode = ?self.mode,
            "Starting iterative refinement"
        );

        let mut results = Vec::with_capacity(total);
        let mut carry = String::new();
        let mut parts: Vec<String> = Vec::with_capacity(total);

        for chunk in &chunks {
            self.pace(chunk.index).await;
            let prompt = self.step_prompt(&carry, chunk)?;
            let output = self
                .provider
                .complete(&prompt, &GenerationOptions::refine_step())
                .await?;
            results.push(ChunkResult {
                chunk_number: chunk.index + 1,
                text_preview: chunk.preview.clone(),
                summary: output.clone(),
            });
            if self.mode == RefineMode::Windowed {
                parts.push(output.clone());
            }
            self.advance_carry(&mut carry, output);
            self.progress.emit(chunk.index + 1, total);
        }

        let body = match self.mode {
            RefineMode::FullCarry => carry,
            RefineMode::Windowed => join_parts(self.language, &parts),
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
            degraded_chunks: 0,
        })
    }

    /// Streaming variant. Fragments concatenate to the same report `run`
    /// assembles: the header first, then the body as the provider emits it,
    /// then the trailing newline.
    ///
    /// In full-carry mode only the final step is streamed, since every
    /// earlier step is subsumed by it. In windowed mode each part is
    /// streamed under its own heading.
    pub fn run_stream(self, text: String) -> TextStream {
        let (tx, rx) = mpsc::channel::<AppResult<String>>(32);
        tokio::spawn(async move {
            if let Err(err) = self.stream_inner(&text, &tx).await {
                let _ = tx.send(Err(err)).await;
            }
            // tx drops here, closing the stream on every path
        });
        Box::pin(ReceiverStream::new(rx))
    }

    async fn stream_inner(
        &self,
        text: &str,
        tx: &mpsc::Sender<AppResult<String>>,
    ) -> AppResult<()> {
        let pieces = self.split(text);
        if pieces.is_empty() {
            return Ok(());
        }
        let original_chars = text.chars().count();
        let total = pieces.len();

        send(
            tx,
            report::header(self.language, total, original_chars, self.focus.as_deref()),
        )
        .await?;

        if total == 1 {
            self.stream_single_pass(text, tx).await?;
            send(tx, "\n".to_string()).await?;
            return Ok(());
        }

        let chunks: Vec<Chunk> = pieces
            .into_iter()
            .enumerate()
            .map(|(i, t)| Chunk::new(i, t))
            .collect();
        let mut carry = String::new();

        for chunk in &chunks {
            self.pace(chunk.index).await;
            let prompt = self.step_prompt(&carry, chunk)?;
            let is_last = chunk.index + 1 == total;
            let stream_this_step = match self.mode {
                RefineMode::FullCarry => is_last,
                RefineMode::Windowed => true,
            };

            let output = if stream_this_step {
                if self.mode == RefineMode::Windowed {
                    let heading = if chunk.index == 0 {
                        format!("{}\n\n", report::part_header(self.language, 1))
                    } else {
                        format!("\n\n{}\n\n", report::part_header(self.language, chunk.index + 1))
                    };
                    send(tx, heading).await?;
                }
                self.forward_step(&prompt, tx).await?
            } else {
                self.provider
                    .complete(&prompt, &GenerationOptions::refine_step())
                    .await?
            };
            self.advance_carry(&mut carry, output);
            self.progress.emit(chunk.index + 1, total);
        }

        send(tx, "\n".to_string()).await
    }

    /// Drive one provider stream, forwarding fragments while accumulating the
    /// step output needed as context for the next step.
    async fn forward_step(
        &self,
        prompt: &str,
        tx: &mpsc::Sender<AppResult<String>>,
    ) -> AppResult<String> {
        use futures::StreamExt;

        let mut inner = self
            .provider
            .complete_stream(prompt, &GenerationOptions::refine_step())
            .await?;
        let mut accumulated = String::new();
        while let Some(fragment) = inner.next().await {
            let fragment = fragment?;
            accumulated.push_str(&fragment);
            send(tx, fragment).await?;
        }
        Ok(accumulated)
    }

    async fn single_pass(&self, text: &str) -> AppResult<String> {
        let options = SummaryOptions::new(self.language)
            .with_focus(self.focus.clone())
            .with_lengths(SINGLE_PASS_MAX_TOKENS, SINGLE_PASS_MIN_TOKENS);
        self.provider.summarize(text, &options).await
    }

    async fn stream_single_pass(
        &self,
        text: &str,
        tx: &mpsc::Sender<AppResult<String>>,
    ) -> AppResult<()> {
        let prompts = shared_prompts()?;
        let prompt = prompts.summarize(self.language, text, self.focus.as_deref())?;
        let options = GenerationOptions {
            max_tokens: SINGLE_PASS_MAX_TOKENS,
            min_tokens: SINGLE_PASS_MIN_TOKENS,
            ..GenerationOptions::default()
        };
        let mut inner = self.provider.complete_stream(&prompt, &options).await?;
        use futures::StreamExt;
        while let Some(fragment) = inner.next().await {
            send(tx, fragment?).await?;
        }
        self.progress.emit(1, 1);
        Ok(())
    }
}

/// Join windowed parts into the report body, one heading per part.
pub(crate) fn join_parts(language: Language, parts: &[String]) -> String {
    parts
        .iter()
        .enumerate()
        .map(|(i, part)| format!("{}\n\n{}", report::part_header(language, i + 1), part))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Last `max_chars` characters of `text`, on a char boundary.
fn tail_chars(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    match text.char_indices().nth(count - max_chars) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

async fn send(tx: &mpsc::Sender<AppResult<String>>, fragment: String) -> AppResult<()> {
    tx.send(Ok(fragment))
        .await
        .map_err(|_| AppError::Generation("summary consumer went away".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_respects_char_boundaries() {
        let text = "añejo";
        assert_eq!(tail_chars(text, 3), "ejo");
        assert_eq!(tail_chars(text, 10), "añejo");
        assert_eq!(tail_chars("", 5), "");
    }

    #[test]
    fn parts_join_with_headings() {
        let parts = vec!["uno".to_string(), "dos".to_string()];
        let body = join_parts(Language::Es, &parts);
        assert_eq!(body, "## Parte 1\n\nuno\n\n## Parte 2\n\ndos");
    }
}
