//! Long-document summarization engines.
//!
//! [`summarize_long_text`] is the entry point: it splits the input per the
//! provider's chunk profile and drives one of two strategies, iterative
//! refinement or map-reduce. Providers without the iterative-refine
//! capability are routed through a generic fallback that only needs the
//! baseline `summarize` call.

pub mod chunker;
pub mod generic;
pub mod map_reduce;
pub mod progress;
pub mod refine;
pub mod report;
pub mod types;

use std::sync::Arc;

use tracing::info;

use booksum_core::error::AppResult;
use booksum_llm::client::{SummarizationProvider, TextStream};
use booksum_prompt::Language;

use crate::generic::GenericRefineEngine;
use crate::map_reduce::MapReduceEngine;
use crate::progress::{ProgressObserver, ProgressReporter};
use crate::refine::RefineEngine;
pub use crate::types::{ChunkResult, RefineMode, Strategy, SummaryResult};

/// Everything a summarization run needs besides the provider and the text.
#[derive(Clone, Default)]
pub struct SummarizeRequest {
    pub language: Language,
    pub strategy: Strategy,
    pub refine_mode: RefineMode,
    pub focus_instruction: Option<String>,
    pub progress: Option<ProgressObserver>,
}

impl SummarizeRequest {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            ..Default::default()
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_refine_mode(mut self, mode: RefineMode) -> Self {
        self.refine_mode = mode;
        self
    }

    pub fn with_focus(mut self, focus: Option<String>) -> Self {
        self.focus_instruction = focus;
        self
    }

    pub fn with_progress(mut self, observer: ProgressObserver) -> Self {
        self.progress = Some(observer);
        self
    }
}

/// Summarize `text` to completion with the requested strategy.
///
/// Empty or whitespace-only input short-circuits to an empty result without
/// touching the provider.
pub async fn summarize_long_text(
    provider: Arc<dyn SummarizationProvider>,
    text: &str,
    request: &SummarizeRequest,
) -> AppResult<SummaryResult> {
    if text.trim().is_empty() {
        return Ok(SummaryResult::empty());
    }
    let progress = ProgressReporter::from_option(request.progress.clone());
    match request.strategy {
        Strategy::Refine => {
            if provider.supports_iterative_refine() {
                RefineEngine::new(
                    provider,
                    request.language,
                    request.focus_instruction.clone(),
                    request.refine_mode,
                    progress,
                )
                .run(text)
                .await
            } else {
                info!(
                    provider = provider.name(),
                    "Provider lacks iterative refinement, using generic fallback"
                );
                GenericRefineEngine::new(
                    provider,
                    request.language,
                    request.focus_instruction.clone(),
                    progress,
                )
                .run(text)
                .await
            }
        }
        Strategy::MapReduce => {
            MapReduceEngine::new(
                provider,
                request.language,
                request.focus_instruction.clone(),
                progress,
            )
            .run(text)
            .await
        }
    }
}

/// Streaming variant of [`summarize_long_text`].
///
/// With an iterative-refine provider the report is streamed as it is
/// generated; the concatenated fragments equal the summary the blocking call
/// would return. Other paths run to completion and yield the whole report as
/// one fragment.
pub async fn summarize_long_text_stream(
    provider: Arc<dyn SummarizationProvider>,
    text: String,
    request: &SummarizeRequest,
) -> AppResult<TextStream> {
    if text.trim().is_empty() {
        return Ok(Box::pin(futures::stream::empty()));
    }
    let progress = ProgressReporter::from_option(request.progress.clone());
    if request.strategy == Strategy::Refine && provider.supports_iterative_refine() {
        let engine = RefineEngine::new(
            provider,
            request.language,
            request.focus_instruction.clone(),
            request.refine_mode,
            progress,
        );
        return Ok(engine.run_stream(text));
    }
    let result = summarize_long_text(provider, &text, request).await?;
    Ok(Box::pin(futures::stream::once(async move {
        Ok(result.summary)
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::time::Duration;

    use futures::StreamExt;

    use booksum_core::error::AppError;
    use booksum_llm::client::{ChunkProfile, ChunkStrategy};
    use booksum_llm::providers::MockProvider;

    fn paragraph(ch: char, len: usize) -> String {
        std::iter::repeat(ch).take(len).collect()
    }

    /// Three ~1900-char paragraphs. Under a 4000-char semantic limit the
    /// first two pack into one chunk and the third starts a second.
    fn three_paragraphs() -> String {
        format!(
            "{}\n\n{}\n\n{}",
            paragraph('a', 1900),
            paragraph('b', 1900),
            paragraph('c', 1900)
        )
    }

    fn iterative_mock() -> Arc<MockProvider> {
        Arc::new(MockProvider::echo().with_iterative(true))
    }

    async fn collect(mut stream: TextStream) -> AppResult<String> {
        let mut out = String::new();
        while let Some(fragment) = stream.next().await {
            out.push_str(&fragment?);
        }
        Ok(out)
    }

    #[tokio::test]
    async fn empty_input_short_circuits() {
        let provider = iterative_mock();
        let request = SummarizeRequest::default();
        let result = summarize_long_text(provider.clone(), "   \n\t ", &request)
            .await
            .unwrap();
        assert_eq!(result.summary, "");
        assert!(result.chunks.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn single_chunk_uses_one_provider_call() {
        let provider = iterative_mock();
        let request = SummarizeRequest::default();
        let result = summarize_long_text(provider.clone(), "short text", &request)
            .await
            .unwrap();
        assert_eq!(provider.call_count(), 1);
        assert!(result.chunks.is_empty());
        assert!(result.summary.contains("SUMMARY("));
    }

    #[tokio::test]
    async fn map_reduce_single_chunk_skips_reduce() {
        let provider = Arc::new(MockProvider::echo());
        let request = SummarizeRequest::default().with_strategy(Strategy::MapReduce);
        let result = summarize_long_text(provider.clone(), "short text", &request)
            .await
            .unwrap();
        // one map call, no reduce
        assert_eq!(provider.call_count(), 1);
        assert!(result.chunks.is_empty());
        assert!(result.summary.contains("SUMMARY("));
    }

    #[tokio::test]
    async fn generic_fallback_single_chunk_uses_one_call() {
        let provider = Arc::new(MockProvider::echo());
        assert!(!provider.supports_iterative_refine());
        let request = SummarizeRequest::default();
        let result = summarize_long_text(provider.clone(), "short text", &request)
            .await
            .unwrap();
        assert_eq!(provider.call_count(), 1);
        assert!(result.chunks.is_empty());
        assert!(result.summary.contains("SUMMARY("));
    }

    #[tokio::test]
    async fn refine_emits_one_chunk_result_per_chunk() {
        let provider = iterative_mock();
        let request = SummarizeRequest::default();
        let text = three_paragraphs();
        let result = summarize_long_text(provider.clone(), &text, &request)
            .await
            .unwrap();
        assert_eq!(result.chunks.len(), 2);
        assert_eq!(provider.call_count(), 2);
        for (i, chunk) in result.chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_number, i + 1);
            assert!(chunk.text_preview.chars().count() <= 203);
            assert!(!chunk.summary.is_empty());
        }
        // Full-carry body is the last step's output
        assert!(result.summary.contains(&result.chunks[1].summary));
        assert!(result.summary.contains("# Reporte de Resumen"));
    }

    #[tokio::test]
    async fn refine_seed_prompt_differs_from_refine_prompt() {
        let provider = iterative_mock();
        let request = SummarizeRequest::default();
        let text = three_paragraphs();
        summarize_long_text(provider.clone(), &text, &request)
            .await
            .unwrap();
        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        assert_ne!(calls[0], calls[1]);
        // The second prompt carries the first step's output as context
        assert!(calls[1].contains("SUMMARY("));
    }

    #[tokio::test]
    async fn progress_reaches_total_monotonically() {
        let seen: Arc<Mutex<Vec<(usize, usize)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer: ProgressObserver = Arc::new(move |done, total| {
            sink.lock().unwrap().push((done, total));
        });
        let provider = iterative_mock();
        let request = SummarizeRequest::default().with_progress(observer);
        let text = three_paragraphs();
        summarize_long_text(provider, &text, &request).await.unwrap();

        let events = seen.lock().unwrap();
        assert!(!events.is_empty());
        let total = events[0].1;
        for window in events.windows(2) {
            assert!(window[1].0 > window[0].0, "completed count must increase");
        }
        assert_eq!(events.last().unwrap(), &(total, total));
    }

    #[tokio::test]
    async fn streaming_concatenates_to_blocking_summary() {
        let text = three_paragraphs();
        let request = SummarizeRequest::default();

        let blocking = summarize_long_text(iterative_mock(), &text, &request)
            .await
            .unwrap();
        let stream = summarize_long_text_stream(iterative_mock(), text, &request)
            .await
            .unwrap();
        let streamed = collect(stream).await.unwrap();
        assert_eq!(streamed, blocking.summary);
    }

    #[tokio::test]
    async fn windowed_streaming_matches_blocking_too() {
        let text = three_paragraphs();
        let request = SummarizeRequest::default().with_refine_mode(RefineMode::Windowed);

        let blocking = summarize_long_text(iterative_mock(), &text, &request)
            .await
            .unwrap();
        assert!(blocking.summary.contains("## Parte 1"));
        assert!(blocking.summary.contains("## Parte 2"));

        let stream = summarize_long_text_stream(iterative_mock(), text, &request)
            .await
            .unwrap();
        let streamed = collect(stream).await.unwrap();
        assert_eq!(streamed, blocking.summary);
    }

    #[tokio::test]
    async fn windowed_context_spans_earlier_parts() {
        // Five ~1900-char paragraphs pack into three 4000-char chunks; the
        // parts are short, so the 1000-char context window reaches back past
        // the immediately preceding part.
        let text = format!(
            "{}\n\n{}\n\n{}\n\n{}\n\n{}",
            paragraph('a', 1900),
            paragraph('b', 1900),
            paragraph('c', 1900),
            paragraph('d', 1900),
            paragraph('e', 1900)
        );
        let provider = Arc::new(
            MockProvider::new(|call, _prompt| Ok(format!("part{}", call))).with_iterative(true),
        );
        let request = SummarizeRequest::default().with_refine_mode(RefineMode::Windowed);
        summarize_long_text(provider.clone(), &text, &request)
            .await
            .unwrap();

        let calls = provider.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[2].contains("part1"));
        assert!(calls[2].contains("part0"), "window must cover older parts");
    }

    #[tokio::test]
    async fn refine_failure_aborts_without_partial_result() {
        let provider = Arc::new(
            MockProvider::new(|call, _prompt| {
                if call == 0 {
                    Ok("first step".to_string())
                } else {
                    Err(AppError::Generation("backend fell over".into()))
                }
            })
            .with_iterative(true),
        );
        let request = SummarizeRequest::default();
        let text = three_paragraphs();
        let err = summarize_long_text(provider, &text, &request)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Generation(_)));
    }

    #[tokio::test]
    async fn non_iterative_provider_takes_generic_fallback() {
        let provider = Arc::new(MockProvider::echo());
        assert!(!provider.supports_iterative_refine());
        let request = SummarizeRequest::default();
        let text = three_paragraphs();
        let result = summarize_long_text(provider.clone(), &text, &request)
            .await
            .unwrap();
        // 6000+ chars at 4000-char chunks with 200 overlap -> 2 chunks
        assert_eq!(result.chunks.len(), 2);
        assert_eq!(provider.call_count(), 2);
        assert!(!result.summary.is_empty());
    }

    #[tokio::test]
    async fn map_reduce_summarizes_every_chunk_then_reduces() {
        let provider = Arc::new(MockProvider::echo().with_profile(ChunkProfile {
            max_chunk_size: 1000,
            strategy: ChunkStrategy::Semantic,
            map_workers: 3,
            request_delay: None,
        }));
        let request = SummarizeRequest::default().with_strategy(Strategy::MapReduce);
        let text = three_paragraphs();
        let result = summarize_long_text(provider.clone(), &text, &request)
            .await
            .unwrap();
        // ~6 map chunks plus one reduce call
        assert_eq!(provider.call_count(), result.chunks.len() + 1);
        assert!(result.chunks.len() >= 2);
        assert_eq!(result.degraded_chunks, 0);
        assert!(result.summary.contains("# Reporte de Resumen"));
    }

    #[tokio::test]
    async fn map_reduce_degrades_failed_chunks_instead_of_aborting() {
        // Map prompts come first (one per chunk, ordered), reduce last.
        let provider = Arc::new(MockProvider::new(|call, prompt| {
            if call == 2 {
                Err(AppError::Generation("chunk backend timeout".into()))
            } else {
                Ok(format!("S{}({})", call, prompt.chars().count()))
            }
        }));
        let request = SummarizeRequest::default().with_strategy(Strategy::MapReduce);
        let text = three_paragraphs();
        let result = summarize_long_text(provider, &text, &request)
            .await
            .unwrap();
        assert_eq!(result.degraded_chunks, 1);
        assert!(result.chunks.len() >= 5);
        assert_eq!(result.chunks[2].summary, "");
        assert!(!result.summary.is_empty());
    }

    #[tokio::test]
    async fn report_header_reflects_language_and_focus() {
        let provider = iterative_mock();
        let request = SummarizeRequest::new(Language::En)
            .with_focus(Some("battles only".to_string()));
        let text = three_paragraphs();
        let result = summarize_long_text(provider, &text, &request)
            .await
            .unwrap();
        assert!(result.summary.starts_with("# Summary Report"));
        assert!(result.summary.contains("- **Focus:** battles only"));
        assert!(result.summary.contains("## Comprehensive Summary"));
    }

    #[tokio::test]
    async fn request_delay_paces_between_chunks() {
        let provider = Arc::new(MockProvider::echo().with_iterative(true).with_profile(
            ChunkProfile {
                max_chunk_size: 4000,
                strategy: ChunkStrategy::Semantic,
                map_workers: 1,
                request_delay: Some(Duration::from_millis(20)),
            },
        ));
        let request = SummarizeRequest::default();
        let text = three_paragraphs();
        let started = std::time::Instant::now();
        summarize_long_text(provider, &text, &request).await.unwrap();
        // one inter-chunk delay for two chunks
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
