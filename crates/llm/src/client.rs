//! Provider abstraction and request/response types.
//!
//! This module defines the capability contract every summarization backend
//! implements, plus the shared option structs and output-cleanup helpers.

use std::pin::Pin;
use std::sync::OnceLock;
use std::time::Duration;

use futures::Stream;
use serde::{Deserialize, Serialize};

use booksum_core::AppResult;
use booksum_prompt::{Language, PromptBuilder};

/// Lazy stream of generated text fragments.
///
/// Single consumption, in order; concatenating every `Ok` fragment yields
/// the same string the non-streaming call would have returned. The stream
/// always terminates, on failure paths included.
pub type TextStream = Pin<Box<dyn Stream<Item = AppResult<String>> + Send>>;

/// Raw generation parameters for a single model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Minimum tokens to generate (ignored by backends without support)
    pub min_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Top-p nucleus sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Repetition penalty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f32>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 500,
            min_tokens: 50,
            temperature: 0.6,
            top_p: None,
            repeat_penalty: None,
        }
    }
}

impl GenerationOptions {
    /// Options for a refine step: long, detailed, repetition-averse output.
    pub fn refine_step() -> Self {
        Self {
            max_tokens: 2048,
            min_tokens: 200,
            temperature: 0.6,
            top_p: Some(0.9),
            repeat_penalty: Some(1.2),
        }
    }

    /// Options for a short independent chunk summary (map phase).
    pub fn map_step() -> Self {
        Self {
            max_tokens: 150,
            min_tokens: 30,
            temperature: 0.6,
            top_p: None,
            repeat_penalty: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_min_tokens(mut self, min_tokens: u32) -> Self {
        self.min_tokens = min_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Options for the baseline `summarize` capability.
#[derive(Debug, Clone, Default)]
pub struct SummaryOptions {
    /// Output language (selects prompt wording)
    pub language: Language,

    /// Optional steering directive appended to the prompt
    pub focus_instruction: Option<String>,

    /// Maximum output tokens
    pub max_length: Option<u32>,

    /// Minimum output tokens
    pub min_length: Option<u32>,
}

impl SummaryOptions {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            ..Default::default()
        }
    }

    pub fn with_focus(mut self, focus: Option<String>) -> Self {
        // Whitespace-only directives are treated as absent
        self.focus_instruction = focus.filter(|f| !f.trim().is_empty());
        self
    }

    pub fn with_lengths(mut self, max_length: u32, min_length: u32) -> Self {
        self.max_length = Some(max_length);
        self.min_length = Some(min_length);
        self
    }

    fn generation_options(&self) -> GenerationOptions {
        let mut options = GenerationOptions::default();
        if let Some(max) = self.max_length {
            options.max_tokens = max;
        }
        if let Some(min) = self.min_length {
            options.min_tokens = min;
        }
        options
    }
}

/// How a provider wants long input split before being prompted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStrategy {
    /// Paragraph/sentence aware greedy packing
    Semantic,

    /// Fixed-width cut at char boundaries; for backends with enormous
    /// context where cost scales with request count, not coherence
    FixedWidth,
}

/// Per-provider chunking and concurrency profile.
#[derive(Debug, Clone)]
pub struct ChunkProfile {
    /// Largest chunk the provider's context comfortably holds, in chars
    pub max_chunk_size: usize,

    /// Splitting strategy for the iterative refine path
    pub strategy: ChunkStrategy,

    /// Worker pool size for the map phase. Must be 1 for providers backed
    /// by a shared local model; concurrent calls against it are not safe.
    pub map_workers: usize,

    /// Sleep between chunk requests (applied between chunks, never before
    /// the first) to respect external quotas
    pub request_delay: Option<Duration>,
}

impl Default for ChunkProfile {
    fn default() -> Self {
        Self {
            max_chunk_size: 4000,
            strategy: ChunkStrategy::Semantic,
            map_workers: 1,
            request_delay: None,
        }
    }
}

/// Shared prompt registry, built on first use.
pub fn shared_prompts() -> AppResult<&'static PromptBuilder> {
    static PROMPTS: OnceLock<PromptBuilder> = OnceLock::new();
    if let Some(prompts) = PROMPTS.get() {
        return Ok(prompts);
    }
    let built = PromptBuilder::new()?;
    Ok(PROMPTS.get_or_init(|| built))
}

/// Trait for summarization providers.
///
/// This trait abstracts the underlying generative backend (local model or
/// hosted API) behind a unified capability set. Optional capabilities are
/// expressed as explicit flags and overridable defaults, never probed at
/// runtime.
#[async_trait::async_trait]
pub trait SummarizationProvider: Send + Sync {
    /// Provider name (e.g., "instruct", "gemini").
    fn name(&self) -> &str;

    /// Chunking and concurrency profile for the engines.
    fn chunk_profile(&self) -> ChunkProfile {
        ChunkProfile::default()
    }

    /// Whether this provider supports the iterative refine prompt contract.
    ///
    /// When false, refine-strategy callers must dispatch to the generic
    /// fallback at the call site.
    fn supports_iterative_refine(&self) -> bool {
        false
    }

    /// Execute a raw prompt and return the generated text.
    ///
    /// Implementations must strip any echo of the prompt from the output.
    async fn complete(&self, prompt: &str, options: &GenerationOptions) -> AppResult<String>;

    /// Execute a raw prompt, streaming the generated text as fragments.
    ///
    /// The default wraps `complete` in a one-fragment stream; streaming
    /// backends override this with their native incremental protocol.
    async fn complete_stream(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> AppResult<TextStream> {
        let text = self.complete(prompt, options).await?;
        Ok(Box::pin(futures::stream::once(async move { Ok(text) })))
    }

    /// Summarize a text in one call.
    ///
    /// Builds the language-appropriate instruction (with the optional focus
    /// directive) and delegates to `complete`.
    async fn summarize(&self, text: &str, options: &SummaryOptions) -> AppResult<String> {
        let prompt = shared_prompts()?.summarize(
            options.language,
            text,
            options.focus_instruction.as_deref(),
        )?;
        self.complete(&prompt, &options.generation_options()).await
    }

    /// Generate a short title for a text.
    ///
    /// Default: the first five words followed by an ellipsis. Model-backed
    /// variants override with a generated title of at most 50 characters.
    async fn generate_title(&self, text: &str) -> AppResult<String> {
        let words: Vec<&str> = text.split_whitespace().take(5).collect();
        Ok(format!("{}...", words.join(" ")))
    }

    /// Generate 3-5 keyword tags for a text.
    ///
    /// Default: no tags.
    async fn generate_tags(&self, _text: &str) -> AppResult<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Remove any echo of the prompt from a causal LM's output.
pub(crate) fn strip_prompt_echo(output: &str, prompt: &str) -> String {
    output.replace(prompt, "").trim().to_string()
}

/// Normalize a raw model title: first line only, quotes stripped, at most
/// 50 characters.
pub(crate) fn clean_title(raw: &str) -> String {
    let mut title = raw
        .lines()
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .to_string();

    if title.chars().count() > 50 {
        title = format!("{}...", char_prefix(&title, 47));
    }

    title
}

/// Normalize raw model tags: newlines become separators, bullet dashes are
/// dropped, entries are trimmed and deduplicated, at most five survive.
pub(crate) fn clean_tags(raw: &str) -> Vec<String> {
    let normalized = raw.replace('\n', ",").replace('-', "");

    let mut tags: Vec<String> = Vec::new();
    for tag in normalized.split(',') {
        let tag = tag
            .trim()
            .trim_matches('"')
            .trim_matches('\'')
            .trim_matches('.')
            .trim()
            .to_string();
        if !tag.is_empty() && !tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
            tags.push(tag);
        }
        if tags.len() == 5 {
            break;
        }
    }

    tags
}
