//! Instruction-tuned local provider.
//!
//! Wraps a causal LM fine-tuned for book summarization, served by the
//! shared local runtime. This is the only local provider with the
//! iterative-refine capability and native streaming.

use std::sync::Arc;

use booksum_core::AppResult;

use crate::client::{
    char_prefix, clean_tags, clean_title, shared_prompts, strip_prompt_echo, ChunkProfile,
    ChunkStrategy, GenerationOptions, SummarizationProvider, TextStream,
};
use crate::runtime::LocalRuntime;

use booksum_prompt::Language;

/// Local instruction-tuned causal-LM provider.
pub struct InstructProvider {
    runtime: Arc<LocalRuntime>,
    model: String,
    /// Language used for title/tag prompts
    language: Language,
}

impl InstructProvider {
    pub fn new(runtime: Arc<LocalRuntime>, model: impl Into<String>) -> Self {
        Self {
            runtime,
            model: model.into(),
            language: Language::default(),
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl SummarizationProvider for InstructProvider {
    fn name(&self) -> &str {
        "instruct"
    }

    fn chunk_profile(&self) -> ChunkProfile {
        ChunkProfile {
            // Bounded local context; semantic boundaries matter here
            max_chunk_size: 4000,
            strategy: ChunkStrategy::Semantic,
            map_workers: 1,
            request_delay: None,
        }
    }

    fn supports_iterative_refine(&self) -> bool {
        true
    }

    async fn complete(&self, prompt: &str, options: &GenerationOptions) -> AppResult<String> {
        let output = self.runtime.generate(&self.model, prompt, options).await?;
        Ok(strip_prompt_echo(&output, prompt))
    }

    async fn complete_stream(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> AppResult<TextStream> {
        self.runtime.generate_stream(&self.model, prompt, options).await
    }

    async fn generate_title(&self, text: &str) -> AppResult<String> {
        let preview = char_prefix(text, 1000);
        let prompt = shared_prompts()?.title(self.language, preview)?;
        let options = GenerationOptions::default()
            .with_max_tokens(20)
            .with_min_tokens(2)
            .with_temperature(0.7);

        let raw = self.complete(&prompt, &options).await?;
        Ok(clean_title(&raw))
    }

    async fn generate_tags(&self, text: &str) -> AppResult<Vec<String>> {
        let preview = char_prefix(text, 2000);
        let prompt = shared_prompts()?.tags(self.language, preview)?;
        // Low temperature keeps the tag list format stable
        let options = GenerationOptions::default()
            .with_max_tokens(40)
            .with_min_tokens(5)
            .with_temperature(0.3);

        let raw = self.complete(&prompt, &options).await?;
        Ok(clean_tags(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruct_profile() {
        let provider = InstructProvider::new(Arc::new(LocalRuntime::new("http://localhost:11434")), "gemma-booksum");
        assert_eq!(provider.name(), "instruct");
        assert!(provider.supports_iterative_refine());

        let profile = provider.chunk_profile();
        assert_eq!(profile.max_chunk_size, 4000);
        assert_eq!(profile.strategy, ChunkStrategy::Semantic);
        // Shared local model: the map phase must not run concurrent calls
        assert_eq!(profile.map_workers, 1);
    }
}
