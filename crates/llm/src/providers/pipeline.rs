//! Generic local summarization-pipeline provider.
//!
//! Wraps a small seq2seq summarization model served by the shared local
//! runtime. Single-shot generation tuned for short independent summaries;
//! the map-reduce strategy is its natural fit. Not iterative-capable, so
//! refine-strategy callers go through the generic fallback.

use std::sync::Arc;

use booksum_core::AppResult;

use crate::client::{
    strip_prompt_echo, ChunkProfile, ChunkStrategy, GenerationOptions, SummarizationProvider,
};
use crate::runtime::LocalRuntime;

/// Local generic summarization-pipeline provider.
pub struct PipelineProvider {
    runtime: Arc<LocalRuntime>,
    model: String,
}

impl PipelineProvider {
    pub fn new(runtime: Arc<LocalRuntime>, model: impl Into<String>) -> Self {
        Self {
            runtime,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl SummarizationProvider for PipelineProvider {
    fn name(&self) -> &str {
        "pipeline"
    }

    fn chunk_profile(&self) -> ChunkProfile {
        ChunkProfile {
            max_chunk_size: 4000,
            strategy: ChunkStrategy::Semantic,
            map_workers: 1,
            request_delay: None,
        }
    }

    async fn complete(&self, prompt: &str, options: &GenerationOptions) -> AppResult<String> {
        let output = self.runtime.generate(&self.model, prompt, options).await?;
        Ok(strip_prompt_echo(&output, prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_capabilities() {
        let provider = PipelineProvider::new(
            Arc::new(LocalRuntime::new("http://localhost:11434")),
            "distilbart-cnn",
        );
        assert_eq!(provider.name(), "pipeline");
        assert!(!provider.supports_iterative_refine());
        assert_eq!(provider.chunk_profile().map_workers, 1);
    }
}
