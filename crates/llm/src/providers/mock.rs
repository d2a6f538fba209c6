//! Deterministic mock provider for tests.
//!
//! Scripted responses keyed by call index, optional failure injection, a
//! capability toggle, and a call log. Streaming splits the scripted
//! response into small fragments so multi-fragment consumption gets
//! exercised for real.

use std::sync::Mutex;

use booksum_core::{AppError, AppResult};

use crate::client::{
    char_prefix, ChunkProfile, GenerationOptions, SummarizationProvider, TextStream,
};

type Responder = Box<dyn Fn(usize, &str) -> AppResult<String> + Send + Sync>;

/// Scripted provider double.
pub struct MockProvider {
    respond: Responder,
    iterative: bool,
    profile: ChunkProfile,
    fragment_chars: usize,
    calls: Mutex<Vec<String>>,
}

impl MockProvider {
    /// Provider answering every prompt through `respond(call_index, prompt)`.
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(usize, &str) -> AppResult<String> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            iterative: false,
            profile: ChunkProfile::default(),
            fragment_chars: 7,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Provider echoing `SUMMARY(<first 20 chars of the prompt>)`.
    pub fn echo() -> Self {
        Self::new(|_, prompt| Ok(format!("SUMMARY({})", char_prefix(prompt, 20))))
    }

    /// Provider failing every call with `Generation`.
    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::new(move |_, _| Err(AppError::Generation(message.clone())))
    }

    pub fn with_iterative(mut self, iterative: bool) -> Self {
        self.iterative = iterative;
        self
    }

    pub fn with_profile(mut self, profile: ChunkProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Fragment size used by `complete_stream`.
    pub fn with_fragment_chars(mut self, fragment_chars: usize) -> Self {
        self.fragment_chars = fragment_chars.max(1);
        self
    }

    /// Number of `complete` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock call log poisoned").len()
    }

    /// Every prompt seen so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("mock call log poisoned").clone()
    }

    fn record(&self, prompt: &str) -> usize {
        let mut calls = self.calls.lock().expect("mock call log poisoned");
        calls.push(prompt.to_string());
        calls.len() - 1
    }
}

#[async_trait::async_trait]
impl SummarizationProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn chunk_profile(&self) -> ChunkProfile {
        self.profile.clone()
    }

    fn supports_iterative_refine(&self) -> bool {
        self.iterative
    }

    async fn complete(&self, prompt: &str, _options: &GenerationOptions) -> AppResult<String> {
        let index = self.record(prompt);
        (self.respond)(index, prompt)
    }

    async fn complete_stream(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> AppResult<TextStream> {
        let text = self.complete(prompt, options).await?;
        let fragments: Vec<AppResult<String>> = text
            .chars()
            .collect::<Vec<_>>()
            .chunks(self.fragment_chars)
            .map(|chars| Ok(chars.iter().collect::<String>()))
            .collect();
        Ok(Box::pin(futures::stream::iter(fragments)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_echo_mock() {
        let provider = MockProvider::echo();
        let output = provider
            .complete("A prompt that is longer than twenty characters", &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(output, "SUMMARY(A prompt that is lon)");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_stream_fragments_concatenate() {
        let provider = MockProvider::new(|_, _| Ok("áéí incremental output".to_string()))
            .with_fragment_chars(3);
        let mut stream = provider
            .complete_stream("prompt", &GenerationOptions::default())
            .await
            .unwrap();

        let mut assembled = String::new();
        let mut fragments = 0;
        while let Some(fragment) = stream.next().await {
            assembled.push_str(&fragment.unwrap());
            fragments += 1;
        }

        assert_eq!(assembled, "áéí incremental output");
        assert!(fragments > 1);
    }

    #[tokio::test]
    async fn test_failure_injection_by_index() {
        let provider = MockProvider::new(|index, _| {
            if index == 1 {
                Err(AppError::Generation("boom".to_string()))
            } else {
                Ok(format!("ok-{}", index))
            }
        });

        let options = GenerationOptions::default();
        assert!(provider.complete("a", &options).await.is_ok());
        assert!(provider.complete("b", &options).await.is_err());
        assert!(provider.complete("c", &options).await.is_ok());
    }
}
