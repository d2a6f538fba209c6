//! Hosted Gemini API provider.
//!
//! No local model: every call is a network request against the hosted
//! inference endpoint using a caller-supplied credential. Streaming
//! consumes the endpoint's server-sent-events protocol and re-exposes it
//! as the same fragment stream the local providers produce.

use std::time::Duration;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use booksum_core::{AppError, AppResult};
use booksum_prompt::Language;

use crate::client::{
    char_prefix, clean_tags, clean_title, shared_prompts, ChunkProfile, ChunkStrategy,
    GenerationOptions, SummarizationProvider, TextStream,
};

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Response shape shared by the blocking and streaming endpoints.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize, Serialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

impl GeminiResponse {
    fn text(&self) -> String {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .map(|p| p.text.as_str())
            .collect()
    }
}

/// Hosted Gemini provider.
pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    request_delay: Option<Duration>,
    language: Language,
}

impl GeminiProvider {
    /// Construct the provider. A missing or empty credential fails here,
    /// before any chunking work can begin.
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> AppResult<Self> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                AppError::ProviderUnavailable("Gemini provider requires an API key".to_string())
            })?;

        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            model: model.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_delay: None,
            language: Language::default(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sleep applied between chunk requests (never before the first) to
    /// respect external quota.
    pub fn with_request_delay(mut self, delay: Option<Duration>) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    fn url(&self, verb: &str, streaming: bool) -> String {
        let sse = if streaming { "&alt=sse" } else { "" };
        format!(
            "{}/models/{}:{}?key={}{}",
            self.endpoint, self.model, verb, self.api_key, sse
        )
    }

    fn request_body(&self, prompt: &str, options: &GenerationOptions) -> serde_json::Value {
        json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "maxOutputTokens": options.max_tokens,
                "temperature": options.temperature,
            }
        })
    }

    async fn check_status(response: reqwest::Response) -> AppResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        // An invalid credential makes the provider unusable as a whole
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            Err(AppError::ProviderUnavailable(format!(
                "Gemini rejected the credential ({}): {}",
                status, error_text
            )))
        } else {
            Err(AppError::Generation(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )))
        }
    }
}

#[async_trait::async_trait]
impl SummarizationProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn chunk_profile(&self) -> ChunkProfile {
        ChunkProfile {
            // Enormous hosted context; cost scales with request count, so
            // boundary awareness buys nothing here
            max_chunk_size: 500_000,
            strategy: ChunkStrategy::FixedWidth,
            map_workers: 5,
            request_delay: self.request_delay,
        }
    }

    fn supports_iterative_refine(&self) -> bool {
        true
    }

    async fn complete(&self, prompt: &str, options: &GenerationOptions) -> AppResult<String> {
        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "Gemini completion");

        let response = self
            .http
            .post(self.url("generateContent", false))
            .json(&self.request_body(prompt, options))
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to reach Gemini: {}", e)))?;

        let response = Self::check_status(response).await?;

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to parse Gemini response: {}", e)))?;

        Ok(body.text().trim().to_string())
    }

    async fn complete_stream(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> AppResult<TextStream> {
        tracing::debug!(model = %self.model, "Gemini streaming completion");

        let response = self
            .http
            .post(self.url("streamGenerateContent", true))
            .json(&self.request_body(prompt, options))
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to reach Gemini: {}", e)))?;

        let response = Self::check_status(response).await?;

        let (tx, rx) = mpsc::channel::<AppResult<String>>(32);
        let mut bytes = response.bytes_stream();

        tokio::spawn(async move {
            // SSE events arrive as "data: {json}" lines; one event may span
            // several byte chunks, so buffer until a newline arrives.
            let mut buffer = String::new();

            'outer: while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(chunk) => {
                        buffer.push_str(&String::from_utf8_lossy(&chunk));

                        while let Some(newline) = buffer.find('\n') {
                            let line = buffer[..newline].trim().to_string();
                            buffer.drain(..=newline);

                            let Some(data) = line.strip_prefix("data: ") else {
                                continue;
                            };
                            if data == "[DONE]" {
                                break 'outer;
                            }

                            match serde_json::from_str::<GeminiResponse>(data) {
                                Ok(parsed) => {
                                    let text = parsed.text();
                                    if !text.is_empty() && tx.send(Ok(text)).await.is_err() {
                                        break 'outer;
                                    }
                                }
                                Err(e) => {
                                    let _ = tx
                                        .send(Err(AppError::Generation(format!(
                                            "Failed to parse stream event: {}",
                                            e
                                        ))))
                                        .await;
                                    break 'outer;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx
                            .send(Err(AppError::Generation(format!("Stream error: {}", e))))
                            .await;
                        break;
                    }
                }
            }
            // tx drops here, closing the channel
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    async fn generate_title(&self, text: &str) -> AppResult<String> {
        let preview = char_prefix(text, 2000);
        let prompt = shared_prompts()?.title(self.language, preview)?;
        let options = GenerationOptions::default().with_max_tokens(20);

        let raw = self.complete(&prompt, &options).await?;
        Ok(clean_title(&raw))
    }

    async fn generate_tags(&self, text: &str) -> AppResult<Vec<String>> {
        let preview = char_prefix(text, 2000);
        let prompt = shared_prompts()?.tags(self.language, preview)?;
        let options = GenerationOptions::default()
            .with_max_tokens(40)
            .with_temperature(0.3);

        let raw = self.complete(&prompt, &options).await?;
        Ok(clean_tags(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_is_unavailable() {
        match GeminiProvider::new(None, "gemini-2.0-flash-exp") {
            Err(AppError::ProviderUnavailable(msg)) => assert!(msg.contains("API key")),
            other => panic!("Expected ProviderUnavailable, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_blank_api_key_is_unavailable() {
        let result = GeminiProvider::new(Some("   ".to_string()), "gemini-2.0-flash-exp");
        assert!(matches!(result, Err(AppError::ProviderUnavailable(_))));
    }

    #[test]
    fn test_gemini_profile() {
        let provider = GeminiProvider::new(Some("key".to_string()), "gemini-2.0-flash-exp")
            .unwrap()
            .with_request_delay(Some(Duration::from_secs(2)));

        let profile = provider.chunk_profile();
        assert_eq!(profile.max_chunk_size, 500_000);
        assert_eq!(profile.strategy, ChunkStrategy::FixedWidth);
        assert_eq!(profile.map_workers, 5);
        assert_eq!(profile.request_delay, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_response_text_concatenation() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"world"}]}}]}"#;
        let parsed: GeminiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.text(), "Hello world");
    }
}
