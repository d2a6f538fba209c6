//! Shared handle to the local model runtime.
//!
//! Local providers generate through an HTTP runtime that keeps the model
//! weights resident (loading them is expensive, so they are loaded once and
//! reused). The handle is created lazily on first use and injected into
//! every local provider instance; a single async mutex serializes
//! generation calls, because the backing model cannot serve two forward
//! passes at once.

use std::sync::{Arc, OnceLock};

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use booksum_core::{AppError, AppResult};

use crate::client::{GenerationOptions, TextStream};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Runtime generate request format.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: RuntimeOptions,
}

#[derive(Debug, Serialize)]
struct RuntimeOptions {
    num_predict: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repeat_penalty: Option<f32>,
}

impl From<&GenerationOptions> for RuntimeOptions {
    fn from(options: &GenerationOptions) -> Self {
        Self {
            num_predict: options.max_tokens,
            temperature: options.temperature,
            top_p: options.top_p,
            repeat_penalty: options.repeat_penalty,
        }
    }
}

/// Runtime generate response format (one JSON object per line when
/// streaming).
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    done: bool,
}

/// Handle to the local model runtime.
pub struct LocalRuntime {
    base_url: String,
    http: reqwest::Client,
    gate: Arc<tokio::sync::Mutex<()>>,
}

impl LocalRuntime {
    /// Create a standalone handle (tests, custom wiring).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
            gate: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Process-wide shared handle, initialized on first use with the
    /// default endpoint.
    pub fn shared() -> Arc<LocalRuntime> {
        Self::shared_at(DEFAULT_BASE_URL)
    }

    /// Process-wide shared handle, initialized on first use with the given
    /// endpoint. Later calls reuse the existing handle regardless of the
    /// endpoint they pass.
    pub fn shared_at(base_url: &str) -> Arc<LocalRuntime> {
        static SHARED: OnceLock<Arc<LocalRuntime>> = OnceLock::new();
        let runtime = SHARED.get_or_init(|| Arc::new(LocalRuntime::new(base_url)));
        if runtime.base_url != base_url {
            tracing::warn!(
                existing = %runtime.base_url,
                requested = %base_url,
                "Shared local runtime already initialized at a different endpoint"
            );
        }
        Arc::clone(runtime)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run one generation call and return the full output.
    ///
    /// Holds the generation gate for the duration of the call.
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> AppResult<String> {
        let _permit = self.gate.lock().await;

        tracing::debug!(model, prompt_chars = prompt.len(), "Local generation call");

        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: RuntimeOptions::from(options),
        };
        let url = format!("{}/api/generate", self.base_url);

        let response = self.http.post(&url).json(&request).send().await.map_err(|e| {
            AppError::ProviderUnavailable(format!("Local runtime not reachable: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Generation(format!(
                "Local runtime error ({}): {}",
                status, error_text
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to parse runtime response: {}", e)))?;

        Ok(body.response)
    }

    /// Run one generation call, streaming output fragments.
    ///
    /// The runtime's forward pass is consumed on a worker task that pushes
    /// fragments into a bounded channel; the returned stream drains the
    /// channel in order. The channel is closed when generation completes or
    /// fails, so the consumer never deadlocks. The generation gate is held
    /// until the producer task finishes.
    pub async fn generate_stream(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> AppResult<TextStream> {
        let permit = Arc::clone(&self.gate).lock_owned().await;

        tracing::debug!(model, prompt_chars = prompt.len(), "Local streaming call");

        let request = GenerateRequest {
            model,
            prompt,
            stream: true,
            options: RuntimeOptions::from(options),
        };
        let url = format!("{}/api/generate", self.base_url);

        let response = self.http.post(&url).json(&request).send().await.map_err(|e| {
            AppError::ProviderUnavailable(format!("Local runtime not reachable: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Generation(format!(
                "Local runtime error ({}): {}",
                status, error_text
            )));
        }

        let (tx, rx) = mpsc::channel::<AppResult<String>>(32);
        let mut bytes = response.bytes_stream();

        tokio::spawn(async move {
            // Keep the model serialized for the lifetime of the stream
            let _permit = permit;
            // The runtime sends newline-delimited JSON; a line may span
            // several byte chunks, so buffer until a newline arrives.
            let mut buffer = String::new();

            'outer: while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(chunk) => {
                        buffer.push_str(&String::from_utf8_lossy(&chunk));

                        while let Some(newline) = buffer.find('\n') {
                            let line = buffer[..newline].trim().to_string();
                            buffer.drain(..=newline);
                            if line.is_empty() {
                                continue;
                            }

                            match serde_json::from_str::<GenerateResponse>(&line) {
                                Ok(parsed) => {
                                    if !parsed.response.is_empty()
                                        && tx.send(Ok(parsed.response)).await.is_err()
                                    {
                                        break 'outer;
                                    }
                                    if parsed.done {
                                        break 'outer;
                                    }
                                }
                                Err(e) => {
                                    let _ = tx
                                        .send(Err(AppError::Generation(format!(
                                            "Failed to parse stream chunk: {}",
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
}
