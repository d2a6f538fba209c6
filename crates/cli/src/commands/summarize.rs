//! Summarize command handler.
//!
//! Reads a plain-text document, runs the configured summarization strategy
//! and records the result in the history database.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use futures::StreamExt;

use booksum_core::{config::AppConfig, AppError, AppResult};
use booksum_engine::progress::ProgressObserver;
use booksum_engine::{
    summarize_long_text, summarize_long_text_stream, RefineMode, Strategy, SummarizeRequest,
    SummaryResult,
};
use booksum_history::{NewSummary, SummaryStore};
use booksum_llm::{create_provider, SummarizationProvider};
use booksum_prompt::Language;

/// Summarize a plain-text file (or stdin)
#[derive(Args, Debug)]
pub struct SummarizeCommand {
    /// Input file path, or `-` to read from stdin
    pub input: String,

    /// Summarization strategy (refine, map-reduce)
    #[arg(short, long, default_value = "refine")]
    pub strategy: String,

    /// Refine sub-mode (full, windowed)
    #[arg(long, default_value = "full")]
    pub refine_mode: String,

    /// Steering instruction, e.g. "focus on the main characters"
    #[arg(short, long)]
    pub focus: Option<String>,

    /// Stream the summary to stdout as it is generated
    #[arg(long)]
    pub stream: bool,

    /// Do not record this run in the history database
    #[arg(long)]
    pub no_save: bool,

    /// Output as JSON (summary plus run metadata)
    #[arg(long, conflicts_with = "stream")]
    pub json: bool,
}

impl SummarizeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        config.validate()?;

        let text = read_input(&self.input)?;
        if text.trim().is_empty() {
            return Err(AppError::Config(format!(
                "Input {} is empty, nothing to summarize",
                self.input
            )));
        }

        let language: Language = config.language.parse()?;
        let strategy: Strategy = self.strategy.parse()?;
        let refine_mode: RefineMode = self.refine_mode.parse()?;
        let provider = create_provider(config)?;

        tracing::info!(
            provider = provider.name(),
            model = %config.model,
            strategy = strategy.as_str(),
            chars = text.chars().count(),
            "Summarizing {}",
            self.input
        );

        let observer: ProgressObserver = Arc::new(|completed, total| {
            eprintln!("  chunk {}/{}", completed, total);
        });
        let request = SummarizeRequest::new(language)
            .with_strategy(strategy)
            .with_refine_mode(refine_mode)
            .with_focus(self.focus.clone())
            .with_progress(observer);

        let started = Instant::now();
        let result = if self.stream {
            ensure_streamable(strategy)?;
            if provider.supports_iterative_refine() {
                self.run_streaming(Arc::clone(&provider), &text, &request)
                    .await?
            } else {
                // The generic fallback runs to completion before emitting
                // anything, so run it blocking and keep the real chunk
                // results instead of a degenerate one-fragment stream.
                let result = summarize_long_text(Arc::clone(&provider), &text, &request).await?;
                println!("{}", result.summary);
                result
            }
        } else {
            let result = summarize_long_text(Arc::clone(&provider), &text, &request).await?;
            if !self.json {
                println!("{}", result.summary);
            }
            result
        };
        let elapsed = started.elapsed().as_secs_f64();

        if result.degraded_chunks > 0 {
            eprintln!(
                "Warning: {} chunk(s) failed and were left out of the summary",
                result.degraded_chunks
            );
        }

        let (title, tags) = if self.no_save && !self.json {
            (None, None)
        } else {
            describe(provider.as_ref(), &text).await
        };

        let saved_id = if self.no_save {
            None
        } else {
            Some(self.save(config, &text, &result, elapsed, title.clone(), tags.clone())?)
        };

        if self.json {
            let output = serde_json::json!({
                "summary": result.summary,
                "chunks": result.chunks,
                "degradedChunks": result.degraded_chunks,
                "title": title,
                "tags": tags,
                "durationSecs": elapsed,
                "historyId": saved_id,
            });
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        }

        Ok(())
    }

    /// Stream fragments to stdout while re-assembling the full report for
    /// history recording. Refine streams never degrade chunks (a failed
    /// step aborts the run), but per-chunk results are not available on
    /// this path.
    async fn run_streaming(
        &self,
        provider: Arc<dyn SummarizationProvider>,
        text: &str,
        request: &SummarizeRequest,
    ) -> AppResult<SummaryResult> {
        let mut stream =
            summarize_long_text_stream(provider, text.to_string(), request).await?;
        let mut assembled = String::new();
        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            print!("{}", fragment);
            std::io::stdout().flush().ok();
            assembled.push_str(&fragment);
        }
        Ok(SummaryResult {
            summary: assembled,
            chunks: Vec::new(),
            degraded_chunks: 0,
        })
    }

    fn save(
        &self,
        config: &AppConfig,
        text: &str,
        result: &SummaryResult,
        elapsed: f64,
        title: Option<String>,
        tags: Option<Vec<String>>,
    ) -> AppResult<i64> {
        let chunks_data = if result.chunks.is_empty() {
            None
        } else {
            Some(
                serde_json::to_string(&result.chunks)
                    .map_err(|e| AppError::Serialization(e.to_string()))?,
            )
        };
        let store = SummaryStore::open(&config.db_path)?;
        let id = store.save(&NewSummary {
            original_text: text.to_string(),
            summary: result.summary.clone(),
            word_count: text.split_whitespace().count() as u64,
            char_count: text.chars().count() as u64,
            processing_time: elapsed,
            method: format!("{}/{}", config.provider, self.strategy_label()),
            chunks_data,
            title,
            tags: tags.map(|t| t.join(", ")).filter(|t| !t.is_empty()),
        })?;
        eprintln!("Saved to history (id {})", id);
        Ok(id)
    }

    fn strategy_label(&self) -> String {
        self.strategy
            .parse::<Strategy>()
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|_| self.strategy.clone())
    }
}

/// Best-effort title and tags for the history entry. Failures are logged
/// and the record falls back to a timestamp title.
async fn describe(
    provider: &dyn SummarizationProvider,
    text: &str,
) -> (Option<String>, Option<Vec<String>>) {
    let title = match provider.generate_title(text).await {
        Ok(title) if !title.trim().is_empty() => Some(title),
        Ok(_) => None,
        Err(err) => {
            tracing::warn!("Title generation failed: {}", err);
            None
        }
    };
    let tags = match provider.generate_tags(text).await {
        Ok(tags) if !tags.is_empty() => Some(tags),
        Ok(_) => None,
        Err(err) => {
            tracing::warn!("Tag generation failed: {}", err);
            None
        }
    };
    (title, tags)
}

/// Map-reduce needs its degraded-chunk accounting, which a stream cannot
/// carry; only the refine strategy streams.
fn ensure_streamable(strategy: Strategy) -> AppResult<()> {
    if strategy == Strategy::MapReduce {
        return Err(AppError::Config(
            "--stream is only supported with the refine strategy; \
             rerun without --stream"
                .to_string(),
        ));
    }
    Ok(())
}

/// Read the input as plain text. Lossy UTF-8 is accepted; files that look
/// binary (NUL bytes) are rejected with a pointer to the supported formats.
fn read_input(input: &str) -> AppResult<String> {
    let bytes = if input == "-" {
        let mut buffer = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buffer)
            .map_err(AppError::Io)?;
        buffer
    } else {
        let path = PathBuf::from(input);
        std::fs::read(&path)
            .map_err(|e| AppError::Config(format!("Cannot read {}: {}", path.display(), e)))?
    };

    if bytes.contains(&0) {
        return Err(AppError::Config(format!(
            "{} looks like a binary file; only plain text input is supported \
             (convert PDF/DOCX/EPUB to text first)",
            input
        )));
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF-1.4\x00\x01binary").unwrap();

        let err = read_input(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("binary"));
    }

    #[test]
    fn lossy_utf8_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, [b'h', b'o', b'l', b'a', 0xFF, b'!']).unwrap();

        let text = read_input(path.to_str().unwrap()).unwrap();
        assert!(text.starts_with("hola"));
        assert!(text.ends_with('!'));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = read_input("/no/such/file.txt").unwrap_err();
        assert!(err.to_string().contains("Cannot read"));
    }

    #[test]
    fn streaming_rejects_map_reduce() {
        let err = ensure_streamable(Strategy::MapReduce).unwrap_err();
        assert!(err.to_string().contains("--stream"));
        assert!(ensure_streamable(Strategy::Refine).is_ok());
    }
}
