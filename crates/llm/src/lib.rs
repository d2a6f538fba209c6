//! Summarization provider crate for the booksum CLI.
//!
//! This crate provides a provider-agnostic abstraction over generative
//! summarization backends through a unified trait-based interface.
//!
//! # Providers
//! - **Instruct**: instruction-tuned causal LM served by a local runtime
//!   (default, iterative-refine capable, streaming)
//! - **Pipeline**: local generic summarization pipeline, single-shot
//! - **Gemini**: hosted API with caller-supplied credential
//! - **Mock**: deterministic scripted provider for tests
//!
//! # Example
//! ```no_run
//! use booksum_llm::{SummarizationProvider, SummaryOptions, providers::InstructProvider};
//! use booksum_llm::runtime::LocalRuntime;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = InstructProvider::new(LocalRuntime::shared(), "gemma-booksum");
//! let summary = provider
//!     .summarize("A long document...", &SummaryOptions::default())
//!     .await?;
//! println!("{}", summary);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod runtime;

// Re-export main types
pub use client::{
    ChunkProfile, ChunkStrategy, GenerationOptions, SummarizationProvider, SummaryOptions,
    TextStream,
};
pub use factory::create_provider;
pub use providers::{GeminiProvider, InstructProvider, MockProvider, PipelineProvider};
