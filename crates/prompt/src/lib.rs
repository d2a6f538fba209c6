//! Prompt crate for the booksum CLI.
//!
//! Holds every prompt template the summarization engines and providers use,
//! in both supported output languages, and renders them with Handlebars.
//!
//! # Example
//! ```
//! use booksum_prompt::{Language, PromptBuilder};
//!
//! let prompts = PromptBuilder::new().expect("templates are statically valid");
//! let prompt = prompts.summarize(Language::En, "some long text", None).unwrap();
//! assert!(prompt.contains("some long text"));
//! ```

mod builder;
mod templates;
mod types;

pub use builder::PromptBuilder;
pub use types::Language;
