//! Prompt rendering over a Handlebars registry.

use handlebars::Handlebars;
use serde_json::json;

use booksum_core::{AppError, AppResult};

use crate::templates::TEMPLATES;
use crate::types::Language;

/// Renders the static prompt templates with per-call variables.
///
/// All templates are registered once at construction; rendering a missing
/// template is a programming error and surfaces as a `Config` error rather
/// than a panic.
pub struct PromptBuilder {
    registry: Handlebars<'static>,
}

impl PromptBuilder {
    /// Build the registry with every template in both languages.
    pub fn new() -> AppResult<Self> {
        let mut registry = Handlebars::new();
        // Prompts are plain text, never HTML
        registry.register_escape_fn(handlebars::no_escape);

        for (name, lang, body) in TEMPLATES {
            let key = format!("{}.{}", name, lang);
            registry
                .register_template_string(&key, body)
                .map_err(|e| AppError::Config(format!("Invalid template {}: {}", key, e)))?;
        }

        Ok(Self { registry })
    }

    fn render(&self, name: &str, language: Language, vars: &serde_json::Value) -> AppResult<String> {
        let key = format!("{}.{}", name, language.as_str());
        tracing::trace!(template = %key, "Rendering prompt");
        self.registry
            .render(&key, vars)
            .map_err(|e| AppError::Config(format!("Failed to render prompt {}: {}", key, e)))
    }

    /// Baseline "summarize this text" prompt with an optional focus directive.
    pub fn summarize(
        &self,
        language: Language,
        text: &str,
        focus: Option<&str>,
    ) -> AppResult<String> {
        self.render("summarize", language, &json!({ "text": text, "focus": focus }))
    }

    /// Detailed initial summary of the first chunk (refine seeding).
    pub fn seed(&self, language: Language, chunk: &str, focus: Option<&str>) -> AppResult<String> {
        self.render("seed", language, &json!({ "chunk": chunk, "focus": focus }))
    }

    /// Full-carry refine step: rewrite the running summary with a new chunk.
    pub fn refine(
        &self,
        language: Language,
        summary: &str,
        chunk: &str,
        focus: Option<&str>,
    ) -> AppResult<String> {
        self.render(
            "refine",
            language,
            &json!({ "summary": summary, "chunk": chunk, "focus": focus }),
        )
    }

    /// Windowed-append refine step: summarize only the new chunk with
    /// a bounded trailing slice of prior output as context.
    pub fn windowed(
        &self,
        language: Language,
        context: &str,
        chunk: &str,
        focus: Option<&str>,
    ) -> AppResult<String> {
        self.render(
            "windowed",
            language,
            &json!({ "context": context, "chunk": chunk, "focus": focus }),
        )
    }

    /// Seed prompt for the generic (capability-absent) refine fallback.
    pub fn generic_seed(&self, language: Language, chunk: &str) -> AppResult<String> {
        self.render("generic_seed", language, &json!({ "chunk": chunk }))
    }

    /// Refine prompt for the generic (capability-absent) refine fallback.
    pub fn generic_refine(
        &self,
        language: Language,
        summary: &str,
        chunk: &str,
    ) -> AppResult<String> {
        self.render(
            "generic_refine",
            language,
            &json!({ "summary": summary, "chunk": chunk }),
        )
    }

    /// Reduce prompt combining the map phase's partial summaries.
    pub fn reduce(&self, language: Language, combined: &str) -> AppResult<String> {
        self.render("reduce", language, &json!({ "summary": combined }))
    }

    /// Short-title prompt over a bounded preview of the text.
    pub fn title(&self, language: Language, preview: &str) -> AppResult<String> {
        self.render("title", language, &json!({ "text": preview }))
    }

    /// Keyword-tags prompt over a bounded preview of the text.
    pub fn tags(&self, language: Language, preview: &str) -> AppResult<String> {
        self.render("tags", language, &json!({ "text": preview }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> PromptBuilder {
        PromptBuilder::new().expect("static templates must be valid")
    }

    #[test]
    fn test_summarize_without_focus() {
        let prompts = builder();
        let prompt = prompts.summarize(Language::Es, "hola mundo", None).unwrap();
        assert!(prompt.starts_with("Resume el siguiente texto:"));
        assert!(prompt.contains("hola mundo"));
        assert!(prompt.ends_with("Resumen:"));
    }

    #[test]
    fn test_summarize_with_focus() {
        let prompts = builder();
        let prompt = prompts
            .summarize(Language::En, "some text", Some("focus on dates"))
            .unwrap();
        assert!(prompt.contains("following this instruction: focus on dates"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_refine_embeds_both_parts() {
        let prompts = builder();
        let prompt = prompts
            .refine(Language::En, "the summary so far", "the new chunk", None)
            .unwrap();
        assert!(prompt.contains("the summary so far"));
        assert!(prompt.contains("the new chunk"));
        assert!(!prompt.contains("FOCUS INSTRUCTION"));
    }

    #[test]
    fn test_seed_includes_style_guidelines() {
        let prompts = builder();
        let es = prompts.seed(Language::Es, "texto", None).unwrap();
        assert!(es.contains("PAUTAS DE ESTILO"));
        let en = prompts.seed(Language::En, "text", Some("key dates")).unwrap();
        assert!(en.contains("STYLE GUIDELINES"));
        assert!(en.contains("FOCUS INSTRUCTION"));
    }

    #[test]
    fn test_no_escaping_of_special_characters() {
        let prompts = builder();
        let prompt = prompts
            .summarize(Language::En, "a < b && c > \"d\"", None)
            .unwrap();
        assert!(prompt.contains("a < b && c > \"d\""));
    }
}
