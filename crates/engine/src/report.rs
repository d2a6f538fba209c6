//! Final report assembly.
//!
//! Every engine wraps its body in the same localized envelope: a
//! processing-metadata header (chunk count, original length, active focus
//! instruction) followed by the summary body.

use booksum_prompt::Language;

/// Metadata header, up to and including the body section heading.
///
/// Kept separate from `assemble` so the streaming path can emit the header
/// as its first fragment and still concatenate to the assembled report.
pub fn header(
    language: Language,
    chunk_count: usize,
    original_chars: usize,
    focus: Option<&str>,
) -> String {
    match language {
        Language::Es => {
            let focus_line = focus
                .map(|f| format!("- **Enfoque:** {}\n", f))
                .unwrap_or_default();
            format!(
                "# Reporte de Resumen\n\n\
                 ## Información de Procesamiento\n\
                 - **Total de fragmentos procesados:** {}\n\
                 - **Longitud del texto original:** {} caracteres\n\
                 {}\n\
                 ---\n\n\
                 ## Resumen Completo\n\n",
                chunk_count, original_chars, focus_line
            )
        }
        Language::En => {
            let focus_line = focus
                .map(|f| format!("- **Focus:** {}\n", f))
                .unwrap_or_default();
            format!(
                "# Summary Report\n\n\
                 ## Processing Information\n\
                 - **Total chunks processed:** {}\n\
                 - **Original text length:** {} characters\n\
                 {}\n\
                 ---\n\n\
                 ## Comprehensive Summary\n\n",
                chunk_count, original_chars, focus_line
            )
        }
    }
}

/// Assemble the final markdown report.
pub fn assemble(
    language: Language,
    chunk_count: usize,
    original_chars: usize,
    focus: Option<&str>,
    body: &str,
) -> String {
    format!(
        "{}{}\n",
        header(language, chunk_count, original_chars, focus),
        body
    )
}

/// Localized section header for windowed-append parts.
pub fn part_header(language: Language, part: usize) -> String {
    match language {
        Language::Es => format!("## Parte {}", part),
        Language::En => format!("## Part {}", part),
    }
}
