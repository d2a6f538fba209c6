//! Static prompt templates, registered per language.
//!
//! Template variables: `text` (full input), `chunk` (current chunk),
//! `summary` (running summary), `context` (trailing window of prior
//! output), `focus` (optional steering directive). The focus block and the
//! style guidelines are baked into each template rather than composed at
//! call sites so that a template reads the way the model receives it.

/// (name, language suffix, template body)
pub(crate) const TEMPLATES: &[(&str, &str, &str)] = &[
    // Plain single-call summarization. Providers route their baseline
    // `summarize` capability through this.
    (
        "summarize",
        "es",
        "Resume el siguiente texto\
{{#if focus}} siguiendo esta instrucción: {{focus}}{{else}}:{{/if}}\n\n\
{{text}}\n\nResumen:",
    ),
    (
        "summarize",
        "en",
        "Summarize the following text\
{{#if focus}} following this instruction: {{focus}}{{else}}:{{/if}}\n\n\
{{text}}\n\nSummary:",
    ),
    // Refine seeding: first chunk, detailed initial summary.
    (
        "seed",
        "es",
        "Resume el siguiente texto en detalle, capturando todos los puntos \
clave, ideas principales y detalles importantes. Usa formato markdown con \
secciones y viñetas.\
{{#if focus}}\n\n**INSTRUCCIÓN DE ENFOQUE:** {{focus}}\n\
Asegúrate de que el resumen se adhiera estrictamente a este enfoque.{{/if}}\n\n\
PAUTAS DE ESTILO:\n\
- Escribe DIRECTAMENTE sobre el contenido (ej: \"La teoría dice...\" NO \"El texto dice...\").\n\
- NO uses meta-lenguaje como \"El autor discute\", \"El capítulo cubre\", \"En esta sección\".\n\
- Sé específico y concreto. Evita generalizaciones vagas.\n\
- Captura consejos accionables y puntos clave, no solo temas.\n\
- EVITA la repetición de frases. Integra la información nueva fluidamente.\n\n\
Texto:\n{{chunk}}\n\nResumen Detallado:",
    ),
    (
        "seed",
        "en",
        "Summarize the following text in detail, capturing all key points, \
main ideas, and important details. Use markdown formatting with sections \
and bullet points.\
{{#if focus}}\n\n**FOCUS INSTRUCTION:** {{focus}}\n\
Ensure the summary strictly adheres to this focus.{{/if}}\n\n\
STYLE GUIDELINES:\n\
- Write DIRECTLY about the content (e.g., \"The theory says...\" NOT \"The text says...\").\n\
- Do NOT use meta-language like \"The author discusses\", \"The chapter covers\", \"In this section\".\n\
- Be specific and concrete. Avoid vague generalizations.\n\
- Capture actionable advice and key insights, not just topics.\n\
- AVOID repetition. Integrate new information smoothly.\n\n\
Text:\n{{chunk}}\n\nDetailed Summary:",
    ),
    // Full-carry refine: rewrite the whole running summary with the new chunk.
    (
        "refine",
        "es",
        "## Resumen Actual:\n{{summary}}\n\n\
## Nueva Sección de Texto:\n{{chunk}}\n\n\
Proporciona un resumen actualizado y expandido que:\n\
1. Incorpore toda la nueva información del texto anterior en la estructura del resumen existente.\n\
2. Mantenga TODOS los detalles importantes del resumen actual, pero reescritos para mejorar la fluidez (evita repetir las mismas frases exactas).\n\
3. Use formato markdown con encabezados, viñetas y secciones.\n\
4. Sea completo, detallado y NO repetitivo.\
{{#if focus}}\n\n**INSTRUCCIÓN DE ENFOQUE:** {{focus}}\n\
Asegúrate de que el resumen se adhiera estrictamente a este enfoque.{{/if}}\n\n\
Resumen Actualizado (Integrado):",
    ),
    (
        "refine",
        "en",
        "## Current Summary:\n{{summary}}\n\n\
## New Text Section:\n{{chunk}}\n\n\
Provide an updated and expanded summary that:\n\
1. Incorporates all new information from the text above into the existing summary structure.\n\
2. Maintains ALL important details from the current summary, but rephrased for flow (avoid repeating exact sentences).\n\
3. Uses markdown formatting with headers, bullet points, and sections.\n\
4. Is comprehensive, detailed, and NOT repetitive.\
{{#if focus}}\n\n**FOCUS INSTRUCTION:** {{focus}}\n\
Ensure the summary strictly adheres to this focus.{{/if}}\n\n\
Updated Summary (Integrated):",
    ),
    // Windowed-append refine: summarize only the new chunk, continuing the
    // narrative from a bounded trailing slice of prior output.
    (
        "windowed",
        "es",
        "## Final del Resumen Anterior (solo contexto):\n{{context}}\n\n\
## Nueva Sección de Texto:\n{{chunk}}\n\n\
Resume SOLO la nueva sección de texto, continuando la narrativa del contexto \
anterior sin repetirlo. Usa formato markdown con viñetas.\
{{#if focus}}\n\n**INSTRUCCIÓN DE ENFOQUE:** {{focus}}{{/if}}\n\n\
Resumen de la Nueva Sección:",
    ),
    (
        "windowed",
        "en",
        "## Tail of Previous Summary (context only):\n{{context}}\n\n\
## New Text Section:\n{{chunk}}\n\n\
Summarize ONLY the new text section, continuing the narrative from the \
context above without repeating it. Use markdown formatting with bullet points.\
{{#if focus}}\n\n**FOCUS INSTRUCTION:** {{focus}}{{/if}}\n\n\
New Section Summary:",
    ),
    // Generic refine fallback, for providers without the iterative capability.
    (
        "generic_seed",
        "es",
        "Resume el siguiente texto de forma concisa y clara:\n\n\"{{chunk}}\"",
    ),
    (
        "generic_seed",
        "en",
        "Summarize the following text concisely and clearly:\n\n\"{{chunk}}\"",
    ),
    (
        "generic_refine",
        "es",
        "Resumen existente:\n\"{{summary}}\"\n\n\
Nuevo fragmento de texto:\n\"{{chunk}}\"\n\n\
Usando el nuevo fragmento, refina el resumen existente para que sea más \
completo y coherente.",
    ),
    (
        "generic_refine",
        "en",
        "Existing summary:\n\"{{summary}}\"\n\n\
New text fragment:\n\"{{chunk}}\"\n\n\
Using the new fragment, refine the existing summary so it is more complete \
and coherent.",
    ),
    // Map-reduce reduce phase.
    (
        "reduce",
        "es",
        "Crea un resumen final coherente a partir de los siguientes resúmenes \
parciales:\n\n{{summary}}",
    ),
    (
        "reduce",
        "en",
        "Create a single coherent final summary from the following partial \
summaries:\n\n{{summary}}",
    ),
    // Best-effort post-processing.
    (
        "title",
        "es",
        "Genera un título muy corto (máximo 5 palabras) y descriptivo para el \
siguiente texto:\n\n{{text}}\n\nTítulo:",
    ),
    (
        "title",
        "en",
        "Generate a very short (5 words maximum) descriptive title for the \
following text:\n\n{{text}}\n\nTitle:",
    ),
    (
        "tags",
        "es",
        "Genera EXACTAMENTE 3 a 5 etiquetas (palabras clave) para el siguiente texto.\n\
Reglas:\n\
1. Devuelve SOLO las etiquetas separadas por comas.\n\
2. NO uses viñetas, guiones ni numeración.\n\
3. NO incluyas saltos de línea extra.\n\
4. Ejemplo: Tecnología, Inteligencia Artificial, Resumen, Rust\n\n\
Texto:\n{{text}}\n\nEtiquetas:",
    ),
    (
        "tags",
        "en",
        "Generate EXACTLY 3 to 5 tags (keywords) for the following text.\n\
Rules:\n\
1. Return ONLY the tags, separated by commas.\n\
2. Do NOT use bullets, dashes, or numbering.\n\
3. Do NOT include extra line breaks.\n\
4. Example: Technology, Artificial Intelligence, Summary, Rust\n\n\
Text:\n{{text}}\n\nTags:",
    ),
];
