//! Boundary-aware text chunking.
//!
//! All splitters are total: any input string and any positive size produce
//! a valid chunk sequence, never dropping characters and never emitting an
//! empty chunk. Sizes are byte lengths; splits always land on char
//! boundaries.

const PARAGRAPH_SEPARATOR: &str = "\n\n";
const SENTENCE_SEPARATOR: &str = ". ";

/// Preview length cap in characters.
const PREVIEW_CHARS: usize = 200;

/// Split on paragraph boundaries first, greedily packing paragraphs up to
/// `max_chunk_size`; a paragraph that alone exceeds the limit falls back to
/// sentence-boundary packing.
///
/// Separators stay attached to the unit they follow, so concatenating the
/// returned chunks reproduces the input exactly. A chunk only exceeds
/// `max_chunk_size` when a single sentence unavoidably does.
///
/// Only the empty string yields no chunks; whitespace-only input is a
/// chunk like any other.
pub fn split_semantic(text: &str, max_chunk_size: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if text.len() <= max_chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for paragraph in split_keeping_separator(text, PARAGRAPH_SEPARATOR) {
        if current.len() + paragraph.len() <= max_chunk_size {
            current.push_str(paragraph);
        } else if paragraph.len() <= max_chunk_size {
            flush(&mut chunks, &mut current);
            current.push_str(paragraph);
        } else {
            // Oversized paragraph: fall back to sentence packing
            for sentence in split_keeping_separator(paragraph, SENTENCE_SEPARATOR) {
                if current.len() + sentence.len() <= max_chunk_size {
                    current.push_str(sentence);
                } else {
                    flush(&mut chunks, &mut current);
                    // A single sentence may still exceed the limit; it is
                    // atomic and emitted as-is
                    current.push_str(sentence);
                }
            }
        }
    }

    flush(&mut chunks, &mut current);
    chunks
}

/// Fixed-width split at char boundaries, no boundary awareness.
///
/// For providers whose backing model tolerates arbitrary mid-sentence
/// truncation.
pub fn split_fixed(text: &str, max_chunk_size: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let end = floor_char_boundary(text, (start + max_chunk_size).min(text.len()));
        // max_chunk_size below the first char's width would stall; take at
        // least one char
        let end = if end <= start {
            ceil_char_boundary(text, start + 1)
        } else {
            end
        };
        chunks.push(text[start..end].to_string());
        start = end;
    }

    chunks
}

/// Fixed-width split where adjacent chunks share `overlap` trailing/leading
/// bytes, preserving cross-boundary context at the cost of minor
/// redundancy.
pub fn split_with_overlap(text: &str, max_chunk_size: usize, overlap: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if text.len() <= max_chunk_size {
        return vec![text.to_string()];
    }

    let step = if max_chunk_size > overlap {
        max_chunk_size - overlap
    } else {
        max_chunk_size
    };

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let end = floor_char_boundary(text, (start + max_chunk_size).min(text.len()));
        let end = if end <= start {
            ceil_char_boundary(text, start + 1)
        } else {
            end
        };
        chunks.push(text[start..end].to_string());
        if end == text.len() {
            break;
        }
        start = ceil_char_boundary(text, start + step);
    }

    chunks
}

/// Bounded display prefix: at most 200 characters, ellipsis marker when
/// truncated, never cut mid multi-byte character.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Split into pieces that each keep their trailing separator, so the
/// concatenation of all pieces equals the input.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        pieces.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces
}

fn flush(chunks: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        chunks.push(std::mem::take(current));
    }
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index.min(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        let text = "A short paragraph.";
        assert_eq!(split_semantic(text, 4000), vec![text.to_string()]);
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert!(split_semantic("", 100).is_empty());
        assert!(split_fixed("", 100).is_empty());
        assert!(split_with_overlap("", 100, 10).is_empty());
    }

    #[test]
    fn test_whitespace_only_input_round_trips() {
        // Whitespace is content like any other; only "" is special
        assert_eq!(split_semantic("   ", 100), vec!["   ".to_string()]);
        assert_eq!(split_semantic("   ", 100).concat(), "   ");
        assert_eq!(split_fixed(" \n\n ", 100).concat(), " \n\n ");
        assert_eq!(split_with_overlap("\t\t", 100, 10).concat(), "\t\t");
    }

    #[test]
    fn test_paragraph_packing_round_trip() {
        let text = (0..20)
            .map(|i| format!("Paragraph {} with a bit of content in it.", i))
            .collect::<Vec<_>>()
            .join("\n\n");

        let chunks = split_semantic(&text, 100);
        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), text);
        for chunk in &chunks {
            assert!(!chunk.is_empty());
            assert!(chunk.len() <= 100, "chunk of {} bytes", chunk.len());
        }
    }

    #[test]
    fn test_sentence_fallback_round_trip() {
        // One huge paragraph, no double newlines
        let text = (0..50)
            .map(|i| format!("Sentence number {} says something", i))
            .collect::<Vec<_>>()
            .join(". ");

        let chunks = split_semantic(&text, 120);
        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), text);
        for chunk in &chunks {
            assert!(chunk.len() <= 120);
        }
    }

    #[test]
    fn test_atomic_oversized_sentence_kept_whole() {
        let long_sentence = "x".repeat(300);
        let text = format!("Short one. {}. Another short one", long_sentence);

        let chunks = split_semantic(&text, 100);
        assert_eq!(chunks.concat(), text);
        // The oversized sentence survives as a single over-limit chunk
        assert!(chunks.iter().any(|c| c.len() > 100));
    }

    #[test]
    fn test_paragraph_boundary_preferred() {
        // Three ~2000-char paragraphs, max 4000: the first chunk holds two
        // paragraphs and ends at a paragraph boundary
        let paragraph = "y".repeat(1990);
        let text = format!("{p}\n\n{p}\n\n{p}", p = paragraph);

        let chunks = split_semantic(&text, 4000);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].ends_with("\n\n"));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_split_fixed_char_boundaries() {
        let text = "ñandú ".repeat(100);
        let chunks = split_fixed(&text, 64);

        assert_eq!(chunks.concat(), text);
        for chunk in &chunks {
            assert!(!chunk.is_empty());
            assert!(chunk.len() <= 64);
        }
    }

    #[test]
    fn test_split_with_overlap_duplicates_boundaries() {
        let text: String = (b'a'..=b'z').cycle().take(500).map(char::from).collect();
        let chunks = split_with_overlap(&text, 100, 20);

        assert!(chunks.len() > 1);
        for window in chunks.windows(2) {
            let tail = &window[0][window[0].len() - 20..];
            assert!(window[1].starts_with(tail));
        }
    }

    #[test]
    fn test_preview_truncation() {
        let short = "short text";
        assert_eq!(preview(short), short);

        let long = "á".repeat(250);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), 203);
    }
}
