//! Result and configuration types for the summarization engines.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use booksum_core::AppError;

use crate::chunker;

/// An immutable ordered segment of the source text.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// 0-based position in the chunk sequence
    pub index: usize,

    /// Segment content
    pub text: String,

    /// Bounded-length prefix for display (at most 200 characters, with an
    /// ellipsis marker when truncated)
    pub preview: String,
}

impl Chunk {
    pub fn new(index: usize, text: String) -> Self {
        let preview = chunker::preview(&text);
        Self {
            index,
            text,
            preview,
        }
    }
}

/// A chunk paired with the output produced for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkResult {
    /// 1-based chunk number, matching the chunk's position + 1
    pub chunk_number: usize,

    /// Bounded preview of the chunk's content
    pub text_preview: String,

    /// Provider output for this chunk
    pub summary: String,
}

/// The engine's output envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResult {
    /// Final assembled text: processing-metadata header plus the body,
    /// markdown-formatted
    pub summary: String,

    /// Per-chunk results in input order (empty when the input fit in a
    /// single chunk)
    pub chunks: Vec<ChunkResult>,

    /// Map-phase chunks that failed and contributed an empty string
    pub degraded_chunks: usize,
}

impl SummaryResult {
    /// Result for empty input: nothing was summarized, no provider call made.
    pub fn empty() -> Self {
        Self {
            summary: String::new(),
            chunks: Vec::new(),
            degraded_chunks: 0,
        }
    }
}

/// Long-document summarization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Incremental running-summary refinement
    #[default]
    Refine,

    /// Independent per-chunk summaries reduced into one
    MapReduce,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Refine => "refine",
            Self::MapReduce => "map-reduce",
        }
    }
}

impl FromStr for Strategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "refine" => Ok(Self::Refine),
            "map-reduce" | "map_reduce" | "mapreduce" => Ok(Self::MapReduce),
            other => Err(AppError::Config(format!(
                "Unknown strategy: {}. Supported: refine, map-reduce",
                other
            ))),
        }
    }
}

/// Sub-strategy for the refine loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefineMode {
    /// Each step rewrites the entire running summary; the final body is the
    /// last step's output
    #[default]
    FullCarry,

    /// Each step summarizes only the new chunk with a bounded trailing
    /// window of prior output as context; the final body concatenates every
    /// step under labeled part headers
    Windowed,
}

impl FromStr for RefineMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" | "full-carry" => Ok(Self::FullCarry),
            "windowed" | "windowed-append" => Ok(Self::Windowed),
            other => Err(AppError::Config(format!(
                "Unknown refine mode: {}. Supported: full, windowed",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_preview_computed() {
        let chunk = Chunk::new(0, "x".repeat(500));
        assert_eq!(chunk.index, 0);
        assert!(chunk.preview.ends_with("..."));
        assert_eq!(chunk.preview.chars().count(), 203);
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("refine".parse::<Strategy>().unwrap(), Strategy::Refine);
        assert_eq!("map-reduce".parse::<Strategy>().unwrap(), Strategy::MapReduce);
        assert_eq!("map_reduce".parse::<Strategy>().unwrap(), Strategy::MapReduce);
        assert!("other".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_refine_mode_parsing() {
        assert_eq!("full".parse::<RefineMode>().unwrap(), RefineMode::FullCarry);
        assert_eq!("windowed".parse::<RefineMode>().unwrap(), RefineMode::Windowed);
        assert!("other".parse::<RefineMode>().is_err());
    }
}
