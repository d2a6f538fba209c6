//! Row types for the summary history store.

use serde::{Deserialize, Serialize};

/// A summary run about to be recorded.
#[derive(Debug, Clone, Default)]
pub struct NewSummary {
    /// Full input text as it was summarized
    pub original_text: String,

    /// Assembled summary report
    pub summary: String,

    /// Word count of the input
    pub word_count: u64,

    /// Character count of the input
    pub char_count: u64,

    /// Wall-clock duration of the run in seconds
    pub processing_time: f64,

    /// Provider/strategy label, e.g. `instruct/refine`
    pub method: String,

    /// Per-chunk results serialized as JSON, when the run was chunked
    pub chunks_data: Option<String>,

    /// Display title; a timestamp title is substituted when absent
    pub title: Option<String>,

    /// Comma-separated keyword tags
    pub tags: Option<String>,
}

/// A stored summary row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub id: i64,
    pub timestamp: String,
    pub original_text: String,
    pub summary: String,
    pub word_count: u64,
    pub char_count: u64,
    pub processing_time: f64,
    pub method: String,
    pub chunks_data: Option<String>,
    pub title: String,
    pub tags: Option<String>,
    pub created_at: String,
}

impl SummaryRecord {
    /// Tags as a cleaned list.
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Aggregate figures over the whole history.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryStatistics {
    pub total_summaries: u64,
    pub total_words: u64,
    pub avg_processing_time: f64,
    pub first_summary: Option<String>,
    pub latest_summary: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_list_splits_and_trims() {
        let record = SummaryRecord {
            id: 1,
            timestamp: String::new(),
            original_text: String::new(),
            summary: String::new(),
            word_count: 0,
            char_count: 0,
            processing_time: 0.0,
            method: "test".to_string(),
            chunks_data: None,
            title: "t".to_string(),
            tags: Some(" novela , historia ,, drama".to_string()),
            created_at: String::new(),
        };
        assert_eq!(record.tag_list(), vec!["novela", "historia", "drama"]);
    }
}
