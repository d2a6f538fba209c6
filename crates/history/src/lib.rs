//! SQLite-backed history of completed summarization runs.

mod store;
mod types;

pub use store::SummaryStore;
pub use types::{HistoryStatistics, NewSummary, SummaryRecord};
