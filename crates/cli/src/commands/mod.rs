//! Command handlers for the booksum CLI.

pub mod export;
pub mod history;
pub mod summarize;

pub use export::ExportCommand;
pub use history::HistoryCommand;
pub use summarize::SummarizeCommand;
