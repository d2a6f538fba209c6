//! History command handler.
//!
//! Browses and manages the SQLite summary history.

use clap::{Args, Subcommand};

use booksum_core::{config::AppConfig, AppError, AppResult};
use booksum_history::{SummaryRecord, SummaryStore};

/// Browse and manage the summary history
#[derive(Args, Debug)]
pub struct HistoryCommand {
    #[command(subcommand)]
    pub action: HistoryAction,
}

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// List recent summaries
    List(HistoryListCommand),
    /// Search summaries by text terms
    Search(HistorySearchCommand),
    /// Show one summary in full
    Show(HistoryShowCommand),
    /// Delete a summary
    Delete(HistoryDeleteCommand),
    /// List all tags in use
    Tags(HistoryTagsCommand),
    /// Show aggregate statistics
    Stats(HistoryStatsCommand),
    /// Keep only the N most recent summaries
    Trim(HistoryTrimCommand),
}

impl HistoryCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let store = SummaryStore::open(&config.db_path)?;
        match &self.action {
            HistoryAction::List(cmd) => cmd.execute(&store),
            HistoryAction::Search(cmd) => cmd.execute(&store),
            HistoryAction::Show(cmd) => cmd.execute(&store),
            HistoryAction::Delete(cmd) => cmd.execute(&store),
            HistoryAction::Tags(cmd) => cmd.execute(&store),
            HistoryAction::Stats(cmd) => cmd.execute(&store),
            HistoryAction::Trim(cmd) => cmd.execute(&store),
        }
    }
}

/// List recent summaries
#[derive(Args, Debug)]
pub struct HistoryListCommand {
    /// Maximum number of entries
    #[arg(short, long, default_value = "10")]
    pub limit: usize,

    /// Filter to entries carrying all of these tags
    #[arg(short, long)]
    pub tag: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl HistoryListCommand {
    pub fn execute(&self, store: &SummaryStore) -> AppResult<()> {
        let records = if self.tag.is_empty() {
            store.recent(self.limit)?
        } else {
            store.filter(None, &self.tag, self.limit)?
        };
        print_records(&records, self.json)
    }
}

/// Search summaries by text terms
#[derive(Args, Debug)]
pub struct HistorySearchCommand {
    /// Search terms; every term must match title, text, summary or tags
    pub query: String,

    /// Maximum number of entries
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl HistorySearchCommand {
    pub fn execute(&self, store: &SummaryStore) -> AppResult<()> {
        let records = store.search(&self.query, self.limit)?;
        print_records(&records, self.json)
    }
}

/// Show one summary in full
#[derive(Args, Debug)]
pub struct HistoryShowCommand {
    /// Summary id
    pub id: i64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl HistoryShowCommand {
    pub fn execute(&self, store: &SummaryStore) -> AppResult<()> {
        let record = store
            .get(self.id)?
            .ok_or_else(|| AppError::History(format!("No summary with id {}", self.id)))?;
        if self.json {
            let json = serde_json::to_string_pretty(&record)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("{}  {} ({})", record.id, record.title, record.timestamp);
            println!("method: {}", record.method);
            let tags = record.tag_list();
            if !tags.is_empty() {
                println!("tags: {}", tags.join(", "));
            }
            println!();
            println!("{}", record.summary);
        }
        Ok(())
    }
}

/// Delete a summary
#[derive(Args, Debug)]
pub struct HistoryDeleteCommand {
    /// Summary id
    pub id: i64,
}

impl HistoryDeleteCommand {
    pub fn execute(&self, store: &SummaryStore) -> AppResult<()> {
        if store.delete(self.id)? {
            println!("Deleted summary {}", self.id);
            Ok(())
        } else {
            Err(AppError::History(format!("No summary with id {}", self.id)))
        }
    }
}

/// List all tags in use
#[derive(Args, Debug)]
pub struct HistoryTagsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl HistoryTagsCommand {
    pub fn execute(&self, store: &SummaryStore) -> AppResult<()> {
        let tags = store.all_tags()?;
        if self.json {
            let json = serde_json::to_string_pretty(&tags)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            for tag in tags {
                println!("{}", tag);
            }
        }
        Ok(())
    }
}

/// Show aggregate statistics
#[derive(Args, Debug)]
pub struct HistoryStatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl HistoryStatsCommand {
    pub fn execute(&self, store: &SummaryStore) -> AppResult<()> {
        let stats = store.statistics()?;
        if self.json {
            let json = serde_json::to_string_pretty(&stats)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("summaries: {}", stats.total_summaries);
            println!("words summarized: {}", stats.total_words);
            println!("avg processing time: {:.2}s", stats.avg_processing_time);
            if let Some(first) = stats.first_summary {
                println!("first: {}", first);
            }
            if let Some(latest) = stats.latest_summary {
                println!("latest: {}", latest);
            }
        }
        Ok(())
    }
}

/// Keep only the N most recent summaries
#[derive(Args, Debug)]
pub struct HistoryTrimCommand {
    /// Number of summaries to keep
    #[arg(short, long, default_value = "100")]
    pub keep: usize,
}

impl HistoryTrimCommand {
    pub fn execute(&self, store: &SummaryStore) -> AppResult<()> {
        let removed = store.cleanup(self.keep)?;
        println!("Removed {} summaries, kept the {} most recent", removed, self.keep);
        Ok(())
    }
}

fn print_records(records: &[SummaryRecord], json: bool) -> AppResult<()> {
    if json {
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| AppError::Serialization(e.to_string()))?;
        println!("{}", json);
        return Ok(());
    }
    if records.is_empty() {
        println!("No summaries found");
        return Ok(());
    }
    for record in records {
        let tags = record.tag_list();
        let tag_suffix = if tags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", tags.join(", "))
        };
        println!(
            "{:>5}  {}  {}  ({}){}",
            record.id, record.timestamp, record.title, record.method, tag_suffix
        );
    }
    Ok(())
}
