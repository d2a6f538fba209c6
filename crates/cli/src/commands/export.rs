//! Export command handler.

use std::fs::File;
use std::path::PathBuf;

use clap::Args;

use booksum_core::{config::AppConfig, AppError, AppResult};
use booksum_history::SummaryStore;

/// Export the summary history to CSV
#[derive(Args, Debug)]
pub struct ExportCommand {
    /// Destination file, e.g. `summaries.csv`
    pub path: PathBuf,
}

impl ExportCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let store = SummaryStore::open(&config.db_path)?;
        let file = File::create(&self.path).map_err(|e| {
            AppError::Config(format!("Cannot create {}: {}", self.path.display(), e))
        })?;
        let count = store.export_csv(file)?;
        println!("Exported {} summaries to {}", count, self.path.display());
        Ok(())
    }
}
