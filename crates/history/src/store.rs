//! Summary history persistence over SQLite.

use std::io::Write;
use std::path::Path;

use chrono::Local;
use rusqlite::{params, params_from_iter, types::Value, Connection, Row};

use booksum_core::error::{AppError, AppResult};

use crate::types::{HistoryStatistics, NewSummary, SummaryRecord};

const COLUMNS: &str = "id, timestamp, original_text, summary, word_count, char_count, \
                       processing_time, method, chunks_data, title, tags, created_at";

pub struct SummaryStore {
    conn: Connection,
}

impl SummaryStore {
    /// Open (or create) the history database at `path`.
    pub fn open(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::History(format!("Failed to create history directory: {}", e))
                })?;
            }
        }
        let conn = Connection::open(path)
            .map_err(|e| AppError::History(format!("Failed to open history database: {}", e)))?;
        let store = Self { conn };
        store.init_schema()?;
        tracing::debug!("Opened summary history at {:?}", path);
        Ok(store)
    }

    /// In-memory store, used by tests and `--no-save` dry runs.
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::History(format!("Failed to open in-memory history: {}", e)))?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> AppResult<()> {
        self.conn
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS summaries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    timestamp TEXT NOT NULL,
                    original_text TEXT NOT NULL,
                    summary TEXT NOT NULL,
                    word_count INTEGER,
                    char_count INTEGER,
                    processing_time REAL,
                    method TEXT DEFAULT 'unknown',
                    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
                );

                CREATE INDEX IF NOT EXISTS idx_timestamp ON summaries(timestamp);
                CREATE INDEX IF NOT EXISTS idx_method ON summaries(method);
                "#,
            )
            .map_err(|e| AppError::History(format!("Failed to create history schema: {}", e)))?;

        // Additive migrations for databases created before these columns
        // existed; a duplicate-column error means the column is already there.
        for column in ["chunks_data TEXT", "title TEXT", "tags TEXT"] {
            let sql = format!("ALTER TABLE summaries ADD COLUMN {}", column);
            if let Err(err) = self.conn.execute(&sql, []) {
                tracing::trace!(column, "Skipping column migration: {}", err);
            }
        }
        Ok(())
    }

    /// Record a summary run, returning its row id.
    pub fn save(&self, entry: &NewSummary) -> AppResult<i64> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let title = match entry.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => format!("Summary {}", timestamp),
        };
        self.conn
            .execute(
                "INSERT INTO summaries \
                 (timestamp, original_text, summary, word_count, char_count, \
                  processing_time, method, chunks_data, title, tags) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    timestamp,
                    entry.original_text,
                    entry.summary,
                    entry.word_count as i64,
                    entry.char_count as i64,
                    entry.processing_time,
                    entry.method,
                    entry.chunks_data,
                    title,
                    entry.tags,
                ],
            )
            .map_err(|e| AppError::History(format!("Failed to save summary: {}", e)))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent summaries, newest first.
    pub fn recent(&self, limit: usize) -> AppResult<Vec<SummaryRecord>> {
        self.query_records(
            &format!(
                "SELECT {} FROM summaries ORDER BY created_at DESC, id DESC LIMIT ?",
                COLUMNS
            ),
            vec![Value::from(limit as i64)],
        )
    }

    /// Fetch one summary by id.
    pub fn get(&self, id: i64) -> AppResult<Option<SummaryRecord>> {
        let mut rows = self.query_records(
            &format!("SELECT {} FROM summaries WHERE id = ?", COLUMNS),
            vec![Value::from(id)],
        )?;
        Ok(rows.pop())
    }

    /// Delete one summary; `false` when the id did not exist.
    pub fn delete(&self, id: i64) -> AppResult<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM summaries WHERE id = ?", params![id])
            .map_err(|e| AppError::History(format!("Failed to delete summary: {}", e)))?;
        Ok(affected > 0)
    }

    /// Term search over title, original text, summary and tags. Every
    /// whitespace-separated term must match at least one of those fields.
    pub fn search(&self, query: &str, limit: usize) -> AppResult<Vec<SummaryRecord>> {
        let terms: Vec<&str> = query.split_whitespace().collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        self.filter(Some(query), &[], limit)
    }

    /// Combined text and tag filter. Text terms AND together, and every
    /// requested tag must be present.
    pub fn filter(
        &self,
        query: Option<&str>,
        tags: &[String],
        limit: usize,
    ) -> AppResult<Vec<SummaryRecord>> {
        let mut conditions: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        for term in query.unwrap_or_default().split_whitespace() {
            conditions.push(
                "(title LIKE ? OR original_text LIKE ? OR summary LIKE ? OR tags LIKE ?)"
                    .to_string(),
            );
            let like = format!("%{}%", term);
            for _ in 0..4 {
                values.push(Value::from(like.clone()));
            }
        }
        for tag in tags {
            conditions.push("tags LIKE ?".to_string());
            values.push(Value::from(format!("%{}%", tag)));
        }

        let where_clause = if conditions.is_empty() {
            "1=1".to_string()
        } else {
            conditions.join(" AND ")
        };
        values.push(Value::from(limit as i64));

        self.query_records(
            &format!(
                "SELECT {} FROM summaries WHERE {} ORDER BY created_at DESC, id DESC LIMIT ?",
                COLUMNS, where_clause
            ),
            values,
        )
    }

    /// Sorted distinct tags across all rows.
    pub fn all_tags(&self) -> AppResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT tags FROM summaries WHERE tags IS NOT NULL AND tags != ''")
            .map_err(|e| AppError::History(format!("Failed to prepare tag query: {}", e)))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| AppError::History(format!("Failed to query tags: {}", e)))?;

        let mut tags = std::collections::BTreeSet::new();
        for row in rows {
            let joined =
                row.map_err(|e| AppError::History(format!("Failed to read tag row: {}", e)))?;
            for tag in joined.split(',') {
                let tag = tag.trim();
                if !tag.is_empty() {
                    tags.insert(tag.to_string());
                }
            }
        }
        Ok(tags.into_iter().collect())
    }

    /// Aggregate counts over the whole history.
    pub fn statistics(&self) -> AppResult<HistoryStatistics> {
        self.conn
            .query_row(
                "SELECT COUNT(*), SUM(word_count), AVG(processing_time), \
                 MIN(created_at), MAX(created_at) FROM summaries",
                [],
                |row| {
                    Ok(HistoryStatistics {
                        total_summaries: row.get::<_, i64>(0)? as u64,
                        total_words: row.get::<_, Option<i64>>(1)?.unwrap_or(0) as u64,
                        avg_processing_time: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
                        first_summary: row.get(3)?,
                        latest_summary: row.get(4)?,
                    })
                },
            )
            .map_err(|e| AppError::History(format!("Failed to compute statistics: {}", e)))
    }

    /// Keep only the `keep_last` most recent rows; returns how many were
    /// removed.
    pub fn cleanup(&self, keep_last: usize) -> AppResult<usize> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM summaries WHERE id NOT IN \
                 (SELECT id FROM summaries ORDER BY created_at DESC, id DESC LIMIT ?)",
                params![keep_last as i64],
            )
            .map_err(|e| AppError::History(format!("Failed to trim history: {}", e)))?;
        if removed > 0 {
            tracing::info!(removed, keep_last, "Trimmed summary history");
        }
        Ok(removed)
    }

    /// Write all rows as CSV, header included, newest first.
    pub fn export_csv<W: Write>(&self, writer: W) -> AppResult<usize> {
        let records = self.query_records(
            &format!(
                "SELECT {} FROM summaries ORDER BY created_at DESC, id DESC",
                COLUMNS
            ),
            Vec::new(),
        )?;
        let mut csv_writer = csv::Writer::from_writer(writer);
        let count = records.len();
        for record in records {
            csv_writer
                .serialize(&record)
                .map_err(|e| AppError::History(format!("Failed to write CSV row: {}", e)))?;
        }
        csv_writer
            .flush()
            .map_err(|e| AppError::History(format!("Failed to flush CSV export: {}", e)))?;
        Ok(count)
    }

    fn query_records(&self, sql: &str, values: Vec<Value>) -> AppResult<Vec<SummaryRecord>> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| AppError::History(format!("Failed to prepare history query: {}", e)))?;
        let rows = stmt
            .query_map(params_from_iter(values), record_from_row)
            .map_err(|e| AppError::History(format!("Failed to query history: {}", e)))?;
        let mut records = Vec::new();
        for row in rows {
            records
                .push(row.map_err(|e| AppError::History(format!("Failed to read row: {}", e)))?);
        }
        Ok(records)
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<SummaryRecord> {
    Ok(SummaryRecord {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        original_text: row.get(2)?,
        summary: row.get(3)?,
        word_count: row.get::<_, Option<i64>>(4)?.unwrap_or(0) as u64,
        char_count: row.get::<_, Option<i64>>(5)?.unwrap_or(0) as u64,
        processing_time: row.get::<_, Option<f64>>(6)?.unwrap_or(0.0),
        method: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        chunks_data: row.get(8)?,
        title: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
        tags: row.get(10)?,
        created_at: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, summary: &str, tags: Option<&str>) -> NewSummary {
        NewSummary {
            original_text: format!("original text for {}", title),
            summary: summary.to_string(),
            word_count: 100,
            char_count: 600,
            processing_time: 1.5,
            method: "instruct/refine".to_string(),
            chunks_data: None,
            title: Some(title.to_string()),
            tags: tags.map(str::to_string),
        }
    }

    #[test]
    fn save_and_get_round_trip() {
        let store = SummaryStore::open_in_memory().unwrap();
        let id = store
            .save(&entry("Don Quijote", "Un hidalgo enloquece.", Some("novela, clásico")))
            .unwrap();

        let record = store.get(id).unwrap().unwrap();
        assert_eq!(record.title, "Don Quijote");
        assert_eq!(record.summary, "Un hidalgo enloquece.");
        assert_eq!(record.method, "instruct/refine");
        assert_eq!(record.tag_list(), vec!["novela", "clásico"]);
        assert!(store.get(id + 100).unwrap().is_none());
    }

    #[test]
    fn blank_title_gets_timestamp_fallback() {
        let store = SummaryStore::open_in_memory().unwrap();
        let mut new_entry = entry("x", "body", None);
        new_entry.title = Some("   ".to_string());
        let id = store.save(&new_entry).unwrap();
        let record = store.get(id).unwrap().unwrap();
        assert!(record.title.starts_with("Summary "));
    }

    #[test]
    fn recent_returns_newest_first() {
        let store = SummaryStore::open_in_memory().unwrap();
        for i in 0..5 {
            store.save(&entry(&format!("t{}", i), "s", None)).unwrap();
        }
        let records = store.recent(3).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].title, "t4");
        assert_eq!(records[2].title, "t2");
    }

    #[test]
    fn search_requires_every_term() {
        let store = SummaryStore::open_in_memory().unwrap();
        store
            .save(&entry("Guerra y paz", "Rusia napoleónica", Some("historia")))
            .unwrap();
        store
            .save(&entry("Paz interior", "Meditación", Some("bienestar")))
            .unwrap();

        let hits = store.search("paz", 10).unwrap();
        assert_eq!(hits.len(), 2);

        let hits = store.search("paz historia", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Guerra y paz");

        assert!(store.search("   ", 10).unwrap().is_empty());
    }

    #[test]
    fn filter_intersects_tags() {
        let store = SummaryStore::open_in_memory().unwrap();
        store.save(&entry("a", "s", Some("novela, drama"))).unwrap();
        store.save(&entry("b", "s", Some("novela"))).unwrap();

        let both = store
            .filter(None, &["novela".to_string(), "drama".to_string()], 10)
            .unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].title, "a");

        let all = store.filter(None, &[], 10).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn all_tags_deduplicates_and_sorts() {
        let store = SummaryStore::open_in_memory().unwrap();
        store.save(&entry("a", "s", Some("novela, drama"))).unwrap();
        store.save(&entry("b", "s", Some("drama, ensayo"))).unwrap();
        assert_eq!(store.all_tags().unwrap(), vec!["drama", "ensayo", "novela"]);
    }

    #[test]
    fn cleanup_keeps_most_recent() {
        let store = SummaryStore::open_in_memory().unwrap();
        for i in 0..10 {
            store.save(&entry(&format!("t{}", i), "s", None)).unwrap();
        }
        let removed = store.cleanup(4).unwrap();
        assert_eq!(removed, 6);
        let left = store.recent(100).unwrap();
        assert_eq!(left.len(), 4);
        assert_eq!(left[0].title, "t9");
    }

    #[test]
    fn statistics_cover_all_rows() {
        let store = SummaryStore::open_in_memory().unwrap();
        let stats = store.statistics().unwrap();
        assert_eq!(stats.total_summaries, 0);
        assert!(stats.first_summary.is_none());

        store.save(&entry("a", "s", None)).unwrap();
        store.save(&entry("b", "s", None)).unwrap();
        let stats = store.statistics().unwrap();
        assert_eq!(stats.total_summaries, 2);
        assert_eq!(stats.total_words, 200);
        assert!(stats.avg_processing_time > 0.0);
        assert!(stats.latest_summary.is_some());
    }

    #[test]
    fn export_writes_csv_with_header() {
        let store = SummaryStore::open_in_memory().unwrap();
        store.save(&entry("Exportable", "s", Some("tag"))).unwrap();

        let mut buffer = Vec::new();
        let count = store.export_csv(&mut buffer).unwrap();
        assert_eq!(count, 1);

        let csv = String::from_utf8(buffer).unwrap();
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().contains("original_text"));
        assert!(lines.next().unwrap().contains("Exportable"));
    }

    #[test]
    fn open_creates_file_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");
        {
            let store = SummaryStore::open(&path).unwrap();
            store.save(&entry("persisted", "s", None)).unwrap();
        }
        let store = SummaryStore::open(&path).unwrap();
        let records = store.recent(10).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "persisted");
    }
}
