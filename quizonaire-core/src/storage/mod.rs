pub mod history_store;

pub use history_store::{GameOutcome, GameRecord, HistoryStore, HistorySummary};

use crate::error::{QuizonaireError, Result};
use rusqlite::Connection;
use std::path::Path;
use tokio::sync::Mutex;

pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    pub async fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                QuizonaireError::internal(format!("Failed to create directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };

        storage.init_schema().await?;
        Ok(storage)
    }

    pub async fn in_memory() -> Result<Self> {
        let storage = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS games (
                session_id INTEGER PRIMARY KEY,
                topic TEXT NOT NULL,
                base_price REAL NOT NULL,
                question_count INTEGER NOT NULL,
                total_cost REAL NOT NULL,
                correct_answers INTEGER NOT NULL,
                prize REAL,
                outcome TEXT NOT NULL,
                start_tx TEXT,
                end_tx TEXT,
                created_at INTEGER NOT NULL,
                finished_at INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    pub async fn get_connection(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}
