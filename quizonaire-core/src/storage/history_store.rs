use crate::error::{QuizonaireError, Result};
use crate::storage::Storage;
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    /// Reveal transaction confirmed.
    Settled,
    /// Stake locked but the game was reset before the reveal.
    Abandoned,
}

impl GameOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            GameOutcome::Settled => "settled",
            GameOutcome::Abandoned => "abandoned",
        }
    }

    fn parse(value: &str) -> Self {
        match value {
            "settled" => GameOutcome::Settled,
            _ => GameOutcome::Abandoned,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub session_id: u64,
    pub topic: String,
    pub base_price: f64,
    pub question_count: u32,
    pub total_cost: f64,
    pub correct_answers: u32,
    pub prize: Option<f64>,
    pub outcome: GameOutcome,
    pub start_tx: Option<String>,
    pub end_tx: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub games_played: u64,
    pub total_staked: f64,
    pub total_won: f64,
}

impl HistorySummary {
    pub fn net(&self) -> f64 {
        self.total_won - self.total_staked
    }
}

pub struct HistoryStore<'a> {
    storage: &'a Storage,
}

const COLUMNS: &str = "session_id, topic, base_price, question_count, total_cost, \
     correct_answers, prize, outcome, start_tx, end_tx, created_at, finished_at";

fn timestamp(value: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(value, 0).unwrap_or_else(Utc::now)
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<GameRecord> {
    let session_id: i64 = row.get(0)?;
    let outcome: String = row.get(7)?;

    Ok(GameRecord {
        session_id: session_id as u64,
        topic: row.get(1)?,
        base_price: row.get(2)?,
        question_count: row.get(3)?,
        total_cost: row.get(4)?,
        correct_answers: row.get(5)?,
        prize: row.get(6)?,
        outcome: GameOutcome::parse(&outcome),
        start_tx: row.get(8)?,
        end_tx: row.get(9)?,
        created_at: timestamp(row.get(10)?),
        finished_at: timestamp(row.get(11)?),
    })
}

impl<'a> HistoryStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn save_record(&self, record: &GameRecord) -> Result<()> {
        let conn = self.storage.get_connection().await;

        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO games ({}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                COLUMNS
            ),
            params![
                record.session_id as i64,
                record.topic,
                record.base_price,
                record.question_count,
                record.total_cost,
                record.correct_answers,
                record.prize,
                record.outcome.as_str(),
                record.start_tx,
                record.end_tx,
                record.created_at.timestamp(),
                record.finished_at.timestamp(),
            ],
        )?;

        tracing::debug!("Saved game record {}", record.session_id);
        Ok(())
    }

    pub async fn load_record(&self, session_id: u64) -> Result<GameRecord> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM games WHERE session_id = ?1",
            COLUMNS
        ))?;

        stmt.query_row(params![session_id as i64], record_from_row)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    QuizonaireError::RecordNotFound { session_id }
                }
                other => other.into(),
            })
    }

    /// Newest first.
    pub async fn list_records(&self, limit: usize) -> Result<Vec<GameRecord>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM games ORDER BY finished_at DESC, session_id DESC LIMIT ?1",
            COLUMNS
        ))?;

        let rows = stmt.query_map(params![limit as i64], record_from_row)?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }

        Ok(records)
    }

    pub async fn summary(&self) -> Result<HistorySummary> {
        let conn = self.storage.get_connection().await;

        let summary = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(total_cost), 0.0), COALESCE(SUM(prize), 0.0) FROM games",
            [],
            |row| {
                let games: i64 = row.get(0)?;
                Ok(HistorySummary {
                    games_played: games as u64,
                    total_staked: row.get(1)?,
                    total_won: row.get(2)?,
                })
            },
        )?;

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    fn record(session_id: u64, outcome: GameOutcome, prize: Option<f64>) -> GameRecord {
        let now = Utc::now();
        GameRecord {
            session_id,
            topic: "Rust".to_string(),
            base_price: 0.0001,
            question_count: 10,
            total_cost: 0.045,
            correct_answers: 7,
            prize,
            outcome,
            start_tx: Some("0x01".to_string()),
            end_tx: prize.map(|_| "0x02".to_string()),
            created_at: now - Duration::minutes(5),
            finished_at: now + Duration::seconds(session_id as i64),
        }
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = tempdir().unwrap();
        let storage = Storage::new(&temp_dir.path().join("quizonaire.db"))
            .await
            .unwrap();
        let store = HistoryStore::new(&storage);

        let saved = record(1_700_000_000_000, GameOutcome::Settled, Some(0.03));
        store.save_record(&saved).await.unwrap();

        let loaded = store.load_record(saved.session_id).await.unwrap();
        assert_eq!(loaded.topic, "Rust");
        assert_eq!(loaded.outcome, GameOutcome::Settled);
        assert_eq!(loaded.prize, Some(0.03));
        assert_eq!(loaded.end_tx.as_deref(), Some("0x02"));
        assert_eq!(loaded.created_at.timestamp(), saved.created_at.timestamp());
    }

    #[tokio::test]
    async fn test_missing_record() {
        let storage = Storage::in_memory().await.unwrap();
        let store = HistoryStore::new(&storage);

        let err = store.load_record(42).await.unwrap_err();
        assert!(matches!(err, QuizonaireError::RecordNotFound { session_id: 42 }));
    }

    #[tokio::test]
    async fn test_list_newest_first_and_summary() {
        let storage = Storage::in_memory().await.unwrap();
        let store = HistoryStore::new(&storage);

        store
            .save_record(&record(1, GameOutcome::Settled, Some(0.06)))
            .await
            .unwrap();
        store
            .save_record(&record(2, GameOutcome::Abandoned, None))
            .await
            .unwrap();
        store
            .save_record(&record(3, GameOutcome::Settled, Some(0.0)))
            .await
            .unwrap();

        let records = store.list_records(2).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].session_id, 3);
        assert_eq!(records[1].session_id, 2);

        let summary = store.summary().await.unwrap();
        assert_eq!(summary.games_played, 3);
        assert!((summary.total_staked - 0.135).abs() < 1e-12);
        assert!((summary.total_won - 0.06).abs() < 1e-12);
        assert!(summary.net() < 0.0);
    }
}
