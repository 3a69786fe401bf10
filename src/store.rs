use chrono::{DateTime, Local, SecondsFormat, TimeZone, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::stats::StatsSnapshot;
use crate::texts::Difficulty;
use crate::util::mean;

pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unable to create database directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// Outcome of one finished test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub wpm: u32,
    pub accuracy: u32,
    pub difficulty: Difficulty,
    pub timestamp: DateTime<Local>,
}

impl TestResult {
    pub fn from_snapshot(snapshot: &StatsSnapshot, difficulty: Difficulty) -> Self {
        Self {
            wpm: snapshot.wpm,
            accuracy: snapshot.accuracy,
            difficulty,
            timestamp: Local::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub wpm: u32,
    pub accuracy: u32,
    pub created_at: DateTime<Local>,
}

/// Persistence for finished tests and the leaderboard
pub trait ResultStore {
    fn save_result(&self, result: &TestResult) -> Result<(), StoreError>;
    /// Most recent first
    fn recent_results(&self, limit: usize) -> Result<Vec<TestResult>, StoreError>;
    fn add_leaderboard_entry(&self, entry: &LeaderboardEntry) -> Result<(), StoreError>;
    /// Highest wpm first, ties broken by higher accuracy
    fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, StoreError>;
}

/// SQLite-backed result store
#[derive(Debug)]
pub struct SqliteResultStore {
    conn: Connection,
}

impl SqliteResultStore {
    /// Open the store at the default state location
    pub fn open_default() -> Result<Self, StoreError> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("typesprint.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened result store");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS test_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                wpm INTEGER NOT NULL,
                accuracy INTEGER NOT NULL,
                difficulty TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_test_results_timestamp ON test_results(timestamp);

            CREATE TABLE IF NOT EXISTS leaderboard (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                wpm INTEGER NOT NULL,
                accuracy INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_leaderboard_rank ON leaderboard(wpm DESC, accuracy DESC);
            "#,
        )?;

        Ok(Self { conn })
    }
}

/// Fixed-width UTC text, so string order matches time order across offset changes
fn format_timestamp<Tz: TimeZone>(ts: &DateTime<Tz>) -> String {
    ts.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Local>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Local))
        .map_err(|_| {
            rusqlite::Error::InvalidColumnType(idx, "timestamp".to_string(), rusqlite::types::Type::Text)
        })
}

impl ResultStore for SqliteResultStore {
    fn save_result(&self, result: &TestResult) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO test_results (wpm, accuracy, difficulty, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![
                result.wpm,
                result.accuracy,
                result.difficulty.to_string(),
                format_timestamp(&result.timestamp),
            ],
        )?;
        Ok(())
    }

    fn recent_results(&self, limit: usize) -> Result<Vec<TestResult>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT wpm, accuracy, difficulty, timestamp
            FROM test_results
            ORDER BY timestamp DESC, id DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            Ok(TestResult {
                wpm: row.get(0)?,
                accuracy: row.get(1)?,
                difficulty: Difficulty::from_id(&row.get::<_, String>(2)?),
                timestamp: parse_timestamp(row, 3)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn add_leaderboard_entry(&self, entry: &LeaderboardEntry) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO leaderboard (username, wpm, accuracy, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.username,
                entry.wpm,
                entry.accuracy,
                format_timestamp(&entry.created_at),
            ],
        )?;
        Ok(())
    }

    fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT username, wpm, accuracy, created_at
            FROM leaderboard
            ORDER BY wpm DESC, accuracy DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            Ok(LeaderboardEntry {
                username: row.get(0)?,
                wpm: row.get(1)?,
                accuracy: row.get(2)?,
                created_at: parse_timestamp(row, 3)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

/// Personal bests over a set of results
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResultsSummary {
    pub best_wpm: u32,
    pub best_accuracy: u32,
    pub average_wpm: Option<f64>,
}

impl ResultsSummary {
    pub fn from_results(results: &[TestResult]) -> Self {
        let wpms: Vec<f64> = results.iter().map(|r| r.wpm as f64).collect();
        Self {
            best_wpm: results.iter().map(|r| r.wpm).max().unwrap_or(0),
            best_accuracy: results.iter().map(|r| r.accuracy).max().unwrap_or(0),
            average_wpm: mean(&wpms),
        }
    }
}
