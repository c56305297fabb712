use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::app_dirs::AppDirs;
use crate::session::TestResult;
use crate::util::round_half_up;

/// Results kept by history queries and the in-memory recorder.
pub const HISTORY_LIMIT: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("could not prepare storage: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored timestamp {0:?} is not RFC 3339")]
    Timestamp(String),
}

/// Receives the result of each completed session.
pub trait ResultRecorder {
    fn record(&mut self, result: TestResult) -> Result<(), RecorderError>;
}

impl<R: ResultRecorder + ?Sized> ResultRecorder for Box<R> {
    fn record(&mut self, result: TestResult) -> Result<(), RecorderError> {
        (**self).record(result)
    }
}

/// Keeps the latest results in memory, oldest first.
#[derive(Debug, Default, Clone)]
pub struct MemoryRecorder {
    results: Vec<TestResult>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }
}

impl ResultRecorder for MemoryRecorder {
    fn record(&mut self, result: TestResult) -> Result<(), RecorderError> {
        if self.results.len() >= HISTORY_LIMIT {
            self.results.remove(0);
        }
        self.results.push(result);
        Ok(())
    }
}

/// Aggregates kept alongside the result history.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileStats {
    pub total_tests: u32,
    pub avg_wpm: u32,
    pub best_wpm: u32,
    pub updated_at: Option<DateTime<Local>>,
}

impl Default for ProfileStats {
    fn default() -> Self {
        Self {
            total_tests: 0,
            avg_wpm: 0,
            best_wpm: 0,
            updated_at: None,
        }
    }
}

impl ProfileStats {
    /// Folds one more result into the aggregates.
    pub fn with_result(&self, wpm: u32) -> Self {
        let total_tests = self.total_tests + 1;
        let avg_wpm = round_half_up(
            (self.avg_wpm as f64 * self.total_tests as f64 + wpm as f64) / total_tests as f64,
        ) as u32;

        Self {
            total_tests,
            avg_wpm,
            best_wpm: self.best_wpm.max(wpm),
            updated_at: Some(Local::now()),
        }
    }
}

/// SQLite-backed result history and profile
#[derive(Debug)]
pub struct SqliteRecorder {
    conn: Connection,
}

impl SqliteRecorder {
    /// Opens the database in the default state directory.
    pub fn new() -> Result<Self, RecorderError> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("clackr_results.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RecorderError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!(target: "recorder", path = %path.display(), "opening results database");
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, RecorderError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, RecorderError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS test_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                wpm INTEGER NOT NULL,
                accuracy INTEGER NOT NULL,
                errors INTEGER NOT NULL,
                time_limit INTEGER NOT NULL,
                words_typed INTEGER NOT NULL,
                characters_typed INTEGER NOT NULL,
                timestamp TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS profile (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                total_tests INTEGER NOT NULL,
                avg_wpm INTEGER NOT NULL,
                best_wpm INTEGER NOT NULL,
                updated_at TEXT
            );
            "#,
        )?;

        Ok(Self { conn })
    }

    /// Latest results, newest first.
    pub fn history(&self, limit: usize) -> Result<Vec<TestResult>, RecorderError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT wpm, accuracy, errors, time_limit, words_typed, characters_typed, timestamp
            FROM test_results
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            Ok((
                TestResult {
                    wpm: row.get(0)?,
                    accuracy: row.get(1)?,
                    errors: row.get::<_, i64>(2)? as usize,
                    time_limit: row.get(3)?,
                    words_typed: row.get::<_, i64>(4)? as usize,
                    characters_typed: row.get::<_, i64>(5)? as usize,
                    timestamp: Local::now(),
                },
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut history = Vec::new();
        for row in rows {
            let (mut result, timestamp) = row?;
            result.timestamp = parse_timestamp(&timestamp)?;
            history.push(result);
        }

        Ok(history)
    }

    pub fn profile(&self) -> Result<ProfileStats, RecorderError> {
        let row = self
            .conn
            .query_row(
                "SELECT total_tests, avg_wpm, best_wpm, updated_at FROM profile WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, u32>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, u32>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(ProfileStats::default()),
            Some((total_tests, avg_wpm, best_wpm, updated_at)) => Ok(ProfileStats {
                total_tests,
                avg_wpm,
                best_wpm,
                updated_at: updated_at.as_deref().map(parse_timestamp).transpose()?,
            }),
        }
    }

    /// Deletes the result history. Profile aggregates are kept.
    pub fn clear_history(&self) -> Result<(), RecorderError> {
        let removed = self.conn.execute("DELETE FROM test_results", [])?;
        info!(target: "recorder", removed, "history cleared");
        Ok(())
    }
}

impl ResultRecorder for SqliteRecorder {
    fn record(&mut self, result: TestResult) -> Result<(), RecorderError> {
        let profile = self.profile()?.with_result(result.wpm);
        let tx = self.conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO test_results
            (wpm, accuracy, errors, time_limit, words_typed, characters_typed, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                result.wpm,
                result.accuracy,
                result.errors as i64,
                result.time_limit,
                result.words_typed as i64,
                result.characters_typed as i64,
                result.timestamp.to_rfc3339(),
            ],
        )?;

        tx.execute(
            r#"
            INSERT INTO profile (id, total_tests, avg_wpm, best_wpm, updated_at)
            VALUES (1, ?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                total_tests = excluded.total_tests,
                avg_wpm = excluded.avg_wpm,
                best_wpm = excluded.best_wpm,
                updated_at = excluded.updated_at
            "#,
            params![
                profile.total_tests,
                profile.avg_wpm,
                profile.best_wpm,
                profile.updated_at.map(|t| t.to_rfc3339()),
            ],
        )?;

        tx.commit()?;
        info!(
            target: "recorder",
            wpm = result.wpm,
            total_tests = profile.total_tests,
            "result saved"
        );
        Ok(())
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Local>, RecorderError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Local))
        .map_err(|_| RecorderError::Timestamp(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;

    fn result(wpm: u32, minutes_ago: i64) -> TestResult {
        TestResult {
            wpm,
            accuracy: 97,
            errors: 2,
            time_limit: 60,
            words_typed: 40,
            characters_typed: 210,
            timestamp: Local::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn test_memory_recorder_caps_history() {
        let mut recorder = MemoryRecorder::new();
        for i in 0..(HISTORY_LIMIT as u32 + 5) {
            recorder.record(result(i, 0)).unwrap();
        }

        assert_eq!(recorder.results().len(), HISTORY_LIMIT);
        assert_eq!(recorder.results()[0].wpm, 5);
    }

    #[test]
    fn test_profile_running_average() {
        let profile = ProfileStats::default()
            .with_result(40)
            .with_result(61)
            .with_result(50);

        assert_eq!(profile.total_tests, 3);
        // 40, then 50.5 rounds to 51, then (51 * 2 + 50) / 3 rounds to 51
        assert_eq!(profile.avg_wpm, 51);
        assert_eq!(profile.best_wpm, 61);
        assert!(profile.updated_at.is_some());
    }

    #[test]
    fn test_sqlite_record_and_history() {
        let mut recorder = SqliteRecorder::open_in_memory().unwrap();
        recorder.record(result(40, 10)).unwrap();
        recorder.record(result(55, 5)).unwrap();
        recorder.record(result(48, 1)).unwrap();

        let history = recorder.history(HISTORY_LIMIT).unwrap();
        let wpms: Vec<u32> = history.iter().map(|r| r.wpm).collect();
        assert_eq!(wpms, vec![48, 55, 40]);
        assert_eq!(history[0].characters_typed, 210);

        let limited = recorder.history(2).unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_sqlite_history_follows_insert_order_across_offsets() {
        let at = |raw: &str| DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Local);
        let mut recorder = SqliteRecorder::open_in_memory().unwrap();

        // 05:30Z then 06:10Z; the stored strings sort the other way round
        recorder
            .record(TestResult {
                timestamp: at("2024-11-03T01:30:00-04:00"),
                ..result(31, 0)
            })
            .unwrap();
        recorder
            .record(TestResult {
                timestamp: at("2024-11-03T01:10:00-05:00"),
                ..result(32, 0)
            })
            .unwrap();

        let wpms: Vec<u32> = recorder
            .history(HISTORY_LIMIT)
            .unwrap()
            .iter()
            .map(|r| r.wpm)
            .collect();
        assert_eq!(wpms, vec![32, 31]);
    }

    #[test]
    fn test_sqlite_profile_updates() {
        let mut recorder = SqliteRecorder::open_in_memory().unwrap();
        assert_eq!(recorder.profile().unwrap(), ProfileStats::default());

        recorder.record(result(30, 0)).unwrap();
        recorder.record(result(70, 0)).unwrap();

        let profile = recorder.profile().unwrap();
        assert_eq!(profile.total_tests, 2);
        assert_eq!(profile.avg_wpm, 50);
        assert_eq!(profile.best_wpm, 70);
    }

    #[test]
    fn test_clear_history_keeps_profile() {
        let mut recorder = SqliteRecorder::open_in_memory().unwrap();
        recorder.record(result(30, 0)).unwrap();
        recorder.clear_history().unwrap();

        assert!(recorder.history(HISTORY_LIMIT).unwrap().is_empty());
        assert_eq!(recorder.profile().unwrap().total_tests, 1);
    }

    #[test]
    fn test_bad_timestamp_is_reported() {
        let recorder = SqliteRecorder::open_in_memory().unwrap();
        recorder
            .conn
            .execute(
                "INSERT INTO test_results (wpm, accuracy, errors, time_limit, words_typed, characters_typed, timestamp) VALUES (1, 1, 1, 1, 1, 1, 'yesterday')",
                [],
            )
            .unwrap();

        assert_matches!(
            recorder.history(HISTORY_LIMIT),
            Err(RecorderError::Timestamp(raw)) if raw == "yesterday"
        );
    }
}
