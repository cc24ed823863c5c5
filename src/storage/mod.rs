//! SQLite-backed storage for observations and annual statistics.
//!
//! A [`Database`] only remembers where the file lives. Every unit of work opens its
//! own [`Session`] (one connection) and releases it when the session is dropped, so
//! no connection is shared across callers.

pub mod observations;
pub mod statistics;

use crate::error::{PipelineError, Result};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags, Transaction};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub use observations::InsertOutcome;
pub use statistics::UpsertOutcome;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Open (or create) the database file and make sure both tables exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Self { path };
        let session = db.session()?;
        session
            .connection()
            .execute_batch(include_str!("schema.sql"))?;

        debug!("Database ready at {}", db.path.display());
        Ok(db)
    }

    /// Refer to an existing database without touching it. No schema or pragma is
    /// written, so a read-only file works for queries.
    pub fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(PipelineError::DatabaseNotFound(path));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquire a scoped unit of work.
    pub fn session(&self) -> Result<Session> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Ok(Session { conn })
    }

    /// Acquire a unit of work that can only read.
    pub fn read_session(&self) -> Result<Session> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        Ok(Session { conn })
    }

    /// Counts and ranges for both tables.
    pub fn summary(&self) -> Result<DatabaseSummary> {
        let session = self.read_session()?;
        let conn = session.connection();

        let (observation_count, station_count, first_date, last_date) = conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT station_id), MIN(date), MAX(date) FROM observations",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<NaiveDate>>(2)?,
                    row.get::<_, Option<NaiveDate>>(3)?,
                ))
            },
        )?;

        let (statistic_count, first_year, last_year) = conn.query_row(
            "SELECT COUNT(*), MIN(year), MAX(year) FROM annual_statistics",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<i32>>(1)?,
                    row.get::<_, Option<i32>>(2)?,
                ))
            },
        )?;

        Ok(DatabaseSummary {
            observation_count,
            station_count,
            date_range: first_date.zip(last_date),
            statistic_count,
            year_range: first_year.zip(last_year),
        })
    }
}

pub struct Session {
    conn: Connection,
}

impl Session {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside a transaction: commit when it returns `Ok`, roll back otherwise.
    pub fn with_transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let tx = self.conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

/// AND-combined SQL conditions with positional parameters.
#[derive(Debug, Clone, Default)]
pub struct WhereClause {
    conditions: Vec<String>,
    params: Vec<Value>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition containing exactly one `?` placeholder.
    pub fn push(&mut self, condition: &str, value: impl Into<Value>) {
        self.conditions.push(condition.to_string());
        self.params.push(value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn to_sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseSummary {
    pub observation_count: i64,
    pub station_count: i64,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub statistic_count: i64,
    pub year_range: Option<(i32, i32)>,
}

impl fmt::Display for DatabaseSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dates = match self.date_range {
            Some((first, last)) => format!("{} to {}", first, last),
            None => "no observations".to_string(),
        };
        let years = match self.year_range {
            Some((first, last)) => format!("{} to {}", first, last),
            None => "no statistics".to_string(),
        };

        write!(
            f,
            "Observations: {} across {} stations\n\
            Date Range: {}\n\
            Annual Statistics: {}\n\
            Year Range: {}",
            self.observation_count, self.station_count, dates, self.statistic_count, years
        )
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tempfile::TempDir;

    pub struct TestDatabase {
        pub _tmp: TempDir,
        pub db: Database,
    }

    pub fn create_test_database() -> TestDatabase {
        let tmp = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open(tmp.path().join("weather.db")).expect("Failed to open database");
        TestDatabase { _tmp: tmp, db }
    }
}
