//! Session persistence
//!
//! One row per session; the whole `SessionState` is stored as JSON and
//! replaced on every save.

mod schema;

pub use schema::*;

use crate::state_machine::SessionState;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Session state could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    ttl: chrono::Duration,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P, ttl: Duration) -> DbResult<Self> {
        Self::init(Connection::open(path)?, ttl)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory(ttl: Duration) -> DbResult<Self> {
        Self::init(Connection::open_in_memory()?, ttl)
    }

    fn init(conn: Connection, ttl: Duration) -> DbResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(36_500)),
        })
    }

    // ==================== Session Operations ====================

    /// Load a session record regardless of age
    pub fn get_session(&self, id: &str) -> DbResult<Option<SessionRecord>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT state, created_at, updated_at FROM sessions WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((state_json, created_at, updated_at)) = row else {
            return Ok(None);
        };
        Ok(Some(SessionRecord {
            state: serde_json::from_str(&state_json)?,
            created_at: parse_datetime(&created_at),
            updated_at: parse_datetime(&updated_at),
        }))
    }

    /// Load a live session; expired sessions are deleted and reported as absent
    pub fn load_session(&self, id: &str) -> DbResult<Option<SessionState>> {
        let Some(record) = self.get_session(id)? else {
            return Ok(None);
        };
        if record.is_expired(Utc::now(), self.ttl) {
            tracing::info!(session_id = %id, created_at = %record.created_at, "Session expired, starting fresh");
            self.delete_session(id)?;
            return Ok(None);
        }
        Ok(Some(record.state))
    }

    /// Insert or replace a session
    pub fn save_session(&self, id: &str, state: &SessionState) -> DbResult<()> {
        let state_json = serde_json::to_string(state)?;
        let now = timestamp(Utc::now());
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sessions (id, state, current_stage, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(id) DO UPDATE SET
                state = excluded.state,
                current_stage = excluded.current_stage,
                updated_at = excluded.updated_at",
            params![id, state_json, state.current_stage, now],
        )?;
        Ok(())
    }

    /// Delete a session; deleting a missing session is not an error
    pub fn delete_session(&self, id: &str) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Delete every session older than the TTL, returning how many were removed
    pub fn purge_expired(&self) -> DbResult<usize> {
        let cutoff = timestamp(Utc::now() - self.ttl);
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute("DELETE FROM sessions WHERE updated_at < ?1", params![cutoff])?;
        if removed > 0 {
            tracing::info!(removed, "Purged expired sessions");
        }
        Ok(removed)
    }

    /// Number of stored sessions
    #[cfg(test)]
    pub fn session_count(&self) -> DbResult<i64> {
        let conn = self.conn.lock().unwrap();
        Ok(conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?)
    }

    #[cfg(test)]
    fn backdate(&self, id: &str, updated_at: DateTime<Utc>) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE sessions SET updated_at = ?2 WHERE id = ?1",
            params![id, timestamp(updated_at)],
        )?;
        Ok(())
    }
}

/// Fixed-width UTC timestamps so stored values compare correctly as text
fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::ConversationTurn;
    use crate::llm::MessageRole;

    const HOUR: Duration = Duration::from_secs(3600);

    fn sample_state() -> SessionState {
        SessionState {
            current_stage: 3,
            completed_stages: vec![1, 2],
            history: vec![
                ConversationTurn::new(MessageRole::User, "I want to ship v2"),
                ConversationTurn::new(MessageRole::Assistant, "Goal confirmed: ship v2."),
            ],
            goal: Some("ship v2".into()),
            sentiment_ema: 1.5,
            ..SessionState::default()
        }
    }

    #[test]
    fn test_save_and_load_session() {
        let db = Database::open_in_memory(HOUR).unwrap();
        assert!(db.load_session("s-1").unwrap().is_none());

        let state = sample_state();
        db.save_session("s-1", &state).unwrap();
        assert_eq!(db.load_session("s-1").unwrap(), Some(state));
    }

    #[test]
    fn test_save_replaces_state() {
        let db = Database::open_in_memory(HOUR).unwrap();
        db.save_session("s-1", &sample_state()).unwrap();
        let created = db.get_session("s-1").unwrap().unwrap().created_at;

        db.save_session("s-1", &SessionState::default()).unwrap();
        let record = db.get_session("s-1").unwrap().unwrap();
        assert_eq!(record.state, SessionState::default());
        assert_eq!(record.created_at, created);
        assert_eq!(db.session_count().unwrap(), 1);
    }

    #[test]
    fn test_expired_session_is_dropped_on_load() {
        let db = Database::open_in_memory(HOUR).unwrap();
        db.save_session("old", &sample_state()).unwrap();
        db.backdate("old", Utc::now() - chrono::Duration::hours(2)).unwrap();

        assert!(db.load_session("old").unwrap().is_none());
        assert_eq!(db.session_count().unwrap(), 0);
    }

    #[test]
    fn test_purge_expired() {
        let db = Database::open_in_memory(HOUR).unwrap();
        db.save_session("old", &sample_state()).unwrap();
        db.save_session("fresh", &sample_state()).unwrap();
        db.backdate("old", Utc::now() - chrono::Duration::hours(3)).unwrap();

        assert_eq!(db.purge_expired().unwrap(), 1);
        assert!(db.load_session("fresh").unwrap().is_some());
    }

    #[test]
    fn test_delete_session() {
        let db = Database::open_in_memory(HOUR).unwrap();
        db.save_session("s-1", &sample_state()).unwrap();
        db.delete_session("s-1").unwrap();
        db.delete_session("missing").unwrap();
        assert!(db.load_session("s-1").unwrap().is_none());
    }

    #[test]
    fn test_on_disk_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.db");
        {
            let db = Database::open(&path, HOUR).unwrap();
            db.save_session("s-1", &sample_state()).unwrap();
        }
        let reopened = Database::open(&path, HOUR).unwrap();
        assert_eq!(reopened.load_session("s-1").unwrap(), Some(sample_state()));
    }
}
