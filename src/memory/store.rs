//! SQLite-backed conversation store.

use crate::error::{AssistantError, Result};
use chrono::Utc;
use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One user/assistant exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// ISO-8601 timestamp of the exchange.
    pub timestamp: String,
    /// What the user said or typed.
    pub user_input: String,
    /// What the assistant answered.
    pub ai_response: String,
}

/// Conversation store.
///
/// Thread-safe via an internal `Mutex<Connection>`; all access is
/// serialized, which is plenty for the single-flight session loop.
pub struct ConversationStore {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl ConversationStore {
    /// Open (or create) the database at `path`, applying the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the
    /// database cannot be opened.
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(db_err)?;
        apply_schema(&conn)?;
        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
        })
    }

    /// Returns the database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one exchange, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns an error on insert failure.
    pub fn append(&self, user_input: &str, ai_response: &str) -> Result<()> {
        let conn = self.lock()?;
        let timestamp = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO conversations (timestamp, user_input, ai_response) VALUES (?1, ?2, ?3)",
            params![timestamp, user_input, ai_response],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// The most recent `limit` exchanges in chronological order.
    ///
    /// # Errors
    ///
    /// Returns an error on query failure.
    pub fn recent(&self, limit: usize) -> Result<Vec<Exchange>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT timestamp, user_input, ai_response FROM conversations \
                 ORDER BY id DESC LIMIT ?1",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(Exchange {
                    timestamp: row.get(0)?,
                    user_input: row.get(1)?,
                    ai_response: row.get(2)?,
                })
            })
            .map_err(db_err)?;

        let mut exchanges = Vec::new();
        for row in rows {
            exchanges.push(row.map_err(db_err)?);
        }
        // Query is newest-first; callers want chronological order.
        exchanges.reverse();
        Ok(exchanges)
    }

    /// Delete all stored exchanges, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error on delete failure.
    pub fn clear(&self) -> Result<usize> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM conversations", [])
            .map_err(db_err)
    }

    /// Human-readable memory status line.
    ///
    /// # Errors
    ///
    /// Returns an error on query failure.
    pub fn status(&self) -> Result<String> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))
            .map_err(db_err)?;
        Ok(format!("Memory contains {count} exchanges"))
    }

    /// Build a context-aware prompt from the recent exchange window.
    ///
    /// # Errors
    ///
    /// Returns an error on query failure.
    pub fn context_prompt(&self, current_input: &str, window: usize) -> Result<String> {
        let recent = self.recent(window)?;

        let mut prompt = String::from("Previous conversation context:\n");
        for exchange in &recent {
            prompt.push_str(&format!("User: {}\n", exchange.user_input));
            prompt.push_str(&format!("Assistant: {}\n\n", exchange.ai_response));
        }
        prompt.push_str(&format!("Current user input: {current_input}\n"));
        prompt.push_str("Please respond considering the conversation history above.");
        Ok(prompt)
    }

    /// Store a long-term context value, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns an error on insert failure.
    pub fn save_context(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        let timestamp = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT OR REPLACE INTO context (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, timestamp],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Look up a long-term context value.
    ///
    /// # Errors
    ///
    /// Returns an error on query failure.
    pub fn get_context(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT value FROM context WHERE key = ?1")
            .map_err(db_err)?;
        let mut rows = stmt.query(params![key]).map_err(db_err)?;
        match rows.next().map_err(db_err)? {
            Some(row) => Ok(Some(row.get(0).map_err(db_err)?)),
            None => Ok(None),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AssistantError::Memory("store mutex poisoned".to_owned()))
    }
}

fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS conversations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT NOT NULL,
            user_input TEXT NOT NULL,
            ai_response TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS context (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            key TEXT UNIQUE NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );",
    )
    .map_err(db_err)
}

fn db_err(e: rusqlite::Error) -> AssistantError {
    AssistantError::Memory(e.to_string())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn temp_store() -> (tempfile::TempDir, ConversationStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConversationStore::new(&dir.path().join("valet.db")).unwrap();
        (dir, store)
    }

    #[test]
    fn append_and_recent_round_trip() {
        let (_dir, store) = temp_store();
        for i in 0..8 {
            store
                .append(&format!("question {i}"), &format!("answer {i}"))
                .unwrap();
        }

        let recent = store.recent(3).unwrap();
        assert_eq!(recent.len(), 3);
        // Chronological order: oldest of the window first.
        assert_eq!(recent[0].user_input, "question 5");
        assert_eq!(recent[2].user_input, "question 7");
        assert_eq!(recent[2].ai_response, "answer 7");
    }

    #[test]
    fn recent_on_empty_store_is_empty() {
        let (_dir, store) = temp_store();
        assert!(store.recent(5).unwrap().is_empty());
    }

    #[test]
    fn clear_removes_all_exchanges() {
        let (_dir, store) = temp_store();
        store.append("hello", "hi").unwrap();
        store.append("bye", "goodbye").unwrap();

        assert_eq!(store.clear().unwrap(), 2);
        assert!(store.recent(10).unwrap().is_empty());
        assert_eq!(store.status().unwrap(), "Memory contains 0 exchanges");
    }

    #[test]
    fn status_counts_exchanges() {
        let (_dir, store) = temp_store();
        store.append("a", "b").unwrap();
        assert_eq!(store.status().unwrap(), "Memory contains 1 exchanges");
    }

    #[test]
    fn context_prompt_includes_window_and_input() {
        let (_dir, store) = temp_store();
        store.append("what is rust", "a systems language").unwrap();

        let prompt = store.context_prompt("tell me more", 5).unwrap();
        assert!(prompt.contains("User: what is rust"));
        assert!(prompt.contains("Assistant: a systems language"));
        assert!(prompt.contains("Current user input: tell me more"));
    }

    #[test]
    fn context_round_trip_and_replace() {
        let (_dir, store) = temp_store();
        assert_eq!(store.get_context("user_name").unwrap(), None);

        store.save_context("user_name", "Ada").unwrap();
        assert_eq!(
            store.get_context("user_name").unwrap().as_deref(),
            Some("Ada")
        );

        store.save_context("user_name", "Grace").unwrap();
        assert_eq!(
            store.get_context("user_name").unwrap().as_deref(),
            Some("Grace")
        );
    }

    #[test]
    fn reopen_preserves_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("valet.db");
        {
            let store = ConversationStore::new(&path).unwrap();
            store.append("persisted", "yes").unwrap();
        }
        let store = ConversationStore::new(&path).unwrap();
        let recent = store.recent(1).unwrap();
        assert_eq!(recent[0].user_input, "persisted");
    }
}
