//! CRUD operations for [`Message`] records.
//!
//! The message table is append-only; the only deletion is clearing a whole
//! conversation (or the whole log).  Insertion order is preserved through
//! the integer row id, which also breaks ties between messages sharing a
//! second-resolution timestamp.

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Message;

impl Database {
    /// Append a message and return it with its assigned row id.
    pub fn insert_message(
        &self,
        sender: &str,
        conversation_id: &str,
        content: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Message> {
        self.conn().execute(
            "INSERT INTO messages (sender, conversation_id, content, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![sender, conversation_id, content, timestamp.to_rfc3339()],
        )?;

        Ok(Message {
            id: self.conn().last_insert_rowid(),
            sender: sender.to_string(),
            conversation_id: conversation_id.to_string(),
            content: content.to_string(),
            timestamp,
        })
    }

    /// Messages of one conversation in chronological (insertion) order.
    ///
    /// With a limit, only the *latest* `limit` messages are returned, still
    /// in chronological order.
    pub fn messages_for_conversation(
        &self,
        conversation_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Message>> {
        match limit {
            None => {
                let mut stmt = self.conn().prepare(
                    "SELECT id, sender, conversation_id, content, timestamp
                     FROM messages
                     WHERE conversation_id = ?1
                     ORDER BY id ASC",
                )?;
                let rows = stmt.query_map(params![conversation_id], row_to_message)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(StoreError::Sqlite)
            }
            Some(limit) => {
                let mut stmt = self.conn().prepare(
                    "SELECT id, sender, conversation_id, content, timestamp
                     FROM messages
                     WHERE conversation_id = ?1
                     ORDER BY id DESC
                     LIMIT ?2",
                )?;
                let rows =
                    stmt.query_map(params![conversation_id, limit as i64], row_to_message)?;
                let mut messages = rows
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(StoreError::Sqlite)?;
                messages.reverse();
                Ok(messages)
            }
        }
    }

    /// The most recent message of a conversation, if any.
    pub fn latest_message_for(&self, conversation_id: &str) -> Result<Option<Message>> {
        let result = self.conn().query_row(
            "SELECT id, sender, conversation_id, content, timestamp
             FROM messages
             WHERE conversation_id = ?1
             ORDER BY id DESC
             LIMIT 1",
            params![conversation_id],
            row_to_message,
        );
        match result {
            Ok(message) => Ok(Some(message)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(other) => Err(StoreError::Sqlite(other)),
        }
    }

    /// Case-insensitive substring search over message content, optionally
    /// scoped to one conversation.
    ///
    /// Matching happens in Rust so that non-ASCII content folds the same way
    /// the rest of the application folds it.
    pub fn search_messages(
        &self,
        keyword: &str,
        conversation_id: Option<&str>,
    ) -> Result<Vec<Message>> {
        let needle = keyword.to_lowercase();
        let candidates = match conversation_id {
            Some(id) => self.messages_for_conversation(id, None)?,
            None => self.all_messages()?,
        };

        Ok(candidates
            .into_iter()
            .filter(|m| m.content.to_lowercase().contains(&needle))
            .collect())
    }

    /// Messages authored by one sender, optionally scoped to a conversation,
    /// in chronological order.
    pub fn messages_from_sender(
        &self,
        sender: &str,
        conversation_id: Option<&str>,
    ) -> Result<Vec<Message>> {
        match conversation_id {
            Some(id) => {
                let mut stmt = self.conn().prepare(
                    "SELECT id, sender, conversation_id, content, timestamp
                     FROM messages
                     WHERE sender = ?1 AND conversation_id = ?2
                     ORDER BY id ASC",
                )?;
                let rows = stmt.query_map(params![sender, id], row_to_message)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(StoreError::Sqlite)
            }
            None => {
                let mut stmt = self.conn().prepare(
                    "SELECT id, sender, conversation_id, content, timestamp
                     FROM messages
                     WHERE sender = ?1
                     ORDER BY id ASC",
                )?;
                let rows = stmt.query_map(params![sender], row_to_message)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(StoreError::Sqlite)
            }
        }
    }

    /// Delete every message of one conversation.  A single statement, so the
    /// delete is all-or-nothing.  Returns the number of rows removed.
    pub fn delete_messages_for_conversation(&self, conversation_id: &str) -> Result<usize> {
        let affected = self.conn().execute(
            "DELETE FROM messages WHERE conversation_id = ?1",
            params![conversation_id],
        )?;
        Ok(affected)
    }

    /// Delete the entire message log.  Returns the number of rows removed.
    pub fn delete_all_messages(&self) -> Result<usize> {
        let affected = self.conn().execute("DELETE FROM messages", [])?;
        Ok(affected)
    }

    /// Number of messages, optionally scoped to one conversation.
    pub fn count_messages(&self, conversation_id: Option<&str>) -> Result<i64> {
        let n: i64 = match conversation_id {
            Some(id) => self.conn().query_row(
                "SELECT COUNT(*) FROM messages WHERE conversation_id = ?1",
                params![id],
                |row| row.get(0),
            )?,
            None => self
                .conn()
                .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?,
        };
        Ok(n)
    }

    /// The whole log in insertion order.
    pub fn all_messages(&self) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, sender, conversation_id, content, timestamp
             FROM messages
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], row_to_message)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }
}

/// Map a `rusqlite::Row` to a [`Message`].
fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let id: i64 = row.get(0)?;
    let sender: String = row.get(1)?;
    let conversation_id: String = row.get(2)?;
    let content: String = row.get(3)?;
    let ts_str: String = row.get(4)?;

    let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Message {
        id,
        sender,
        conversation_id,
        content,
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    #[test]
    fn append_preserves_order() {
        let (_dir, db) = test_db();

        db.insert_message("alice", "BROADCAST_ROOM", "first", Utc::now())
            .unwrap();
        db.insert_message("bob", "BROADCAST_ROOM", "second", Utc::now())
            .unwrap();
        db.insert_message("alice", "PM_alice_bob", "elsewhere", Utc::now())
            .unwrap();

        let broadcast = db.messages_for_conversation("BROADCAST_ROOM", None).unwrap();
        assert_eq!(broadcast.len(), 2);
        assert_eq!(broadcast[0].content, "first");
        assert_eq!(broadcast[1].content, "second");

        let latest = db.latest_message_for("BROADCAST_ROOM").unwrap().unwrap();
        assert_eq!(latest.content, "second");
        assert!(db.latest_message_for("PM_no_one").unwrap().is_none());
    }

    #[test]
    fn limit_returns_latest_in_order() {
        let (_dir, db) = test_db();

        for i in 0..5 {
            db.insert_message("alice", "BROADCAST_ROOM", &format!("m{i}"), Utc::now())
                .unwrap();
        }

        let tail = db
            .messages_for_conversation("BROADCAST_ROOM", Some(2))
            .unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].content, "m3");
        assert_eq!(tail[1].content, "m4");
    }

    #[test]
    fn search_is_case_insensitive_and_scoped() {
        let (_dir, db) = test_db();

        db.insert_message("alice", "BROADCAST_ROOM", "Keep Going!", Utc::now())
            .unwrap();
        db.insert_message("bob", "PM_alice_bob", "going home", Utc::now())
            .unwrap();

        let global = db.search_messages("GOING", None).unwrap();
        assert_eq!(global.len(), 2);

        let scoped = db.search_messages("going", Some("PM_alice_bob")).unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].sender, "bob");
    }

    #[test]
    fn clearing_one_conversation_leaves_others_untouched() {
        let (_dir, db) = test_db();

        db.insert_message("alice", "BROADCAST_ROOM", "hello", Utc::now())
            .unwrap();
        db.insert_message("alice", "PM_alice_bob", "hey", Utc::now())
            .unwrap();

        assert_eq!(db.delete_messages_for_conversation("PM_alice_bob").unwrap(), 1);
        assert_eq!(db.count_messages(Some("PM_alice_bob")).unwrap(), 0);
        assert_eq!(db.count_messages(Some("BROADCAST_ROOM")).unwrap(), 1);

        // Idempotent.
        assert_eq!(db.delete_messages_for_conversation("PM_alice_bob").unwrap(), 0);
    }

    #[test]
    fn sender_filter() {
        let (_dir, db) = test_db();

        db.insert_message("alice", "BROADCAST_ROOM", "one", Utc::now())
            .unwrap();
        db.insert_message("bob", "BROADCAST_ROOM", "two", Utc::now())
            .unwrap();
        db.insert_message("alice", "PM_alice_bob", "three", Utc::now())
            .unwrap();

        assert_eq!(db.messages_from_sender("alice", None).unwrap().len(), 2);
        assert_eq!(
            db.messages_from_sender("alice", Some("BROADCAST_ROOM"))
                .unwrap()
                .len(),
            1
        );
    }
}
