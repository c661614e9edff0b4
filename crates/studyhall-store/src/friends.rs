//! Friend-edge storage.
//!
//! An edge between two users is stored as two directed rows, one per
//! direction.  Both rows are always written or removed inside a single
//! transaction, so the graph can never be observed half-symmetric.

use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    /// Insert both directions of a friend edge atomically.
    pub fn insert_friend_edge(&mut self, user_a: &str, user_b: &str) -> Result<()> {
        let tx = self.conn_mut().transaction()?;
        tx.execute(
            "INSERT INTO friends (username, friend) VALUES (?1, ?2)",
            params![user_a, user_b],
        )?;
        tx.execute(
            "INSERT INTO friends (username, friend) VALUES (?1, ?2)",
            params![user_b, user_a],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Remove both directions of a friend edge atomically.
    ///
    /// Returns `true` if an edge existed.
    pub fn delete_friend_edge(&mut self, user_a: &str, user_b: &str) -> Result<bool> {
        let tx = self.conn_mut().transaction()?;
        let removed = tx.execute(
            "DELETE FROM friends WHERE username = ?1 AND friend = ?2",
            params![user_a, user_b],
        )?;
        tx.execute(
            "DELETE FROM friends WHERE username = ?1 AND friend = ?2",
            params![user_b, user_a],
        )?;
        tx.commit()?;
        Ok(removed > 0)
    }

    /// List a user's friends in the order the edges were added.
    ///
    /// Unknown users simply have no rows; the result is an empty list, not
    /// an error.
    pub fn friends_of(&self, username: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn().prepare(
            "SELECT friend FROM friends WHERE username = ?1 ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map(params![username], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Every username that appears in the friend graph.
    ///
    /// Both directions of an edge are stored, so the `username` column alone
    /// already covers every participant.
    pub fn known_friend_usernames(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT DISTINCT username FROM friends ORDER BY username ASC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Whether a friend edge exists between two users.
    pub fn are_friends(&self, user_a: &str, user_b: &str) -> Result<bool> {
        let n: i64 = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM friends WHERE username = ?1 AND friend = ?2)",
            params![user_a, user_b],
            |row| row.get(0),
        )?;
        Ok(n != 0)
    }
}
