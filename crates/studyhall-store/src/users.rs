//! CRUD operations for [`User`] records.

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::User;

impl Database {
    /// Insert a new user.
    pub fn insert_user(&self, user: &User) -> Result<()> {
        self.conn().execute(
            "INSERT INTO users (username, password, created_at)
             VALUES (?1, ?2, ?3)",
            params![user.username, user.password, user.created_at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Fetch a single user by username.
    pub fn get_user(&self, username: &str) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT username, password, created_at
                 FROM users
                 WHERE username = ?1",
                params![username],
                row_to_user,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Whether a username is registered.
    pub fn user_exists(&self, username: &str) -> Result<bool> {
        let n: i64 = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
            params![username],
            |row| row.get(0),
        )?;
        Ok(n != 0)
    }

    /// Number of registered users.
    pub fn count_users(&self) -> Result<i64> {
        let n: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(n)
    }

    /// List all registered usernames, sorted for determinism.
    pub fn list_usernames(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT username FROM users ORDER BY username ASC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }
}

/// Map a `rusqlite::Row` to a [`User`].
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let username: String = row.get(0)?;
    let password: String = row.get(1)?;
    let created_str: String = row.get(2)?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(User {
        username,
        password,
        created_at,
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
    fn insert_and_get_round_trip() {
        let (_dir, db) = test_db();

        let user = User {
            username: "alice".into(),
            password: "pass1".into(),
            created_at: Utc::now(),
        };
        db.insert_user(&user).unwrap();

        let loaded = db.get_user("alice").unwrap();
        assert_eq!(loaded.username, "alice");
        assert_eq!(loaded.password, "pass1");

        assert!(db.user_exists("alice").unwrap());
        assert!(!db.user_exists("bob").unwrap());
        assert_eq!(db.count_users().unwrap(), 1);
    }

    #[test]
    fn duplicate_username_is_rejected_by_schema() {
        let (_dir, db) = test_db();

        let user = User {
            username: "alice".into(),
            password: "pass1".into(),
            created_at: Utc::now(),
        };
        db.insert_user(&user).unwrap();
        assert!(db.insert_user(&user).is_err());
        assert_eq!(db.count_users().unwrap(), 1);
    }

    #[test]
    fn unknown_user_is_not_found() {
        let (_dir, db) = test_db();
        assert!(matches!(db.get_user("ghost"), Err(StoreError::NotFound)));
    }
}
