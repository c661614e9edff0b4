//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees
//! that migrations have run and the broadcast room exists before any other
//! operation.

use std::path::{Path, PathBuf};

use chrono::Utc;
use directories::ProjectDirs;
use rusqlite::{params, Connection};

use studyhall_shared::constants::{BROADCAST_ROOM_ID, BROADCAST_ROOM_NAME, SYSTEM_SENDER};

use crate::error::{Result, StoreError};
use crate::migrations;
use crate::models::GroupKind;

/// File name of the SQLite database inside the data directory.
pub const DB_FILE_NAME: &str = "studyhall.db";

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/studyhall/studyhall.db`
    /// - macOS:   `~/Library/Application Support/com.studyhall.studyhall/studyhall.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\studyhall\studyhall\data\studyhall.db`
    pub fn new() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("com", "studyhall", "studyhall").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join(DB_FILE_NAME);

        tracing::info!(path = %db_path.display(), "opening database");

        Self::open_at(&db_path)
    }

    /// Open (or create) a database at an explicit path.
    ///
    /// This is useful for tests and for embedding the store inside custom
    /// directory layouts.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Recommended SQLite settings.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        // Run schema migrations.
        migrations::run_migrations(&conn)?;

        let db = Self { conn };

        // The broadcast room must exist before any conversation logic runs.
        db.ensure_broadcast_room()?;

        Ok(db)
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    ///
    /// Callers should prefer the typed CRUD helpers, but direct access is
    /// occasionally needed for transactions or ad-hoc queries.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return a mutable reference to the underlying connection.
    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }

    /// Insert the broadcast room group if it is missing.
    ///
    /// The room is created with an empty member list and the system user as
    /// its creator; membership is never checked for broadcast access.
    fn ensure_broadcast_room(&self) -> Result<()> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO groups (id, name, creator, created_at, kind)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                BROADCAST_ROOM_ID,
                BROADCAST_ROOM_NAME,
                SYSTEM_SENDER,
                Utc::now().to_rfc3339(),
                GroupKind::Broadcast.as_str(),
            ],
        )?;

        if inserted > 0 {
            tracing::info!(id = BROADCAST_ROOM_ID, "created broadcast room");
        }

        Ok(())
    }

    /// Post the first-run greeting into the broadcast room.
    ///
    /// Only runs when the message log is completely empty, so clearing a
    /// conversation later never resurrects the greeting.  Returns whether
    /// anything was seeded.
    pub fn seed_welcome_messages(&self) -> Result<bool> {
        if self.count_messages(None)? != 0 {
            return Ok(false);
        }

        let now = Utc::now();
        self.insert_message(
            SYSTEM_SENDER,
            BROADCAST_ROOM_ID,
            "Welcome to the study motivation chat room!",
            now,
        )?;
        self.insert_message(
            SYSTEM_SENDER,
            BROADCAST_ROOM_ID,
            "Share your study progress here and cheer your friends on!",
            now,
        )?;

        tracing::info!("seeded welcome messages");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_broadcast_room() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        let db = Database::open_at(&path).expect("should open");
        assert!(db.path().is_some());

        let room = db.get_group(BROADCAST_ROOM_ID).unwrap();
        assert_eq!(room.kind, GroupKind::Broadcast);
        assert_eq!(room.creator, SYSTEM_SENDER);
        assert!(room.members.is_empty());
    }

    #[test]
    fn reopen_keeps_single_broadcast_room() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        drop(Database::open_at(&path).unwrap());
        let db = Database::open_at(&path).unwrap();

        let groups = db.list_groups().unwrap();
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn welcome_messages_seed_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open_at(&path).unwrap();

        assert!(db.seed_welcome_messages().unwrap());
        assert_eq!(db.count_messages(Some(BROADCAST_ROOM_ID)).unwrap(), 2);

        // Second call is a no-op.
        assert!(!db.seed_welcome_messages().unwrap());
        assert_eq!(db.count_messages(None).unwrap(), 2);

        let messages = db.messages_for_conversation(BROADCAST_ROOM_ID, None).unwrap();
        assert!(messages.iter().all(|m| m.sender == SYSTEM_SENDER));
    }
}
