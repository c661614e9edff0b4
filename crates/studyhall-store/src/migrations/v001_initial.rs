//! v001 -- Initial schema creation.
//!
//! Creates the four record sets: `users`, `friends`, `groups` (with their
//! `group_members` roster), and `messages`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    username   TEXT PRIMARY KEY NOT NULL,
    password   TEXT NOT NULL,               -- plaintext
    created_at TEXT NOT NULL                -- ISO-8601 / RFC-3339
);

-- ----------------------------------------------------------------
-- Friend edges (both directions stored explicitly)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS friends (
    username TEXT NOT NULL,
    friend   TEXT NOT NULL,

    PRIMARY KEY (username, friend)
);

-- ----------------------------------------------------------------
-- Groups
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS groups (
    id         TEXT PRIMARY KEY NOT NULL,   -- UUID v4, or the fixed broadcast id
    name       TEXT NOT NULL,
    creator    TEXT NOT NULL,
    created_at TEXT NOT NULL,
    kind       TEXT NOT NULL                -- 'broadcast' | 'group'
);

-- Roster rows keep join order through their rowid.
CREATE TABLE IF NOT EXISTS group_members (
    group_id TEXT NOT NULL,
    username TEXT NOT NULL,

    PRIMARY KEY (group_id, username),
    FOREIGN KEY (group_id) REFERENCES groups(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_group_members_username ON group_members(username);

-- ----------------------------------------------------------------
-- Messages (append-only)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    sender          TEXT NOT NULL,
    conversation_id TEXT NOT NULL,
    content         TEXT NOT NULL,
    timestamp       TEXT NOT NULL           -- ISO-8601
);

CREATE INDEX IF NOT EXISTS idx_messages_conversation
    ON messages(conversation_id, id);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
