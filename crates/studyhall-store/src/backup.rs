//! JSON backup of the whole store.
//!
//! The payload is plain serde structs with string timestamps, so a backup
//! taken by one version of the application stays readable by later ones as
//! long as the field names survive.

use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::Result;
use crate::models::GroupKind;

/// Full backup payload — every record set, serialized to JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupPayload {
    /// ISO 8601 timestamp of when the backup was created
    pub created_at: String,
    /// App version that produced the backup
    pub version: String,
    pub users: Vec<BackupUser>,
    /// Directed friend rows, both directions, exactly as stored.
    pub friend_edges: Vec<BackupFriendEdge>,
    pub groups: Vec<BackupGroup>,
    pub messages: Vec<BackupMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupUser {
    pub username: String,
    pub password: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupFriendEdge {
    pub username: String,
    pub friend: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupGroup {
    pub id: String,
    pub name: String,
    pub creator: String,
    pub members: Vec<String>,
    pub created_at: String,
    pub kind: GroupKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupMessage {
    pub sender: String,
    pub conversation_id: String,
    pub content: String,
    pub timestamp: String,
}

/// Counters describing what an import actually added.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ImportStats {
    pub users_imported: usize,
    pub friend_edges_imported: usize,
    pub groups_imported: usize,
    pub messages_imported: usize,
}

impl Database {
    /// Export all users, friend edges, groups and messages into a
    /// serializable struct.
    pub fn export_backup(&self) -> Result<BackupPayload> {
        let mut users = Vec::new();
        for username in self.list_usernames()? {
            let user = self.get_user(&username)?;
            users.push(BackupUser {
                username: user.username,
                password: user.password,
                created_at: user.created_at.to_rfc3339(),
            });
        }

        let mut friend_edges = Vec::new();
        {
            let mut stmt = self
                .conn()
                .prepare("SELECT username, friend FROM friends ORDER BY rowid ASC")?;
            let rows = stmt.query_map([], |row| {
                Ok(BackupFriendEdge {
                    username: row.get(0)?,
                    friend: row.get(1)?,
                })
            })?;
            for row in rows {
                friend_edges.push(row?);
            }
        }

        let groups = self
            .list_groups()?
            .into_iter()
            .map(|g| BackupGroup {
                id: g.id,
                name: g.name,
                creator: g.creator,
                members: g.members,
                created_at: g.created_at.to_rfc3339(),
                kind: g.kind,
            })
            .collect();

        let messages = self
            .all_messages()?
            .into_iter()
            .map(|m| BackupMessage {
                sender: m.sender,
                conversation_id: m.conversation_id,
                content: m.content,
                timestamp: m.timestamp.to_rfc3339(),
            })
            .collect();

        Ok(BackupPayload {
            created_at: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            users,
            friend_edges,
            groups,
            messages,
        })
    }

    /// Import a backup payload, merging with existing data (INSERT OR IGNORE).
    ///
    /// Messages carry no stable identifier, so a message is skipped when an
    /// identical row (sender, conversation, content, timestamp) is already
    /// present.
    pub fn import_backup(&mut self, payload: &BackupPayload) -> Result<ImportStats> {
        let mut stats = ImportStats::default();

        let tx = self.conn_mut().transaction()?;

        for user in &payload.users {
            let created_at = chrono::DateTime::parse_from_rfc3339(&user.created_at)?;
            let res = tx.execute(
                "INSERT OR IGNORE INTO users (username, password, created_at)
                 VALUES (?1, ?2, ?3)",
                rusqlite::params![
                    user.username,
                    user.password,
                    created_at.with_timezone(&chrono::Utc).to_rfc3339(),
                ],
            );
            if matches!(res, Ok(1)) {
                stats.users_imported += 1;
            }
        }

        for edge in &payload.friend_edges {
            let res = tx.execute(
                "INSERT OR IGNORE INTO friends (username, friend) VALUES (?1, ?2)",
                rusqlite::params![edge.username, edge.friend],
            );
            if matches!(res, Ok(1)) {
                stats.friend_edges_imported += 1;
            }
        }

        for group in &payload.groups {
            let created_at = chrono::DateTime::parse_from_rfc3339(&group.created_at)?;
            let res = tx.execute(
                "INSERT OR IGNORE INTO groups (id, name, creator, created_at, kind)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    group.id,
                    group.name,
                    group.creator,
                    created_at.with_timezone(&chrono::Utc).to_rfc3339(),
                    group.kind.as_str(),
                ],
            );
            if matches!(res, Ok(1)) {
                stats.groups_imported += 1;
            }
            for member in &group.members {
                tx.execute(
                    "INSERT OR IGNORE INTO group_members (group_id, username) VALUES (?1, ?2)",
                    rusqlite::params![group.id, member],
                )?;
            }
        }

        for msg in &payload.messages {
            let timestamp = chrono::DateTime::parse_from_rfc3339(&msg.timestamp)?
                .with_timezone(&chrono::Utc)
                .to_rfc3339();

            let exists: i64 = tx.query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM messages
                     WHERE sender = ?1 AND conversation_id = ?2
                       AND content = ?3 AND timestamp = ?4
                 )",
                rusqlite::params![msg.sender, msg.conversation_id, msg.content, timestamp],
                |row| row.get(0),
            )?;
            if exists != 0 {
                continue;
            }

            tx.execute(
                "INSERT INTO messages (sender, conversation_id, content, timestamp)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![msg.sender, msg.conversation_id, msg.content, timestamp],
            )?;
            stats.messages_imported += 1;
        }

        tx.commit()?;
        Ok(stats)
    }

    /// Serialize a full backup to a pretty-printed JSON string.
    pub fn export_backup_json(&self) -> Result<String> {
        let payload = self.export_backup()?;
        Ok(serde_json::to_string_pretty(&payload)?)
    }

    /// Import a backup from its JSON representation.
    pub fn import_backup_json(&mut self, json: &str) -> Result<ImportStats> {
        let payload: BackupPayload = serde_json::from_str(json)?;
        self.import_backup(&payload)
    }
}
