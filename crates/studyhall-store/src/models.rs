//! Domain model structs persisted in the local SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the UI layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered user.  The primary key is the username.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Unique, case-sensitive username.
    pub username: String,
    /// Password, stored and compared in plaintext.
    pub password: String,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

/// Distinguishes the single always-open broadcast room from ordinary
/// creator-administered groups.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Broadcast,
    Group,
}

impl GroupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKind::Broadcast => "broadcast",
            GroupKind::Group => "group",
        }
    }
}

/// A chat group.  The broadcast room is stored as a group with
/// [`GroupKind::Broadcast`], an empty member list and the fixed id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    /// Unique group identifier (UUID v4, or the fixed broadcast id).
    pub id: String,
    /// Human-readable group name.
    pub name: String,
    /// Username of the creator.  Fixed at creation, never transferred.
    pub creator: String,
    /// Member usernames in join order.  Always contains the creator for
    /// non-broadcast groups; empty for the broadcast room.
    pub members: Vec<String>,
    /// When the group was created.
    pub created_at: DateTime<Utc>,
    pub kind: GroupKind,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message.  Append-only; never edited after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Monotonically increasing row id; preserves insertion order even for
    /// messages sharing a timestamp.
    pub id: i64,
    /// Username of the sender, or the `"system"` sentinel.
    pub sender: String,
    /// Conversation this message belongs to (broadcast, personal or group).
    pub conversation_id: String,
    /// Message text.
    pub content: String,
    /// When the message was sent.
    pub timestamp: DateTime<Utc>,
}
