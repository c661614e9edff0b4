//! Conversation identifier algebra.
//!
//! Every message stream in the application is addressed by a string id from
//! one of three disjoint families:
//!
//! - the fixed broadcast room id ([`BROADCAST_ROOM_ID`]),
//! - personal chats: `PM_<lower>_<upper>` with the two participant
//!   usernames sorted ascending, so the id is identical regardless of which
//!   side derives it,
//! - group ids: opaque generated tokens.
//!
//! The functions here are pure; access decisions live in the core crate.

use serde::{Deserialize, Serialize};

use crate::constants::{
    BROADCAST_ROOM_ID, PERSONAL_CHAT_PREFIX, PERSONAL_CHAT_SEPARATOR,
};

/// The three shapes a conversation id can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    Broadcast,
    Personal,
    Group,
}

/// Derive the canonical id of the personal chat between two users.
///
/// The pair is sorted lexicographically before joining, so
/// `personal_chat_id(a, b) == personal_chat_id(b, a)`.
pub fn personal_chat_id(user_a: &str, user_b: &str) -> String {
    let (lower, upper) = if user_a <= user_b {
        (user_a, user_b)
    } else {
        (user_b, user_a)
    };
    format!("{PERSONAL_CHAT_PREFIX}{lower}{PERSONAL_CHAT_SEPARATOR}{upper}")
}

/// Whether an id belongs to the personal-chat family.
pub fn is_personal_chat_id(id: &str) -> bool {
    id.starts_with(PERSONAL_CHAT_PREFIX)
}

/// Parse the two participant usernames back out of a personal chat id.
///
/// Returns `None` when the id is not a personal chat id or does not split
/// into exactly the expected tokens; callers must treat `None` as "not a
/// valid personal chat", never as an empty conversation.
pub fn participants_of_personal_chat(id: &str) -> Option<(String, String)> {
    if !is_personal_chat_id(id) {
        return None;
    }

    let parts: Vec<&str> = id.split(PERSONAL_CHAT_SEPARATOR).collect();
    if parts.len() != 3 {
        return None;
    }
    if parts[1].is_empty() || parts[2].is_empty() {
        return None;
    }

    Some((parts[1].to_string(), parts[2].to_string()))
}

/// Classify an id by its shape alone.
///
/// Anything that is neither the broadcast id nor `PM_`-prefixed is assumed
/// to be a group id; whether such a group actually exists is a question for
/// the stores, not for this function.
pub fn kind_of(id: &str) -> ConversationKind {
    if id == BROADCAST_ROOM_ID {
        ConversationKind::Broadcast
    } else if is_personal_chat_id(id) {
        ConversationKind::Personal
    } else {
        ConversationKind::Group
    }
}
