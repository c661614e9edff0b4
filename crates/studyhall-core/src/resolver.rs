//! Conversation access decisions and naming.
//!
//! The resolver owns no persisted state; it is pure logic over the record
//! sets behind the shared database handle.  Every read or write of a
//! conversation goes through [`ConversationResolver::can_access`], so the
//! access rule lives in exactly one place.

use std::sync::MutexGuard;

use serde::Serialize;

use studyhall_shared::constants::{BROADCAST_ROOM_ID, BROADCAST_ROOM_NAME};
use studyhall_shared::conversation::{self, ConversationKind};
use studyhall_store::{Database, GroupKind, Message, StoreError};

use crate::error::{ChatError, Result};
use crate::StoreHandle;

/// One row of the recent-conversation listing handed to the UI.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub id: String,
    pub name: String,
    pub kind: ConversationKind,
    pub last_message: Option<Message>,
}

/// Decides, for every send and read, whether a user may touch a
/// conversation, and resolves display names for conversation ids.
#[derive(Clone)]
pub struct ConversationResolver {
    db: StoreHandle,
}

impl ConversationResolver {
    pub fn new(db: StoreHandle) -> Self {
        Self { db }
    }

    fn db(&self) -> Result<MutexGuard<'_, Database>> {
        self.db.lock().map_err(|_| ChatError::Poisoned)
    }

    /// Whether `user` may read from and write to `conversation_id`.
    ///
    /// - broadcast: open to everyone, registered or not;
    /// - personal chat: the user must be one of the two participants *and*
    ///   the two must currently be friends;
    /// - group: the user must be on the roster;
    /// - anything else: denied.
    pub fn can_access(&self, user: &str, conversation_id: &str) -> Result<bool> {
        let db = self.db()?;
        Ok(Self::check_access(&db, user, conversation_id)?)
    }

    /// Access decision against an already-locked database.
    ///
    /// The message log shares this so that its access check and append run
    /// inside one critical section.
    pub(crate) fn check_access(
        db: &Database,
        user: &str,
        conversation_id: &str,
    ) -> std::result::Result<bool, StoreError> {
        match conversation::kind_of(conversation_id) {
            ConversationKind::Broadcast => Ok(true),
            ConversationKind::Personal => {
                let Some((a, b)) = conversation::participants_of_personal_chat(conversation_id)
                else {
                    return Ok(false);
                };
                if user != a && user != b {
                    return Ok(false);
                }
                // A pair chat stays open only while the two are friends.
                db.are_friends(&a, &b)
            }
            ConversationKind::Group => db.is_group_member(conversation_id, user),
        }
    }

    /// Display name of a conversation, relative to the viewer.
    ///
    /// A personal chat is named after the *other* participant.  Unknown or
    /// malformed ids come back unchanged; that is a fallback, not an error.
    pub fn conversation_name(&self, viewer: &str, conversation_id: &str) -> Result<String> {
        match conversation::kind_of(conversation_id) {
            ConversationKind::Broadcast => Ok(BROADCAST_ROOM_NAME.to_string()),
            ConversationKind::Personal => {
                let Some((a, b)) = conversation::participants_of_personal_chat(conversation_id)
                else {
                    return Ok(conversation_id.to_string());
                };
                if viewer == a {
                    Ok(b)
                } else if viewer == b {
                    Ok(a)
                } else {
                    Ok(conversation_id.to_string())
                }
            }
            ConversationKind::Group => {
                let db = self.db()?;
                match db.get_group(conversation_id) {
                    Ok(group) => Ok(group.name),
                    Err(StoreError::NotFound) => Ok(conversation_id.to_string()),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    /// The conversations a user would see in their sidebar.
    ///
    /// The broadcast room is always present and pinned first.  The rest is
    /// one entry per friend (the personal chat, named after the friend) and
    /// one per non-broadcast group membership, sorted by last-message time
    /// descending; entries without messages sink to the end, ties break on
    /// the conversation id so the order is deterministic.
    pub fn recent_conversations_for(&self, user: &str) -> Result<Vec<ConversationSummary>> {
        let db = self.db()?;

        let broadcast_name = match db.get_group(BROADCAST_ROOM_ID) {
            Ok(group) => group.name,
            Err(StoreError::NotFound) => BROADCAST_ROOM_NAME.to_string(),
            Err(e) => return Err(e.into()),
        };
        let mut summaries = vec![ConversationSummary {
            id: BROADCAST_ROOM_ID.to_string(),
            name: broadcast_name,
            kind: ConversationKind::Broadcast,
            last_message: db.latest_message_for(BROADCAST_ROOM_ID)?,
        }];

        let mut rest = Vec::new();

        for friend in db.friends_of(user)? {
            let id = conversation::personal_chat_id(user, &friend);
            rest.push(ConversationSummary {
                last_message: db.latest_message_for(&id)?,
                id,
                name: friend,
                kind: ConversationKind::Personal,
            });
        }

        for group in db.groups_with_member(user)? {
            if group.kind == GroupKind::Broadcast {
                continue;
            }
            rest.push(ConversationSummary {
                last_message: db.latest_message_for(&group.id)?,
                id: group.id,
                name: group.name,
                kind: ConversationKind::Group,
            });
        }

        rest.sort_by(|a, b| {
            let ta = a.last_message.as_ref().map(|m| m.timestamp);
            let tb = b.last_message.as_ref().map(|m| m.timestamp);
            // None sorts after every Some here, pushing idle chats last.
            tb.cmp(&ta).then_with(|| a.id.cmp(&b.id))
        });

        summaries.extend(rest);
        Ok(summaries)
    }
}
