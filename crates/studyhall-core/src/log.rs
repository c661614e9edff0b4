//! The append-only message log.
//!
//! Every append consults the [`ConversationResolver`] inside the same
//! critical section, so a send can never slip past an access check that a
//! concurrent roster or friend change just invalidated.

use std::sync::MutexGuard;

use chrono::Utc;
use tracing::debug;

use studyhall_shared::constants::BROADCAST_ROOM_ID;
use studyhall_shared::conversation;
use studyhall_store::{Database, Message};

use crate::error::{ChatError, Result};
use crate::resolver::ConversationResolver;
use crate::StoreHandle;

/// Owns the persisted, ordered message sequence.
#[derive(Clone)]
pub struct MessageLog {
    db: StoreHandle,
}

impl MessageLog {
    pub fn new(db: StoreHandle) -> Self {
        Self { db }
    }

    fn db(&self) -> Result<MutexGuard<'_, Database>> {
        self.db.lock().map_err(|_| ChatError::Poisoned)
    }

    /// Append a message.
    ///
    /// `conversation_id` defaults to the broadcast room when omitted, the
    /// documented default for "send without picking a conversation".
    pub fn send(
        &self,
        sender: &str,
        content: &str,
        conversation_id: Option<&str>,
    ) -> Result<Message> {
        if sender.trim().is_empty() {
            return Err(ChatError::Validation("sender must not be empty".into()));
        }
        if content.trim().is_empty() {
            return Err(ChatError::Validation(
                "message content must not be empty".into(),
            ));
        }
        let conversation_id = conversation_id.unwrap_or(BROADCAST_ROOM_ID);

        let db = self.db()?;
        if !ConversationResolver::check_access(&db, sender, conversation_id)? {
            return Err(ChatError::AccessDenied);
        }

        let message = db.insert_message(sender, conversation_id, content, Utc::now())?;
        debug!(sender, conversation = conversation_id, "message appended");
        Ok(message)
    }

    /// All messages of a conversation in chronological order, without an
    /// access check; the UI uses this for conversations it already resolved.
    pub fn messages_for(&self, conversation_id: &str) -> Result<Vec<Message>> {
        Ok(self.db()?.messages_for_conversation(conversation_id, None)?)
    }

    /// The latest `limit` messages of a conversation, oldest first.
    pub fn recent_messages(&self, conversation_id: &str, limit: usize) -> Result<Vec<Message>> {
        Ok(self
            .db()?
            .messages_for_conversation(conversation_id, Some(limit))?)
    }

    /// Messages of a conversation as seen by one user.
    ///
    /// `conversation_id` defaults to the broadcast room when omitted.  A
    /// user without access gets an empty list, not an error.
    pub fn messages_for_user(
        &self,
        user: &str,
        conversation_id: Option<&str>,
    ) -> Result<Vec<Message>> {
        let conversation_id = conversation_id.unwrap_or(BROADCAST_ROOM_ID);

        let db = self.db()?;
        if !ConversationResolver::check_access(&db, user, conversation_id)? {
            return Ok(Vec::new());
        }
        Ok(db.messages_for_conversation(conversation_id, None)?)
    }

    /// History of the personal chat between two users.
    pub fn personal_history(&self, user_a: &str, user_b: &str) -> Result<Vec<Message>> {
        let id = conversation::personal_chat_id(user_a, user_b);
        self.messages_for(&id)
    }

    /// Messages authored by one user; `None` searches every conversation.
    pub fn sent_by(&self, sender: &str, conversation_id: Option<&str>) -> Result<Vec<Message>> {
        Ok(self.db()?.messages_from_sender(sender, conversation_id)?)
    }

    /// Case-insensitive substring search; `None` searches every
    /// conversation.
    pub fn search(&self, keyword: &str, conversation_id: Option<&str>) -> Result<Vec<Message>> {
        Ok(self.db()?.search_messages(keyword, conversation_id)?)
    }

    /// Remove every message of one conversation.  All-or-nothing and
    /// idempotent; returns how many messages were removed.
    pub fn clear(&self, conversation_id: &str) -> Result<usize> {
        let db = self.db()?;
        let removed = db.delete_messages_for_conversation(conversation_id)?;
        debug!(conversation = conversation_id, removed, "conversation cleared");
        Ok(removed)
    }

    /// Remove the entire log.
    pub fn clear_all(&self) -> Result<usize> {
        let db = self.db()?;
        let removed = db.delete_all_messages()?;
        debug!(removed, "message log cleared");
        Ok(removed)
    }

    /// Number of messages; `None` counts every conversation.
    pub fn count(&self, conversation_id: Option<&str>) -> Result<i64> {
        Ok(self.db()?.count_messages(conversation_id)?)
    }
}
