//! Application composition root.
//!
//! [`ChatApp`] opens the one SQLite database and hands every service an
//! explicit reference to it.  Components never look each other up through a
//! registry; the UI reaches them as plain fields.

use std::path::Path;
use std::sync::{Arc, Mutex};

use studyhall_store::{Database, StoreError};

use crate::config::AppConfig;
use crate::error::Result;
use crate::log::MessageLog;
use crate::relationships::RelationshipStore;
use crate::resolver::ConversationResolver;
use crate::users::UserStore;
use crate::StoreHandle;

/// The wired-up chat core.  Cloning a field clones a handle to the same
/// underlying store.
pub struct ChatApp {
    pub users: UserStore,
    pub relationships: RelationshipStore,
    pub resolver: ConversationResolver,
    pub messages: MessageLog,
}

impl ChatApp {
    /// Open the application stores from configuration.
    ///
    /// On a brand-new installation this also posts the first-run greeting
    /// into the broadcast room.
    pub fn open(config: &AppConfig) -> Result<Self> {
        let db = match &config.data_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(StoreError::from)?;
                Database::open_at(&dir.join(studyhall_store::database::DB_FILE_NAME))?
            }
            None => Database::new()?,
        };
        db.seed_welcome_messages()?;

        Ok(Self::from_database(db))
    }

    /// Open against an explicit database path, with no first-run greeting.
    ///
    /// Used by tests and by embedders that manage their own layout.
    pub fn open_at(path: &Path) -> Result<Self> {
        Ok(Self::from_database(Database::open_at(path)?))
    }

    /// Wire the services around one shared database handle.
    pub fn from_database(db: Database) -> Self {
        let handle: StoreHandle = Arc::new(Mutex::new(db));

        Self {
            users: UserStore::new(handle.clone()),
            relationships: RelationshipStore::new(handle.clone()),
            resolver: ConversationResolver::new(handle.clone()),
            messages: MessageLog::new(handle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyhall_shared::constants::BROADCAST_ROOM_ID;
    use studyhall_shared::conversation;

    fn test_app() -> (tempfile::TempDir, ChatApp) {
        let dir = tempfile::tempdir().unwrap();
        let app = ChatApp::open_at(&dir.path().join("test.db")).unwrap();
        (dir, app)
    }

    #[test]
    fn broadcast_and_personal_chat_end_to_end() {
        let (_dir, app) = test_app();

        app.users.register("alice", "pass1").unwrap();
        app.users.register("bob", "pass2").unwrap();

        // Broadcast is open without any setup.
        app.messages.send("alice", "hi", None).unwrap();
        let broadcast = app.messages.messages_for(BROADCAST_ROOM_ID).unwrap();
        assert_eq!(broadcast.len(), 1);
        assert_eq!(broadcast[0].sender, "alice");
        assert_eq!(broadcast[0].content, "hi");

        // Friendship opens the pair chat for both sides.
        app.relationships.add_friend("alice", "bob").unwrap();
        assert_eq!(
            app.relationships.friends_of("alice").unwrap(),
            vec!["bob".to_string()]
        );
        assert_eq!(
            app.relationships.friends_of("bob").unwrap(),
            vec!["alice".to_string()]
        );

        let pair = conversation::personal_chat_id("alice", "bob");
        app.messages.send("alice", "hey", Some(&pair)).unwrap();

        let bob_view = app.messages.messages_for_user("bob", Some(&pair)).unwrap();
        assert_eq!(bob_view.len(), 1);
        assert_eq!(bob_view[0].content, "hey");

        // An outsider reading the same id gets nothing.
        assert!(app
            .messages
            .messages_for_user("eve", Some(&pair))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn group_membership_end_to_end() {
        let (_dir, app) = test_app();

        app.users.register("alice", "pass1").unwrap();
        app.users.register("bob", "pass2").unwrap();

        let group = app.relationships.create_group("bob", "study").unwrap();
        app.relationships
            .add_member(&group.id, "alice", "bob")
            .unwrap();

        // A non-creator cannot administer the roster.
        assert!(app
            .relationships
            .add_member(&group.id, "eve", "alice")
            .is_err());

        // The creator cannot remove themselves.
        assert!(app
            .relationships
            .remove_member(&group.id, "bob", "bob")
            .is_err());

        app.messages.send("alice", "studying?", Some(&group.id)).unwrap();

        app.relationships
            .remove_member(&group.id, "alice", "bob")
            .unwrap();
        assert!(!app.resolver.can_access("alice", &group.id).unwrap());
        assert!(matches!(
            app.messages.send("alice", "still here?", Some(&group.id)),
            Err(crate::ChatError::AccessDenied)
        ));
    }
}
