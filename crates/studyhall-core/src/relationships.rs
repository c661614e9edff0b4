//! The friend graph and group rosters.
//!
//! Friendship is symmetric: both directions of an edge are written and
//! removed inside one store transaction, so no caller ever observes a
//! one-sided friendship.  Groups are administered solely by their creator;
//! the broadcast room is a distinguished group that belongs to no one and
//! admits everyone.

use std::sync::MutexGuard;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use studyhall_shared::constants::BROADCAST_ROOM_ID;
use studyhall_store::{Database, Group, GroupKind, StoreError};

use crate::error::{ChatError, Result};
use crate::StoreHandle;

/// Owns the undirected friend graph and the group roster table.
#[derive(Clone)]
pub struct RelationshipStore {
    db: StoreHandle,
}

impl RelationshipStore {
    pub fn new(db: StoreHandle) -> Self {
        Self { db }
    }

    fn db(&self) -> Result<MutexGuard<'_, Database>> {
        self.db.lock().map_err(|_| ChatError::Poisoned)
    }

    // ------------------------------------------------------------------
    // Friends
    // ------------------------------------------------------------------

    /// Create a friend edge between two users.
    pub fn add_friend(&self, user: &str, friend: &str) -> Result<()> {
        if user == friend {
            return Err(ChatError::SelfReference(
                "You cannot add yourself as a friend".into(),
            ));
        }

        let mut db = self.db()?;
        if db.are_friends(user, friend)? {
            return Err(ChatError::AlreadyFriends);
        }

        db.insert_friend_edge(user, friend)?;
        info!(user, friend, "friend edge added");
        Ok(())
    }

    /// Remove the friend edge between two users.
    pub fn remove_friend(&self, user: &str, friend: &str) -> Result<()> {
        let mut db = self.db()?;
        if !db.are_friends(user, friend)? {
            return Err(ChatError::NotFriends);
        }

        db.delete_friend_edge(user, friend)?;
        info!(user, friend, "friend edge removed");
        Ok(())
    }

    /// A user's friends in the order they were added.  Unknown users get an
    /// empty list, not an error.
    pub fn friends_of(&self, user: &str) -> Result<Vec<String>> {
        Ok(self.db()?.friends_of(user)?)
    }

    /// Whether the two users are friends.
    pub fn is_friends_with(&self, user: &str, other: &str) -> Result<bool> {
        Ok(self.db()?.are_friends(user, other)?)
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    /// Create a group with the creator as its first member.
    pub fn create_group(&self, creator: &str, name: &str) -> Result<Group> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ChatError::Validation("group name must not be empty".into()));
        }

        let group = Group {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            creator: creator.to_string(),
            members: vec![creator.to_string()],
            created_at: Utc::now(),
            kind: GroupKind::Group,
        };

        let mut db = self.db()?;
        db.insert_group(&group)?;

        info!(group_id = %group.id, creator, name, "group created");
        Ok(group)
    }

    /// Add a member to a group.  Only the creator may do this.
    pub fn add_member(&self, group_id: &str, user: &str, acting_admin: &str) -> Result<()> {
        let db = self.db()?;
        let group = get_group_or_not_found(&db, group_id)?;

        if group.creator != acting_admin {
            return Err(ChatError::Forbidden(
                "only the group creator can add members".into(),
            ));
        }
        if group.members.iter().any(|m| m == user) {
            return Err(ChatError::AlreadyMember(user.to_string()));
        }

        db.add_group_member(group_id, user)?;
        info!(group_id, user, "group member added");
        Ok(())
    }

    /// Remove a member from a group.  Only the creator may do this, and the
    /// creator cannot remove themselves; dissolving a group is a separate
    /// (unimplemented) disband operation.
    pub fn remove_member(&self, group_id: &str, user: &str, acting_admin: &str) -> Result<()> {
        let db = self.db()?;
        let group = get_group_or_not_found(&db, group_id)?;

        if group.creator != acting_admin {
            return Err(ChatError::Forbidden(
                "only the group creator can remove members".into(),
            ));
        }
        if !group.members.iter().any(|m| m == user) {
            return Err(ChatError::NotMember(user.to_string()));
        }
        if user == acting_admin {
            return Err(ChatError::SelfReference(
                "The group creator cannot remove themselves; use disband to dissolve the group"
                    .into(),
            ));
        }

        db.remove_group_member(group_id, user)?;
        info!(group_id, user, "group member removed");
        Ok(())
    }

    /// Groups the user belongs to, excluding the broadcast room.
    pub fn groups_of(&self, user: &str) -> Result<Vec<Group>> {
        Ok(self
            .db()?
            .groups_with_member(user)?
            .into_iter()
            .filter(|g| g.kind != GroupKind::Broadcast)
            .collect())
    }

    /// Fetch one group, roster included.
    pub fn get_group(&self, group_id: &str) -> Result<Group> {
        let db = self.db()?;
        get_group_or_not_found(&db, group_id)
    }

    /// All groups, broadcast room included.
    pub fn all_groups(&self) -> Result<Vec<Group>> {
        Ok(self.db()?.list_groups()?)
    }

    /// The fixed id of the broadcast room.
    pub fn broadcast_id(&self) -> &'static str {
        BROADCAST_ROOM_ID
    }
}

fn get_group_or_not_found(db: &Database, group_id: &str) -> Result<Group> {
    match db.get_group(group_id) {
        Ok(group) => Ok(group),
        Err(StoreError::NotFound) => Err(ChatError::NotFound(format!("group '{group_id}'"))),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ChatApp;

    fn test_app() -> (tempfile::TempDir, ChatApp) {
        let dir = tempfile::tempdir().unwrap();
        let app = ChatApp::open_at(&dir.path().join("test.db")).unwrap();
        (dir, app)
    }

    #[test]
    fn friendship_is_symmetric() {
        let (_dir, app) = test_app();

        app.relationships.add_friend("alice", "bob").unwrap();
        assert_eq!(
            app.relationships.friends_of("alice").unwrap(),
            vec!["bob".to_string()]
        );
        assert_eq!(
            app.relationships.friends_of("bob").unwrap(),
            vec!["alice".to_string()]
        );

        app.relationships.remove_friend("bob", "alice").unwrap();
        assert!(app.relationships.friends_of("alice").unwrap().is_empty());
        assert!(app.relationships.friends_of("bob").unwrap().is_empty());
    }

    #[test]
    fn friend_edge_error_cases() {
        let (_dir, app) = test_app();

        assert!(matches!(
            app.relationships.add_friend("alice", "alice"),
            Err(ChatError::SelfReference(_))
        ));

        app.relationships.add_friend("alice", "bob").unwrap();
        assert!(matches!(
            app.relationships.add_friend("bob", "alice"),
            Err(ChatError::AlreadyFriends)
        ));

        assert!(matches!(
            app.relationships.remove_friend("alice", "carol"),
            Err(ChatError::NotFriends)
        ));
    }

    #[test]
    fn group_lifecycle_and_permissions() {
        let (_dir, app) = test_app();

        let group = app.relationships.create_group("bob", "  study  ").unwrap();
        assert_eq!(group.name, "study");
        assert_eq!(group.members, vec!["bob".to_string()]);

        app.relationships
            .add_member(&group.id, "alice", "bob")
            .unwrap();

        // Only the creator administers the roster.
        assert!(matches!(
            app.relationships.add_member(&group.id, "eve", "alice"),
            Err(ChatError::Forbidden(_))
        ));
        assert!(matches!(
            app.relationships.add_member(&group.id, "alice", "bob"),
            Err(ChatError::AlreadyMember(_))
        ));

        // The creator cannot remove themselves.
        assert!(matches!(
            app.relationships.remove_member(&group.id, "bob", "bob"),
            Err(ChatError::SelfReference(_))
        ));

        app.relationships
            .remove_member(&group.id, "alice", "bob")
            .unwrap();
        assert!(matches!(
            app.relationships.remove_member(&group.id, "alice", "bob"),
            Err(ChatError::NotMember(_))
        ));
    }

    #[test]
    fn blank_group_name_is_rejected() {
        let (_dir, app) = test_app();
        assert!(matches!(
            app.relationships.create_group("bob", "   "),
            Err(ChatError::Validation(_))
        ));
    }

    #[test]
    fn unknown_group_is_not_found() {
        let (_dir, app) = test_app();
        assert!(matches!(
            app.relationships.add_member("missing", "alice", "bob"),
            Err(ChatError::NotFound(_))
        ));
    }

    #[test]
    fn group_listings_handle_the_broadcast_room() {
        let (_dir, app) = test_app();

        let group = app.relationships.create_group("bob", "study").unwrap();

        let bobs = app.relationships.groups_of("bob").unwrap();
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].id, group.id);

        // all_groups includes the seeded broadcast room.
        let all = app.relationships.all_groups().unwrap();
        assert_eq!(all.len(), 2);
        assert!(all
            .iter()
            .any(|g| g.id == app.relationships.broadcast_id()));
    }
}
