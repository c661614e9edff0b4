//! CRUD operations for [`Group`] records and their membership rosters.

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Group, GroupKind};

impl Database {
    /// Insert a new group together with its initial member roster, as one
    /// transaction.
    pub fn insert_group(&mut self, group: &Group) -> Result<()> {
        let tx = self.conn_mut().transaction()?;
        tx.execute(
            "INSERT INTO groups (id, name, creator, created_at, kind)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                group.id,
                group.name,
                group.creator,
                group.created_at.to_rfc3339(),
                group.kind.as_str(),
            ],
        )?;
        for member in &group.members {
            tx.execute(
                "INSERT INTO group_members (group_id, username) VALUES (?1, ?2)",
                params![group.id, member],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Fetch a single group, roster included.
    pub fn get_group(&self, id: &str) -> Result<Group> {
        let mut group = self
            .conn()
            .query_row(
                "SELECT id, name, creator, created_at, kind
                 FROM groups
                 WHERE id = ?1",
                params![id],
                row_to_group,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })?;
        group.members = self.members_of_group(id)?;
        Ok(group)
    }

    /// Whether a group with this id exists.
    pub fn group_exists(&self, id: &str) -> Result<bool> {
        let n: i64 = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM groups WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        Ok(n != 0)
    }

    /// List all groups (broadcast room included), oldest first.
    pub fn list_groups(&self) -> Result<Vec<Group>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, name, creator, created_at, kind
             FROM groups
             ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt.query_map([], row_to_group)?;

        let mut groups = Vec::new();
        for row in rows {
            let mut group = row?;
            group.members = self.members_of_group(&group.id)?;
            groups.push(group);
        }
        Ok(groups)
    }

    /// List the groups a user is a member of, oldest first.
    ///
    /// The broadcast room has an empty roster, so it never appears here.
    pub fn groups_with_member(&self, username: &str) -> Result<Vec<Group>> {
        let mut stmt = self.conn().prepare(
            "SELECT g.id, g.name, g.creator, g.created_at, g.kind
             FROM groups g
             JOIN group_members m ON m.group_id = g.id
             WHERE m.username = ?1
             ORDER BY g.created_at ASC, g.id ASC",
        )?;
        let rows = stmt.query_map(params![username], row_to_group)?;

        let mut groups = Vec::new();
        for row in rows {
            let mut group = row?;
            group.members = self.members_of_group(&group.id)?;
            groups.push(group);
        }
        Ok(groups)
    }

    /// Append a member to a group's roster.
    pub fn add_group_member(&self, group_id: &str, username: &str) -> Result<()> {
        self.conn().execute(
            "INSERT INTO group_members (group_id, username) VALUES (?1, ?2)",
            params![group_id, username],
        )?;
        Ok(())
    }

    /// Remove a member from a group's roster.  Returns `true` if a row was
    /// deleted.
    pub fn remove_group_member(&self, group_id: &str, username: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM group_members WHERE group_id = ?1 AND username = ?2",
            params![group_id, username],
        )?;
        Ok(affected > 0)
    }

    /// Whether a user is on a group's roster.
    pub fn is_group_member(&self, group_id: &str, username: &str) -> Result<bool> {
        let n: i64 = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM group_members WHERE group_id = ?1 AND username = ?2)",
            params![group_id, username],
            |row| row.get(0),
        )?;
        Ok(n != 0)
    }

    /// Roster of a group in join order.
    pub fn members_of_group(&self, group_id: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn().prepare(
            "SELECT username FROM group_members WHERE group_id = ?1 ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map(params![group_id], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Group`] with an empty roster; the caller
/// fills in `members` with a second query.
fn row_to_group(row: &rusqlite::Row<'_>) -> rusqlite::Result<Group> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let creator: String = row.get(2)?;
    let created_str: String = row.get(3)?;
    let kind_str: String = row.get(4)?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let kind = match kind_str.as_str() {
        "broadcast" => GroupKind::Broadcast,
        "group" => GroupKind::Group,
        other => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                format!("unknown group kind: {other}").into(),
            ))
        }
    };

    Ok(Group {
        id,
        name,
        creator,
        members: Vec::new(),
        created_at,
        kind,
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

    fn study_group(id: &str, creator: &str) -> Group {
        Group {
            id: id.into(),
            name: "study".into(),
            creator: creator.into(),
            members: vec![creator.into()],
            created_at: Utc::now(),
            kind: GroupKind::Group,
        }
    }

    #[test]
    fn insert_and_get_round_trip() {
        let (_dir, mut db) = test_db();

        db.insert_group(&study_group("g1", "bob")).unwrap();

        let loaded = db.get_group("g1").unwrap();
        assert_eq!(loaded.name, "study");
        assert_eq!(loaded.creator, "bob");
        assert_eq!(loaded.members, vec!["bob".to_string()]);
        assert_eq!(loaded.kind, GroupKind::Group);
    }

    #[test]
    fn roster_keeps_join_order() {
        let (_dir, mut db) = test_db();

        db.insert_group(&study_group("g1", "bob")).unwrap();
        db.add_group_member("g1", "carol").unwrap();
        db.add_group_member("g1", "alice").unwrap();

        let loaded = db.get_group("g1").unwrap();
        assert_eq!(
            loaded.members,
            vec!["bob".to_string(), "carol".to_string(), "alice".to_string()]
        );

        assert!(db.is_group_member("g1", "carol").unwrap());
        assert!(db.remove_group_member("g1", "carol").unwrap());
        assert!(!db.is_group_member("g1", "carol").unwrap());
        assert!(!db.remove_group_member("g1", "carol").unwrap());
    }

    #[test]
    fn membership_listing_skips_broadcast() {
        let (_dir, mut db) = test_db();

        db.insert_group(&study_group("g1", "bob")).unwrap();

        let groups = db.groups_with_member("bob").unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, "g1");

        // list_groups sees the seeded broadcast room as well.
        assert_eq!(db.list_groups().unwrap().len(), 2);
    }
}
