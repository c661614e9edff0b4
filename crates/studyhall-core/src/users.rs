//! User registration, login and lookup.

use std::sync::MutexGuard;

use chrono::Utc;
use tracing::info;

use studyhall_shared::constants::{MIN_PASSWORD_CHARS, MIN_USERNAME_CHARS};
use studyhall_store::{Database, StoreError, User};

use crate::error::{ChatError, Result};
use crate::StoreHandle;

/// Owns usernames and credentials.
///
/// Passwords are stored and compared in plaintext; everything stays on the
/// local machine.
#[derive(Clone)]
pub struct UserStore {
    db: StoreHandle,
}

impl UserStore {
    pub fn new(db: StoreHandle) -> Self {
        Self { db }
    }

    fn db(&self) -> Result<MutexGuard<'_, Database>> {
        self.db.lock().map_err(|_| ChatError::Poisoned)
    }

    /// Register a new user and return a welcome message.
    pub fn register(&self, username: &str, password: &str) -> Result<String> {
        if username.is_empty() || password.is_empty() {
            return Err(ChatError::Validation(
                "username and password must not be empty".into(),
            ));
        }
        if username.chars().count() < MIN_USERNAME_CHARS {
            return Err(ChatError::Validation(format!(
                "username must be at least {MIN_USERNAME_CHARS} characters"
            )));
        }
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(ChatError::Validation(format!(
                "password must be at least {MIN_PASSWORD_CHARS} characters"
            )));
        }

        let db = self.db()?;
        if db.user_exists(username)? {
            return Err(ChatError::AlreadyExists(username.to_string()));
        }

        db.insert_user(&User {
            username: username.to_string(),
            password: password.to_string(),
            created_at: Utc::now(),
        })?;

        info!(username, "registered new user");
        Ok(format!("Registration successful, welcome {username}!"))
    }

    /// Check a credential pair and return a greeting.
    pub fn login(&self, username: &str, password: &str) -> Result<String> {
        if username.is_empty() || password.is_empty() {
            return Err(ChatError::Validation(
                "enter a username and password".into(),
            ));
        }

        let db = self.db()?;
        let user = match db.get_user(username) {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                return Err(ChatError::NotFound(format!(
                    "username '{username}' is not registered"
                )))
            }
            Err(e) => return Err(e.into()),
        };

        // Exact string equality on the stored plaintext.
        if user.password != password {
            return Err(ChatError::AuthFailed);
        }

        info!(username, "user logged in");
        Ok(format!("Login successful, welcome back {username}!"))
    }

    /// Log a user out.  The core keeps no session state, so this only
    /// records the event and hands the UI a farewell line.
    pub fn logout(&self, username: &str) -> String {
        info!(username, "user logged out");
        format!("{username} has logged out")
    }

    /// Whether a username is registered.
    pub fn exists(&self, username: &str) -> Result<bool> {
        Ok(self.db()?.user_exists(username)?)
    }

    /// Number of registered users.
    pub fn count(&self) -> Result<i64> {
        Ok(self.db()?.count_users()?)
    }

    /// All registered usernames, sorted.
    pub fn list_usernames(&self) -> Result<Vec<String>> {
        Ok(self.db()?.list_usernames()?)
    }

    /// Search for users by case-insensitive substring, excluding the caller.
    ///
    /// The candidate set is the union of registered users and every name in
    /// the friend graph, since the graph may reference names that never
    /// registered.  An empty keyword returns every candidate.
    pub fn search_users(&self, current_user: &str, keyword: &str) -> Result<Vec<String>> {
        let db = self.db()?;

        let mut candidates = db.list_usernames()?;
        candidates.extend(db.known_friend_usernames()?);
        candidates.sort();
        candidates.dedup();

        let needle = keyword.trim().to_lowercase();
        Ok(candidates
            .into_iter()
            .filter(|name| name != current_user)
            .filter(|name| needle.is_empty() || name.to_lowercase().contains(&needle))
            .collect())
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
    fn register_then_login() {
        let (_dir, app) = test_app();

        app.users.register("alice", "pass1").unwrap();
        app.users.login("alice", "pass1").unwrap();

        assert!(matches!(
            app.users.login("alice", "wrong"),
            Err(ChatError::AuthFailed)
        ));
        assert!(matches!(
            app.users.login("nobody", "pass1"),
            Err(ChatError::NotFound(_))
        ));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let (_dir, app) = test_app();

        app.users.register("alice", "pass1").unwrap();
        assert!(matches!(
            app.users.register("alice", "other"),
            Err(ChatError::AlreadyExists(_))
        ));
        assert_eq!(app.users.count().unwrap(), 1);
    }

    #[test]
    fn registration_validates_field_lengths() {
        let (_dir, app) = test_app();

        assert!(matches!(
            app.users.register("", "pass1"),
            Err(ChatError::Validation(_))
        ));
        assert!(matches!(
            app.users.register("ab", "pass1"),
            Err(ChatError::Validation(_))
        ));
        assert!(matches!(
            app.users.register("alice", "abc"),
            Err(ChatError::Validation(_))
        ));
        assert_eq!(app.users.count().unwrap(), 0);
    }

    #[test]
    fn search_excludes_caller_and_matches_case_insensitively() {
        let (_dir, app) = test_app();

        app.users.register("alice", "pass1").unwrap();
        app.users.register("Albert", "pass2").unwrap();
        app.users.register("bob", "pass3").unwrap();

        let hits = app.users.search_users("alice", "AL").unwrap();
        assert_eq!(hits, vec!["Albert".to_string()]);

        let all = app.users.search_users("alice", "").unwrap();
        assert_eq!(all, vec!["Albert".to_string(), "bob".to_string()]);
    }

    #[test]
    fn search_sees_unregistered_names_from_the_friend_graph() {
        let (_dir, app) = test_app();

        app.users.register("alice", "pass1").unwrap();
        app.relationships.add_friend("alice", "ghost").unwrap();

        let hits = app.users.search_users("alice", "gho").unwrap();
        assert_eq!(hits, vec!["ghost".to_string()]);
    }
}
