use thiserror::Error;

use studyhall_store::StoreError;

/// Errors produced by the chat core.
///
/// Every message is written so the UI layer can surface it to the user
/// verbatim.  Nothing here is fatal; each failure is recoverable by
/// correcting input or retrying.
#[derive(Error, Debug)]
pub enum ChatError {
    /// Malformed input: empty or too-short fields.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Unknown username, group or conversation.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Password mismatch on login.
    #[error("Wrong password, please try again")]
    AuthFailed,

    /// Authorization failure: the acting user lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The user may not read or write this conversation.
    #[error("You do not have access to this conversation")]
    AccessDenied,

    /// The username is already registered.
    #[error("Username '{0}' is already taken, please choose another")]
    AlreadyExists(String),

    /// The two users are already friends.
    #[error("You are already friends")]
    AlreadyFriends,

    /// No friend edge exists between the two users.
    #[error("You are not friends")]
    NotFriends,

    /// The user is already on the group roster.
    #[error("User '{0}' is already in the group")]
    AlreadyMember(String),

    /// The user is not on the group roster.
    #[error("User '{0}' is not in the group")]
    NotMember(String),

    /// A self-referential operation: adding yourself as a friend, or the
    /// creator removing themselves from their own group.
    #[error("{0}")]
    SelfReference(String),

    /// Durable-write failure.  The in-memory and on-disk state are unchanged
    /// from before the call.
    #[error("Could not save changes, please try again later: {0}")]
    Persistence(#[from] StoreError),

    /// A store lock was poisoned by a panicking thread.
    #[error("Internal error: store lock poisoned")]
    Poisoned,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ChatError>;
