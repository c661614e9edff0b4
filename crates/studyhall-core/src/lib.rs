//! # studyhall-core
//!
//! The conversation-access core of the Studyhall desktop chat application:
//! user registration and login, the symmetric friend graph, creator-managed
//! groups, the always-open broadcast room, and the append-only message log.
//!
//! The UI layer is the sole caller.  It constructs a [`ChatApp`] (which
//! opens the SQLite store and wires the services together) and invokes the
//! typed operations; every failure comes back as a [`ChatError`] whose
//! `Display` text can be shown to the user verbatim.

pub mod app;
pub mod config;
pub mod log;
pub mod relationships;
pub mod resolver;
pub mod users;

mod error;

use std::sync::{Arc, Mutex};

use studyhall_store::Database;

/// Shared handle to the one open [`Database`].
///
/// Each service locks the handle around its entire
/// read-validate-mutate-persist sequence, so a UI dispatching calls from a
/// background worker never races another caller on the same store.
pub type StoreHandle = Arc<Mutex<Database>>;

pub use app::ChatApp;
pub use config::AppConfig;
pub use error::{ChatError, Result};
pub use log::MessageLog;
pub use relationships::RelationshipStore;
pub use resolver::{ConversationResolver, ConversationSummary};
pub use users::UserStore;
