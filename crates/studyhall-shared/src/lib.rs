//! # studyhall-shared
//!
//! Common layer shared by the store and core crates: conversation-identifier
//! algebra and the fixed constants of the application.  This crate holds no
//! state and performs no I/O.

pub mod constants;
pub mod conversation;

pub use conversation::{ConversationKind, kind_of, personal_chat_id};
