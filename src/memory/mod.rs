//! Conversation memory.
//!
//! An append-only SQLite log of user/assistant exchanges keyed by
//! timestamp, plus a small key-value context table. Memory mode builds
//! its context prompt from the most recent exchanges.

mod store;

pub use store::{ConversationStore, Exchange};
