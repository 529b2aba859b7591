//! Client-side chat session management
//!
//! This module keeps the user's chat list consistent with the backend:
//!
//! - `manager`: the [`ChatSessionManager`] with optimistic sends, renames,
//!   deletes, and selection
//! - `title`: default titles derived from the first user message
//! - `search`: case-insensitive filtering over titles and message content

pub mod manager;
pub mod search;
pub mod title;

pub use manager::{ChatSessionManager, RenameDraft, SendOutcome};
pub use search::{filter_chats, find_chat};
pub use title::{default_title, DEFAULT_TITLE_MAX_CHARS};
