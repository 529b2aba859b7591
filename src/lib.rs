//! Chatai - location-aware chat assistant client library
//!
//! This library provides the core of the Chatai client: the chat session
//! manager with optimistic updates, the authenticated session, preferences,
//! location handling, and the HTTP client for the assistant backend.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `api`: Wire records, API traits, and the reqwest-backed client
//! - `chat`: Chat list state, ordering, search, rename, and deletion
//! - `session`: Credential persistence and the signed-in user
//! - `settings`: Preferences, profile, password, export, account deletion
//! - `location`: Position sources, reverse geocoding, saved location
//! - `notify`: User-facing notices and confirmation prompts
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chatai::api::{AuthToken, HttpApiClient};
//! use chatai::chat::ChatSessionManager;
//! use chatai::notify::ConsoleNotifier;
//! use chatai::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let api = Arc::new(HttpApiClient::new(&config.api, AuthToken::new())?);
//!     let manager = ChatSessionManager::new(api, Arc::new(ConsoleNotifier));
//!     manager.refresh_chats().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod location;
pub mod notify;
pub mod session;
pub mod settings;

// Re-export commonly used types
pub use chat::{ChatSessionManager, SendOutcome};
pub use config::Config;
pub use error::{ChataiError, Result};
pub use session::Session;

#[cfg(test)]
pub mod test_utils;
