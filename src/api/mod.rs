//! Remote API abstraction for the assistant backend
//!
//! The backend is split into three traits so consumers depend only on what
//! they call:
//!
//! - [`AuthApi`]: login and registration
//! - [`ChatApi`]: chat creation, listing, messages, titles, deletion
//! - [`UserApi`]: profile, settings, location, password, export, account
//!
//! [`HttpApiClient`] implements all three over HTTP.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::error::Result;

pub mod http;
pub mod types;

pub use http::HttpApiClient;
pub use types::{
    AppSettings, AuthResponse, Chat, Location, Message, MessageExchange, PasswordChange,
    PlaceData, Role, SavedLocation, SettingsPatch, Theme, User, UserProfile,
};

/// Shared bearer token slot
///
/// The session installs and clears the token; API clients read it on every
/// request. Cloning yields another handle to the same slot.
#[derive(Debug, Clone, Default)]
pub struct AuthToken {
    inner: Arc<RwLock<Option<String>>>,
}

impl AuthToken {
    /// Create an empty token slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a bearer token
    pub fn set(&self, token: impl Into<String>) {
        if let Ok(mut slot) = self.inner.write() {
            *slot = Some(token.into());
        }
    }

    /// Remove the bearer token
    pub fn clear(&self) {
        if let Ok(mut slot) = self.inner.write() {
            *slot = None;
        }
    }

    /// Current bearer token, if any
    pub fn get(&self) -> Option<String> {
        self.inner.read().ok().and_then(|slot| slot.clone())
    }

    /// Whether a token is installed
    pub fn is_set(&self) -> bool {
        self.get().is_some()
    }
}

/// Account authentication endpoints
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a bearer token and the account
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse>;

    /// Create an account and sign in
    async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthResponse>;
}

/// Chat persistence and message generation endpoints
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Create an empty chat
    async fn create_chat(&self) -> Result<Chat>;

    /// List chat summaries, most recently updated first
    async fn list_chats(&self) -> Result<Vec<Chat>>;

    /// Fetch a chat with its full message history
    async fn get_chat(&self, id: &str) -> Result<Chat>;

    /// Post a user message and receive the generated reply
    async fn post_message(
        &self,
        id: &str,
        text: &str,
        location: Option<&Location>,
    ) -> Result<MessageExchange>;

    /// Replace the title of a chat
    async fn update_title(&self, id: &str, title: &str) -> Result<()>;

    /// Delete a chat
    async fn delete_chat(&self, id: &str) -> Result<()>;
}

/// Account profile, preferences, and location endpoints
#[async_trait]
pub trait UserApi: Send + Sync {
    /// Fetch the signed-in account
    async fn get_profile(&self) -> Result<User>;

    /// Update name, email, and preferred language
    async fn update_profile(&self, profile: &UserProfile) -> Result<()>;

    /// Change the account password
    async fn change_password(&self, change: &PasswordChange) -> Result<()>;

    /// Fetch stored preferences
    async fn get_settings(&self) -> Result<AppSettings>;

    /// Replace stored preferences
    async fn update_settings(&self, settings: &AppSettings) -> Result<()>;

    /// Fetch the saved location; a missing location is an `Ok(None)`
    async fn get_location(&self) -> Result<Option<Location>>;

    /// Save the current location to the profile
    async fn save_location(&self, location: &Location) -> Result<()>;

    /// Remove the saved location
    async fn delete_location(&self) -> Result<()>;

    /// Download everything the backend stores for the account
    async fn export_data(&self) -> Result<serde_json::Value>;

    /// Permanently delete the account
    async fn delete_account(&self) -> Result<()>;
}
