//! Test utilities for Chatai
//!
//! [`FakeApi`] is an in-memory stand-in for the backend implementing every
//! API trait. Individual operations can be made to fail, and replies to
//! posted messages can be held back to exercise in-flight behavior.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::api::{
    AppSettings, AuthApi, AuthResponse, Chat, ChatApi, Location, Message, MessageExchange,
    PasswordChange, PlaceData, User, UserApi, UserProfile,
};
use crate::error::{ChataiError, Result};

/// Password [`FakeApi::login`] accepts
pub const FAKE_PASSWORD: &str = "hunter22";

/// Token [`FakeApi`] issues on login and register
pub const FAKE_TOKEN: &str = "fake-token";

#[derive(Default)]
struct FakeState {
    chats: Vec<Chat>,
    next_id: usize,
    calls: HashMap<String, usize>,
    failing: HashSet<String>,
    places: Option<Vec<PlaceData>>,
    user: Option<User>,
    settings: AppSettings,
    location: Option<Location>,
    passwords: Vec<PasswordChange>,
}

/// In-memory backend
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
    gate: Mutex<Option<Arc<Notify>>>,
    history_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeApi {
    pub fn new() -> Self {
        let api = Self::default();
        api.set_user(User {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            preferred_language: "en".to_string(),
            location: None,
        });
        api
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        let mut state = self.state.lock().expect("fake api state poisoned");
        f(&mut state)
    }

    /// Record a call and fail it if configured to
    fn enter(&self, op: &str) -> Result<()> {
        self.with_state(|s| {
            *s.calls.entry(op.to_string()).or_default() += 1;
            if s.failing.contains(op) {
                Err(ChataiError::Network(format!("{} unavailable", op)).into())
            } else {
                Ok(())
            }
        })
    }

    /// Make every later call to `op` fail with a network error
    pub fn fail(&self, op: &str) {
        self.with_state(|s| s.failing.insert(op.to_string()));
    }

    /// Let `op` succeed again
    pub fn recover(&self, op: &str) {
        self.with_state(|s| s.failing.remove(op));
    }

    /// How many times `op` was called
    pub fn call_count(&self, op: &str) -> usize {
        self.with_state(|s| s.calls.get(op).copied().unwrap_or(0))
    }

    /// Hold every later `post_message` until the returned handle is notified
    pub fn hold_replies(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().expect("gate poisoned") = Some(gate.clone());
        gate
    }

    /// Hold every later `get_chat` until the returned handle is notified
    ///
    /// The history is read before waiting, so messages posted meanwhile are
    /// missing from the answer.
    pub fn hold_history(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.history_gate.lock().expect("gate poisoned") = Some(gate.clone());
        gate
    }

    /// Attach `places` to every assistant reply
    pub fn reply_with_places(&self, places: Vec<PlaceData>) {
        self.with_state(|s| s.places = Some(places));
    }

    /// Store a chat with an empty history on the server
    pub fn seed_chat(&self, id: &str, title: &str, updated_at: DateTime<Utc>) {
        let mut chat = Chat::new(id, title);
        chat.messages = Some(Vec::new());
        chat.created_at = updated_at;
        chat.updated_at = updated_at;
        self.with_state(|s| s.chats.push(chat));
    }

    /// Append `messages` to a seeded chat's server history
    pub fn seed_messages(&self, id: &str, messages: Vec<Message>) {
        self.with_state(|s| {
            if let Some(chat) = s.chats.iter_mut().find(|c| c.id == id) {
                chat.messages.get_or_insert_with(Vec::new).extend(messages);
            }
        });
    }

    /// Replace the signed-in account
    pub fn set_user(&self, user: User) {
        self.with_state(|s| s.user = Some(user));
    }

    /// Replace the stored settings
    pub fn set_settings(&self, settings: AppSettings) {
        self.with_state(|s| s.settings = settings);
    }

    /// Settings as the server currently stores them
    pub fn stored_settings(&self) -> AppSettings {
        self.with_state(|s| s.settings.clone())
    }

    /// Location as the server currently stores it
    pub fn stored_location(&self) -> Option<Location> {
        self.with_state(|s| s.location.clone())
    }

    /// Replace the stored location
    pub fn set_location(&self, location: Option<Location>) {
        self.with_state(|s| s.location = location);
    }

    /// Password changes received so far
    pub fn password_changes(&self) -> Vec<PasswordChange> {
        self.with_state(|s| s.passwords.clone())
    }

    fn not_found(id: &str) -> anyhow::Error {
        ChataiError::NotFound(format!("chat {}", id)).into()
    }
}

#[async_trait]
impl AuthApi for FakeApi {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        self.enter("login")?;
        if password != FAKE_PASSWORD {
            return Err(ChataiError::Api {
                status: 400,
                message: "Invalid credentials".to_string(),
            }
            .into());
        }
        let mut user = self
            .with_state(|s| s.user.clone())
            .ok_or_else(|| ChataiError::NotFound("user".to_string()))?;
        user.email = email.to_string();
        Ok(AuthResponse {
            token: FAKE_TOKEN.to_string(),
            user,
        })
    }

    async fn register(&self, name: &str, email: &str, _password: &str) -> Result<AuthResponse> {
        self.enter("register")?;
        let user = User {
            id: "u2".to_string(),
            name: name.to_string(),
            email: email.to_string(),
            preferred_language: "en".to_string(),
            location: None,
        };
        self.set_user(user.clone());
        Ok(AuthResponse {
            token: FAKE_TOKEN.to_string(),
            user,
        })
    }
}

#[async_trait]
impl ChatApi for FakeApi {
    async fn create_chat(&self) -> Result<Chat> {
        self.enter("create_chat")?;
        Ok(self.with_state(|s| {
            s.next_id += 1;
            let mut chat = Chat::new(format!("chat-{}", s.next_id), "New Chat");
            chat.messages = Some(Vec::new());
            s.chats.push(chat.clone());
            chat.messages = None;
            chat
        }))
    }

    async fn list_chats(&self) -> Result<Vec<Chat>> {
        self.enter("list_chats")?;
        Ok(self.with_state(|s| {
            let mut chats: Vec<Chat> = s
                .chats
                .iter()
                .cloned()
                .map(|mut c| {
                    c.messages = None;
                    c
                })
                .collect();
            chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            chats
        }))
    }

    async fn get_chat(&self, id: &str) -> Result<Chat> {
        self.enter("get_chat")?;
        let chat = self
            .with_state(|s| s.chats.iter().find(|c| c.id == id).cloned())
            .ok_or_else(|| Self::not_found(id))?;

        let gate = self.history_gate.lock().expect("gate poisoned").clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(chat)
    }

    async fn post_message(
        &self,
        id: &str,
        text: &str,
        location: Option<&Location>,
    ) -> Result<MessageExchange> {
        self.enter("post_message")?;

        let gate = self.gate.lock().expect("gate poisoned").clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.with_state(|s| {
            let places = s.places.clone();
            let chat = s
                .chats
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| Self::not_found(id))?;
            let user_message = Message::user(text, location.cloned());
            let mut assistant_message = Message::assistant(format!("Echo: {}", text));
            assistant_message.places_data = places;
            assistant_message.location = location.cloned();

            let messages = chat.messages.get_or_insert_with(Vec::new);
            messages.push(user_message.clone());
            messages.push(assistant_message.clone());
            chat.updated_at = Utc::now();

            Ok(MessageExchange {
                user_message,
                assistant_message,
            })
        })
    }

    async fn update_title(&self, id: &str, title: &str) -> Result<()> {
        self.enter("update_title")?;
        self.with_state(|s| {
            let chat = s
                .chats
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| Self::not_found(id))?;
            chat.title = title.to_string();
            Ok(())
        })
    }

    async fn delete_chat(&self, id: &str) -> Result<()> {
        self.enter("delete_chat")?;
        self.with_state(|s| s.chats.retain(|c| c.id != id));
        Ok(())
    }
}

#[async_trait]
impl UserApi for FakeApi {
    async fn get_profile(&self) -> Result<User> {
        self.enter("get_profile")?;
        self.with_state(|s| s.user.clone())
            .ok_or_else(|| ChataiError::Authentication("no session".to_string()).into())
    }

    async fn update_profile(&self, profile: &UserProfile) -> Result<()> {
        self.enter("update_profile")?;
        self.with_state(|s| {
            if let Some(user) = s.user.as_mut() {
                user.name = profile.name.clone();
                user.email = profile.email.clone();
                user.preferred_language = profile.preferred_language.clone();
            }
        });
        Ok(())
    }

    async fn change_password(&self, change: &PasswordChange) -> Result<()> {
        self.enter("change_password")?;
        self.with_state(|s| s.passwords.push(change.clone()));
        Ok(())
    }

    async fn get_settings(&self) -> Result<AppSettings> {
        self.enter("get_settings")?;
        Ok(self.stored_settings())
    }

    async fn update_settings(&self, settings: &AppSettings) -> Result<()> {
        self.enter("update_settings")?;
        self.set_settings(settings.clone());
        Ok(())
    }

    async fn get_location(&self) -> Result<Option<Location>> {
        self.enter("get_location")?;
        Ok(self.stored_location())
    }

    async fn save_location(&self, location: &Location) -> Result<()> {
        self.enter("save_location")?;
        self.set_location(Some(location.clone()));
        Ok(())
    }

    async fn delete_location(&self) -> Result<()> {
        self.enter("delete_location")?;
        self.set_location(None);
        Ok(())
    }

    async fn export_data(&self) -> Result<serde_json::Value> {
        self.enter("export_data")?;
        let chats = self.with_state(|s| s.chats.clone());
        Ok(serde_json::json!({ "chats": chats }))
    }

    async fn delete_account(&self) -> Result<()> {
        self.enter("delete_account")?;
        self.with_state(|s| {
            s.user = None;
            s.chats.clear();
        });
        Ok(())
    }
}
