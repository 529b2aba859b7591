//! Wire records exchanged with the assistant backend
//!
//! Field names follow the backend's camelCase JSON; chat identifiers arrive
//! as `_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message typed by the user
    User,
    /// Message generated by the assistant
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Geographic position with an optional human-readable address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Location {
    /// Create a location without an address
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            address: None,
        }
    }

    /// Address when known, otherwise `"lat, lon"`
    pub fn display_label(&self) -> String {
        self.address
            .clone()
            .unwrap_or_else(|| format!("{}, {}", self.latitude, self.longitude))
    }
}

/// A place recommendation attached to an assistant reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceData {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub opening_hours: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub places_data: Option<Vec<PlaceData>>,
}

impl Message {
    /// Build a user message stamped with the current time
    pub fn user(content: impl Into<String>, location: Option<Location>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            language: None,
            location,
            places_data: None,
        }
    }

    /// Build an assistant message stamped with the current time
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            language: None,
            location: None,
            places_data: None,
        }
    }

    /// Place results attached to this message, empty when none
    pub fn places(&self) -> &[PlaceData] {
        self.places_data.as_deref().unwrap_or(&[])
    }
}

/// A conversation thread
///
/// `messages` is `None` when only the summary has been loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// Create an empty chat summary stamped with the current time
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            messages: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the message history has been fetched
    pub fn is_loaded(&self) -> bool {
        self.messages.is_some()
    }

    /// Loaded messages, empty when not loaded
    pub fn messages(&self) -> &[Message] {
        self.messages.as_deref().unwrap_or(&[])
    }

    /// Whether any loaded message was written by the user
    pub fn has_user_message(&self) -> bool {
        self.messages().iter().any(|m| m.role == Role::User)
    }
}

/// Body of `POST /api/chats/{id}/messages`
#[derive(Debug, Clone, Serialize)]
pub struct PostMessageRequest {
    pub message: String,
    pub location: Option<Location>,
}

/// Response of `POST /api/chats/{id}/messages`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageExchange {
    /// The user message as persisted by the server
    pub user_message: Message,
    /// The generated reply, possibly carrying places and location
    pub assistant_message: Message,
}

/// Location saved on the user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// The signed-in account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default = "default_language")]
    pub preferred_language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SavedLocation>,
}

fn default_language() -> String {
    "en".to_string()
}

impl User {
    /// Editable subset of the account
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            name: self.name.clone(),
            email: self.email.clone(),
            preferred_language: self.preferred_language.clone(),
        }
    }
}

/// Editable profile fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub preferred_language: String,
}

/// UI theme preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    System,
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(format!(
                "Invalid theme: {}. Must be one of: light, dark, system",
                other
            )),
        }
    }
}

/// Application preferences stored server-side
///
/// Missing keys in a server response fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub theme: Theme,
    pub notifications: bool,
    pub location_sharing: bool,
    pub language: String,
    pub auto_save: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            notifications: true,
            location_sharing: false,
            language: default_language(),
            auto_save: true,
        }
    }
}

/// Partial settings update; `None` fields keep their current value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub theme: Option<Theme>,
    pub notifications: Option<bool>,
    pub location_sharing: Option<bool>,
    pub language: Option<String>,
    pub auto_save: Option<bool>,
}

impl SettingsPatch {
    /// Whether the patch changes nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Produce the settings that result from applying this patch
    pub fn apply_to(&self, base: &AppSettings) -> AppSettings {
        AppSettings {
            theme: self.theme.unwrap_or(base.theme),
            notifications: self.notifications.unwrap_or(base.notifications),
            location_sharing: self.location_sharing.unwrap_or(base.location_sharing),
            language: self
                .language
                .clone()
                .unwrap_or_else(|| base.language.clone()),
            auto_save: self.auto_save.unwrap_or(base.auto_save),
        }
    }
}

/// Response of the login and register endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Body of `PUT /api/user/password`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_deserializes_backend_shape() {
        let value = json!({
            "_id": "65f0",
            "title": "Coffee near me",
            "createdAt": "2024-03-01T10:00:00Z",
            "updatedAt": "2024-03-01T10:05:00Z",
            "messages": [{
                "role": "assistant",
                "content": "Try these",
                "timestamp": "2024-03-01T10:05:00Z",
                "placesData": [{
                    "name": "Blue Bottle",
                    "address": "1 Main St",
                    "rating": 4.5,
                    "priceLevel": 2,
                    "phoneNumber": "555-0100"
                }]
            }]
        });

        let chat: Chat = serde_json::from_value(value).unwrap();
        assert_eq!(chat.id, "65f0");
        assert!(chat.is_loaded());
        let place = &chat.messages()[0].places()[0];
        assert_eq!(place.price_level, Some(2));
        assert_eq!(place.phone_number.as_deref(), Some("555-0100"));
        assert!(!chat.has_user_message());
    }

    #[test]
    fn test_chat_summary_without_messages() {
        let value = json!({
            "_id": "a",
            "title": "t",
            "createdAt": "2024-03-01T10:00:00Z",
            "updatedAt": "2024-03-01T10:00:00Z"
        });
        let chat: Chat = serde_json::from_value(value).unwrap();
        assert!(!chat.is_loaded());
        assert!(chat.messages().is_empty());
    }

    #[test]
    fn test_partial_settings_keep_defaults() {
        let settings: AppSettings =
            serde_json::from_value(json!({ "theme": "dark", "autoSave": false })).unwrap();
        assert_eq!(settings.theme, Theme::Dark);
        assert!(!settings.auto_save);
        assert!(settings.notifications);
        assert_eq!(settings.language, "en");
    }

    #[test]
    fn test_settings_patch_apply() {
        let base = AppSettings::default();
        let patch = SettingsPatch {
            location_sharing: Some(true),
            language: Some("fr".to_string()),
            ..Default::default()
        };
        let next = patch.apply_to(&base);
        assert!(next.location_sharing);
        assert_eq!(next.language, "fr");
        assert_eq!(next.theme, base.theme);
        assert!(!patch.is_empty());
        assert!(SettingsPatch::default().is_empty());
    }

    #[test]
    fn test_theme_from_str() {
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("blue".parse::<Theme>().is_err());
    }

    #[test]
    fn test_user_accepts_mongo_id() {
        let user: User = serde_json::from_value(json!({
            "_id": "u1",
            "name": "Ada",
            "email": "ada@example.com"
        }))
        .unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.preferred_language, "en");
    }

    #[test]
    fn test_location_label() {
        let mut loc = Location::new(51.5, -0.12);
        assert_eq!(loc.display_label(), "51.5, -0.12");
        loc.address = Some("London".to_string());
        assert_eq!(loc.display_label(), "London");
    }
}
