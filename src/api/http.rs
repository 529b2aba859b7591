//! HTTP implementation of the backend API
//!
//! Every request carries the bearer token from the shared [`AuthToken`] slot
//! when one is installed. Non-success responses are mapped onto
//! [`ChataiError`]: 401 becomes `Authentication`, 404 becomes `NotFound`,
//! anything else becomes `Api` with the server's `error` text when present.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use url::Url;

use super::types::{
    AppSettings, AuthResponse, Chat, Location, MessageExchange, PasswordChange,
    PostMessageRequest, User, UserProfile,
};
use super::{AuthApi, AuthToken, ChatApi, UserApi};
use crate::config::ApiConfig;
use crate::error::{ChataiError, Result};

/// Error body returned by the backend
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// reqwest-backed client for the assistant backend
///
/// # Examples
///
/// ```
/// use chatai::api::{AuthToken, HttpApiClient};
/// use chatai::config::ApiConfig;
///
/// let config = ApiConfig {
///     base_url: "http://localhost:5000/".to_string(),
///     timeout_seconds: 5,
/// };
/// let client = HttpApiClient::new(&config, AuthToken::new()).unwrap();
/// assert_eq!(client.base_url(), "http://localhost:5000");
/// ```
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
    base: Url,
    token: AuthToken,
}

impl HttpApiClient {
    /// Create a client for the configured backend
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: &ApiConfig, token: AuthToken) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("chatai/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChataiError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        let base = Url::parse(&base_url)
            .ok()
            .filter(|u| !u.cannot_be_a_base())
            .ok_or_else(|| ChataiError::Config(format!("Invalid API base URL: {}", base_url)))?;
        tracing::debug!("Initialized API client: base_url={}", base_url);

        Ok(Self {
            client,
            base_url,
            base,
            token,
        })
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Endpoint URL with each segment percent-encoded on its own
    ///
    /// A `/` inside a segment is escaped, so caller-supplied ids can never
    /// climb out of the path they are placed in.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.endpoint(segments);
        tracing::debug!(%method, %url, "API request");
        let builder = self.client.request(method, url);
        match self.token.get() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn chat_request(
        &self,
        method: Method,
        id: &str,
        tail: Option<&str>,
    ) -> Result<RequestBuilder> {
        let id = chat_segment(id)?;
        Ok(match tail {
            Some(tail) => self.request(method, &["api", "chats", id, tail]),
            None => self.request(method, &["api", "chats", id]),
        })
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await.map_err(|e| {
            tracing::warn!("API request failed: {}", e);
            ChataiError::Network(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or_else(|_| {
                if body.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                } else {
                    body
                }
            });

        tracing::warn!("API returned {}: {}", status, message);
        Err(status_error(status, message).into())
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send(builder).await?;
        response.json::<T>().await.map_err(|e| {
            tracing::error!("Failed to parse API response: {}", e);
            ChataiError::Api {
                status: 200,
                message: format!("Malformed response: {}", e),
            }
            .into()
        })
    }

    async fn send_ack(&self, builder: RequestBuilder) -> Result<()> {
        self.send(builder).await.map(|_| ())
    }
}

/// Reject ids that cannot stand as a single path segment
fn chat_segment(id: &str) -> Result<&str> {
    if id.is_empty() || id == "." || id == ".." {
        return Err(ChataiError::Validation(format!("Invalid chat id: {:?}", id)).into());
    }
    Ok(id)
}

fn status_error(status: StatusCode, message: String) -> ChataiError {
    match status {
        StatusCode::UNAUTHORIZED => ChataiError::Authentication(message),
        StatusCode::NOT_FOUND => ChataiError::NotFound(message),
        _ => ChataiError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl AuthApi for HttpApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let builder = self
            .request(Method::POST, &["api", "auth", "login"])
            .json(&json!({ "email": email, "password": password }));
        self.send_json(builder).await
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthResponse> {
        let builder = self
            .request(Method::POST, &["api", "auth", "register"])
            .json(&json!({ "name": name, "email": email, "password": password }));
        self.send_json(builder).await
    }
}

#[async_trait]
impl ChatApi for HttpApiClient {
    async fn create_chat(&self) -> Result<Chat> {
        let builder = self.request(Method::POST, &["api", "chats"]);
        self.send_json(builder).await
    }

    async fn list_chats(&self) -> Result<Vec<Chat>> {
        let builder = self.request(Method::GET, &["api", "chats"]);
        self.send_json(builder).await
    }

    async fn get_chat(&self, id: &str) -> Result<Chat> {
        let builder = self.chat_request(Method::GET, id, None)?;
        self.send_json(builder).await
    }

    async fn post_message(
        &self,
        id: &str,
        text: &str,
        location: Option<&Location>,
    ) -> Result<MessageExchange> {
        let body = PostMessageRequest {
            message: text.to_string(),
            location: location.cloned(),
        };
        let builder = self
            .chat_request(Method::POST, id, Some("messages"))?
            .json(&body);
        self.send_json(builder).await
    }

    async fn update_title(&self, id: &str, title: &str) -> Result<()> {
        let builder = self
            .chat_request(Method::PUT, id, Some("title"))?
            .json(&json!({ "title": title }));
        self.send_ack(builder).await
    }

    async fn delete_chat(&self, id: &str) -> Result<()> {
        let builder = self.chat_request(Method::DELETE, id, None)?;
        self.send_ack(builder).await
    }
}

#[async_trait]
impl UserApi for HttpApiClient {
    async fn get_profile(&self) -> Result<User> {
        let builder = self.request(Method::GET, &["api", "user", "profile"]);
        self.send_json(builder).await
    }

    async fn update_profile(&self, profile: &UserProfile) -> Result<()> {
        let builder = self
            .request(Method::PUT, &["api", "user", "profile"])
            .json(profile);
        self.send_ack(builder).await
    }

    async fn change_password(&self, change: &PasswordChange) -> Result<()> {
        let builder = self
            .request(Method::PUT, &["api", "user", "password"])
            .json(change);
        self.send_ack(builder).await
    }

    async fn get_settings(&self) -> Result<AppSettings> {
        // The backend may answer with `null` for accounts that never saved settings.
        let builder = self.request(Method::GET, &["api", "user", "settings"]);
        let settings: Option<AppSettings> = self.send_json(builder).await?;
        Ok(settings.unwrap_or_default())
    }

    async fn update_settings(&self, settings: &AppSettings) -> Result<()> {
        let builder = self
            .request(Method::PUT, &["api", "user", "settings"])
            .json(settings);
        self.send_ack(builder).await
    }

    async fn get_location(&self) -> Result<Option<Location>> {
        let builder = self.request(Method::GET, &["api", "user", "location"]);
        match self.send_json::<Option<Location>>(builder).await {
            Ok(location) => Ok(location),
            Err(e) if crate::error::is_not_found(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn save_location(&self, location: &Location) -> Result<()> {
        let builder = self
            .request(Method::POST, &["api", "user", "location"])
            .json(location);
        self.send_ack(builder).await
    }

    async fn delete_location(&self) -> Result<()> {
        let builder = self.request(Method::DELETE, &["api", "user", "location"]);
        self.send_ack(builder).await
    }

    async fn export_data(&self) -> Result<serde_json::Value> {
        let builder = self.request(Method::GET, &["api", "user", "export"]);
        self.send_json(builder).await
    }

    async fn delete_account(&self) -> Result<()> {
        let builder = self.request(Method::DELETE, &["api", "user", "account"]);
        self.send_ack(builder).await
    }
}
