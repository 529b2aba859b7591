//! Authenticated session
//!
//! A [`Session`] is constructed explicitly and handed to whatever needs the
//! signed-in user. It has a clear lifecycle:
//!
//! - [`Session::init`] loads the persisted credential and verifies it
//! - [`Session::login`] / [`Session::register`] obtain and persist a new one
//! - [`Session::logout`] clears it everywhere
//!
//! The bearer token is published through a shared [`AuthToken`] slot that the
//! API client reads on every request.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::api::{AuthApi, AuthToken, User, UserApi, UserProfile};
use crate::config::SessionConfig;
use crate::error::{ChataiError, Result};
use crate::notify::Notifier;

/// The persisted session credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    /// Bearer token issued by the backend
    pub token: String,
    /// Local expiry of the credential
    #[serde(with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl StoredCredential {
    /// Whether the credential is past its expiry
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Where the session credential lives between runs
pub trait CredentialStore: Send + Sync {
    /// Load the credential, `None` when nothing is stored
    fn load(&self) -> Result<Option<StoredCredential>>;

    /// Persist the credential
    fn save(&self, credential: &StoredCredential) -> Result<()>;

    /// Remove the credential
    fn clear(&self) -> Result<()>;
}

/// Credential store backed by the OS keyring
///
/// Stored as JSON under the configured service and user names.
#[derive(Debug, Clone)]
pub struct KeyringCredentialStore {
    service: String,
    user: String,
}

impl KeyringCredentialStore {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            service: config.keyring_service.clone(),
            user: config.keyring_user.clone(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry> {
        Ok(keyring::Entry::new(&self.service, &self.user)?)
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn load(&self) -> Result<Option<StoredCredential>> {
        match self.entry()?.get_password() {
            Ok(json) if json.is_empty() => Ok(None),
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, credential: &StoredCredential) -> Result<()> {
        let json = serde_json::to_string(credential)?;
        self.entry()?.set_password(&json)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Credential store that forgets everything on exit
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: Mutex<Option<StoredCredential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<StoredCredential>> {
        Ok(self.credential.lock().map(|c| c.clone()).unwrap_or_default())
    }

    fn save(&self, credential: &StoredCredential) -> Result<()> {
        if let Ok(mut slot) = self.credential.lock() {
            *slot = Some(credential.clone());
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if let Ok(mut slot) = self.credential.lock() {
            *slot = None;
        }
        Ok(())
    }
}

/// Backend endpoints a session needs
pub trait SessionApi: AuthApi + UserApi {}

impl<T: AuthApi + UserApi> SessionApi for T {}

/// The signed-in user and their credential
pub struct Session {
    api: Arc<dyn SessionApi>,
    store: Arc<dyn CredentialStore>,
    token: AuthToken,
    notifier: Arc<dyn Notifier>,
    ttl: Duration,
    user: Mutex<Option<User>>,
}

impl Session {
    /// Create a signed-out session
    pub fn new(
        api: Arc<dyn SessionApi>,
        store: Arc<dyn CredentialStore>,
        token: AuthToken,
        notifier: Arc<dyn Notifier>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            api,
            store,
            token,
            notifier,
            ttl: Duration::days(config.token_ttl_days),
            user: Mutex::new(None),
        }
    }

    /// The signed-in user
    pub fn user(&self) -> Option<User> {
        self.user.lock().map(|u| u.clone()).unwrap_or_default()
    }

    /// Whether a user is signed in
    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    fn set_user(&self, user: Option<User>) {
        if let Ok(mut slot) = self.user.lock() {
            *slot = user;
        }
    }

    /// Restore the persisted session
    ///
    /// Installs a stored, unexpired credential and fetches the profile with
    /// it. A credential the backend rejects (or any failure to fetch the
    /// profile) is cleared, leaving the session signed out.
    pub async fn init(&self) -> Result<Option<User>> {
        let credential = match self.store.load() {
            Ok(Some(credential)) => credential,
            Ok(None) => return Ok(None),
            Err(e) => {
                tracing::warn!("Failed to read stored credential: {}", e);
                return Ok(None);
            }
        };

        if credential.is_expired() {
            tracing::info!("Stored credential expired, signing out");
            self.clear();
            return Ok(None);
        }

        self.token.set(&credential.token);
        match self.api.get_profile().await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Restored session");
                self.set_user(Some(user.clone()));
                Ok(Some(user))
            }
            Err(e) => {
                tracing::error!("Error fetching user: {}", e);
                self.clear();
                Ok(None)
            }
        }
    }

    /// Sign in with email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        match self.api.login(email, password).await {
            Ok(response) => {
                self.establish(response.token, response.user.clone())?;
                self.notifier.success("Login successful!");
                Ok(response.user)
            }
            Err(e) => {
                self.notifier.error(&server_message(&e, "Login failed"));
                Err(e)
            }
        }
    }

    /// Create an account and sign in
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User> {
        match self.api.register(name, email, password).await {
            Ok(response) => {
                self.establish(response.token, response.user.clone())?;
                self.notifier.success("Registration successful!");
                Ok(response.user)
            }
            Err(e) => {
                self.notifier.error(&server_message(&e, "Registration failed"));
                Err(e)
            }
        }
    }

    fn establish(&self, token: String, user: User) -> Result<()> {
        let credential = StoredCredential {
            token,
            expires_at: Utc::now() + self.ttl,
        };
        self.store.save(&credential)?;
        self.token.set(credential.token);
        tracing::info!(user_id = %user.id, "Signed in");
        self.set_user(Some(user));
        Ok(())
    }

    /// Sign out and forget the credential
    pub fn logout(&self) {
        self.clear();
        self.notifier.success("Logged out successfully");
    }

    /// Forget the credential without a notice
    ///
    /// Used when the backend rejects the session or the account is gone.
    pub fn clear(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to clear stored credential: {}", e);
        }
        self.token.clear();
        self.set_user(None);
    }

    /// Merge edited profile fields into the cached user
    pub fn update_user(&self, profile: &UserProfile) {
        if let Ok(mut slot) = self.user.lock() {
            if let Some(user) = slot.as_mut() {
                user.name = profile.name.clone();
                user.email = profile.email.clone();
                user.preferred_language = profile.preferred_language.clone();
            }
        }
    }

    /// Require a signed-in user
    pub fn require_user(&self) -> Result<User> {
        self.user()
            .ok_or_else(|| ChataiError::Authentication("Not logged in".to_string()).into())
    }
}

/// Server-provided error text, or `fallback`
pub(crate) fn server_message(err: &anyhow::Error, fallback: &str) -> String {
    match err.downcast_ref::<ChataiError>() {
        Some(ChataiError::Api { message, .. })
        | Some(ChataiError::Authentication(message))
        | Some(ChataiError::Validation(message)) => message.clone(),
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::test_utils::{FakeApi, FAKE_PASSWORD, FAKE_TOKEN};

    struct Harness {
        api: Arc<FakeApi>,
        store: Arc<MemoryCredentialStore>,
        token: AuthToken,
        notifier: Arc<RecordingNotifier>,
        session: Session,
    }

    fn harness() -> Harness {
        let api = Arc::new(FakeApi::new());
        let store = Arc::new(MemoryCredentialStore::new());
        let token = AuthToken::new();
        let notifier = Arc::new(RecordingNotifier::new());
        let session = Session::new(
            api.clone(),
            store.clone(),
            token.clone(),
            notifier.clone(),
            &SessionConfig::default(),
        );
        Harness {
            api,
            store,
            token,
            notifier,
            session,
        }
    }

    #[tokio::test]
    async fn test_init_without_credential_is_signed_out() {
        let h = harness();
        assert!(h.session.init().await.unwrap().is_none());
        assert!(!h.token.is_set());
        assert_eq!(h.api.call_count("get_profile"), 0);
    }

    #[tokio::test]
    async fn test_login_persists_credential() {
        let h = harness();
        let user = h.session.login("ada@example.com", FAKE_PASSWORD).await.unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(h.token.get().as_deref(), Some(FAKE_TOKEN));

        let stored = h.store.load().unwrap().unwrap();
        assert_eq!(stored.token, FAKE_TOKEN);
        assert!(stored.expires_at > Utc::now() + Duration::days(6));
    }

    #[tokio::test]
    async fn test_login_failure_surfaces_server_message() {
        let h = harness();
        assert!(h.session.login("ada@example.com", "wrong").await.is_err());
        assert!(!h.session.is_authenticated());
        assert_eq!(h.notifier.errors(), vec!["Invalid credentials".to_string()]);
    }

    #[tokio::test]
    async fn test_register_signs_in() {
        let h = harness();
        let user = h
            .session
            .register("Grace", "grace@example.com", "secret1")
            .await
            .unwrap();
        assert_eq!(user.name, "Grace");
        assert!(h.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_init_restores_session() {
        let h = harness();
        h.store
            .save(&StoredCredential {
                token: "saved".to_string(),
                expires_at: Utc::now() + Duration::days(1),
            })
            .unwrap();

        let user = h.session.init().await.unwrap();
        assert_eq!(user.unwrap().name, "Ada");
        assert_eq!(h.token.get().as_deref(), Some("saved"));
    }

    #[tokio::test]
    async fn test_init_with_rejected_token_clears_it() {
        let h = harness();
        h.store
            .save(&StoredCredential {
                token: "stale".to_string(),
                expires_at: Utc::now() + Duration::days(1),
            })
            .unwrap();
        h.api.fail("get_profile");

        assert!(h.session.init().await.unwrap().is_none());
        assert!(h.store.load().unwrap().is_none());
        assert!(!h.token.is_set());
    }

    #[tokio::test]
    async fn test_init_with_expired_credential_skips_profile() {
        let h = harness();
        h.store
            .save(&StoredCredential {
                token: "old".to_string(),
                expires_at: Utc::now() - Duration::minutes(1),
            })
            .unwrap();

        assert!(h.session.init().await.unwrap().is_none());
        assert_eq!(h.api.call_count("get_profile"), 0);
        assert!(h.store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let h = harness();
        h.session.login("ada@example.com", FAKE_PASSWORD).await.unwrap();
        h.session.logout();

        assert!(!h.session.is_authenticated());
        assert!(!h.token.is_set());
        assert!(h.store.load().unwrap().is_none());
        assert!(h.session.require_user().is_err());
    }

    #[tokio::test]
    async fn test_update_user_merges_profile() {
        let h = harness();
        h.session.login("ada@example.com", FAKE_PASSWORD).await.unwrap();
        h.session.update_user(&UserProfile {
            name: "Ada L.".to_string(),
            email: "ada@example.org".to_string(),
            preferred_language: "fr".to_string(),
        });
        let user = h.session.user().unwrap();
        assert_eq!(user.name, "Ada L.");
        assert_eq!(user.preferred_language, "fr");
        assert_eq!(user.id, "u1");
    }

    #[test]
    fn test_credential_json_round_trip() {
        let credential = StoredCredential {
            token: "t".to_string(),
            expires_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        };
        let json = serde_json::to_string(&credential).unwrap();
        assert!(json.contains("1700000000"));
        let back: StoredCredential = serde_json::from_str(&json).unwrap();
        assert_eq!(back, credential);
    }
}
