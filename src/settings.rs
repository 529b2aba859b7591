//! Preferences, profile, and account management
//!
//! Thin wrappers over [`UserApi`] that add the local validation and
//! confirmation steps the backend does not perform.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::api::{AppSettings, PasswordChange, SettingsPatch, UserApi, UserProfile};
use crate::error::{ChataiError, Result};
use crate::notify::{Confirmer, Notifier};
use crate::session::{server_message, Session};

/// Minimum accepted length of a new password
pub const MIN_PASSWORD_LEN: usize = 6;

/// Word that must be typed to confirm account deletion
pub const DELETE_CONFIRMATION: &str = "DELETE";

/// Cached application preferences
///
/// Updates are two-phase: applied locally, sent to the backend, and rolled
/// back if the backend refuses them.
pub struct SettingsManager {
    api: Arc<dyn UserApi>,
    notifier: Arc<dyn Notifier>,
    settings: Mutex<AppSettings>,
}

impl SettingsManager {
    /// Start from the default preferences
    pub fn new(api: Arc<dyn UserApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            settings: Mutex::new(AppSettings::default()),
        }
    }

    /// Current preferences
    pub fn settings(&self) -> AppSettings {
        self.settings.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn replace(&self, settings: AppSettings) {
        if let Ok(mut slot) = self.settings.lock() {
            *slot = settings;
        }
    }

    /// Fetch stored preferences
    ///
    /// Failures are logged and the current preferences kept.
    pub async fn load(&self) -> AppSettings {
        match self.api.get_settings().await {
            Ok(settings) => {
                self.replace(settings.clone());
                settings
            }
            Err(e) => {
                tracing::error!("Error loading user settings: {}", e);
                self.settings()
            }
        }
    }

    /// Apply `patch` and persist the result
    pub async fn save(&self, patch: &SettingsPatch) -> Result<AppSettings> {
        let prior = self.settings();
        if patch.is_empty() {
            return Ok(prior);
        }

        let updated = patch.apply_to(&prior);
        self.replace(updated.clone());

        if let Err(e) = self.api.update_settings(&updated).await {
            tracing::error!("Error saving settings: {}", e);
            self.replace(prior);
            self.notifier.error("Failed to save settings");
            return Err(e);
        }

        self.notifier.success("Settings saved");
        Ok(updated)
    }
}

/// Password change form as entered by the user
#[derive(Debug, Clone, Default)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordForm {
    /// Check the form and produce the request body
    pub fn validate(&self) -> Result<PasswordChange> {
        if self.current_password.is_empty()
            || self.new_password.is_empty()
            || self.confirm_password.is_empty()
        {
            return Err(
                ChataiError::Validation("All password fields are required".to_string()).into(),
            );
        }
        if self.new_password != self.confirm_password {
            return Err(ChataiError::Validation("New passwords do not match".to_string()).into());
        }
        if self.new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ChataiError::Validation(format!(
                "New password must be at least {} characters",
                MIN_PASSWORD_LEN
            ))
            .into());
        }
        Ok(PasswordChange {
            current_password: self.current_password.clone(),
            new_password: self.new_password.clone(),
        })
    }
}

/// File name used for a data export taken today
pub fn export_file_name() -> String {
    format!("chat-ai-data-{}.json", Utc::now().format("%Y-%m-%d"))
}

/// Default directory for data exports: the user's download directory
pub fn default_export_dir() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Profile, password, export, and account deletion
pub struct AccountService {
    api: Arc<dyn UserApi>,
    notifier: Arc<dyn Notifier>,
}

impl AccountService {
    pub fn new(api: Arc<dyn UserApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self { api, notifier }
    }

    /// Save profile edits and mirror them into the session
    pub async fn save_profile(&self, session: &Session, profile: &UserProfile) -> Result<()> {
        let profile = UserProfile {
            name: profile.name.trim().to_string(),
            email: profile.email.trim().to_string(),
            preferred_language: profile.preferred_language.clone(),
        };
        if profile.name.is_empty() || profile.email.is_empty() {
            self.notifier.error("Name and email are required");
            return Err(ChataiError::Validation("Name and email are required".to_string()).into());
        }

        if let Err(e) = self.api.update_profile(&profile).await {
            tracing::error!("Error updating profile: {}", e);
            let message = server_message(&e, "Failed to update profile");
            self.notifier.error(&message);
            return Err(e);
        }

        session.update_user(&profile);
        self.notifier.success("Profile updated successfully");
        Ok(())
    }

    /// Validate the form and change the password
    pub async fn change_password(&self, form: &PasswordForm) -> Result<()> {
        let change = match form.validate() {
            Ok(change) => change,
            Err(e) => {
                self.notifier.error(&server_message(&e, "Invalid password"));
                return Err(e);
            }
        };

        if let Err(e) = self.api.change_password(&change).await {
            tracing::error!("Error changing password: {}", e);
            let message = server_message(&e, "Failed to change password");
            self.notifier.error(&message);
            return Err(e);
        }

        self.notifier.success("Password changed successfully");
        Ok(())
    }

    /// Download the account's data into `dir`
    ///
    /// Returns the path of the written file.
    pub async fn export_data(&self, dir: &Path) -> Result<PathBuf> {
        let data = match self.api.export_data().await {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("Error exporting data: {}", e);
                self.notifier.error("Failed to export data");
                return Err(e);
            }
        };

        let path = dir.join(export_file_name());
        let json = serde_json::to_string_pretty(&data)?;
        tokio::fs::write(&path, json).await?;

        tracing::info!(path = %path.display(), "Exported account data");
        self.notifier.success("Data exported successfully");
        Ok(path)
    }

    /// Delete the account after two confirmations, then sign out
    ///
    /// Returns `Ok(false)` when the user backed out.
    pub async fn delete_account(
        &self,
        session: &Session,
        confirmer: &dyn Confirmer,
    ) -> Result<bool> {
        if !confirmer.confirm(
            "Are you sure you want to delete your account? This action cannot be undone.",
        ) {
            return Ok(false);
        }

        let typed = confirmer.ask("Type \"DELETE\" to confirm account deletion:");
        if typed.as_deref() != Some(DELETE_CONFIRMATION) {
            self.notifier.error("Account deletion cancelled");
            return Ok(false);
        }

        if let Err(e) = self.api.delete_account().await {
            tracing::error!("Error deleting account: {}", e);
            let message = server_message(&e, "Failed to delete account");
            self.notifier.error(&message);
            return Err(e);
        }

        session.clear();
        self.notifier.success("Account deleted successfully");
        Ok(true)
    }
}
