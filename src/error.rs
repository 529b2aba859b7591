//! Error types for Chatai
//!
//! This module defines all error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Chatai operations
///
/// Covers the failure classes a client of the remote assistant API can
/// observe: transport problems, rejected sessions, local validation, missing
/// resources, and server-side errors, plus conversions from the libraries
/// used for configuration and credential storage.
#[derive(Error, Debug)]
pub enum ChataiError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failures (connection refused, timeouts, DNS)
    #[error("Network error: {0}")]
    Network(String),

    /// The server rejected the session credential (HTTP 401)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Input rejected before any request was issued
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested resource does not exist (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success response from the API
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the server
        status: u16,
        /// Server-provided error text, or the raw body
        message: String,
    },

    /// The user declined a destructive action
    #[error("Cancelled: {0}")]
    ConfirmationDeclined(String),

    /// Device position could not be determined
    #[error("Geolocation error: {0}")]
    Geolocation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Result type alias for Chatai operations
///
/// Uses `anyhow::Error` so callers can attach context while the typed
/// [`ChataiError`] stays recoverable through `downcast_ref`.
pub type Result<T> = anyhow::Result<T>;

/// Returns `true` when the error chain carries a rejected session credential.
///
/// Front ends use this to tear down the session and ask for a new login.
pub fn is_auth_failure(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ChataiError>(),
        Some(ChataiError::Authentication(_))
    )
}

/// Returns `true` when the error chain carries a 404 from the API.
pub fn is_not_found(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ChataiError>(),
        Some(ChataiError::NotFound(_))
    )
}
