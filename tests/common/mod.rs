use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::MockServer;

use chatai::api::{AuthToken, HttpApiClient};
use chatai::config::ApiConfig;

/// Client pointed at a mock server, with a shared token slot
#[allow(dead_code)]
pub fn client_for(server: &MockServer) -> (Arc<HttpApiClient>, AuthToken) {
    let token = AuthToken::new();
    let config = ApiConfig {
        base_url: server.uri(),
        timeout_seconds: 5,
    };
    let client = HttpApiClient::new(&config, token.clone()).expect("failed to build client");
    (Arc::new(client), token)
}

/// Chat summary as the backend returns it
#[allow(dead_code)]
pub fn chat_json(id: &str, title: &str, updated_at: &str) -> Value {
    json!({
        "_id": id,
        "title": title,
        "createdAt": "2024-03-01T10:00:00Z",
        "updatedAt": updated_at
    })
}

/// Message exchange as the backend returns it
#[allow(dead_code)]
pub fn exchange_json(text: &str, reply: &str) -> Value {
    json!({
        "userMessage": {
            "role": "user",
            "content": text,
            "timestamp": "2024-03-01T10:00:00Z"
        },
        "assistantMessage": {
            "role": "assistant",
            "content": reply,
            "timestamp": "2024-03-01T10:00:01Z"
        }
    })
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
