//! Request/response transport to the game server's REST API

use crate::config::ServerSettings;
use crate::error::{LobbyError, Result};
use crate::types::{CreateGameRequest, GameRecord};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Trait for the game server's REST operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameApi: Send + Sync {
    /// List games that are still waiting for players
    async fn list_pending_games(&self) -> Result<Vec<GameRecord>>;

    /// Create a game with the creator already seated
    async fn create_game(&self, request: CreateGameRequest) -> Result<GameRecord>;

    /// Seat a user at an existing game
    async fn add_player(&self, game_id: &str, user_id: &str) -> Result<GameRecord>;
}

/// reqwest-backed implementation of [`GameApi`]
pub struct HttpGameApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpGameApi {
    /// Create a client for `settings.api_url` + `settings.api_prefix`
    pub fn new(settings: &ServerSettings, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| LobbyError::ConfigurationError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        let base_url = format!(
            "{}{}",
            settings.api_url.trim_end_matches('/'),
            settings.api_prefix.trim_end_matches('/')
        );

        Ok(Self {
            client,
            base_url,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Full URL for a path below the versioned prefix
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn request<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let mut builder = self.client.request(method, &url);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| LobbyError::Request {
            status: 0,
            message: format!("Network error: {}", e),
        })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let value: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::Null)
        };

        if !status.is_success() {
            let message = error_message(&value, status);
            warn!("{} failed with status {}: {}", url, status.as_u16(), message);
            return Err(LobbyError::Request {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        // Some endpoints answer 200 with `{success: false, message}`
        if value.get("success").and_then(Value::as_bool) == Some(false) {
            return Err(LobbyError::Request {
                status: status.as_u16(),
                message: error_message(&value, status),
            }
            .into());
        }

        let payload = unwrap_data(value);
        serde_json::from_value(payload).map_err(|e| {
            LobbyError::Request {
                status: status.as_u16(),
                message: format!("Unexpected response from {}: {}", url, e),
            }
            .into()
        })
    }
}

#[async_trait]
impl GameApi for HttpGameApi {
    async fn list_pending_games(&self) -> Result<Vec<GameRecord>> {
        self.request::<(), _>(Method::GET, "games?status=pending", None)
            .await
    }

    async fn create_game(&self, request: CreateGameRequest) -> Result<GameRecord> {
        self.request(Method::POST, "games", Some(&request)).await
    }

    async fn add_player(&self, game_id: &str, user_id: &str) -> Result<GameRecord> {
        let body = serde_json::json!({ "userId": user_id });
        self.request(Method::POST, &format!("games/{}/players", game_id), Some(&body))
            .await
    }
}

/// User-facing text for a failed request: the server's `message` verbatim
/// when present, otherwise a generic fallback.
pub fn error_message(body: &Value, status: StatusCode) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()))
}

/// Accept both bare payloads and `{data: ...}` wrappers
fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") && !map.contains_key("id") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
