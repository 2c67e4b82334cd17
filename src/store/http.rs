//! HTTP client for the user service (`/api/users/**`)

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::{StoreError, StoreResult, UserStore};
use crate::core::address::WalletAddress;
use crate::core::paths::{client as urls, DEFAULT_API_URL};
use crate::user::{NewUser, User, UserId, UserPatch};

#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    /// Base URL ending in `/api`
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for HttpStoreConfig {
    fn default() -> Self { Self { base_url: DEFAULT_API_URL.into(), timeout_secs: 10 } }
}

impl HttpStoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self { Self { base_url: base_url.into(), ..Default::default() } }
    pub fn with_timeout_secs(mut self, secs: u64) -> Self { self.timeout_secs = secs; self }
}

/// Remote [`UserStore`]. One request per call, status codes mapped to
/// [`StoreError`] here and nowhere else.
pub struct HttpUserStore {
    config: HttpStoreConfig,
    client: Client,
}

#[derive(Deserialize)]
struct UserEnvelope { user: User }

#[derive(Deserialize)]
struct UsersEnvelope { users: Vec<User> }

impl HttpUserStore {
    pub fn new(config: HttpStoreConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Transport(format!("http client: {}", e)))?;
        Ok(Self { config, client })
    }

    pub fn base_url(&self) -> &str { &self.config.base_url }

    async fn decode<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| StoreError::Transport(format!("invalid response body: {}", e)));
        }
        Err(Self::classify(status, response).await)
    }

    async fn classify(status: StatusCode, response: Response) -> StoreError {
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
        match status {
            StatusCode::NOT_FOUND => StoreError::NotFound,
            StatusCode::CONFLICT => StoreError::Conflict(message),
            StatusCode::BAD_REQUEST => StoreError::Validation(details(&body).unwrap_or(message)),
            _ => StoreError::Transport(format!("HTTP {}: {}", status.as_u16(), message)),
        }
    }
}

/// `{"error": "...", "details": [...]}` → one line.
fn error_message(body: &Value) -> Option<String> {
    let error = body.get("error")?.as_str()?.to_string();
    match details(body) {
        Some(details) => Some(format!("{}: {}", error, details)),
        None => Some(error),
    }
}

/// Entries are plain strings (this crate's server) or zod issues with a `message`.
fn details(body: &Value) -> Option<String> {
    let details: Vec<&str> = body
        .get("details")?
        .as_array()?
        .iter()
        .filter_map(|v| v.as_str().or_else(|| v.get("message")?.as_str()))
        .collect();
    if details.is_empty() { None } else { Some(details.join("; ")) }
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Transport(e.to_string())
}

#[async_trait]
impl UserStore for HttpUserStore {
    async fn find_by_wallet(&self, address: &WalletAddress) -> StoreResult<Option<User>> {
        let url = urls::user_by_wallet(&self.config.base_url, address.as_str());
        let response = self.client.get(&url).send().await.map_err(transport)?;
        match Self::decode::<UserEnvelope>(response).await {
            Ok(env) => Ok(Some(env.user)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn find_by_id(&self, id: &UserId) -> StoreResult<Option<User>> {
        let url = urls::user(&self.config.base_url, &id.to_string());
        let response = self.client.get(&url).send().await.map_err(transport)?;
        match Self::decode::<UserEnvelope>(response).await {
            Ok(env) => Ok(Some(env.user)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let url = urls::users(&self.config.base_url);
        let response = self.client.get(&url).send().await.map_err(transport)?;
        Ok(Self::decode::<UsersEnvelope>(response).await?.users)
    }

    async fn create(&self, new_user: NewUser) -> StoreResult<User> {
        new_user.validate()?;
        let url = urls::users(&self.config.base_url);
        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&new_user)
            .send()
            .await
            .map_err(transport)?;
        Ok(Self::decode::<UserEnvelope>(response).await?.user)
    }

    async fn update(&self, id: &UserId, patch: UserPatch) -> StoreResult<User> {
        patch.validate()?;
        let url = urls::user(&self.config.base_url, &id.to_string());
        let response = self
            .client
            .put(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&patch)
            .send()
            .await
            .map_err(transport)?;
        Ok(Self::decode::<UserEnvelope>(response).await?.user)
    }

    async fn delete(&self, id: &UserId) -> StoreResult<()> {
        let url = urls::user(&self.config.base_url, &id.to_string());
        let response = self.client.delete(&url).send().await.map_err(transport)?;
        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(Self::classify(status, response).await)
    }
}
