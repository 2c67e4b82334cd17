//! X (Twitter) API v2 client and the two mission checks built on it.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::{follows, Tweet, TweetCriteria, VerificationCheck, VerifyError, XUser};
use crate::core::paths::x_api;

/// `{"data": [...]}`; `data` is absent when the list is empty.
#[derive(Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

pub struct XApiClient {
    client: Client,
    base_url: String,
}

impl XApiClient {
    pub fn new(bearer_token: &str) -> Result<Self, VerifyError> {
        Self::with_base_url(bearer_token, x_api::BASE)
    }

    pub fn with_base_url(bearer_token: &str, base_url: impl Into<String>) -> Result<Self, VerifyError> {
        if bearer_token.trim().is_empty() {
            return Err(VerifyError::NotConfigured);
        }
        let mut headers = header::HeaderMap::new();
        let auth = header::HeaderValue::from_str(&format!("Bearer {}", bearer_token.trim()))
            .map_err(|_| VerifyError::NotConfigured)?;
        headers.insert(header::AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| VerifyError::Transport(e.to_string()))?;
        Ok(Self { client, base_url: base_url.into().trim_end_matches('/').to_string() })
    }

    async fn list<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>, VerifyError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| VerifyError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VerifyError::Api(format!("HTTP {}: {}", status.as_u16(), body)));
        }
        let parsed: ListResponse<T> = response
            .json()
            .await
            .map_err(|e| VerifyError::Api(format!("invalid response body: {}", e)))?;
        Ok(parsed.data)
    }

    /// Up to ten most recent tweets.
    pub async fn recent_tweets(&self, account_id: &str) -> Result<Vec<Tweet>, VerifyError> {
        self.list(&x_api::tweets(&self.base_url, account_id)).await
    }

    pub async fn following(&self, account_id: &str) -> Result<Vec<XUser>, VerifyError> {
        self.list(&x_api::following(&self.base_url, account_id)).await
    }
}

/// Has `account_id` recently tweeted something matching `criteria`?
pub struct TweetCheck {
    pub client: Arc<XApiClient>,
    pub account_id: String,
    pub criteria: TweetCriteria,
}

#[async_trait]
impl VerificationCheck for TweetCheck {
    async fn check(&self) -> Result<bool, VerifyError> {
        let tweets = self.client.recent_tweets(&self.account_id).await?;
        tracing::debug!(account = %self.account_id, checked = tweets.len(), "tweets checked");
        Ok(self.criteria.any_match(&tweets))
    }
}

/// Does `account_id` follow `target`?
pub struct FollowCheck {
    pub client: Arc<XApiClient>,
    pub account_id: String,
    pub target: String,
}

#[async_trait]
impl VerificationCheck for FollowCheck {
    async fn check(&self) -> Result<bool, VerifyError> {
        let following = self.client.following(&self.account_id).await?;
        Ok(follows(&following, &self.target))
    }
}
