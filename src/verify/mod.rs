//! Verify - social mission checks and the poll loop that drives them
//!
//! # Architecture
//!
//! ```text
//! spawn_poll(check, PollConfig) → PollHandle (drop = cancel)
//!     │
//!     └── every interval_ms, up to max_attempts:
//!           VerificationCheck::check()
//!             ├── TweetCheck  → XApiClient::recent_tweets → TweetCriteria::any_match
//!             └── FollowCheck → XApiClient::following     → follows()
//! ```

mod poll;
#[cfg(feature = "native")]
mod x_api;

pub use poll::{poll_until, spawn_poll, PollConfig, PollHandle, PollOutcome};
#[cfg(feature = "native")]
pub use x_api::{FollowCheck, TweetCheck, XApiClient};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("X API bearer token not configured")]
    NotConfigured,

    #[error("X API error: {0}")]
    Api(String),

    #[error("X API unreachable: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XUser {
    pub id: String,
    pub username: String,
}

/// What a qualifying tweet must contain. Empty criteria match any tweet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetCriteria {
    pub mention: Option<String>,
    pub hashtag: Option<String>,
}

impl TweetCriteria {
    pub fn with_mention(mut self, mention: impl Into<String>) -> Self { self.mention = Some(mention.into()); self }
    pub fn with_hashtag(mut self, hashtag: impl Into<String>) -> Self { self.hashtag = Some(hashtag.into()); self }

    /// Case-insensitive substring match on both fields.
    pub fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        let has = |needle: &Option<String>| needle.as_ref().map_or(true, |n| text.contains(&n.to_lowercase()));
        has(&self.mention) && has(&self.hashtag)
    }

    pub fn any_match(&self, tweets: &[Tweet]) -> bool {
        tweets.iter().any(|t| self.matches(&t.text))
    }
}

/// Case-insensitive; a leading `@` on the target is ignored.
pub fn follows(following: &[XUser], target: &str) -> bool {
    let target = target.trim_start_matches('@');
    following.iter().any(|u| u.username.eq_ignore_ascii_case(target))
}

/// One attempt at a mission check.
#[async_trait]
pub trait VerificationCheck: Send + Sync {
    async fn check(&self) -> Result<bool, VerifyError>;
}
