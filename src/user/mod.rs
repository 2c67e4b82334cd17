//! User records: the profile row, the registration payload and partial updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::address::WalletAddress;
use crate::core::validation::{is_valid_url, validate_username};
use crate::store::{StoreError, StoreResult};

pub type UserId = Uuid;

/// A profile keyed by wallet address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub wallet_address: WalletAddress,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub reputation: u64,
    #[serde(default)]
    pub total_staked: f64,
    #[serde(default)]
    pub total_verified: u64,
    #[serde(default)]
    pub evt_credits: u64,
    #[serde(default)]
    pub total_evt_earned: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Fresh profile with zeroed counters.
    pub fn provision(new_user: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            wallet_address: new_user.wallet_address,
            username: new_user.username,
            avatar_url: None,
            reputation: 0,
            total_staked: 0.0,
            total_verified: 0,
            evt_credits: 0,
            total_evt_earned: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn apply(&mut self, patch: UserPatch) {
        if let Some(username) = patch.username { self.username = username; }
        if let Some(wallet_address) = patch.wallet_address { self.wallet_address = wallet_address; }
        if let Some(avatar_url) = patch.avatar_url { self.avatar_url = Some(avatar_url); }
        self.updated_at = Utc::now();
    }
}

/// Registration payload (`POST /api/users`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub wallet_address: WalletAddress,
}

impl NewUser {
    pub fn new(username: impl Into<String>, wallet_address: WalletAddress) -> Self {
        Self { username: username.into().trim().to_string(), wallet_address }
    }

    pub fn validate(&self) -> StoreResult<()> {
        validate_username(&self.username).map_err(StoreError::Validation)
    }
}

/// Partial update (`PUT /api/users/:id`). Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<WalletAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserPatch {
    pub fn username(mut self, username: impl Into<String>) -> Self { self.username = Some(username.into().trim().to_string()); self }
    pub fn avatar_url(mut self, url: impl Into<String>) -> Self { self.avatar_url = Some(url.into()); self }
    pub fn wallet_address(mut self, address: WalletAddress) -> Self { self.wallet_address = Some(address); self }

    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.wallet_address.is_none() && self.avatar_url.is_none()
    }

    pub fn validate(&self) -> StoreResult<()> {
        if let Some(ref username) = self.username {
            validate_username(username).map_err(StoreError::Validation)?;
        }
        if let Some(ref url) = self.avatar_url {
            if !is_valid_url(url) {
                return Err(StoreError::Validation(format!("Invalid avatar URL: {}", url)));
            }
        }
        Ok(())
    }
}
