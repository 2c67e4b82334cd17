//! In-process backing store with the same rules as the hosted one.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{StoreError, StoreResult, UserStore};
use crate::core::address::WalletAddress;
use crate::user::{NewUser, User, UserId, UserPatch};

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize {
        self.users.read().map(|u| u.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    fn poisoned() -> StoreError { StoreError::Transport("store lock poisoned".into()) }
}

/// Unique constraint check, skipping the row being updated.
fn taken(users: &HashMap<UserId, User>, skip: Option<&UserId>, username: Option<&str>, wallet: Option<&WalletAddress>) -> bool {
    users.values().filter(|u| Some(&u.id) != skip).any(|u| {
        username.map_or(false, |n| u.username == n) || wallet.map_or(false, |w| &u.wallet_address == w)
    })
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_wallet(&self, address: &WalletAddress) -> StoreResult<Option<User>> {
        let users = self.users.read().map_err(|_| Self::poisoned())?;
        Ok(users.values().find(|u| &u.wallet_address == address).cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> StoreResult<Option<User>> {
        let users = self.users.read().map_err(|_| Self::poisoned())?;
        Ok(users.get(id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let users = self.users.read().map_err(|_| Self::poisoned())?;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn create(&self, new_user: NewUser) -> StoreResult<User> {
        new_user.validate()?;
        let mut users = self.users.write().map_err(|_| Self::poisoned())?;
        if taken(&users, None, Some(&new_user.username), Some(&new_user.wallet_address)) {
            return Err(StoreError::conflict());
        }
        let user = User::provision(new_user);
        users.insert(user.id, user.clone());
        tracing::debug!(id = %user.id, wallet = %user.wallet_address, "user created");
        Ok(user)
    }

    async fn update(&self, id: &UserId, patch: UserPatch) -> StoreResult<User> {
        patch.validate()?;
        let mut users = self.users.write().map_err(|_| Self::poisoned())?;
        if !users.contains_key(id) {
            return Err(StoreError::NotFound);
        }
        if taken(&users, Some(id), patch.username.as_deref(), patch.wallet_address.as_ref()) {
            return Err(StoreError::conflict());
        }
        let user = users.get_mut(id).ok_or(StoreError::NotFound)?;
        user.apply(patch);
        Ok(user.clone())
    }

    async fn delete(&self, id: &UserId) -> StoreResult<()> {
        let mut users = self.users.write().map_err(|_| Self::poisoned())?;
        users.remove(id);
        Ok(())
    }
}
