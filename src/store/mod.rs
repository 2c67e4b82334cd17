//! Store - Persistence client for user records
//!
//! # Architecture
//!
//! ```text
//! SessionCoordinator / server routes
//!     │
//!     └── Arc<dyn UserStore>
//!           ├── HttpUserStore   (reqwest → /api/users/**)
//!           └── MemoryUserStore (RwLock<HashMap>, same uniqueness rules)
//! ```
//!
//! One round trip per call. No caching, no retries: failures go straight
//! back to the caller as a [`StoreError`].

mod error;
#[cfg(feature = "native")]
mod http;
mod memory;

pub use error::{StoreError, StoreResult, CONFLICT_MESSAGE};
#[cfg(feature = "native")]
pub use http::{HttpStoreConfig, HttpUserStore};
pub use memory::MemoryUserStore;

use async_trait::async_trait;

use crate::core::address::WalletAddress;
use crate::user::{NewUser, User, UserId, UserPatch};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// `Ok(None)` when the wallet has no profile yet.
    async fn find_by_wallet(&self, address: &WalletAddress) -> StoreResult<Option<User>>;

    async fn find_by_id(&self, id: &UserId) -> StoreResult<Option<User>>;

    /// Newest first.
    async fn list(&self) -> StoreResult<Vec<User>>;

    async fn create(&self, new_user: NewUser) -> StoreResult<User>;

    async fn update(&self, id: &UserId, patch: UserPatch) -> StoreResult<User>;

    /// Deleting an unknown id is not an error.
    async fn delete(&self, id: &UserId) -> StoreResult<()>;
}
