//! Wallet module - the wallet adapter seam
//!
//! A wallet adapter is whatever holds the user's chain account: a browser
//! extension in production, [`LocalWallet`] for the CLI and tests. The
//! session coordinator only reads [`WalletStatus`] and its change feed.
//!
//! # Architecture
//!
//! ```text
//! WalletAdapter (trait)
//!     │
//!     ├── status()      → WalletStatus {connected, public_key}
//!     ├── subscribe()   → watch::Receiver<WalletStatus>  ──► SessionCoordinator::run
//!     └── sign_message  → ed25519 signature bytes
//! ```

mod local;

pub use local::LocalWallet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Wallet not connected")]
    NotConnected,

    #[error("Signing failed: {0}")]
    Signing(String),
}

/// What the adapter reports on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletStatus {
    pub connected: bool,
    pub public_key: Option<String>,
}

impl WalletStatus {
    pub fn disconnected() -> Self { Self::default() }

    pub fn connected(public_key: impl Into<String>) -> Self {
        Self { connected: true, public_key: Some(public_key.into()) }
    }

    /// The public key, but only while connected.
    pub fn active_key(&self) -> Option<&str> {
        if self.connected { self.public_key.as_deref() } else { None }
    }
}

#[async_trait]
pub trait WalletAdapter: Send + Sync {
    fn status(&self) -> WalletStatus;

    /// Change feed. The current status is readable immediately via `borrow()`.
    fn subscribe(&self) -> watch::Receiver<WalletStatus>;

    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, WalletError>;
}
