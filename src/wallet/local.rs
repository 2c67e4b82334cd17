//! LocalWallet - in-process ed25519 keypair acting as a wallet adapter

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use super::{WalletAdapter, WalletError, WalletStatus};
use crate::core::address::WalletAddress;

/// Holds one active keypair; `switch_account` swaps it the way a browser
/// extension does, without a disconnect in between.
#[derive(Clone)]
pub struct LocalWallet {
    key: Arc<Mutex<SigningKey>>,
    status: Arc<watch::Sender<WalletStatus>>,
}

impl LocalWallet {
    pub fn generate() -> Self { Self::from_key(SigningKey::generate(&mut OsRng)) }

    pub fn from_seed(seed: [u8; 32]) -> Self { Self::from_key(SigningKey::from_bytes(&seed)) }

    fn from_key(key: SigningKey) -> Self {
        let (tx, _rx) = watch::channel(WalletStatus::disconnected());
        Self { key: Arc::new(Mutex::new(key)), status: Arc::new(tx) }
    }

    pub fn address(&self) -> WalletAddress {
        let key = self.key.lock().unwrap_or_else(|p| p.into_inner());
        WalletAddress::from_public_key(&key.verifying_key().to_bytes())
    }

    pub fn connect(&self) {
        self.status.send_replace(WalletStatus::connected(self.address().to_string()));
    }

    pub fn disconnect(&self) {
        self.status.send_replace(WalletStatus::disconnected());
    }

    /// Swap the active account. Reports the new key at once if connected.
    pub fn switch_account(&self, seed: [u8; 32]) {
        {
            let mut key = self.key.lock().unwrap_or_else(|p| p.into_inner());
            *key = SigningKey::from_bytes(&seed);
        }
        if self.status.borrow().connected {
            self.connect();
        }
    }
}

#[async_trait]
impl WalletAdapter for LocalWallet {
    fn status(&self) -> WalletStatus { self.status.borrow().clone() }

    fn subscribe(&self) -> watch::Receiver<WalletStatus> { self.status.subscribe() }

    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, WalletError> {
        if !self.status.borrow().connected {
            return Err(WalletError::NotConnected);
        }
        let key = self.key.lock().map_err(|_| WalletError::Signing("key lock".into()))?;
        Ok(key.sign(message).to_bytes().to_vec())
    }
}
