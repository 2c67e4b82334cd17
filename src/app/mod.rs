//! App - composition root
//!
//! Builds one `Arc<dyn UserStore>` and hands it to everything that needs
//! it: session coordinators, the HTTP router, the CLI.
//!
//! ```text
//! AppConfig ──► App
//!                 ├── store()   → Arc<dyn UserStore>  (HttpUserStore | MemoryUserStore)
//!                 ├── session() → SessionCoordinator
//!                 ├── router()  → axum::Router over the same store
//!                 └── x_client()→ XApiClient (needs X_BEARER_TOKEN)
//! ```

mod config;

pub use config::{env, AppConfig, ConfigError, Environment, DEFAULT_CORS_ORIGINS, DEFAULT_TIMEOUT_SECS};

use axum::Router;
use std::sync::Arc;

use crate::auth::AdminPolicy;
use crate::server::{cors_layer, router, ServerState};
use crate::session::SessionCoordinator;
use crate::store::{HttpStoreConfig, HttpUserStore, MemoryUserStore, StoreResult, UserStore};
use crate::verify::{VerifyError, XApiClient};

#[derive(Clone)]
pub struct App {
    config: AppConfig,
    store: Arc<dyn UserStore>,
}

impl App {
    /// Talk to the user service at `config.api_url`.
    pub fn remote(config: AppConfig) -> StoreResult<Self> {
        let store = HttpUserStore::new(
            HttpStoreConfig::new(config.api_url.clone()).with_timeout_secs(config.timeout_secs),
        )?;
        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Keep users in process memory.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::with_store(config, Arc::new(MemoryUserStore::new()))
    }

    pub fn with_store(config: AppConfig, store: Arc<dyn UserStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &AppConfig { &self.config }

    pub fn store(&self) -> Arc<dyn UserStore> { self.store.clone() }

    pub fn admin_policy(&self) -> AdminPolicy { AdminPolicy::new(self.config.admin_wallet.clone()) }

    /// A fresh coordinator; one per wallet adapter.
    pub fn session(&self) -> SessionCoordinator { SessionCoordinator::new(self.store()) }

    pub fn router(&self) -> Router {
        let state = ServerState::new(self.store(), self.admin_policy());
        router(state, cors_layer(&self.config.cors_origins))
    }

    pub fn x_client(&self) -> Result<XApiClient, VerifyError> { self.config.x_client() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::address::WalletAddress;

    #[tokio::test]
    async fn coordinator_and_store_share_state() {
        let app = App::in_memory(AppConfig::default());
        let session = app.session();
        let wallet = WalletAddress::from_public_key(&[4; 32]);
        session.connect(wallet.clone()).await.unwrap();
        session.register("grace").await.unwrap();
        assert!(app.store().find_by_wallet(&wallet).await.unwrap().is_some());
    }

    #[test]
    fn x_client_needs_token() {
        let app = App::in_memory(AppConfig::default());
        assert_eq!(app.x_client().err(), Some(VerifyError::NotConfigured));
        let app = App::in_memory(AppConfig::default().with_x_bearer_token("t"));
        assert!(app.x_client().is_ok());
    }

    #[test]
    fn remote_builds_without_network() {
        let app = App::remote(AppConfig::default().with_api_url("http://127.0.0.1:9/api")).unwrap();
        assert_eq!(app.config().api_url, "http://127.0.0.1:9/api");
    }
}
