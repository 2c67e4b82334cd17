//! EventDAO: wallet session and user provisioning.
//!
//! # Architecture
//!
//! ```text
//! WalletAdapter (LocalWallet | browser extension)
//!   │  watch::Receiver<WalletStatus>
//!   ▼
//! SessionCoordinator ── Disconnected → Connecting → ProfileFound | ProfileMissing | Error
//!   │  Arc<dyn UserStore>
//!   ▼
//! UserStore
//!   ├── HttpUserStore   → /api/users/**  (served by `server` or the hosted backend)
//!   └── MemoryUserStore   (tests, local dev)
//! ```
//!
//! # Session flow
//!
//! | Event | From | To |
//! |-------|------|----|
//! | wallet connects with K | any | `Connecting{K}` |
//! | lookup returns user | `Connecting` | `ProfileFound` |
//! | lookup returns nothing | `Connecting` | `ProfileMissing` (redirect `/setup-username`) |
//! | lookup fails | `Connecting` | `Error` |
//! | `register(name)` succeeds | `ProfileMissing` | `ProfileFound` |
//! | wallet disconnects | any | `Disconnected` |
//!
//! # Features
//!
//! - `native` (default) - HTTP store client, axum server, X API client, CLI
//!
//! # Usage
//!
//! ```ignore
//! use eventdao::{App, AppConfig, LocalWallet, Shutdown, WalletAdapter};
//!
//! let app = App::remote(AppConfig::from_env()?)?;
//! let session = app.session();
//! let wallet = LocalWallet::generate();
//! let _driver = session.run(wallet.subscribe(), Shutdown::new());
//! wallet.connect();
//! ```

// =============================================================================
// Shared modules
// =============================================================================
pub mod auth;
pub mod core;
pub mod runtime;
pub mod session;
pub mod store;
pub mod user;
pub mod verify;
pub mod wallet;

// =============================================================================
// Native-only modules (server, CLI, HTTP clients)
// =============================================================================
#[cfg(feature = "native")]
pub mod app;
#[cfg(feature = "native")]
pub mod logging;
#[cfg(feature = "native")]
pub mod server;

// =============================================================================
// Re-exports
// =============================================================================
pub use auth::{AdminError, AdminPolicy};
pub use core::address::{is_valid_address, AddressError, WalletAddress};
pub use runtime::Shutdown;
pub use session::{LookupTicket, SessionCoordinator, SessionError, SessionState, SessionView};
pub use store::{MemoryUserStore, StoreError, StoreResult, UserStore};
pub use user::{NewUser, User, UserId, UserPatch};
pub use verify::{PollConfig, PollHandle, PollOutcome, TweetCriteria, VerificationCheck, VerifyError};
pub use wallet::{LocalWallet, WalletAdapter, WalletError, WalletStatus};

#[cfg(feature = "native")]
pub use app::{App, AppConfig, ConfigError, Environment};
#[cfg(feature = "native")]
pub use runtime::install_signal_handlers;
#[cfg(feature = "native")]
pub use store::{HttpStoreConfig, HttpUserStore};
#[cfg(feature = "native")]
pub use verify::{FollowCheck, TweetCheck, XApiClient};
