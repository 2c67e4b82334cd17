//! Path constants for the user API, UI redirects and the X API
//!
//! Centralized registry for every route the crate serves or calls.

/// Routes served by the user service
pub mod api {
    pub const HEALTH: &str = "/health";
    pub const USERS: &str = "/api/users";
    pub const USER_BY_ID: &str = "/api/users/:id";
    pub const USER_BY_WALLET: &str = "/api/users/wallet/:wallet_address";

    /// Header carrying the caller's wallet for admin-gated routes
    pub const WALLET_HEADER: &str = "x-wallet-address";
}

/// Client-side URLs, relative to a base ending in `/api`
pub mod client {
    pub fn users(base: &str) -> String { format!("{}/users", base.trim_end_matches('/')) }
    pub fn user(base: &str, id: &str) -> String { format!("{}/{}", users(base), id) }
    pub fn user_by_wallet(base: &str, address: &str) -> String { format!("{}/wallet/{}", users(base), address) }
}

/// UI pages the session coordinator may redirect to
pub mod ui {
    pub const SETUP_USERNAME: &str = "/setup-username";
}

/// X (Twitter) API v2
pub mod x_api {
    pub const BASE: &str = "https://api.twitter.com/2";

    pub fn tweets(base: &str, account_id: &str) -> String {
        format!("{}/users/{}/tweets?max_results=10&tweet.fields=created_at", base, account_id)
    }
    pub fn following(base: &str, account_id: &str) -> String {
        format!("{}/users/{}/following?user.fields=username", base, account_id)
    }
}

/// Defaults
pub const DEFAULT_API_URL: &str = "http://localhost:4000/api";
pub const DEFAULT_PORT: u16 = 4000;
pub const SERVICE_NAME: &str = "eventdao";
