//! App Configuration - environment first, CLI flags override

use thiserror::Error;

use crate::core::address::WalletAddress;
use crate::core::paths::{DEFAULT_API_URL, DEFAULT_PORT};
use crate::verify::{VerifyError, XApiClient};

pub mod env {
    pub const PORT: &str = "EVENTDAO_PORT";
    pub const API_URL: &str = "EVENTDAO_API_URL";
    pub const CORS_ORIGINS: &str = "EVENTDAO_CORS_ORIGINS";
    pub const ADMIN_WALLET: &str = "EVENTDAO_ADMIN_WALLET";
    pub const TIMEOUT_SECS: &str = "EVENTDAO_TIMEOUT_SECS";
    pub const ENVIRONMENT: &str = "EVENTDAO_ENV";
    pub const X_BEARER_TOKEN: &str = "X_BEARER_TOKEN";
}

pub const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:3000", "http://localhost:3001"];
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {var}={value:?}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

impl ConfigError {
    fn new(var: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self { var, value: value.to_string(), reason: reason.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "test" => Some(Environment::Test),
            "production" | "prod" => Some(Environment::Production),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Base URL of the user service, ending in `/api`
    pub api_url: String,
    pub cors_origins: Vec<String>,
    pub admin_wallet: Option<WalletAddress>,
    pub timeout_secs: u64,
    pub environment: Environment,
    pub x_bearer_token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_url: DEFAULT_API_URL.into(),
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
            admin_wallet: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            environment: Environment::default(),
            x_bearer_token: None,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self { Self::default() }
    pub fn with_port(mut self, port: u16) -> Self { self.port = port; self }
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self { self.api_url = url.into(); self }
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self { self.cors_origins = origins; self }
    pub fn with_admin_wallet(mut self, wallet: WalletAddress) -> Self { self.admin_wallet = Some(wallet); self }
    pub fn with_timeout_secs(mut self, secs: u64) -> Self { self.timeout_secs = secs; self }
    pub fn with_environment(mut self, env: Environment) -> Self { self.environment = env; self }
    pub fn with_x_bearer_token(mut self, token: impl Into<String>) -> Self { self.x_bearer_token = Some(token.into()); self }

    /// X API client from `x_bearer_token`.
    pub fn x_client(&self) -> Result<XApiClient, VerifyError> {
        let token = self.x_bearer_token.as_deref().ok_or(VerifyError::NotConfigured)?;
        XApiClient::new(token)
    }

    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(raw) = get(env::PORT) {
            config.port = raw.parse().map_err(|_| ConfigError::new(env::PORT, &raw, "expected a port number"))?;
        }
        if let Some(raw) = get(env::API_URL) {
            if !crate::core::validation::is_valid_url(&raw) {
                return Err(ConfigError::new(env::API_URL, &raw, "expected an http(s) URL"));
            }
            config.api_url = raw.trim_end_matches('/').to_string();
        }
        if let Some(raw) = get(env::CORS_ORIGINS) {
            config.cors_origins = raw
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(raw) = get(env::ADMIN_WALLET) {
            let wallet = WalletAddress::parse(&raw).map_err(|e| ConfigError::new(env::ADMIN_WALLET, &raw, e.to_string()))?;
            config.admin_wallet = Some(wallet);
        }
        if let Some(raw) = get(env::TIMEOUT_SECS) {
            config.timeout_secs = match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => return Err(ConfigError::new(env::TIMEOUT_SECS, &raw, "expected a positive number of seconds")),
            };
        }
        if let Some(raw) = get(env::ENVIRONMENT) {
            config.environment = Environment::from_str(&raw)
                .ok_or_else(|| ConfigError::new(env::ENVIRONMENT, &raw, "expected development, test or production"))?;
        }
        config.x_bearer_token = get(env::X_BEARER_TOKEN);

        Ok(config)
    }
}
