//! Error taxonomy for the backing store.

use serde::Serialize;
use thiserror::Error;

/// Every persistence failure is normalized into one of these at the client
/// boundary. Nothing downstream looks at raw status codes or bodies.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum StoreError {
    /// No row for the given key.
    #[error("User not found")]
    NotFound,

    /// Unique constraint on username or wallet address.
    #[error("{0}")]
    Conflict(String),

    /// Input rejected before or by the store.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network or server failure with no finer classification.
    #[error("{0}")]
    Transport(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub const CONFLICT_MESSAGE: &str = "User with this username or wallet address already exists";

impl StoreError {
    pub fn conflict() -> Self { Self::Conflict(CONFLICT_MESSAGE.into()) }

    /// Only `Transport` failures are worth an identical retry.
    pub fn is_retryable(&self) -> bool { matches!(self, Self::Transport(_)) }

    /// Text a UI can show as-is.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound => "No profile found for this wallet. Please register.".into(),
            Self::Conflict(_) => "That username or wallet address is already taken.".into(),
            Self::Validation(msg) => format!("Invalid input: {}", msg),
            Self::Transport(msg) => format!("Something went wrong, try again. ({})", msg),
        }
    }
}
