//! Session states, the published view, and coordinator errors.

use serde::Serialize;
use thiserror::Error;

use crate::core::address::WalletAddress;
use crate::core::paths::ui;
use crate::store::StoreError;
use crate::user::User;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Wallet not connected")]
    NotConnected,

    #[error("Session is not awaiting registration")]
    NotAwaitingRegistration,

    #[error("No profile loaded for this session")]
    NoProfile,

    /// The wallet disconnected or switched while the call was in flight.
    #[error("Session changed before the result arrived")]
    Superseded,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SessionState {
    Disconnected,
    Connecting { address: WalletAddress },
    ProfileFound { user: User },
    ProfileMissing { address: WalletAddress },
    Error { address: Option<WalletAddress>, error: StoreError },
}

impl Default for SessionState {
    fn default() -> Self { Self::Disconnected }
}

impl SessionState {
    pub fn phase(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting { .. } => "connecting",
            Self::ProfileFound { .. } => "profile_found",
            Self::ProfileMissing { .. } => "profile_missing",
            Self::Error { .. } => "error",
        }
    }

    pub fn address(&self) -> Option<&WalletAddress> {
        match self {
            Self::Disconnected => None,
            Self::Connecting { address } | Self::ProfileMissing { address } => Some(address),
            Self::ProfileFound { user } => Some(&user.wallet_address),
            Self::Error { address, .. } => address.as_ref(),
        }
    }
}

/// Snapshot published to subscribers on every transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub state: SessionState,
    /// Last failed registration attempt; only set while `ProfileMissing`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_error: Option<StoreError>,
}

impl SessionView {
    pub fn user(&self) -> Option<&User> {
        match &self.state {
            SessionState::ProfileFound { user } => Some(user),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&StoreError> {
        match &self.state {
            SessionState::Error { error, .. } => Some(error),
            _ => self.registration_error.as_ref(),
        }
    }

    /// Where the UI should navigate, if anywhere.
    pub fn redirect(&self) -> Option<&'static str> {
        match self.state {
            SessionState::ProfileMissing { .. } => Some(ui::SETUP_USERNAME),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<String> {
        match &self.state {
            SessionState::ProfileMissing { .. } => Some(
                self.registration_error
                    .as_ref()
                    .unwrap_or(&StoreError::NotFound)
                    .user_message(),
            ),
            SessionState::Error { error, .. } => Some(error.user_message()),
            _ => None,
        }
    }
}
