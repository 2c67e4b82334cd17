//! Admin-wallet authorization for destructive endpoints.

use thiserror::Error;

use crate::core::address::WalletAddress;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    #[error("Wallet address is required for admin access")]
    MissingWallet,

    #[error("Unauthorized: Only admin wallet can access this endpoint")]
    NotAdmin,
}

/// Who may call admin endpoints. With no admin wallet configured every
/// admin call is refused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminPolicy {
    admin: Option<WalletAddress>,
}

impl AdminPolicy {
    pub fn new(admin: Option<WalletAddress>) -> Self { Self { admin } }

    pub fn admin(&self) -> Option<&WalletAddress> { self.admin.as_ref() }

    pub fn is_admin(&self, wallet: &str) -> bool {
        self.admin.as_ref().map_or(false, |a| a.as_str() == wallet.trim())
    }

    /// Check the caller's wallet, typically the `x-wallet-address` header.
    pub fn authorize(&self, wallet: Option<&str>) -> Result<(), AdminError> {
        let wallet = wallet.map(str::trim).filter(|w| !w.is_empty()).ok_or(AdminError::MissingWallet)?;
        if self.is_admin(wallet) {
            Ok(())
        } else {
            tracing::warn!(wallet = %display_wallet(wallet), "admin access refused");
            Err(AdminError::NotAdmin)
        }
    }

    /// `first8...last8` of the admin wallet, or `Not configured`.
    pub fn display(&self) -> String {
        self.admin.as_ref().map_or_else(|| "Not configured".to_string(), |a| display_wallet(a.as_str()))
    }
}

fn display_wallet(wallet: &str) -> String {
    if wallet.len() <= 16 || !wallet.is_ascii() {
        return wallet.to_string();
    }
    format!("{}...{}", &wallet[..8], &wallet[wallet.len() - 8..])
}
