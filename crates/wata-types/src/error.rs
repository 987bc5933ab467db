//! Error types for Wata
//!
//! Every infrastructure fault is re-coded into exactly one of these variants
//! at the component boundary that observed it. Detail strings are for logs
//! only and never reach clients (see [`WataError::client_message`]).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for Wata operations
pub type Result<T> = std::result::Result<T, WataError>;

/// Wata error taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WataError {
    // ========================================================================
    // Validation Errors
    // ========================================================================

    /// Address is not a well-formed, non-zero account identifier
    #[error("invalid address format")]
    InvalidAddressFormat,

    /// Signature could not be decoded or no key could be recovered from it
    #[error("invalid signature")]
    InvalidSignature,

    /// Currency is not in the supported set
    #[error("invalid currency: {0}")]
    InvalidCurrency(String),

    /// Amount is unparsable or not strictly positive
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    // ========================================================================
    // Authentication Errors
    // ========================================================================

    /// Access token could not be signed
    #[error("failed to generate tokens: {0}")]
    TokenGenerationFailed(String),

    // ========================================================================
    // Account Errors
    // ========================================================================

    /// Account could not be read, or does not exist where one is required
    #[error("failed to find account: {0}")]
    AccountLookupFailed(String),

    /// Account insert failed for a reason other than a lost uniqueness race
    #[error("failed to create account: {0}")]
    AccountCreationFailed(String),

    // ========================================================================
    // Balance Errors
    // ========================================================================

    /// Withdrawal exceeds the available balance
    #[error("insufficient {currency} balance: available {available}, requested {requested}")]
    InsufficientBalance {
        currency: String,
        available: String,
        requested: String,
    },

    /// Balance mutation could not be persisted
    #[error("failed to update balance: {0}")]
    BalanceUpdateFailed(String),

    // ========================================================================
    // Fallback
    // ========================================================================

    /// Unclassified infrastructure fault
    #[error("internal error: {0}")]
    InternalError(String),
}

impl WataError {
    /// Stable error code exposed to clients
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAddressFormat => "0001",
            Self::InvalidSignature => "0002",
            Self::InvalidCurrency(_) => "0004",
            Self::InvalidAmount(_) => "0005",
            Self::TokenGenerationFailed(_) => "0100",
            Self::AccountCreationFailed(_) => "0201",
            Self::AccountLookupFailed(_) => "0202",
            Self::InsufficientBalance { .. } => "0300",
            Self::BalanceUpdateFailed(_) => "0301",
            Self::InternalError(_) => "0500",
        }
    }

    /// Get safe message for client (doesn't leak internal details)
    pub fn client_message(&self) -> String {
        match self {
            Self::InvalidAddressFormat => "invalid address format".to_string(),
            Self::InvalidSignature => "invalid signature".to_string(),
            Self::InvalidCurrency(_) => "invalid currency".to_string(),
            Self::InvalidAmount(_) => "invalid amount".to_string(),
            Self::TokenGenerationFailed(_) => "failed to generate tokens".to_string(),
            Self::AccountCreationFailed(_) => "failed to create user".to_string(),
            Self::AccountLookupFailed(_) => "failed to find user".to_string(),
            Self::InsufficientBalance { .. } => "insufficient balance".to_string(),
            Self::BalanceUpdateFailed(_) => "failed to update balance".to_string(),
            Self::InternalError(_) => "internal server error".to_string(),
        }
    }

    /// Whether this error originates from infrastructure rather than input
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::TokenGenerationFailed(_)
                | Self::AccountCreationFailed(_)
                | Self::BalanceUpdateFailed(_)
                | Self::InternalError(_)
        )
    }
}

/// Error body rendered by callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (machine-readable)
    pub code: String,
    /// Error message (human-readable)
    pub message: String,
}

impl From<&WataError> for ErrorResponse {
    fn from(error: &WataError) -> Self {
        Self {
            code: error.code().to_string(),
            message: error.client_message(),
        }
    }
}
