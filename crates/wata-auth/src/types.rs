//! Authentication types

use serde::{Deserialize, Serialize};
use wata_types::AccountRole;

/// Caller-supplied provisioning inputs, used only when the account is new
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub referral_code: Option<String>,
    pub invite_code: Option<String>,
}

impl ProvisionRequest {
    pub fn new(referral_code: Option<String>, invite_code: Option<String>) -> Self {
        Self {
            referral_code: non_empty(referral_code),
            invite_code: non_empty(invite_code),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Issued credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Signed access token
    pub access_token: String,
    /// Opaque refresh token. Not recorded anywhere, so it cannot be
    /// verified or revoked later.
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Access token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Audience: the account address the token was issued to
    pub aud: String,
    /// Expiry (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub iss: String,
    /// Always `auth`
    pub sub: String,
    /// First 16 bytes of keccak256(address), hex
    pub user_id: String,
    pub address: String,
    pub referral_code: String,
    pub role: String,
}

/// Login result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub address: String,
    pub referral_code: String,
    pub reward: i32,
    pub role: AccountRole,
}
