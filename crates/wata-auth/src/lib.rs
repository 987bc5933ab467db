//! Wata Authentication Layer
//!
//! Wallet-based login for Wata accounts:
//!
//! - **Signed login**: recover the signer's address from a personal-message
//!   signature
//! - **Address login**: accept a free-text address after normalization
//! - **Provisioning**: idempotent find-or-create keyed by address
//! - **JWT**: HS256 access token bound to the address, plus an opaque
//!   refresh token
//!
//! # Architecture
//!
//! ```text
//! signature ──► recover_address ──┐
//!                                 ├──► AccountRegistry ──► JwtService ──► AuthResponse
//! address ───► normalize_address ─┘         │
//!                                           ▼
//!                                     AccountStore
//! ```

pub mod config;
pub mod error;
pub mod jwt;
pub mod registry;
pub mod types;

pub use config::{AuthConfig, JwtConfig, RegistryConfig};
pub use error::{AuthError, AuthResult};
pub use jwt::JwtService;
pub use registry::AccountRegistry;
pub use types::*;

use std::sync::Arc;
use tracing::{info, instrument};

use wata_crypto::recover_address;
use wata_db::AccountStore;
use wata_types::{normalize_address, Account, Address, Clock, SystemClock, WataError};

/// Login entry point combining provisioning and token issuance
pub struct AuthService {
    pub jwt: JwtService,
    pub registry: AccountRegistry,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(store: Arc<dyn AccountStore>, config: AuthConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn AccountStore>, config: AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let jwt = JwtService::with_clock(config.jwt.clone(), clock.clone());
        let registry = AccountRegistry::with_clock(store, config.registry.retry, clock);

        Self { jwt, registry, config }
    }

    /// Get the config reference
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Log in with a signed message; the signer's address is the identity
    #[instrument(skip(self, signature, request))]
    pub async fn authenticate_signed(
        &self,
        message: &str,
        signature: &str,
        request: ProvisionRequest,
    ) -> Result<AuthResponse, WataError> {
        let address = recover_address(message, signature)?;
        self.login(&address, request).await
    }

    /// Log in with a bare address
    #[instrument(skip(self, request))]
    pub async fn authenticate_address(
        &self,
        address: &str,
        request: ProvisionRequest,
    ) -> Result<AuthResponse, WataError> {
        let address = normalize_address(address)?;
        self.login(&address, request).await
    }

    async fn login(&self, address: &Address, request: ProvisionRequest) -> Result<AuthResponse, WataError> {
        let invite_code = request.invite_code.clone();
        let account = self.registry.find_or_create(address, request).await?;
        let account = self
            .registry
            .attach_invite_code(account, invite_code.as_deref())
            .await;

        let tokens = self.jwt.issue(address, &account.referral_code)?;
        info!(address = %address, provisional = account.is_provisional(), "Login succeeded");

        Ok(response(tokens, &account))
    }
}

fn response(tokens: TokenPair, account: &Account) -> AuthResponse {
    AuthResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
        address: account.address.to_checksum(),
        referral_code: account.referral_code.clone(),
        reward: account.reward,
        role: account.role,
    }
}
