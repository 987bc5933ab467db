//! Login commands

use std::sync::Arc;

use wata_auth::{AuthService, ProvisionRequest};
use wata_db::AccountStore;

use super::report;
use crate::config::AppConfig;

fn service(store: Arc<dyn AccountStore>, config: &AppConfig) -> anyhow::Result<AuthService> {
    if let Err(problems) = config.auth.validate() {
        anyhow::bail!("invalid auth configuration: {}", problems.join("; "));
    }
    Ok(AuthService::new(store, config.auth.clone()))
}

/// Log in with a signed message
pub async fn login_signed(
    store: Arc<dyn AccountStore>,
    config: &AppConfig,
    message: &str,
    signature: &str,
    request: ProvisionRequest,
) -> anyhow::Result<()> {
    let auth = service(store, config)?;
    report(auth.authenticate_signed(message, signature, request).await)
}

/// Log in with a bare address
pub async fn login_address(
    store: Arc<dyn AccountStore>,
    config: &AppConfig,
    address: &str,
    request: ProvisionRequest,
) -> anyhow::Result<()> {
    let auth = service(store, config)?;
    report(auth.authenticate_address(address, request).await)
}
