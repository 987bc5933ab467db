//! Walkthrough against an in-memory store
//!
//! Every other command runs in its own process, so with the memory backend
//! nothing carries over between invocations. The demo chains a signed login,
//! a deposit, a rejected withdrawal and a history read in one process.

use std::sync::Arc;

use wata_auth::{AuthService, ProvisionRequest};
use wata_crypto::{sign_message, signing_key_from_hex};
use wata_db::MemoryStore;
use wata_ledger::Ledger;
use wata_types::{Address, WataError};

use crate::config::AppConfig;
use crate::display;

const DEMO_KEY: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";
const DEMO_MESSAGE: &str = "Sign in to Wata";

pub async fn run(config: &AppConfig) -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let mut auth_config = config.auth.clone();
    if auth_config.validate().is_err() {
        auth_config.jwt.secret = "wata-demo-secret-not-for-production-use".to_string();
    }
    let auth = AuthService::new(store.clone(), auth_config);
    let ledger = Ledger::new(store.clone());

    display::section("Wallet login");
    let key = signing_key_from_hex(DEMO_KEY)?;
    let signature = sign_message(&key, DEMO_MESSAGE.as_bytes())?;
    let login = auth
        .authenticate_signed(DEMO_MESSAGE, &signature, ProvisionRequest::default())
        .await?;
    display::success("Account provisioned");
    display::kv("address", &login.address);
    display::kv("referral code", &login.referral_code);
    display::kv("reward", &login.reward.to_string());
    display::kv("expires in", &format!("{}s", login.expires_in));

    let address: Address = login.address.parse()?;

    display::section("Deposit");
    let record = ledger.deposit(&address, "usdt", "25.5", Some("0xdemo")).await?;
    display::success("Deposited 25.5 USDT");
    display::kv("balance", &record.balance_after.to_string());

    display::section("Overdraw");
    match ledger.withdraw(&address, "usdt", "100", None).await {
        Err(err @ WataError::InsufficientBalance { .. }) => display::failure(&err),
        Ok(_) => anyhow::bail!("withdrawal beyond the balance was accepted"),
        Err(other) => return Err(other.into()),
    }
    let record = ledger.withdraw(&address, "usdt", "5.5", None).await?;
    display::success("Withdrew 5.5 USDT");
    display::kv("balance", &record.balance_after.to_string());

    display::section("History");
    display::json(&ledger.history(&address, None).await?)?;
    Ok(())
}
