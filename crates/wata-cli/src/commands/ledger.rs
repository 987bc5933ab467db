//! Balance commands

use std::sync::Arc;

use wata_db::AccountStore;
use wata_ledger::Ledger;
use wata_types::{normalize_address, WataError};

use super::report;

pub enum Direction {
    Deposit,
    Withdraw,
}

/// Deposit or withdraw against the account at `address`
pub async fn transfer(
    store: Arc<dyn AccountStore>,
    direction: Direction,
    address: &str,
    currency: &str,
    amount: &str,
    tx_hash: Option<&str>,
) -> anyhow::Result<()> {
    let ledger = Ledger::new(store);
    let result: Result<_, WataError> = async {
        let address = normalize_address(address)?;
        match direction {
            Direction::Deposit => ledger.deposit(&address, currency, amount, tx_hash).await,
            Direction::Withdraw => ledger.withdraw(&address, currency, amount, tx_hash).await,
        }
    }
    .await;
    report(result)
}

pub async fn profile(store: Arc<dyn AccountStore>, address: &str) -> anyhow::Result<()> {
    let ledger = Ledger::new(store);
    let result: Result<_, WataError> = async {
        let address = normalize_address(address)?;
        ledger.profile(&address).await
    }
    .await;
    report(result)
}

pub async fn history(
    store: Arc<dyn AccountStore>,
    address: &str,
    limit: Option<i64>,
) -> anyhow::Result<()> {
    let ledger = Ledger::new(store);
    let result: Result<_, WataError> = async {
        let address = normalize_address(address)?;
        ledger.history(&address, limit).await
    }
    .await;
    report(result)
}
