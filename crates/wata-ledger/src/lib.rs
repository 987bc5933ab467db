//! Wata Ledger - per-account decimal balances with an audit trail
//!
//! The ledger is:
//! - Currency-scoped (`wata` and `usdt` balances on every account)
//! - Account-keyed by canonical address
//! - Append-only on the audit side (records are never changed)
//!
//! # Invariants
//!
//! 1. No negative balances
//! 2. A withdrawal larger than the balance changes nothing
//! 3. Every balance mutation is atomic per account
//! 4. A committed mutation stays committed even if its audit record cannot
//!    be written; the returned record then carries no id

use std::str::FromStr;
use std::sync::Arc;

use tracing::{error, info, instrument};

use wata_db::{AccountStore, DbError, NewTransaction};
use wata_types::{
    parse_amount, Account, Address, BalanceChange, Clock, Currency, SystemClock, TransactionRecord,
    WataError,
};

/// Records returned by [`Ledger::history`] when no limit is given
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// Upper bound on a single history page
pub const MAX_HISTORY_LIMIT: i64 = 500;

/// Deposit/withdraw front end over an [`AccountStore`]
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn AccountStore>,
    clock: Arc<dyn Clock>,
}

impl Ledger {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn AccountStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Credit `amount` of `currency` to the account at `address`
    #[instrument(skip(self))]
    pub async fn deposit(
        &self,
        address: &Address,
        currency: &str,
        amount: &str,
        tx_hash: Option<&str>,
    ) -> Result<TransactionRecord, WataError> {
        let currency = Currency::from_str(currency)?;
        let amount = parse_amount(amount)?;
        self.apply(address, currency, BalanceChange::Credit(amount), tx_hash)
            .await
    }

    /// Debit `amount` of `currency` from the account at `address`.
    ///
    /// Fails with [`WataError::InsufficientBalance`] and leaves the balance
    /// unchanged when the account holds less than `amount`.
    #[instrument(skip(self))]
    pub async fn withdraw(
        &self,
        address: &Address,
        currency: &str,
        amount: &str,
        tx_hash: Option<&str>,
    ) -> Result<TransactionRecord, WataError> {
        let currency = Currency::from_str(currency)?;
        let amount = parse_amount(amount)?;
        self.apply(address, currency, BalanceChange::Debit(amount), tx_hash)
            .await
    }

    /// Current account state, read from the primary store
    pub async fn profile(&self, address: &Address) -> Result<Account, WataError> {
        self.resolve(address).await
    }

    /// Most recent audit records first; `None` or a non-positive limit means
    /// [`DEFAULT_HISTORY_LIMIT`]
    pub async fn history(
        &self,
        address: &Address,
        limit: Option<i64>,
    ) -> Result<Vec<TransactionRecord>, WataError> {
        let limit = match limit {
            Some(n) if n > 0 => n.min(MAX_HISTORY_LIMIT),
            _ => DEFAULT_HISTORY_LIMIT,
        };

        let account = self.resolve(address).await?;
        self.store
            .list_transactions(&account.id, limit)
            .await
            .map_err(|e| {
                error!(address = %address, error = %e, "Failed to list transactions");
                WataError::InternalError(e.to_string())
            })
    }

    async fn resolve(&self, address: &Address) -> Result<Account, WataError> {
        match self.store.get_by_address_no_cache(address).await {
            Ok(Some(account)) => Ok(account),
            Ok(None) => Err(WataError::AccountLookupFailed(format!(
                "no account for {}",
                address
            ))),
            Err(e) => {
                error!(address = %address, error = %e, "Account lookup failed");
                Err(WataError::AccountLookupFailed(e.to_string()))
            }
        }
    }

    async fn apply(
        &self,
        address: &Address,
        currency: Currency,
        change: BalanceChange,
        tx_hash: Option<&str>,
    ) -> Result<TransactionRecord, WataError> {
        let account = self.resolve(address).await?;

        let update = self
            .store
            .apply_balance_change(&account.id, currency, change)
            .await
            .map_err(|e| match e {
                DbError::Rejected(reason) => reason,
                other => {
                    error!(address = %address, error = %other, "Balance update failed");
                    WataError::BalanceUpdateFailed(other.to_string())
                }
            })?;

        info!(
            address = %address,
            kind = %change.kind(),
            currency = %currency,
            before = %update.before,
            after = %update.after,
            "Balance updated"
        );

        let record = NewTransaction {
            account_id: account.id,
            kind: change.kind(),
            currency,
            amount: change.amount().normalize(),
            balance_before: update.before,
            balance_after: update.after,
            tx_hash: tx_hash.map(str::to_string).filter(|h| !h.is_empty()),
        };

        match self.store.append_transaction(record.clone()).await {
            Ok(persisted) => Ok(persisted),
            Err(e) => {
                error!(
                    address = %address,
                    error = %e,
                    "Failed to record transaction; balance change stands"
                );
                Ok(record.into_record(None, self.clock.now()))
            }
        }
    }
}
