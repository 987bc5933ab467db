//! The narrow persistence surface the account services depend on

use async_trait::async_trait;
use std::sync::Arc;

use wata_types::{Account, AccountId, Address, Balance, BalanceChange, Currency, TransactionRecord};

use crate::{DbResult, NewAccount, NewTransaction};

/// Balances on either side of a committed change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceUpdate {
    pub before: Balance,
    pub after: Balance,
}

/// Account and audit persistence.
///
/// Address uniqueness is enforced here: a second `insert` for the same
/// address fails with [`DbError::Duplicate`](crate::DbError::Duplicate).
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Look up an account; may be served from a cache
    async fn get_by_address(&self, address: &Address) -> DbResult<Option<Account>>;

    /// Look up an account straight from the primary store
    async fn get_by_address_no_cache(&self, address: &Address) -> DbResult<Option<Account>>;

    /// Persist a new account with default reward, role and balances
    async fn insert(&self, account: NewAccount) -> DbResult<()>;

    /// Write the mutable profile fields (invite code, reward, role).
    /// Address and balances are never touched.
    async fn update(&self, account: &Account) -> DbResult<()>;

    /// Atomically read, check and write one balance.
    ///
    /// A refused change (e.g. insufficient funds) fails with
    /// [`DbError::Rejected`](crate::DbError::Rejected) and leaves the
    /// balance untouched.
    async fn apply_balance_change(
        &self,
        account_id: &AccountId,
        currency: Currency,
        change: BalanceChange,
    ) -> DbResult<BalanceUpdate>;

    /// Append an audit record, returning it with its assigned id
    async fn append_transaction(&self, record: NewTransaction) -> DbResult<TransactionRecord>;

    /// Most recent records first
    async fn list_transactions(
        &self,
        account_id: &AccountId,
        limit: i64,
    ) -> DbResult<Vec<TransactionRecord>>;
}

#[async_trait]
impl<S: AccountStore + ?Sized> AccountStore for Arc<S> {
    async fn get_by_address(&self, address: &Address) -> DbResult<Option<Account>> {
        (**self).get_by_address(address).await
    }

    async fn get_by_address_no_cache(&self, address: &Address) -> DbResult<Option<Account>> {
        (**self).get_by_address_no_cache(address).await
    }

    async fn insert(&self, account: NewAccount) -> DbResult<()> {
        (**self).insert(account).await
    }

    async fn update(&self, account: &Account) -> DbResult<()> {
        (**self).update(account).await
    }

    async fn apply_balance_change(
        &self,
        account_id: &AccountId,
        currency: Currency,
        change: BalanceChange,
    ) -> DbResult<BalanceUpdate> {
        (**self).apply_balance_change(account_id, currency, change).await
    }

    async fn append_transaction(&self, record: NewTransaction) -> DbResult<TransactionRecord> {
        (**self).append_transaction(record).await
    }

    async fn list_transactions(
        &self,
        account_id: &AccountId,
        limit: i64,
    ) -> DbResult<Vec<TransactionRecord>> {
        (**self).list_transactions(account_id, limit).await
    }
}
