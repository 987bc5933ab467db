//! In-process [`AccountStore`] for tests and local runs

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use wata_types::{
    Account, AccountId, AccountRole, Address, Balance, BalanceChange, Clock, Currency,
    SystemClock, TransactionRecord, DEFAULT_REWARD,
};

use crate::{AccountStore, BalanceUpdate, DbError, DbResult, NewAccount, NewTransaction};

#[derive(Default)]
struct Inner {
    accounts: HashMap<Address, Account>,
    addresses: HashMap<AccountId, Address>,
    transactions: Vec<TransactionRecord>,
    /// Reads still to miss per freshly inserted address
    lagging: HashMap<Address, u32>,
}

/// Keyed in-memory store.
///
/// Balance changes run under the write lock, so they serialize per store.
/// `with_read_lag` makes freshly inserted accounts invisible to the next few
/// reads, mimicking a replica that trails the primary.
pub struct MemoryStore {
    inner: RwLock<Inner>,
    clock: Arc<dyn Clock>,
    read_lag: u32,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            clock,
            read_lag: 0,
        }
    }

    /// Hide each new account from its next `reads` lookups
    pub fn with_read_lag(mut self, reads: u32) -> Self {
        self.read_lag = reads;
        self
    }

    pub async fn account_count(&self) -> usize {
        self.inner.read().await.accounts.len()
    }

    pub async fn transaction_count(&self) -> usize {
        self.inner.read().await.transactions.len()
    }

    async fn lookup(&self, address: &Address) -> DbResult<Option<Account>> {
        let mut inner = self.inner.write().await;
        if let Some(remaining) = inner.lagging.get_mut(address) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(None);
            }
            inner.lagging.remove(address);
        }
        Ok(inner.accounts.get(address).cloned())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn get_by_address(&self, address: &Address) -> DbResult<Option<Account>> {
        self.lookup(address).await
    }

    async fn get_by_address_no_cache(&self, address: &Address) -> DbResult<Option<Account>> {
        self.lookup(address).await
    }

    async fn insert(&self, account: NewAccount) -> DbResult<()> {
        let mut inner = self.inner.write().await;
        if inner.accounts.contains_key(&account.address) {
            return Err(DbError::Duplicate(format!(
                "Account {} already exists",
                account.address
            )));
        }

        let now = self.clock.now();
        let id = AccountId::new();
        let record = Account {
            id,
            address: account.address,
            referral_code: account.referral_code,
            invite_code: account.invite_code,
            reward: DEFAULT_REWARD,
            role: AccountRole::User,
            wata_balance: Balance::ZERO,
            usdt_balance: Balance::ZERO,
            created_at: now,
            updated_at: now,
        };

        inner.addresses.insert(id, account.address);
        inner.accounts.insert(account.address, record);
        if self.read_lag > 0 {
            inner.lagging.insert(account.address, self.read_lag);
        }
        Ok(())
    }

    async fn update(&self, account: &Account) -> DbResult<()> {
        let mut inner = self.inner.write().await;
        let address = *inner
            .addresses
            .get(&account.id)
            .ok_or_else(|| DbError::NotFound(format!("Account {}", account.id)))?;
        let now = self.clock.now();

        let stored = inner
            .accounts
            .get_mut(&address)
            .ok_or_else(|| DbError::NotFound(format!("Account {}", account.id)))?;
        stored.invite_code = account.invite_code.clone();
        stored.reward = account.reward;
        stored.role = account.role;
        stored.updated_at = now;
        Ok(())
    }

    async fn apply_balance_change(
        &self,
        account_id: &AccountId,
        currency: Currency,
        change: BalanceChange,
    ) -> DbResult<BalanceUpdate> {
        let mut inner = self.inner.write().await;
        let address = *inner
            .addresses
            .get(account_id)
            .ok_or_else(|| DbError::NotFound(format!("Account {}", account_id)))?;
        let now = self.clock.now();

        let account = inner
            .accounts
            .get_mut(&address)
            .ok_or_else(|| DbError::NotFound(format!("Account {}", account_id)))?;

        let before = account.balance(currency);
        let after = change.apply(currency, before).map_err(DbError::Rejected)?;
        account.set_balance(currency, after);
        account.updated_at = now;

        Ok(BalanceUpdate { before, after })
    }

    async fn append_transaction(&self, record: NewTransaction) -> DbResult<TransactionRecord> {
        let record = record.into_record(Some(Uuid::new_v4()), self.clock.now());
        self.inner.write().await.transactions.push(record.clone());
        Ok(record)
    }

    async fn list_transactions(
        &self,
        account_id: &AccountId,
        limit: i64,
    ) -> DbResult<Vec<TransactionRecord>> {
        let limit = usize::try_from(limit).unwrap_or(0);
        let inner = self.inner.read().await;
        // Appends arrive in commit order, so reverse order is newest first
        Ok(inner
            .transactions
            .iter()
            .rev()
            .filter(|t| &t.account_id == account_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use wata_types::TransactionKind;

    fn address() -> Address {
        "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf".parse().unwrap()
    }

    fn new_account() -> NewAccount {
        NewAccount {
            address: address(),
            referral_code: "29395BDF".to_string(),
            invite_code: None,
        }
    }

    #[tokio::test]
    async fn test_insert_applies_defaults() {
        let store = MemoryStore::new();
        store.insert(new_account()).await.unwrap();

        let account = store.get_by_address(&address()).await.unwrap().unwrap();
        assert_eq!(account.reward, DEFAULT_REWARD);
        assert_eq!(account.role, AccountRole::User);
        assert_eq!(account.wata_balance, Balance::ZERO);
        assert!(!account.is_provisional());
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = MemoryStore::new();
        store.insert(new_account()).await.unwrap();
        let err = store.insert(new_account()).await.unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(store.account_count().await, 1);
    }

    #[tokio::test]
    async fn test_read_lag_hides_new_rows() {
        let store = MemoryStore::new().with_read_lag(2);
        store.insert(new_account()).await.unwrap();

        assert!(store.get_by_address_no_cache(&address()).await.unwrap().is_none());
        assert!(store.get_by_address_no_cache(&address()).await.unwrap().is_none());
        assert!(store.get_by_address_no_cache(&address()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_leaves_balances_alone() {
        let store = MemoryStore::new();
        store.insert(new_account()).await.unwrap();
        let mut account = store.get_by_address(&address()).await.unwrap().unwrap();
        store
            .apply_balance_change(&account.id, Currency::Wata, BalanceChange::Credit(dec!(5)))
            .await
            .unwrap();

        account.invite_code = Some("FRIEND".to_string());
        store.update(&account).await.unwrap();

        let stored = store.get_by_address(&address()).await.unwrap().unwrap();
        assert_eq!(stored.invite_code.as_deref(), Some("FRIEND"));
        assert_eq!(stored.wata_balance.value(), dec!(5));
    }

    #[tokio::test]
    async fn test_rejected_debit_leaves_balance() {
        let store = MemoryStore::new();
        store.insert(new_account()).await.unwrap();
        let account = store.get_by_address(&address()).await.unwrap().unwrap();

        let err = store
            .apply_balance_change(&account.id, Currency::Usdt, BalanceChange::Debit(dec!(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected(_)));

        let stored = store.get_by_address(&address()).await.unwrap().unwrap();
        assert_eq!(stored.usdt_balance, Balance::ZERO);
    }

    #[tokio::test]
    async fn test_list_transactions_newest_first() {
        let store = MemoryStore::new();
        let account_id = AccountId::new();
        for amount in [dec!(1), dec!(2), dec!(3)] {
            store
                .append_transaction(NewTransaction {
                    account_id,
                    kind: TransactionKind::Deposit,
                    currency: Currency::Wata,
                    amount,
                    balance_before: Balance::ZERO,
                    balance_after: Balance::new(amount).unwrap(),
                    tx_hash: None,
                })
                .await
                .unwrap();
        }

        let listed = store.list_transactions(&account_id, 2).await.unwrap();
        let amounts: Vec<_> = listed.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![dec!(3), dec!(2)]);
    }
}
