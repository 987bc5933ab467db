//! Provisioning under concurrency and store failures

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

use wata_auth::{AccountRegistry, ProvisionRequest};
use wata_db::{
    AccountStore, BalanceUpdate, DbError, DbResult, MemoryStore, NewAccount, NewTransaction,
    RetryPolicy,
};
use wata_types::{Account, AccountId, Address, BalanceChange, Currency, TransactionRecord, WataError};

fn address() -> Address {
    "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf".parse().unwrap()
}

/// Wraps a store so that callers can be lined up at the initial lookup,
/// and individual operations can be made to fail.
struct ScriptedStore {
    inner: MemoryStore,
    lookup_barrier: Option<Barrier>,
    fail_lookup: bool,
    fail_insert: bool,
    inserts: AtomicU32,
    uncached_reads: AtomicU32,
}

impl ScriptedStore {
    fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            lookup_barrier: None,
            fail_lookup: false,
            fail_insert: false,
            inserts: AtomicU32::new(0),
            uncached_reads: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl AccountStore for ScriptedStore {
    async fn get_by_address(&self, address: &Address) -> DbResult<Option<Account>> {
        if self.fail_lookup {
            return Err(DbError::Connection("primary unavailable".to_string()));
        }
        let result = self.inner.get_by_address(address).await;
        if let Some(barrier) = &self.lookup_barrier {
            barrier.wait().await;
        }
        result
    }

    async fn get_by_address_no_cache(&self, address: &Address) -> DbResult<Option<Account>> {
        self.uncached_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_by_address_no_cache(address).await
    }

    async fn insert(&self, account: NewAccount) -> DbResult<()> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_insert {
            return Err(DbError::Connection("primary unavailable".to_string()));
        }
        self.inner.insert(account).await
    }

    async fn update(&self, account: &Account) -> DbResult<()> {
        self.inner.update(account).await
    }

    async fn apply_balance_change(
        &self,
        account_id: &AccountId,
        currency: Currency,
        change: BalanceChange,
    ) -> DbResult<BalanceUpdate> {
        self.inner.apply_balance_change(account_id, currency, change).await
    }

    async fn append_transaction(&self, record: NewTransaction) -> DbResult<TransactionRecord> {
        self.inner.append_transaction(record).await
    }

    async fn list_transactions(
        &self,
        account_id: &AccountId,
        limit: i64,
    ) -> DbResult<Vec<TransactionRecord>> {
        self.inner.list_transactions(account_id, limit).await
    }
}

fn policy() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(50))
}

#[tokio::test]
async fn concurrent_first_logins_create_one_account() {
    let mut store = ScriptedStore::new(MemoryStore::new());
    store.lookup_barrier = Some(Barrier::new(2));
    let store = Arc::new(store);
    let registry = Arc::new(AccountRegistry::new(store.clone(), policy()));

    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry
                    .find_or_create(&address(), ProvisionRequest::default())
                    .await
            })
        })
        .collect();

    let mut accounts = Vec::new();
    for task in tasks {
        accounts.push(task.await.unwrap().unwrap());
    }

    // both callers missed the lookup and tried to insert
    assert_eq!(store.inserts.load(Ordering::SeqCst), 2);
    assert_eq!(store.inner.account_count().await, 1);
    assert_eq!(accounts[0].id, accounts[1].id);
    assert!(!accounts[0].is_provisional());
}

#[tokio::test(start_paused = true)]
async fn read_after_insert_uses_bounded_retries() {
    let store = Arc::new(ScriptedStore::new(MemoryStore::new().with_read_lag(u32::MAX)));
    let registry = AccountRegistry::new(store.clone(), policy());

    let started = tokio::time::Instant::now();
    let account = registry
        .find_or_create(&address(), ProvisionRequest::default())
        .await
        .unwrap();

    assert!(account.is_provisional());
    assert_eq!(store.uncached_reads.load(Ordering::SeqCst), 3);
    assert_eq!(started.elapsed(), Duration::from_millis(100));
}

#[tokio::test]
async fn lookup_failure_is_reported() {
    let mut store = ScriptedStore::new(MemoryStore::new());
    store.fail_lookup = true;
    let store = Arc::new(store);
    let registry = AccountRegistry::new(store.clone(), policy());

    let err = registry
        .find_or_create(&address(), ProvisionRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, WataError::AccountLookupFailed(_)));
    assert_eq!(err.code(), "0202");
    assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn insert_failure_is_reported() {
    let mut store = ScriptedStore::new(MemoryStore::new());
    store.fail_insert = true;
    let registry = AccountRegistry::new(Arc::new(store), policy());

    let err = registry
        .find_or_create(&address(), ProvisionRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, WataError::AccountCreationFailed(_)));
    assert_eq!(err.code(), "0201");
}
