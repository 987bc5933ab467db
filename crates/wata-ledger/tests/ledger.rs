//! Ledger behaviour across store failures and concurrent mutation

use async_trait::async_trait;
use futures::future::join_all;
use rust_decimal_macros::dec;
use std::sync::Arc;

use wata_db::{
    AccountStore, BalanceUpdate, DbError, DbResult, MemoryStore, NewAccount, NewTransaction,
};
use wata_ledger::Ledger;
use wata_types::{Account, AccountId, Address, BalanceChange, Currency, TransactionRecord, WataError};

fn address() -> Address {
    "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf".parse().unwrap()
}

async fn store_with_account() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .insert(NewAccount {
            address: address(),
            referral_code: "29395BDF".to_string(),
            invite_code: None,
        })
        .await
        .unwrap();
    store
}

/// Delegates to a memory store but can break individual operations
struct FlakyStore {
    inner: Arc<MemoryStore>,
    fail_append: bool,
    fail_balance: bool,
}

#[async_trait]
impl AccountStore for FlakyStore {
    async fn get_by_address(&self, address: &Address) -> DbResult<Option<Account>> {
        self.inner.get_by_address(address).await
    }

    async fn get_by_address_no_cache(&self, address: &Address) -> DbResult<Option<Account>> {
        self.inner.get_by_address_no_cache(address).await
    }

    async fn insert(&self, account: NewAccount) -> DbResult<()> {
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
        if self.fail_balance {
            return Err(DbError::Connection("primary unavailable".to_string()));
        }
        self.inner.apply_balance_change(account_id, currency, change).await
    }

    async fn append_transaction(&self, record: NewTransaction) -> DbResult<TransactionRecord> {
        if self.fail_append {
            return Err(DbError::Connection("audit table unavailable".to_string()));
        }
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

#[tokio::test]
async fn failed_audit_append_keeps_balance() {
    let inner = store_with_account().await;
    let ledger = Ledger::new(Arc::new(FlakyStore {
        inner: inner.clone(),
        fail_append: true,
        fail_balance: false,
    }));

    let record = ledger.deposit(&address(), "wata", "3", Some("0xfeed")).await.unwrap();
    assert!(!record.is_persisted());
    assert_eq!(record.balance_after.to_string(), "3");
    assert_eq!(record.tx_hash.as_deref(), Some("0xfeed"));

    let account = inner.get_by_address(&address()).await.unwrap().unwrap();
    assert_eq!(account.wata_balance.value(), dec!(3));
    assert_eq!(inner.transaction_count().await, 0);
}

#[tokio::test]
async fn failed_balance_update_is_coded() {
    let ledger = Ledger::new(Arc::new(FlakyStore {
        inner: store_with_account().await,
        fail_append: false,
        fail_balance: true,
    }));

    let err = ledger.deposit(&address(), "wata", "3", None).await.unwrap_err();
    assert!(matches!(err, WataError::BalanceUpdateFailed(_)));
    assert_eq!(err.code(), "0301");
}

#[tokio::test]
async fn balances_render_without_trailing_zeros() {
    let ledger = Ledger::new(store_with_account().await);

    let record = ledger.deposit(&address(), "usdt", "10.500000", None).await.unwrap();
    assert_eq!(record.balance_after.to_string(), "10.5");

    let record = ledger.withdraw(&address(), "usdt", "0.5", None).await.unwrap();
    assert_eq!(record.balance_after.to_string(), "10");

    let record = ledger.deposit(&address(), "usdt", "1e2", None).await.unwrap();
    assert_eq!(record.balance_after.to_string(), "110");
}

#[tokio::test]
async fn deposit_then_withdraw_restores_balance() {
    let ledger = Ledger::new(store_with_account().await);
    ledger.deposit(&address(), "wata", "7.25", None).await.unwrap();

    ledger.deposit(&address(), "wata", "0.12345678", None).await.unwrap();
    let record = ledger.withdraw(&address(), "wata", "0.12345678", None).await.unwrap();
    assert_eq!(record.balance_after.value(), dec!(7.25));
}

#[tokio::test]
async fn withdraw_entire_balance_reaches_zero() {
    let ledger = Ledger::new(store_with_account().await);
    ledger.deposit(&address(), "usdt", "2.5", None).await.unwrap();

    let record = ledger.withdraw(&address(), "usdt", "2.5", None).await.unwrap();
    assert_eq!(record.balance_after.to_string(), "0");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_deposits_all_land() {
    let store = store_with_account().await;
    let ledger = Ledger::new(store.clone());

    let deposits = (0..50).map(|_| {
        let ledger = ledger.clone();
        tokio::spawn(async move { ledger.deposit(&address(), "wata", "0.1", None).await })
    });
    for result in join_all(deposits).await {
        result.unwrap().unwrap();
    }

    let account = store.get_by_address(&address()).await.unwrap().unwrap();
    assert_eq!(account.wata_balance.value(), dec!(5));
    assert_eq!(store.transaction_count().await, 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_withdrawals_never_overdraw() {
    let store = store_with_account().await;
    let ledger = Ledger::new(store.clone());
    ledger.deposit(&address(), "usdt", "10", None).await.unwrap();

    let withdrawals = (0..25).map(|_| {
        let ledger = ledger.clone();
        tokio::spawn(async move { ledger.withdraw(&address(), "usdt", "1", None).await })
    });
    let results = join_all(withdrawals).await;

    let succeeded = results.iter().filter(|r| matches!(r, Ok(Ok(_)))).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Ok(Err(WataError::InsufficientBalance { .. }))))
        .count();
    assert_eq!(succeeded, 10);
    assert_eq!(refused, 15);

    let account = store.get_by_address(&address()).await.unwrap().unwrap();
    assert_eq!(account.usdt_balance.to_string(), "0");
}

#[tokio::test]
async fn oversized_deposit_is_refused_without_side_effects() {
    let store = store_with_account().await;
    let ledger = Ledger::new(store.clone());
    ledger.deposit(&address(), "wata", "1", None).await.unwrap();

    let err = ledger
        .deposit(&address(), "wata", "79228162514264337593543950335", None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "0005");

    let account = store.get_by_address(&address()).await.unwrap().unwrap();
    assert_eq!(account.wata_balance.value(), dec!(1));
    assert_eq!(store.transaction_count().await, 1);
}

#[tokio::test]
async fn amounts_finer_than_balance_scale_are_refused() {
    let store = store_with_account().await;
    let ledger = Ledger::new(store.clone());

    let err = ledger.deposit(&address(), "wata", "0.000000001", None).await.unwrap_err();
    assert!(matches!(err, WataError::InvalidAmount(_)));
    assert_eq!(store.transaction_count().await, 0);

    ledger.deposit(&address(), "wata", "0.00000003", None).await.unwrap();
    let err = ledger.withdraw(&address(), "wata", "0.000000025", None).await.unwrap_err();
    assert!(matches!(err, WataError::InvalidAmount(_)));

    let record = ledger.withdraw(&address(), "wata", "0.00000002", None).await.unwrap();
    let record = ledger
        .deposit(&address(), "wata", &record.amount.to_string(), None)
        .await
        .unwrap();
    assert_eq!(record.balance_after.to_string(), "0.00000003");
}

#[tokio::test]
async fn recorded_amount_matches_balance_delta() {
    let store = store_with_account().await;
    let ledger = Ledger::new(store.clone());

    let record = ledger.deposit(&address(), "usdt", "10.500000", None).await.unwrap();
    assert_eq!(record.amount.to_string(), "10.5");
    assert_eq!(record.balance_after.value() - record.balance_before.value(), record.amount);

    let listed = ledger.history(&address(), Some(1)).await.unwrap();
    assert_eq!(listed[0].amount.to_string(), "10.5");
}
