//! PostgreSQL-backed [`AccountStore`] with an optional Redis read-through cache

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, warn};

use wata_types::{Account, AccountId, Address, BalanceChange, Currency, TransactionRecord};

use crate::cache::CacheManager;
use crate::{
    AccountRepo, AccountStore, BalanceUpdate, DbResult, NewAccount, NewTransaction,
    TransactionRepo,
};

pub struct PgAccountStore {
    accounts: AccountRepo,
    transactions: TransactionRepo,
    cache: Option<CacheManager>,
}

impl PgAccountStore {
    pub fn new(pool: PgPool, cache: Option<CacheManager>) -> Self {
        Self {
            accounts: AccountRepo::new(pool.clone()),
            transactions: TransactionRepo::new(pool),
            cache,
        }
    }

    async fn invalidate(&self, address: &Address) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.invalidate_account(address).await {
                warn!(address = %address, error = %e, "Failed to invalidate cached account");
            }
        }
    }

    async fn invalidate_by_id(&self, account_id: &AccountId) {
        if self.cache.is_none() {
            return;
        }
        match self.accounts.find_by_id(account_id.0).await {
            Ok(Some(row)) => match Account::try_from(row) {
                Ok(account) => self.invalidate(&account.address).await,
                Err(e) => warn!(account_id = %account_id, error = %e, "Cannot invalidate corrupt account"),
            },
            Ok(None) => {}
            Err(e) => warn!(account_id = %account_id, error = %e, "Cache invalidation lookup failed"),
        }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn get_by_address(&self, address: &Address) -> DbResult<Option<Account>> {
        if let Some(cache) = &self.cache {
            match cache.get_account(address).await {
                Ok(Some(account)) => {
                    debug!(address = %address, "Account cache hit");
                    return Ok(Some(account));
                }
                Ok(None) => {}
                Err(e) => warn!(address = %address, error = %e, "Account cache read failed, using database"),
            }
        }

        let account = self.get_by_address_no_cache(address).await?;

        if let (Some(cache), Some(account)) = (&self.cache, &account) {
            if let Err(e) = cache.set_account(account).await {
                warn!(address = %address, error = %e, "Account cache write failed");
            }
        }

        Ok(account)
    }

    async fn get_by_address_no_cache(&self, address: &Address) -> DbResult<Option<Account>> {
        self.accounts
            .find_by_address(address)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    async fn insert(&self, account: NewAccount) -> DbResult<()> {
        self.accounts.create(&account).await?;
        self.invalidate(&account.address).await;
        Ok(())
    }

    async fn update(&self, account: &Account) -> DbResult<()> {
        self.accounts
            .update_profile(
                account.id.0,
                account.invite_code.as_deref(),
                account.reward,
                account.role.as_str(),
            )
            .await?;
        self.invalidate(&account.address).await;
        Ok(())
    }

    async fn apply_balance_change(
        &self,
        account_id: &AccountId,
        currency: Currency,
        change: BalanceChange,
    ) -> DbResult<BalanceUpdate> {
        let update = self.accounts.change_balance(account_id.0, currency, change).await?;
        self.invalidate_by_id(account_id).await;
        Ok(update)
    }

    async fn append_transaction(&self, record: NewTransaction) -> DbResult<TransactionRecord> {
        let row = self.transactions.append(&record).await?;
        TransactionRecord::try_from(row)
    }

    async fn list_transactions(
        &self,
        account_id: &AccountId,
        limit: i64,
    ) -> DbResult<Vec<TransactionRecord>> {
        self.transactions
            .list_by_account(account_id.0, limit)
            .await?
            .into_iter()
            .map(TransactionRecord::try_from)
            .collect()
    }
}
