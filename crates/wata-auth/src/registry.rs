//! Account provisioning keyed by wallet address
//!
//! `find_or_create` is idempotent: an address maps to at most one account
//! and an existing account is returned untouched. Two concurrent first
//! logins race on the store's uniqueness constraint; the loser reads the
//! winner's row back instead of creating a second one.
//!
//! Reads after an insert may lag behind it. The registry re-reads under a
//! bounded [`RetryPolicy`] and, if the row still is not visible, hands back
//! an in-memory account built from the insert parameters.

use std::sync::Arc;
use tracing::{error, info, warn};

use wata_db::{AccountStore, DbError, NewAccount, RetryPolicy};
use wata_types::{default_referral_code, Account, Address, Clock, SystemClock, WataError};

use crate::types::ProvisionRequest;

pub struct AccountRegistry {
    store: Arc<dyn AccountStore>,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl AccountRegistry {
    pub fn new(store: Arc<dyn AccountStore>, retry: RetryPolicy) -> Self {
        Self::with_clock(store, retry, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn AccountStore>, retry: RetryPolicy, clock: Arc<dyn Clock>) -> Self {
        Self { store, retry, clock }
    }

    pub fn store(&self) -> &Arc<dyn AccountStore> {
        &self.store
    }

    /// Return the account for `address`, provisioning it on first sight
    pub async fn find_or_create(
        &self,
        address: &Address,
        request: ProvisionRequest,
    ) -> Result<Account, WataError> {
        match self.store.get_by_address(address).await {
            Ok(Some(account)) => return Ok(account),
            Ok(None) => {}
            Err(e) => {
                error!(address = %address, error = %e, "Account lookup failed");
                return Err(WataError::AccountLookupFailed(e.to_string()));
            }
        }

        let new_account = NewAccount {
            address: *address,
            referral_code: request
                .referral_code
                .unwrap_or_else(|| default_referral_code(address)),
            invite_code: request.invite_code,
        };

        match self.store.insert(new_account.clone()).await {
            Ok(()) => {
                info!(address = %address, referral_code = %new_account.referral_code, "Provisioned account");
            }
            Err(DbError::Duplicate(_)) => {
                info!(address = %address, "Concurrent provisioning detected, reading winner");
                return self.read_winner(address).await;
            }
            Err(e) => {
                error!(address = %address, error = %e, "Account insert failed");
                return Err(WataError::AccountCreationFailed(e.to_string()));
            }
        }

        match self.read_back(address).await {
            Ok(Some(account)) => Ok(account),
            outcome => {
                if let Err(e) = outcome {
                    warn!(address = %address, error = %e, "Read-after-insert kept failing");
                }
                warn!(
                    address = %address,
                    attempts = self.retry.max_attempts,
                    "Account not yet visible after insert, returning provisional account"
                );
                Ok(Account::provisional(
                    new_account.address,
                    new_account.referral_code,
                    new_account.invite_code,
                    self.clock.now(),
                ))
            }
        }
    }

    /// Record an invite code on an account that has none. Best-effort: a
    /// failed write is logged and the account is returned as stored.
    pub async fn attach_invite_code(&self, mut account: Account, invite_code: Option<&str>) -> Account {
        let Some(code) = invite_code.map(str::trim).filter(|c| !c.is_empty()) else {
            return account;
        };
        if account.invite_code.is_some() || account.is_provisional() {
            return account;
        }

        let previous = account.invite_code.replace(code.to_string());
        if let Err(e) = self.store.update(&account).await {
            warn!(address = %account.address, error = %e, "Failed to record invite code");
            account.invite_code = previous;
        }
        account
    }

    async fn read_back(&self, address: &Address) -> Result<Option<Account>, DbError> {
        self.retry
            .retry_until(|| self.store.get_by_address_no_cache(address))
            .await
    }

    async fn read_winner(&self, address: &Address) -> Result<Account, WataError> {
        match self.read_back(address).await {
            Ok(Some(account)) => Ok(account),
            Ok(None) => Err(WataError::AccountLookupFailed(format!(
                "account {} exists but is not readable",
                address
            ))),
            Err(e) => {
                error!(address = %address, error = %e, "Failed to read concurrently provisioned account");
                Err(WataError::AccountLookupFailed(e.to_string()))
            }
        }
    }
}
