//! Database models - mapped from PostgreSQL tables
//!
//! Rows are converted into domain entities through `TryFrom`, which rejects
//! anything the domain types would not accept.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use wata_types::{
    normalize_address, Account, AccountId, AccountRole, Address, Balance, Currency,
    TransactionKind, TransactionRecord, TransactionStatus,
};

use crate::DbError;

// ============================================================================
// Account Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbAccount {
    pub id: Uuid,
    pub address: String,
    pub referral_code: String,
    pub invite_code: Option<String>,
    pub reward: i32,
    pub role: String,
    pub wata_balance: String,
    pub usdt_balance: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbAccount> for Account {
    type Error = DbError;

    fn try_from(row: DbAccount) -> Result<Self, Self::Error> {
        let address = normalize_address(&row.address)
            .map_err(|e| corrupt("accounts.address", &row.address, e))?;
        let role = AccountRole::from_str(&row.role)
            .map_err(|e| corrupt("accounts.role", &row.role, e))?;
        let wata_balance = Balance::parse(&row.wata_balance)
            .map_err(|e| corrupt("accounts.wata_balance", &row.wata_balance, e))?;
        let usdt_balance = Balance::parse(&row.usdt_balance)
            .map_err(|e| corrupt("accounts.usdt_balance", &row.usdt_balance, e))?;

        Ok(Account {
            id: AccountId(row.id),
            address,
            referral_code: row.referral_code,
            invite_code: row.invite_code.filter(|c| !c.is_empty()),
            reward: row.reward,
            role,
            wata_balance,
            usdt_balance,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Identity fields of a not-yet-persisted account. Reward, role and
/// balances take the store's defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub address: Address,
    pub referral_code: String,
    pub invite_code: Option<String>,
}

// ============================================================================
// Transaction Models
// ============================================================================

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbTransaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: String,
    pub currency: String,
    pub amount: String,
    pub balance_before: String,
    pub balance_after: String,
    pub status: String,
    pub tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbTransaction> for TransactionRecord {
    type Error = DbError;

    fn try_from(row: DbTransaction) -> Result<Self, Self::Error> {
        let kind = TransactionKind::from_str(&row.kind)
            .map_err(|e| corrupt("account_transactions.kind", &row.kind, e))?;
        let currency = Currency::from_str(&row.currency)
            .map_err(|e| corrupt("account_transactions.currency", &row.currency, e))?;
        let amount = Decimal::from_str(row.amount.trim())
            .map_err(|e| corrupt("account_transactions.amount", &row.amount, e))?;
        let balance_before = Balance::parse(&row.balance_before)
            .map_err(|e| corrupt("account_transactions.balance_before", &row.balance_before, e))?;
        let balance_after = Balance::parse(&row.balance_after)
            .map_err(|e| corrupt("account_transactions.balance_after", &row.balance_after, e))?;
        let status = TransactionStatus::from_str(&row.status)
            .map_err(|e| corrupt("account_transactions.status", &row.status, e))?;

        Ok(TransactionRecord {
            id: Some(row.id),
            account_id: AccountId(row.account_id),
            kind,
            currency,
            amount,
            balance_before,
            balance_after,
            status,
            tx_hash: row.tx_hash,
            created_at: row.created_at,
        })
    }
}

/// An audit record ready to be appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub kind: TransactionKind,
    pub currency: Currency,
    pub amount: Decimal,
    pub balance_before: Balance,
    pub balance_after: Balance,
    pub tx_hash: Option<String>,
}

impl NewTransaction {
    /// The record as it reads once the store has assigned `id` and `created_at`
    pub fn into_record(self, id: Option<Uuid>, created_at: DateTime<Utc>) -> TransactionRecord {
        TransactionRecord {
            id,
            account_id: self.account_id,
            kind: self.kind,
            currency: self.currency,
            amount: self.amount,
            balance_before: self.balance_before,
            balance_after: self.balance_after,
            status: TransactionStatus::Completed,
            tx_hash: self.tx_hash,
            created_at,
        }
    }
}

fn corrupt(column: &str, value: &str, cause: impl std::fmt::Display) -> DbError {
    DbError::Corrupt(format!("{} = {:?}: {}", column, value, cause))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account_row() -> DbAccount {
        DbAccount {
            id: Uuid::new_v4(),
            address: "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf".to_string(),
            referral_code: "29395BDF".to_string(),
            invite_code: Some(String::new()),
            reward: 50,
            role: "user".to_string(),
            wata_balance: "10.50000000".to_string(),
            usdt_balance: "".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn transaction_row() -> DbTransaction {
        DbTransaction {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            kind: "withdraw".to_string(),
            currency: "usdt".to_string(),
            amount: "2.5".to_string(),
            balance_before: "10".to_string(),
            balance_after: "7.5".to_string(),
            status: "completed".to_string(),
            tx_hash: Some("0xabc".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_account_row_converts() {
        let account = Account::try_from(account_row()).unwrap();
        assert_eq!(account.address.to_string(), "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf");
        assert_eq!(account.wata_balance.to_string(), "10.5");
        assert_eq!(account.usdt_balance, Balance::ZERO);
        assert_eq!(account.invite_code, None);
        assert_eq!(account.role, AccountRole::User);
    }

    #[test]
    fn test_account_row_rejects_bad_address() {
        let mut row = account_row();
        row.address = "0x1234".to_string();
        assert!(matches!(Account::try_from(row), Err(DbError::Corrupt(_))));
    }

    #[test]
    fn test_account_row_rejects_negative_balance() {
        let mut row = account_row();
        row.wata_balance = "-1".to_string();
        assert!(matches!(Account::try_from(row), Err(DbError::Corrupt(_))));
    }

    #[test]
    fn test_account_row_rejects_unknown_role() {
        let mut row = account_row();
        row.role = "root".to_string();
        assert!(matches!(Account::try_from(row), Err(DbError::Corrupt(_))));
    }

    #[test]
    fn test_transaction_row_converts() {
        let record = TransactionRecord::try_from(transaction_row()).unwrap();
        assert!(record.is_persisted());
        assert_eq!(record.kind, TransactionKind::Withdraw);
        assert_eq!(record.currency, Currency::Usdt);
        assert_eq!(record.balance_after.to_string(), "7.5");
    }

    #[test]
    fn test_transaction_row_rejects_unknown_currency() {
        let mut row = transaction_row();
        row.currency = "btc".to_string();
        assert!(matches!(TransactionRecord::try_from(row), Err(DbError::Corrupt(_))));
    }
}
