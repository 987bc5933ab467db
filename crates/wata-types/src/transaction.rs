//! Audit records for balance mutations
//!
//! A [`TransactionRecord`] is written once after a balance mutation has been
//! committed and is never changed or deleted afterwards.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{AccountId, Balance, Currency, WataError};

/// Direction of a balance mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = WataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(Self::Deposit),
            "withdraw" => Ok(Self::Withdraw),
            other => Err(WataError::InternalError(format!("unknown transaction kind {:?}", other))),
        }
    }
}

/// Status of a recorded mutation. Records are only written after commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Completed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = WataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            other => Err(WataError::InternalError(format!("unknown transaction status {:?}", other))),
        }
    }
}

/// Append-only audit entry for one deposit or withdrawal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Assigned by the store; `None` when the append itself failed
    pub id: Option<Uuid>,
    pub account_id: AccountId,
    pub kind: TransactionKind,
    pub currency: Currency,
    pub amount: Decimal,
    pub balance_before: Balance,
    pub balance_after: Balance,
    pub status: TransactionStatus,
    /// External reference, e.g. an on-chain transaction hash
    pub tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}
