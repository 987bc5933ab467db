//! Account entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Address, Balance, Currency, WataError};

/// Reward granted to every newly provisioned account
pub const DEFAULT_REWARD: i32 = 50;

/// Strongly typed account identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub Uuid);

impl AccountId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "acct_{}", self.0)
    }
}

impl From<Uuid> for AccountId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Account roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    #[default]
    User,
    Admin,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountRole {
    type Err = WataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(WataError::InternalError(format!("unknown role {:?}", other))),
        }
    }
}

/// A provisioned account.
///
/// `address` is fixed at creation; only balances, reward and invite code
/// change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub address: Address,
    pub referral_code: String,
    pub invite_code: Option<String>,
    pub reward: i32,
    pub role: AccountRole,
    pub wata_balance: Balance,
    pub usdt_balance: Balance,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// In-memory stand-in for an account whose insert succeeded but which
    /// could not yet be read back. Carries a nil id.
    pub fn provisional(
        address: Address,
        referral_code: String,
        invite_code: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AccountId(Uuid::nil()),
            address,
            referral_code,
            invite_code,
            reward: DEFAULT_REWARD,
            role: AccountRole::User,
            wata_balance: Balance::ZERO,
            usdt_balance: Balance::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_provisional(&self) -> bool {
        self.id.0.is_nil()
    }

    pub fn balance(&self, currency: Currency) -> Balance {
        match currency {
            Currency::Wata => self.wata_balance,
            Currency::Usdt => self.usdt_balance,
        }
    }

    pub fn set_balance(&mut self, currency: Currency, balance: Balance) {
        match currency {
            Currency::Wata => self.wata_balance = balance,
            Currency::Usdt => self.usdt_balance = balance,
        }
    }
}

/// Referral code assigned when the caller supplies none
pub fn default_referral_code(address: &Address) -> String {
    address.short_code()
}
