//! Account repository

use sqlx::PgPool;
use uuid::Uuid;

use wata_types::{Address, Balance, BalanceChange, Currency};

use crate::{BalanceUpdate, DbAccount, DbError, DbResult, NewAccount};

const ACCOUNT_COLUMNS: &str = r#"
    id, address, referral_code, invite_code, reward, role,
    wata_balance, usdt_balance, created_at, updated_at
"#;

/// Account repository for identity lookups, provisioning and balances
pub struct AccountRepo {
    pool: PgPool,
}

impl AccountRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new account. Reward, role and balances take column defaults.
    pub async fn create(&self, account: &NewAccount) -> DbResult<DbAccount> {
        let address = account.address.to_checksum();

        let row = sqlx::query_as::<_, DbAccount>(&format!(
            r#"
            INSERT INTO accounts (address, referral_code, invite_code)
            VALUES ($1, $2, $3)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(&address)
        .bind(&account.referral_code)
        .bind(account.invite_code.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.constraint() == Some("accounts_address_key") {
                    return DbError::Duplicate(format!("Account {} already exists", address));
                }
            }
            DbError::Query(e)
        })?;

        Ok(row)
    }

    /// Find account by canonical address
    pub async fn find_by_address(&self, address: &Address) -> DbResult<Option<DbAccount>> {
        let row = sqlx::query_as::<_, DbAccount>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE address = $1"
        ))
        .bind(address.to_checksum())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Find account by ID
    pub async fn find_by_id(&self, id: Uuid) -> DbResult<Option<DbAccount>> {
        let row = sqlx::query_as::<_, DbAccount>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Update profile fields. The address and balance columns are left alone.
    pub async fn update_profile(
        &self,
        id: Uuid,
        invite_code: Option<&str>,
        reward: i32,
        role: &str,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET invite_code = $2, reward = $3, role = $4, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(invite_code)
        .bind(reward)
        .bind(role)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("Account {}", id)));
        }
        Ok(())
    }

    /// Apply a credit or debit to one currency balance.
    ///
    /// The row is locked for the duration of the read-check-write, so
    /// concurrent changes to the same account serialize.
    pub async fn change_balance(
        &self,
        id: Uuid,
        currency: Currency,
        change: BalanceChange,
    ) -> DbResult<BalanceUpdate> {
        let column = balance_column(currency);
        let mut tx = self.pool.begin().await?;

        // Get current balance with lock
        let current: Option<(String,)> = sqlx::query_as(&format!(
            "SELECT {column} FROM accounts WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let (current,) = current.ok_or_else(|| DbError::NotFound(format!("Account {}", id)))?;
        let before = Balance::parse(&current)
            .map_err(|e| DbError::Corrupt(format!("accounts.{} = {:?}: {}", column, current, e)))?;

        // Dropping `tx` on the early return rolls back and releases the lock
        let after = change.apply(currency, before).map_err(DbError::Rejected)?;

        sqlx::query(&format!(
            "UPDATE accounts SET {column} = $2, updated_at = NOW() WHERE id = $1"
        ))
        .bind(id)
        .bind(after.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(BalanceUpdate { before, after })
    }
}

fn balance_column(currency: Currency) -> &'static str {
    match currency {
        Currency::Wata => "wata_balance",
        Currency::Usdt => "usdt_balance",
    }
}
