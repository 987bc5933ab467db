//! Transaction (audit trail) repository

use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbResult, DbTransaction, NewTransaction};

/// Newest first; `seq` orders rows that share a `created_at`
const LIST_BY_ACCOUNT: &str = r#"
    SELECT
        id, account_id, kind, currency, amount, balance_before, balance_after,
        status, tx_hash, created_at
    FROM account_transactions
    WHERE account_id = $1
    ORDER BY created_at DESC, seq DESC
    LIMIT $2
"#;

/// Append-only repository of balance mutations
pub struct TransactionRepo {
    pool: PgPool,
}

impl TransactionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append a completed transaction
    pub async fn append(&self, record: &NewTransaction) -> DbResult<DbTransaction> {
        let row = sqlx::query_as::<_, DbTransaction>(
            r#"
            INSERT INTO account_transactions
                (account_id, kind, currency, amount, balance_before, balance_after, status, tx_hash)
            VALUES ($1, $2, $3, $4, $5, $6, 'completed', $7)
            RETURNING
                id, account_id, kind, currency, amount, balance_before, balance_after,
                status, tx_hash, created_at
            "#,
        )
        .bind(record.account_id.0)
        .bind(record.kind.as_str())
        .bind(record.currency.code())
        .bind(record.amount.normalize().to_string())
        .bind(record.balance_before.to_string())
        .bind(record.balance_after.to_string())
        .bind(record.tx_hash.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Get an account's transactions, newest first
    pub async fn list_by_account(&self, account_id: Uuid, limit: i64) -> DbResult<Vec<DbTransaction>> {
        let rows = sqlx::query_as::<_, DbTransaction>(LIST_BY_ACCOUNT)
            .bind(account_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}
