//! Append-only transfer ledger
//!
//! One record per completed transfer, carrying the amount and currency as
//! requested (not the converted amounts) plus both bank display names.
//! Records are historical snapshots: they reference account ids but stay
//! valid after an account is later modified or removed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Row, Transaction};

/// A ledger entry describing one completed transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub bank_sender_name: String,
    pub account_sender_id: i64,
    pub bank_receiver_name: String,
    pub account_receiver_id: i64,
    pub sent_currency: String,
    pub sent_amount: Decimal,
    pub idempotency_key: Option<String>,
}

/// A ledger entry as read back from the store
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub bank_sender_name: String,
    pub account_sender_id: i64,
    pub bank_receiver_name: String,
    pub account_receiver_id: i64,
    pub sent_currency: String,
    pub sent_amount: Decimal,
    pub datetime: DateTime<Utc>,
}

/// Writes and reads the audit trail
pub struct LedgerWriter;

impl LedgerWriter {
    /// Append one record inside an open transaction.
    ///
    /// Commits or rolls back together with the balance updates; an append
    /// failure aborts the whole transfer.
    pub async fn append(
        tx: &mut Transaction<'_, Postgres>,
        record: &TransactionRecord,
    ) -> Result<i64, sqlx::Error> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO transactions_tb
                (bank_sender_name, account_sender_id,
                 bank_receiver_name, account_receiver_id,
                 sent_currency, sent_amount, datetime, idempotency_key)
            VALUES ($1, $2, $3, $4, $5, $6, now(), $7)
            RETURNING id
            "#,
        )
        .bind(&record.bank_sender_name)
        .bind(record.account_sender_id)
        .bind(&record.bank_receiver_name)
        .bind(record.account_receiver_id)
        .bind(&record.sent_currency)
        .bind(record.sent_amount)
        .bind(&record.idempotency_key)
        .fetch_one(&mut **tx)
        .await?;

        Ok(id)
    }

    /// Look up a previously applied transfer by its idempotency key
    pub async fn find_by_key(
        pool: &PgPool,
        key: &str,
    ) -> Result<Option<LedgerEntry>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, bank_sender_name, account_sender_id,
                   bank_receiver_name, account_receiver_id,
                   sent_currency, sent_amount, datetime
            FROM transactions_tb
            WHERE idempotency_key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|r| row_to_entry(&r)))
    }

    /// Audit history for an account, either side, newest first
    pub async fn history(
        pool: &PgPool,
        account_id: i64,
        limit: i64,
    ) -> Result<Vec<LedgerEntry>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, bank_sender_name, account_sender_id,
                   bank_receiver_name, account_receiver_id,
                   sent_currency, sent_amount, datetime
            FROM transactions_tb
            WHERE account_sender_id = $1 OR account_receiver_id = $1
            ORDER BY datetime DESC
            LIMIT $2
            "#,
        )
        .bind(account_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(rows.iter().map(row_to_entry).collect())
    }
}

fn row_to_entry(row: &sqlx::postgres::PgRow) -> LedgerEntry {
    LedgerEntry {
        id: row.get("id"),
        bank_sender_name: row.get("bank_sender_name"),
        account_sender_id: row.get("account_sender_id"),
        bank_receiver_name: row.get("bank_receiver_name"),
        account_receiver_id: row.get("account_receiver_id"),
        sent_currency: row.get("sent_currency"),
        sent_amount: row.get("sent_amount"),
        datetime: row.get("datetime"),
    }
}
