//! Account persistence
//!
//! Reads join the bank display name in, so callers never issue a second
//! lookup to label ledger records. Balance writes only exist on an open
//! transaction handle; there is no pool-level mutation path.

use super::models::{Account, AccountKind, Bank, DiscountTier, StatusTier};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

const SELECT_ACCOUNT: &str = r#"
    SELECT a.id, a.user_id, a.kind, a.account_number, a.bank_id,
           b.name AS bank_name, a.currency, a.balance, a.discount, a.status
    FROM accounts_tb a
    JOIN banks_tb b ON a.bank_id = b.id
    WHERE a.id = $1
"#;

/// Account repository
pub struct AccountStore;

impl AccountStore {
    /// Get an account by id (non-locking read)
    pub async fn get_by_id(pool: &PgPool, id: i64) -> Result<Option<Account>, sqlx::Error> {
        let row = sqlx::query(SELECT_ACCOUNT)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        row.map(|r| row_to_account(&r)).transpose()
    }

    /// Get an account by id and lock its row for the rest of the
    /// transaction. Only the accounts row is locked, not the bank.
    pub async fn lock(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<Option<Account>, sqlx::Error> {
        let query = format!("{SELECT_ACCOUNT} FOR UPDATE OF a");
        let row = sqlx::query(&query).bind(id).fetch_optional(&mut **tx).await?;

        row.map(|r| row_to_account(&r)).transpose()
    }

    /// Resolve a bank display name by id
    pub async fn bank_by_id(pool: &PgPool, id: i64) -> Result<Option<Bank>, sqlx::Error> {
        let row = sqlx::query("SELECT id, name FROM banks_tb WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|r| Bank {
            id: r.get("id"),
            name: r.get("name"),
        }))
    }

    /// Overwrite an account balance inside an open transaction.
    ///
    /// Returns false if the account vanished between lock and write.
    pub async fn update_balance(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        new_balance: rust_decimal::Decimal,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE accounts_tb SET balance = $1 WHERE id = $2")
            .bind(new_balance)
            .bind(id)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_account(row: &PgRow) -> Result<Account, sqlx::Error> {
    let kind: String = row.get("kind");
    let kind: AccountKind = kind.parse().map_err(decode_err)?;

    let discount = row
        .get::<Option<i16>, _>("discount")
        .map(|v| DiscountTier::from_percent(v).ok_or_else(|| format!("Invalid discount: {}", v)))
        .transpose()
        .map_err(decode_err)?;

    let status = row
        .get::<Option<String>, _>("status")
        .map(|s| s.parse::<StatusTier>())
        .transpose()
        .map_err(decode_err)?;

    Ok(Account {
        id: row.get("id"),
        user_id: row.get("user_id"),
        kind,
        account_number: row.get("account_number"),
        bank_id: row.get("bank_id"),
        bank_name: row.get("bank_name"),
        currency: row.get("currency"),
        balance: row.get("balance"),
        discount,
        status,
    })
}

fn decode_err(msg: String) -> sqlx::Error {
    sqlx::Error::Decode(msg.into())
}
