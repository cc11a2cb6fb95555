//! Ledger schema DDL
//!
//! Four tables: banks, users, accounts, transactions. Foreign keys from
//! accounts to users and banks are structural invariants enforced here.
//! The transactions table is append-only; nothing in this crate updates
//! or deletes its rows.

use sqlx::PgPool;

const DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS banks_tb (
        id   BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users_tb (
        id        BIGSERIAL PRIMARY KEY,
        name      TEXT,
        surname   TEXT,
        birth_day DATE,
        accounts  TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS accounts_tb (
        id             BIGSERIAL PRIMARY KEY,
        user_id        BIGINT NOT NULL REFERENCES users_tb(id),
        kind           TEXT NOT NULL CHECK (kind IN ('credit', 'debit')),
        account_number TEXT NOT NULL UNIQUE
                       CHECK (account_number ~ '^[A-Za-z0-9]{8,12}$'),
        bank_id        BIGINT NOT NULL REFERENCES banks_tb(id),
        currency       TEXT NOT NULL,
        balance        NUMERIC NOT NULL,
        discount       SMALLINT CHECK (discount IN (25, 30, 50)),
        status         TEXT CHECK (status IN ('gold', 'silver', 'platinum'))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transactions_tb (
        id                  BIGSERIAL PRIMARY KEY,
        bank_sender_name    TEXT NOT NULL,
        account_sender_id   BIGINT NOT NULL,
        bank_receiver_name  TEXT NOT NULL,
        account_receiver_id BIGINT NOT NULL,
        sent_currency       TEXT NOT NULL,
        sent_amount         NUMERIC NOT NULL,
        datetime            TIMESTAMPTZ NOT NULL DEFAULT now(),
        idempotency_key     TEXT UNIQUE
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_transactions_sender
        ON transactions_tb (account_sender_id, datetime DESC)
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_transactions_receiver
        ON transactions_tb (account_receiver_id, datetime DESC)
    "#,
];

/// Apply the schema, statement by statement. Idempotent.
pub async fn apply_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for stmt in DDL {
        sqlx::query(stmt).execute(pool).await?;
    }
    tracing::info!("ledger schema applied");
    Ok(())
}
