use thiserror::Error;

use crate::rates::RateError;

/// Which side of the transfer a lookup failed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountSide {
    Sender,
    Receiver,
}

impl std::fmt::Display for AccountSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountSide::Sender => write!(f, "Sender"),
            AccountSide::Receiver => write!(f, "Receiver"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Invalid transfer request: {0}")]
    Validation(String),

    #[error("{side} account not found")]
    AccountNotFound { side: AccountSide },

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Exchange rates unavailable: {0}")]
    RateUnavailable(#[from] RateError),

    #[error("Transfer conflicted with a concurrent update, safe to retry")]
    ConcurrencyConflict,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Serialization failures and deadlocks are retriable conflicts, not
/// persistence errors.
pub(crate) fn is_conflict(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db)
            if matches!(db.code().as_deref(), Some("40001") | Some("40P01"))
    )
}

/// Unique violation on the idempotency key: a duplicate request won the
/// race and already committed.
pub(crate) fn is_duplicate_key(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db)
            if db.code().as_deref() == Some("23505")
                && db.constraint().is_some_and(|c| c.contains("idempotency_key"))
    )
}
