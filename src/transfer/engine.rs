//! The transfer engine
//!
//! Validates a request, resolves a rate snapshot pivoted on the sender's
//! currency, then debits, credits, and appends the ledger record in one
//! database transaction. Any failure before the commit leaves balances and
//! the ledger untouched; dropping the returned future before the commit
//! rolls the transaction back.
//!
//! The rate fetch runs before the transaction opens, so row locks are
//! never held across the network call.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

use super::error::{AccountSide, TransferError, is_conflict, is_duplicate_key};
use super::types::{TransferDetails, TransferOutcome, TransferRequest};
use crate::account::{Account, AccountStore};
use crate::ledger::{LedgerWriter, TransactionRecord};
use crate::rates::{RateSnapshot, RateSource};
use crate::store::Database;

pub struct TransferEngine {
    db: Arc<Database>,
    rates: Arc<dyn RateSource>,
}

impl TransferEngine {
    pub fn new(db: Arc<Database>, rates: Arc<dyn RateSource>) -> Self {
        Self { db, rates }
    }

    /// Execute a transfer.
    ///
    /// Not idempotent on its own: resubmission after an ambiguous failure
    /// can double-move funds unless the request carries an
    /// `idempotency_key`.
    pub async fn execute(&self, req: TransferRequest) -> Result<TransferOutcome, TransferError> {
        req.validate()?;

        if let Some(key) = &req.idempotency_key
            && LedgerWriter::find_by_key(self.db.pool(), key).await?.is_some()
        {
            return self.replay(&req).await;
        }

        // Currencies come from a non-locking read; balances are re-read
        // under lock before any mutation.
        let sender = self.fetch(req.sender_account_id, AccountSide::Sender).await?;
        let receiver = self
            .fetch(req.receiver_account_id, AccountSide::Receiver)
            .await?;

        let snapshot = self.resolve_snapshot(&req, &sender, &receiver).await?;
        let (debit, credit) = converted_amounts(
            req.amount,
            &req.currency,
            &sender.currency,
            &receiver.currency,
            &snapshot,
        )?;

        let mut retried = false;
        loop {
            match self.apply(&req, &snapshot, debit, credit).await {
                Err(TransferError::ConcurrencyConflict) if !retried => {
                    // The failed attempt rolled back, so one re-attempt
                    // can never repeat committed work.
                    retried = true;
                    warn!(
                        sender = req.sender_account_id,
                        receiver = req.receiver_account_id,
                        "transfer conflicted, retrying once"
                    );
                }
                Err(TransferError::Database(e)) if is_duplicate_key(&e) => {
                    // A concurrent duplicate of this request committed
                    // first; report its outcome instead of failing.
                    return self.replay(&req).await;
                }
                other => return other,
            }
        }
    }

    async fn fetch(&self, id: i64, side: AccountSide) -> Result<Account, TransferError> {
        AccountStore::get_by_id(self.db.pool(), id)
            .await?
            .ok_or(TransferError::AccountNotFound { side })
    }

    /// A transfer whose three currencies coincide needs no provider call;
    /// everything else pivots on the sender's currency. Provider failures
    /// propagate, never a substituted 1:1 table.
    async fn resolve_snapshot(
        &self,
        req: &TransferRequest,
        sender: &Account,
        receiver: &Account,
    ) -> Result<RateSnapshot, TransferError> {
        if sender.currency == receiver.currency && sender.currency == req.currency {
            return Ok(RateSnapshot::identity(&sender.currency));
        }
        Ok(self.rates.rates(&sender.currency).await?)
    }

    async fn apply(
        &self,
        req: &TransferRequest,
        snapshot: &RateSnapshot,
        debit: Decimal,
        credit: Decimal,
    ) -> Result<TransferOutcome, TransferError> {
        match self.apply_tx(req, snapshot, debit, credit).await {
            Err(TransferError::Database(e)) if is_conflict(&e) => {
                Err(TransferError::ConcurrencyConflict)
            }
            other => other,
        }
    }

    async fn apply_tx(
        &self,
        req: &TransferRequest,
        snapshot: &RateSnapshot,
        debit: Decimal,
        credit: Decimal,
    ) -> Result<TransferOutcome, TransferError> {
        let mut tx = self.db.pool().begin().await?;

        // Lock rows in ascending id order so two opposing transfers over
        // the same pair cannot deadlock.
        let (sender, receiver) = if req.sender_account_id < req.receiver_account_id {
            let s = self.lock(&mut tx, req.sender_account_id, AccountSide::Sender).await?;
            let r = self
                .lock(&mut tx, req.receiver_account_id, AccountSide::Receiver)
                .await?;
            (s, r)
        } else {
            let r = self
                .lock(&mut tx, req.receiver_account_id, AccountSide::Receiver)
                .await?;
            let s = self.lock(&mut tx, req.sender_account_id, AccountSide::Sender).await?;
            (s, r)
        };

        // Sufficiency is judged against the amount in the sender's own
        // currency, under lock.
        if sender.balance < debit {
            return Err(TransferError::InsufficientFunds);
        }

        let sender_new = sender.balance - debit;
        let receiver_new = receiver.balance + credit;

        if !AccountStore::update_balance(&mut tx, sender.id, sender_new).await? {
            return Err(TransferError::AccountNotFound {
                side: AccountSide::Sender,
            });
        }
        if !AccountStore::update_balance(&mut tx, receiver.id, receiver_new).await? {
            return Err(TransferError::AccountNotFound {
                side: AccountSide::Receiver,
            });
        }

        // The ledger carries the requested amount and currency, not the
        // converted amounts.
        let record = TransactionRecord {
            bank_sender_name: sender.bank_name.clone(),
            account_sender_id: sender.id,
            bank_receiver_name: receiver.bank_name.clone(),
            account_receiver_id: receiver.id,
            sent_currency: req.currency.clone(),
            sent_amount: req.amount,
            idempotency_key: req.idempotency_key.clone(),
        };
        let ledger_id = LedgerWriter::append(&mut tx, &record).await?;

        tx.commit().await?;

        info!(
            ledger_id,
            sender = sender.id,
            receiver = receiver.id,
            amount = %req.amount,
            currency = %req.currency,
            "transfer committed"
        );

        Ok(TransferOutcome::Completed(TransferDetails {
            sender_new_balance: sender_new,
            receiver_new_balance: receiver_new,
            exchange_rate_snapshot: Some(snapshot.clone()),
        }))
    }

    async fn lock(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: i64,
        side: AccountSide,
    ) -> Result<Account, TransferError> {
        AccountStore::lock(tx, id)
            .await?
            .ok_or(TransferError::AccountNotFound { side })
    }

    /// The idempotency key was seen before: report current balances, move
    /// nothing.
    async fn replay(&self, req: &TransferRequest) -> Result<TransferOutcome, TransferError> {
        info!(
            sender = req.sender_account_id,
            receiver = req.receiver_account_id,
            "idempotency key already applied, replaying outcome"
        );

        let sender = self.fetch(req.sender_account_id, AccountSide::Sender).await?;
        let receiver = self
            .fetch(req.receiver_account_id, AccountSide::Receiver)
            .await?;

        Ok(TransferOutcome::AlreadyApplied(TransferDetails {
            sender_new_balance: sender.balance,
            receiver_new_balance: receiver.balance,
            exchange_rate_snapshot: None,
        }))
    }
}

/// Translate the requested amount into each account's native currency.
///
/// Both amounts are derived independently from the requested amount, so
/// rounding error stays symmetric instead of compounding through an
/// intermediate conversion.
pub fn converted_amounts(
    amount: Decimal,
    request_currency: &str,
    sender_currency: &str,
    receiver_currency: &str,
    snapshot: &RateSnapshot,
) -> Result<(Decimal, Decimal), TransferError> {
    let rate_requested = snapshot
        .rate(request_currency)
        .ok_or_else(|| TransferError::UnsupportedCurrency(request_currency.to_string()))?;
    let rate_sender = snapshot
        .rate(sender_currency)
        .ok_or_else(|| TransferError::UnsupportedCurrency(sender_currency.to_string()))?;
    let rate_receiver = snapshot
        .rate(receiver_currency)
        .ok_or_else(|| TransferError::UnsupportedCurrency(receiver_currency.to_string()))?;

    let debit = amount / rate_requested * rate_sender;
    let credit = amount / rate_requested * rate_receiver;
    Ok((debit, credit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn snapshot(pairs: &[(&str, &str)]) -> RateSnapshot {
        let rates: HashMap<String, Decimal> = pairs
            .iter()
            .map(|(c, r)| (c.to_string(), r.parse().unwrap()))
            .collect();
        RateSnapshot::new("USD", rates)
    }

    #[test]
    fn test_usd_to_eur_conversion() {
        // 100 USD against {USD: 1.0, EUR: 0.85}: sender pays 100 USD,
        // receiver gains 85 EUR.
        let snap = snapshot(&[("USD", "1.0"), ("EUR", "0.85")]);
        let (debit, credit) = converted_amounts(
            Decimal::new(100, 0),
            "USD",
            "USD",
            "EUR",
            &snap,
        )
        .unwrap();
        assert_eq!(debit, Decimal::new(100, 0));
        assert_eq!(credit, Decimal::new(85, 0));
    }

    #[test]
    fn test_request_currency_differs_from_both_accounts() {
        // Transfer denominated in EUR between a USD sender and a GBP
        // receiver.
        let snap = snapshot(&[("USD", "1.0"), ("EUR", "0.8"), ("GBP", "0.6")]);
        let (debit, credit) =
            converted_amounts(Decimal::new(80, 0), "EUR", "USD", "GBP", &snap).unwrap();
        assert_eq!(debit, Decimal::new(100, 0)); // 80 / 0.8 * 1.0
        assert_eq!(credit, Decimal::new(60, 0)); // 80 / 0.8 * 0.6
    }

    #[test]
    fn test_identity_snapshot_is_one_to_one() {
        let snap = RateSnapshot::identity("USD");
        let (debit, credit) =
            converted_amounts(Decimal::new(42, 0), "USD", "USD", "USD", &snap).unwrap();
        assert_eq!(debit, Decimal::new(42, 0));
        assert_eq!(credit, Decimal::new(42, 0));
    }

    #[test]
    fn test_missing_currency_is_unsupported() {
        let snap = snapshot(&[("USD", "1.0")]);
        let err =
            converted_amounts(Decimal::ONE, "USD", "USD", "JPY", &snap).unwrap_err();
        assert!(matches!(err, TransferError::UnsupportedCurrency(c) if c == "JPY"));
    }

    #[test]
    fn test_zero_rate_is_unsupported() {
        let snap = snapshot(&[("USD", "1.0"), ("EUR", "0")]);
        let err = converted_amounts(Decimal::ONE, "EUR", "USD", "USD", &snap).unwrap_err();
        assert!(matches!(err, TransferError::UnsupportedCurrency(c) if c == "EUR"));
    }

    #[test]
    fn test_base_equivalent_sum_is_conserved() {
        // debit/rate_sender == credit/rate_receiver == amount/rate_req
        let snap = snapshot(&[("USD", "1.0"), ("EUR", "0.85"), ("GBP", "0.72")]);
        let amount = Decimal::new(12345, 2);
        let (debit, credit) =
            converted_amounts(amount, "GBP", "USD", "EUR", &snap).unwrap();
        let base_out = debit / snap.rate("USD").unwrap();
        let base_in = credit / snap.rate("EUR").unwrap();
        assert!((base_out - base_in).abs() < Decimal::new(1, 10));
    }
}
