use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::TransferError;
use crate::rates::RateSnapshot;

/// A request to move money between two accounts.
///
/// The amount is denominated in `currency`, which may differ from either
/// account's native currency.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferRequest {
    pub sender_account_id: i64,
    pub receiver_account_id: i64,
    pub amount: Decimal,
    pub currency: String,
    /// Optional dedupe token. A repeated key returns the original outcome
    /// instead of moving funds twice.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

impl TransferRequest {
    /// Local validation, rejected before any store access
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.sender_account_id <= 0 {
            return Err(TransferError::Validation(
                "sender_account_id must be positive".to_string(),
            ));
        }
        if self.receiver_account_id <= 0 {
            return Err(TransferError::Validation(
                "receiver_account_id must be positive".to_string(),
            ));
        }
        if self.sender_account_id == self.receiver_account_id {
            return Err(TransferError::Validation(
                "sender and receiver account must differ".to_string(),
            ));
        }
        if self.amount <= Decimal::ZERO {
            return Err(TransferError::Validation(
                "amount must be positive".to_string(),
            ));
        }
        if self.currency.trim().is_empty() {
            return Err(TransferError::Validation(
                "currency must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// New balances and the snapshot the conversion used, for caller audit.
/// A replayed request carries no snapshot: the original conversion already
/// happened and its rates were never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct TransferDetails {
    pub sender_new_balance: Decimal,
    pub receiver_new_balance: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_rate_snapshot: Option<RateSnapshot>,
}

/// Engine-level result of a transfer
#[derive(Debug)]
pub enum TransferOutcome {
    /// Funds moved, ledger record appended
    Completed(TransferDetails),
    /// Idempotency key seen before; balances reflect the earlier transfer
    AlreadyApplied(TransferDetails),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Success,
    Error,
}

/// Boundary response: no error crosses to the caller for expected failure
/// kinds, only a structured status and message.
#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub status: TransferStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<TransferDetails>,
}

impl TransferResponse {
    pub fn from_result(result: Result<TransferOutcome, TransferError>) -> Self {
        match result {
            Ok(TransferOutcome::Completed(details)) => Self {
                status: TransferStatus::Success,
                message: "Transfer completed successfully".to_string(),
                details: Some(details),
            },
            Ok(TransferOutcome::AlreadyApplied(details)) => Self {
                status: TransferStatus::Success,
                message: "Transfer already applied".to_string(),
                details: Some(details),
            },
            Err(err) => Self {
                status: TransferStatus::Error,
                message: err.to_string(),
                details: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(amount: Decimal) -> TransferRequest {
        TransferRequest {
            sender_account_id: 1,
            receiver_account_id: 2,
            amount,
            currency: "USD".to_string(),
            idempotency_key: None,
        }
    }

    #[test]
    fn test_positive_amount_required() {
        assert!(request(Decimal::new(100, 0)).validate().is_ok());
        assert!(request(Decimal::ZERO).validate().is_err());
        assert!(request(Decimal::new(-5, 0)).validate().is_err());
    }

    #[test]
    fn test_self_transfer_rejected() {
        let mut req = request(Decimal::ONE);
        req.receiver_account_id = req.sender_account_id;
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn test_empty_currency_rejected() {
        let mut req = request(Decimal::ONE);
        req.currency = "  ".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_request_deserializes_without_idempotency_key() {
        let req: TransferRequest = serde_json::from_str(
            r#"{"sender_account_id":1,"receiver_account_id":2,"amount":"100","currency":"USD"}"#,
        )
        .unwrap();
        assert_eq!(req.amount, Decimal::new(100, 0));
        assert!(req.idempotency_key.is_none());
    }

    #[test]
    fn test_error_response_shape() {
        let resp = TransferResponse::from_result(Err(TransferError::InsufficientFunds));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Insufficient funds");
        assert!(json.get("details").is_none());
    }
}
