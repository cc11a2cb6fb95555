//! Atomic cross-currency transfer execution

mod engine;
mod error;
mod types;

pub use engine::{TransferEngine, converted_amounts};
pub use error::{AccountSide, TransferError};
pub use types::{
    TransferDetails, TransferOutcome, TransferRequest, TransferResponse, TransferStatus,
};
