//! bank-ledger - Multi-Bank Transfer Engine
//!
//! Banks hold accounts, accounts belong to users, and money moves between
//! accounts through transfers that may cross currencies and land in an
//! append-only audit trail.
//!
//! # Modules
//!
//! - [`config`] - YAML application configuration
//! - [`logging`] - tracing subscriber setup
//! - [`store`] - PostgreSQL pool and schema bootstrap
//! - [`account`] - account/bank models and the account store
//! - [`ledger`] - append-only transaction records
//! - [`rates`] - exchange-rate provider client and TTL cache
//! - [`transfer`] - the transfer engine

pub mod account;
pub mod config;
pub mod ledger;
pub mod logging;
pub mod rates;
pub mod store;
pub mod transfer;

// Convenient re-exports at crate root
pub use account::{Account, AccountKind, AccountStore, Bank};
pub use config::AppConfig;
pub use ledger::{LedgerEntry, LedgerWriter, TransactionRecord};
pub use rates::{CachedRateSource, HttpRateSource, RateError, RateSnapshot, RateSource};
pub use store::Database;
pub use transfer::{
    TransferDetails, TransferEngine, TransferError, TransferOutcome, TransferRequest,
    TransferResponse, TransferStatus,
};
