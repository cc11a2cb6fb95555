//! Account domain models and persistence

mod models;
mod store;

pub use models::{Account, AccountKind, Bank, DiscountTier, StatusTier};
pub use store::AccountStore;
