//! Exchange-rate provider client and cache

mod cache;
mod client;

pub use cache::CachedRateSource;
pub use client::{HttpRateSource, RateError, RateSnapshot, RateSource};
