//! HTTP exchange-rate client
//!
//! Fetches a currency→rate table relative to a base currency. Any network,
//! status, or parse failure is surfaced as a [`RateError`]; there is no
//! 1:1 fallback here. The engine decides what a missing snapshot means.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::ExchangeConfig;

#[derive(Debug, Error)]
pub enum RateError {
    #[error("rate request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate provider returned malformed response: {0}")]
    Malformed(String),
}

/// A point-in-time rate table relative to a base currency. Ephemeral,
/// never persisted.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RateSnapshot {
    pub base: String,
    pub fetched_at: DateTime<Utc>,
    pub rates: HashMap<String, Decimal>,
}

impl RateSnapshot {
    pub fn new(base: impl Into<String>, rates: HashMap<String, Decimal>) -> Self {
        Self {
            base: base.into(),
            fetched_at: Utc::now(),
            rates,
        }
    }

    /// The 1:1 snapshot for a transfer whose three currencies are all the
    /// same. Built locally, never as a substitute for a failed fetch.
    pub fn identity(base: impl Into<String>) -> Self {
        let base = base.into();
        let rates = HashMap::from([(base.clone(), Decimal::ONE)]);
        Self::new(base, rates)
    }

    /// Rate for a currency code, rejecting zero and negative entries
    pub fn rate(&self, code: &str) -> Option<Decimal> {
        self.rates
            .get(code)
            .copied()
            .filter(|r| *r > Decimal::ZERO)
    }

    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.fetched_at
    }
}

/// Source of rate snapshots
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn rates(&self, base: &str) -> Result<RateSnapshot, RateError>;
}

#[derive(Deserialize)]
struct LatestRatesBody {
    data: Option<HashMap<String, Decimal>>,
}

/// Rate client backed by a freecurrencyapi-style HTTP endpoint
pub struct HttpRateSource {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl HttpRateSource {
    pub fn new(config: &ExchangeConfig) -> Result<Self, RateError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn rates(&self, base: &str) -> Result<RateSnapshot, RateError> {
        debug!(base = base, "fetching exchange rates");

        let body: LatestRatesBody = self
            .client
            .get(&self.api_url)
            .query(&[("apikey", self.api_key.as_str()), ("base_currency", base)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let rates = body
            .data
            .ok_or_else(|| RateError::Malformed("missing data field".to_string()))?;

        if rates.is_empty() {
            return Err(RateError::Malformed("empty rate table".to_string()));
        }

        Ok(RateSnapshot::new(base, rates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_rejects_zero_rate() {
        let rates = HashMap::from([
            ("USD".to_string(), Decimal::ONE),
            ("XXX".to_string(), Decimal::ZERO),
        ]);
        let snap = RateSnapshot::new("USD", rates);
        assert_eq!(snap.rate("USD"), Some(Decimal::ONE));
        assert_eq!(snap.rate("XXX"), None);
        assert_eq!(snap.rate("EUR"), None);
    }

    #[test]
    fn test_identity_snapshot() {
        let snap = RateSnapshot::identity("EUR");
        assert_eq!(snap.base, "EUR");
        assert_eq!(snap.rate("EUR"), Some(Decimal::ONE));
        assert_eq!(snap.rate("USD"), None);
    }

    #[test]
    fn test_provider_body_parses_decimal_rates() {
        let body: LatestRatesBody =
            serde_json::from_str(r#"{"data":{"USD":1.0,"EUR":0.85}}"#).unwrap();
        let rates = body.data.unwrap();
        assert_eq!(rates["EUR"], Decimal::new(85, 2));
    }

    #[test]
    fn test_provider_body_without_data_is_malformed() {
        let body: LatestRatesBody = serde_json::from_str(r#"{"message":"nope"}"#).unwrap();
        assert!(body.data.is_none());
    }
}
