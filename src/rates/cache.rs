//! TTL cache in front of a rate source
//!
//! Bounds the request rate against the provider. Snapshots are cached per
//! base currency; a snapshot older than the TTL forces a refetch. The
//! refresh runs outside the read lock, so readers of other bases are never
//! blocked behind a slow provider call.

use async_trait::async_trait;
use chrono::Duration;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::client::{RateError, RateSnapshot, RateSource};

/// Caching wrapper around any [`RateSource`]
pub struct CachedRateSource<S> {
    inner: S,
    ttl: Duration,
    cache: RwLock<HashMap<String, RateSnapshot>>,
}

impl<S: RateSource> CachedRateSource<S> {
    pub fn new(inner: S, ttl_secs: u64) -> Self {
        Self {
            inner,
            ttl: Duration::seconds(ttl_secs as i64),
            cache: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<S: RateSource> RateSource for CachedRateSource<S> {
    async fn rates(&self, base: &str) -> Result<RateSnapshot, RateError> {
        {
            let cache = self.cache.read().await;
            if let Some(snap) = cache.get(base)
                && snap.age() <= self.ttl
            {
                return Ok(snap.clone());
            }
        }

        // Expired or missing. A provider failure propagates; a stale
        // snapshot is never served in its place.
        debug!(base = base, "rate cache miss, refreshing");
        let snap = self.inner.rates(base).await?;

        let mut cache = self.cache.write().await;
        cache.insert(base.to_string(), snap.clone());
        Ok(snap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl RateSource for CountingSource {
        async fn rates(&self, base: &str) -> Result<RateSnapshot, RateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RateError::Malformed("provider down".to_string()));
            }
            let rates = HashMap::from([(base.to_string(), Decimal::ONE)]);
            Ok(RateSnapshot::new(base, rates))
        }
    }

    #[tokio::test]
    async fn test_fresh_snapshot_served_without_second_fetch() {
        let cached = CachedRateSource::new(CountingSource::new(false), 60);

        cached.rates("USD").await.unwrap();
        cached.rates("USD").await.unwrap();
        cached.rates("USD").await.unwrap();

        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_bases_fetch_separately() {
        let cached = CachedRateSource::new(CountingSource::new(false), 60);

        cached.rates("USD").await.unwrap();
        cached.rates("EUR").await.unwrap();

        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_snapshot_forces_refetch() {
        // Zero TTL: every call is a refetch
        let cached = CachedRateSource::new(CountingSource::new(false), 0);

        cached.rates("USD").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        cached.rates("USD").await.unwrap();

        assert_eq!(cached.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_provider_failure_is_not_masked() {
        let cached = CachedRateSource::new(CountingSource::new(true), 60);
        assert!(cached.rates("USD").await.is_err());
    }
}
