//! Deadline decorator for any `FilterStore`
//!
//! A call that does not complete within the deadline fails with
//! `StoreError::Timeout`. Its effect on the store is unknown; callers treat
//! the whole filter operation as retryable.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::debug;

use crate::error::StoreError;
use crate::ports::{CasOutcome, FilterStore};

/// Default deadline per store call
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Wraps a store and bounds every call with a deadline
pub struct TimeoutStore<S> {
    inner: S,
    deadline: Duration,
}

impl<S: FilterStore> TimeoutStore<S> {
    pub fn new(inner: S, deadline: Duration) -> Self {
        Self { inner, deadline }
    }

    pub fn with_default_timeout(inner: S) -> Self {
        Self::new(inner, DEFAULT_STORE_TIMEOUT)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = Result<T, StoreError>> + Send,
    ) -> Result<T, StoreError> {
        match timeout(self.deadline, fut).await {
            Ok(result) => result,
            Err(_) => {
                debug!(op, deadline_ms = self.deadline.as_millis() as u64, "Store call timed out");
                Err(StoreError::Timeout)
            }
        }
    }
}

#[async_trait]
impl<S: FilterStore> FilterStore for TimeoutStore<S> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.bounded("get", self.inner.get(key)).await
    }

    async fn put_if_absent(&self, key: &str, value: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.bounded("put_if_absent", self.inner.put_if_absent(key, value))
            .await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &[u8],
        new: &[u8],
    ) -> Result<CasOutcome, StoreError> {
        self.bounded(
            "compare_and_swap",
            self.inner.compare_and_swap(key, expected, new),
        )
        .await
    }

    async fn increment(&self, key: &str, delta: u64) -> Result<u64, StoreError> {
        self.bounded("increment", self.inner.increment(key, delta))
            .await
    }

    async fn set_bits(&self, key: &str, offsets: &[u64]) -> Result<Vec<bool>, StoreError> {
        self.bounded("set_bits", self.inner.set_bits(key, offsets))
            .await
    }

    async fn get_bits(&self, key: &str, offsets: &[u64]) -> Result<Vec<bool>, StoreError> {
        self.bounded("get_bits", self.inner.get_bits(key, offsets))
            .await
    }

    async fn count_bits(&self, key: &str) -> Result<u64, StoreError> {
        self.bounded("count_bits", self.inner.count_bits(key)).await
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, StoreError> {
        self.bounded("delete", self.inner.delete(keys)).await
    }

    async fn expire(&self, keys: &[String], ttl: Duration) -> Result<(), StoreError> {
        self.bounded("expire", self.inner.expire(keys, ttl)).await
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        self.bounded("ttl", self.inner.ttl(key)).await
    }
}
