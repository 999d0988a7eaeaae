//! Outbound Ports (Driven Ports)
//!
//! The shared key-value store the filter delegates all state to. Every call may
//! be issued concurrently from many tasks and many processes; implementations
//! must make each individual call atomic with respect to the others.
//!
//! Production: a networked store (connection handling lives with the host)
//! Testing: `InMemoryFilterStore` (adapters/memory.rs)

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

/// Outcome of a compare-and-swap
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CasOutcome {
    /// The expected value matched and the new value is stored
    Swapped,
    /// The stored value differed; carries what was found
    Mismatch(Option<Vec<u8>>),
}

/// Key-value store contract (Driven Port)
///
/// Three value kinds live in one keyspace: opaque byte values, decimal
/// counters (byte values holding an ASCII integer) and bit regions. Using a
/// key with an operation of another kind fails with `StoreError::WrongType`.
#[async_trait]
pub trait FilterStore: Send + Sync {
    /// Get a byte value (or a counter's decimal text)
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store `value` only if `key` is absent
    ///
    /// Returns `None` when this call created the key, otherwise the existing value.
    async fn put_if_absent(&self, key: &str, value: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the value of `key` with `new` only if it currently equals `expected`
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &[u8],
        new: &[u8],
    ) -> Result<CasOutcome, StoreError>;

    /// Atomically add `delta` to a decimal counter, creating it at zero
    ///
    /// Returns the value after the increment.
    async fn increment(&self, key: &str, delta: u64) -> Result<u64, StoreError>;

    /// Set every offset to 1, returning the previous value of each offset
    ///
    /// The bit region is created (zero-filled) and extended as needed. An
    /// empty `offsets` creates an empty region if none exists.
    async fn set_bits(&self, key: &str, offsets: &[u64]) -> Result<Vec<bool>, StoreError>;

    /// Read the value of each offset; a missing region reads as all zeros
    async fn get_bits(&self, key: &str, offsets: &[u64]) -> Result<Vec<bool>, StoreError>;

    /// Number of set bits in a region
    async fn count_bits(&self, key: &str) -> Result<u64, StoreError>;

    /// Delete keys of any kind, returning how many existed
    async fn delete(&self, keys: &[String]) -> Result<u64, StoreError>;

    /// Expire existing keys after `ttl`
    async fn expire(&self, keys: &[String], ttl: Duration) -> Result<(), StoreError>;

    /// Time left before `key` expires; `None` if it has no expiry or does not exist
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError>;
}

#[async_trait]
impl<S: FilterStore + ?Sized> FilterStore for std::sync::Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key).await
    }

    async fn put_if_absent(&self, key: &str, value: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).put_if_absent(key, value).await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &[u8],
        new: &[u8],
    ) -> Result<CasOutcome, StoreError> {
        (**self).compare_and_swap(key, expected, new).await
    }

    async fn increment(&self, key: &str, delta: u64) -> Result<u64, StoreError> {
        (**self).increment(key, delta).await
    }

    async fn set_bits(&self, key: &str, offsets: &[u64]) -> Result<Vec<bool>, StoreError> {
        (**self).set_bits(key, offsets).await
    }

    async fn get_bits(&self, key: &str, offsets: &[u64]) -> Result<Vec<bool>, StoreError> {
        (**self).get_bits(key, offsets).await
    }

    async fn count_bits(&self, key: &str) -> Result<u64, StoreError> {
        (**self).count_bits(key).await
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, StoreError> {
        (**self).delete(keys).await
    }

    async fn expire(&self, keys: &[String], ttl: Duration) -> Result<(), StoreError> {
        (**self).expire(keys, ttl).await
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        (**self).ttl(key).await
    }
}
