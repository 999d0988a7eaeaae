//! Bit region of one level in the shared store
//!
//! A `BitField` holds no bits itself; every call goes to the store, so all
//! handles on the same `(filter, level)` observe the same region.

use std::sync::Arc;

use crate::domain::FilterKeys;
use crate::error::FilterError;
use crate::ports::FilterStore;

/// Store-resident bit region scoped to a filter name and level index
pub struct BitField<S: ?Sized> {
    store: Arc<S>,
    key: String,
}

impl<S: FilterStore + ?Sized> BitField<S> {
    pub fn new(store: Arc<S>, keys: &FilterKeys, level: u32) -> Self {
        Self {
            store,
            key: keys.level_bits(level),
        }
    }

    /// Store key of the region
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Set the bits at `positions`, returning their values before the write
    ///
    /// Durable once this returns `Ok`.
    pub async fn set_bits(&self, positions: &[u64]) -> Result<Vec<bool>, FilterError> {
        Ok(self.store.set_bits(&self.key, positions).await?)
    }

    pub async fn get_bits(&self, positions: &[u64]) -> Result<Vec<bool>, FilterError> {
        Ok(self.store.get_bits(&self.key, positions).await?)
    }

    /// Whether every bit at `positions` is set
    pub async fn all_set(&self, positions: &[u64]) -> Result<bool, FilterError> {
        Ok(self.get_bits(positions).await?.into_iter().all(|bit| bit))
    }

    /// Number of set bits in the region
    pub async fn count_set(&self) -> Result<u64, FilterError> {
        Ok(self.store.count_bits(&self.key).await?)
    }
}
