//! One fixed-size level of a scalable filter
//!
//! A level is addressed by `(filter name, index)` and rebuilt from the
//! filter configuration on every access. Its sizing never changes once created.

use std::sync::Arc;

use crate::domain::{compute_hash_positions, FilterKeys, LevelParams};
use crate::error::FilterError;
use crate::ports::{AddReceipt, FilterStore};

use super::bit_field::BitField;
use super::metadata_store::MetadataStore;

/// Handle on one level's bits and item count
pub struct Level<S: ?Sized> {
    params: LevelParams,
    bits: BitField<S>,
    metadata: MetadataStore<S>,
}

impl<S: FilterStore + ?Sized> Level<S> {
    pub fn new(store: Arc<S>, keys: &FilterKeys, params: LevelParams) -> Self {
        Self {
            bits: BitField::new(store.clone(), keys, params.index),
            metadata: MetadataStore::new(store, keys.clone()),
            params,
        }
    }

    pub fn params(&self) -> &LevelParams {
        &self.params
    }

    pub fn index(&self) -> u32 {
        self.params.index
    }

    pub fn capacity(&self) -> u64 {
        self.params.capacity
    }

    pub fn bit_field(&self) -> &BitField<S> {
        &self.bits
    }

    fn positions(&self, item: &[u8]) -> Vec<u64> {
        compute_hash_positions(item, self.params.size_bits, self.params.hash_count)
    }

    /// Set the item's bits, then count it
    ///
    /// The count is incremented even when every bit was already set, so the
    /// count tracks adds rather than distinct items.
    pub async fn add(&self, item: &[u8]) -> Result<AddReceipt, FilterError> {
        let previous = self.bits.set_bits(&self.positions(item)).await?;
        let level_items = self.metadata.bump_item_count(self.params.index).await?;

        Ok(AddReceipt {
            level: self.params.index,
            level_items,
            previously_present: previous.iter().all(|&bit| bit),
        })
    }

    /// Set the bits of all items in one write and count them in one increment
    ///
    /// Returns the level's item count afterwards.
    pub async fn add_many(&self, items: &[Vec<u8>]) -> Result<u64, FilterError> {
        if items.is_empty() {
            return self.current_count().await;
        }

        let positions: Vec<u64> = items
            .iter()
            .flat_map(|item| self.positions(item))
            .collect();
        self.bits.set_bits(&positions).await?;

        self.metadata
            .bump_item_count_by(self.params.index, items.len() as u64)
            .await
    }

    pub async fn contains(&self, item: &[u8]) -> Result<bool, FilterError> {
        self.bits.all_set(&self.positions(item)).await
    }

    /// Items recorded in the level
    pub async fn current_count(&self) -> Result<u64, FilterError> {
        self.metadata.item_count(self.params.index).await
    }

    pub async fn is_full(&self) -> Result<bool, FilterError> {
        Ok(self.current_count().await? >= self.params.capacity)
    }
}
