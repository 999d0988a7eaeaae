//! Filter and level metadata kept in the shared store
//!
//! Every mutation is a single atomic store call: conditional create for the
//! header and level records, compare-and-swap for the level count, and atomic
//! increment for item counts. No in-process lock is involved.

use std::sync::Arc;

use tracing::debug;

use crate::domain::metadata::{decode_count, decode_level, encode_count, encode_level};
use crate::domain::{FilterHeader, FilterKeys, FilterRecord, LevelParams, MAX_LEVELS};
use crate::error::FilterError;
use crate::ports::{CasOutcome, FilterStore};

/// Result of an attempt to append a level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrowthOutcome {
    /// This caller moved the level count to the contained value
    Appended(u32),
    /// Another caller had already moved the level count; contains the current value
    Lost(u32),
}

/// Metadata accessor for one filter name
pub struct MetadataStore<S: ?Sized> {
    store: Arc<S>,
    keys: FilterKeys,
}

impl<S: ?Sized> Clone for MetadataStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            keys: self.keys.clone(),
        }
    }
}

impl<S: FilterStore + ?Sized> MetadataStore<S> {
    pub fn new(store: Arc<S>, keys: FilterKeys) -> Self {
        Self { store, keys }
    }

    pub fn keys(&self) -> &FilterKeys {
        &self.keys
    }

    fn not_found(&self) -> FilterError {
        FilterError::NotFound(self.keys.name().to_string())
    }

    /// Persisted header; `NotFound` if the filter was never initialized
    pub async fn header(&self) -> Result<FilterHeader, FilterError> {
        match self.store.get(&self.keys.header()).await? {
            Some(bytes) => FilterHeader::from_bytes(&bytes),
            None => Err(self.not_found()),
        }
    }

    /// Everything recorded about the filter
    pub async fn load(&self) -> Result<FilterRecord, FilterError> {
        let header = self.header().await?;
        let level_count = self.level_count().await?;

        let mut level_counts = Vec::new();
        for index in 0..level_count {
            level_counts.push(self.item_count(index).await?);
        }

        Ok(FilterRecord {
            name: self.keys.name().to_string(),
            config: header.config,
            level_count,
            level_counts,
        })
    }

    /// Write the header unless one exists
    ///
    /// Returns the header now in the store and whether this call created it.
    pub async fn create_if_absent(
        &self,
        header: &FilterHeader,
    ) -> Result<(FilterHeader, bool), FilterError> {
        let existing = self
            .store
            .put_if_absent(&self.keys.header(), &header.to_bytes()?)
            .await?;

        match existing {
            None => Ok((header.clone(), true)),
            Some(bytes) => Ok((FilterHeader::from_bytes(&bytes)?, false)),
        }
    }

    /// Set the level count to 1 unless it is already set
    pub async fn seed_level_count(&self) -> Result<(), FilterError> {
        self.store
            .put_if_absent(&self.keys.level_count(), &encode_count(1))
            .await?;
        Ok(())
    }

    /// Current number of levels, at least 1 and at most [`MAX_LEVELS`]
    pub async fn level_count(&self) -> Result<u32, FilterError> {
        let raw = self
            .store
            .get(&self.keys.level_count())
            .await?
            .ok_or_else(|| self.not_found())?;

        let count = decode_count(Some(&raw))?;
        if count == 0 || count > MAX_LEVELS as u64 {
            return Err(FilterError::CorruptMetadata(format!(
                "filter '{}' records {} levels",
                self.keys.name(),
                count
            )));
        }
        Ok(count as u32)
    }

    /// Move the level count from `expected` to `expected + 1`
    pub async fn increment_level_count(&self, expected: u32) -> Result<GrowthOutcome, FilterError> {
        let next = expected
            .checked_add(1)
            .ok_or(FilterError::LevelTooLarge { index: expected })?;

        let outcome = self
            .store
            .compare_and_swap(
                &self.keys.level_count(),
                &encode_count(expected as u64),
                &encode_count(next as u64),
            )
            .await?;

        match outcome {
            CasOutcome::Swapped => Ok(GrowthOutcome::Appended(next)),
            CasOutcome::Mismatch(None) => Err(self.not_found()),
            CasOutcome::Mismatch(Some(raw)) => {
                let current = decode_count(Some(&raw))?;
                debug!(
                    filter = %self.keys.name(),
                    expected,
                    current,
                    "Level count already advanced"
                );
                Ok(GrowthOutcome::Lost(current.min(u32::MAX as u64) as u32))
            }
        }
    }

    /// Write a level's sizing record unless one exists
    ///
    /// An existing record must match `params`.
    pub async fn record_level_meta(&self, params: &LevelParams) -> Result<(), FilterError> {
        let key = self.keys.level_meta(params.index);
        let existing = self.store.put_if_absent(&key, &encode_level(params)?).await?;

        if let Some(bytes) = existing {
            let persisted = decode_level(&bytes)?;
            if persisted != *params {
                return Err(FilterError::CorruptMetadata(format!(
                    "level {} of filter '{}' was recorded with different sizing",
                    params.index,
                    self.keys.name()
                )));
            }
        }
        Ok(())
    }

    /// Write a level's sizing record and create its count and bit region
    ///
    /// Every step is idempotent. The level keys take over the expiry of the
    /// filter header, if it has one, so a level appended after `expire` goes
    /// away together with the rest of the filter.
    pub async fn create_level(&self, params: &LevelParams) -> Result<(), FilterError> {
        self.record_level_meta(params).await?;
        self.store
            .increment(&self.keys.level_item_count(params.index), 0)
            .await?;
        self.store
            .set_bits(&self.keys.level_bits(params.index), &[])
            .await?;

        if let Some(ttl) = self.store.ttl(&self.keys.header()).await? {
            self.store.expire(&self.keys.level(params.index), ttl).await?;
            debug!(
                filter = %self.keys.name(),
                level = params.index,
                ttl_ms = ttl.as_millis() as u64,
                "Level inherits filter expiry"
            );
        }
        Ok(())
    }

    /// Persisted sizing record of a level, if written
    pub async fn level_meta(&self, index: u32) -> Result<Option<LevelParams>, FilterError> {
        match self.store.get(&self.keys.level_meta(index)).await? {
            Some(bytes) => Ok(Some(decode_level(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn bump_item_count(&self, index: u32) -> Result<u64, FilterError> {
        self.bump_item_count_by(index, 1).await
    }

    /// Atomically add `by` to a level's item count, returning the new count
    pub async fn bump_item_count_by(&self, index: u32, by: u64) -> Result<u64, FilterError> {
        Ok(self
            .store
            .increment(&self.keys.level_item_count(index), by)
            .await?)
    }

    /// Items recorded in a level; zero if none were ever added
    pub async fn item_count(&self, index: u32) -> Result<u64, FilterError> {
        let raw = self.store.get(&self.keys.level_item_count(index)).await?;
        decode_count(raw.as_deref())
    }

    /// Stored level count without validation, `None` when absent
    pub(crate) async fn raw_level_count(&self) -> Result<Option<u32>, FilterError> {
        match self.store.get(&self.keys.level_count()).await? {
            Some(raw) => Ok(Some(decode_count(Some(&raw))?.min(MAX_LEVELS as u64) as u32)),
            None => Ok(None),
        }
    }
}
