//! Scalable Filter Service
//!
//! A growing stack of levels kept entirely in a shared store. Level `i` holds
//! `n0 * s^i` items at error rate `p0 * r^i`; a new level is appended when the
//! top level is full at the moment of an add.
//!
//! ## Growth
//!
//! ```text
//! add(item):
//!   L = levels
//!   while level L-1 is full:
//!     create level L's keys (conditional creates, inheriting any expiry)
//!     CAS levels: L -> L+1        (winner appends, losers observe the new count)
//!     L = levels
//!   add item to level L-1
//! ```
//!
//! Nothing is cached between calls: the level count and item counts are read
//! from the store on every operation, so any number of handles in any number
//! of processes may operate on the same filter.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::{debug, info, warn};

use crate::domain::{FilterConfig, FilterHeader, FilterKeys, LevelParams};
use crate::error::FilterError;
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::{AddReceipt, FilterStats, FilterStore, LevelStats, ScalableFilterApi};

use super::level::Level;
use super::metadata_store::{GrowthOutcome, MetadataStore};

/// Handle on a named scalable filter
///
/// Handles are cheap to clone and hold no filter state besides the immutable
/// configuration.
pub struct ScalableFilter<S: ?Sized> {
    name: String,
    config: FilterConfig,
    store: Arc<S>,
    metadata: MetadataStore<S>,
    metrics: Arc<dyn MetricsRecorder>,
}

impl<S: ?Sized> Clone for ScalableFilter<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            config: self.config.clone(),
            store: self.store.clone(),
            metadata: self.metadata.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

/// Filter names become part of store keys and may not contain the separator
fn validate_name(name: &str) -> Result<(), FilterError> {
    if name.is_empty() {
        return Err(FilterError::InvalidParameters(
            "filter name must not be empty".to_string(),
        ));
    }
    if name.contains(':') {
        return Err(FilterError::InvalidParameters(format!(
            "filter name must not contain ':', got '{}'",
            name
        )));
    }
    Ok(())
}

impl<S: FilterStore + ?Sized> ScalableFilter<S> {
    fn attach(store: Arc<S>, name: String, config: FilterConfig) -> Self {
        let metadata = MetadataStore::new(store.clone(), FilterKeys::new(name.clone()));
        Self {
            name,
            config,
            store,
            metadata,
            metrics: Arc::new(NoOpMetrics),
        }
    }

    /// Create the filter, or attach to it if it already exists
    ///
    /// Idempotent. An existing filter must have been created with the same
    /// configuration, otherwise `ConfigurationMismatch` is returned. Racing
    /// initializers agree on a single header; each one then completes the
    /// remaining creation steps, so a creator that failed midway never leaves
    /// a filter without its first level.
    pub async fn initialize(
        store: Arc<S>,
        name: impl Into<String>,
        config: FilterConfig,
    ) -> Result<Self, FilterError> {
        let name = name.into();
        validate_name(&name)?;
        config.validate()?;
        LevelParams::for_level(&config, 0)?;

        let filter = Self::attach(store, name, config);
        let (winner, created) = filter
            .metadata
            .create_if_absent(&FilterHeader::new(filter.config.clone()))
            .await?;

        if let Some((field, persisted, requested)) = winner.config.first_difference(&filter.config) {
            return Err(FilterError::ConfigurationMismatch {
                name: filter.name.clone(),
                field,
                persisted,
                requested,
            });
        }

        filter.complete_creation().await?;

        if created {
            info!(
                filter = %filter.name,
                capacity = filter.config.base_capacity,
                error_rate = filter.config.base_error_rate,
                growth_ratio = filter.config.growth_ratio,
                scale = filter.config.scale,
                "Created scalable filter"
            );
        } else {
            debug!(filter = %filter.name, "Attached to existing filter");
        }
        Ok(filter)
    }

    /// Attach to an existing filter using its persisted configuration
    ///
    /// Returns `NotFound` if the filter was never initialized.
    pub async fn open(store: Arc<S>, name: impl Into<String>) -> Result<Self, FilterError> {
        let name = name.into();
        validate_name(&name)?;

        let metadata = MetadataStore::new(store.clone(), FilterKeys::new(name.clone()));
        let header = metadata.header().await?;
        header.config.validate()?;

        let filter = Self::attach(store, name, header.config);
        filter.complete_creation().await?;

        debug!(filter = %filter.name, "Opened filter");
        Ok(filter)
    }

    /// Report operations to `metrics`
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Level 0 keys and level count; every step is a conditional create
    async fn complete_creation(&self) -> Result<(), FilterError> {
        let first = LevelParams::for_level(&self.config, 0)?;
        self.metadata.create_level(&first).await?;
        self.metadata.seed_level_count().await
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn keys(&self) -> &FilterKeys {
        self.metadata.keys()
    }

    /// Handle on level `index`; the level need not exist yet
    pub fn level(&self, index: u32) -> Result<Level<S>, FilterError> {
        let params = LevelParams::for_level(&self.config, index)?;
        Ok(Level::new(self.store.clone(), self.metadata.keys(), params))
    }

    pub async fn level_count(&self) -> Result<u32, FilterError> {
        let result = self.metadata.level_count().await;
        self.observe("level_count", result)
    }

    /// The current top level and its item count, growing past any full level
    async fn writable_level(&self) -> Result<(Level<S>, u64), FilterError> {
        let mut levels = self.metadata.level_count().await?;
        loop {
            let top = self.level(levels - 1)?;
            let count = top.current_count().await?;
            if count < top.capacity() {
                return Ok((top, count));
            }
            levels = self.grow(levels).await?;
        }
    }

    /// Append level `levels` unless another handle already did
    ///
    /// Returns the level count afterwards.
    async fn grow(&self, levels: u32) -> Result<u32, FilterError> {
        let params = LevelParams::for_level(&self.config, levels)?;
        self.metadata.create_level(&params).await?;

        match self.metadata.increment_level_count(levels).await? {
            GrowthOutcome::Appended(now) => {
                self.metrics.record_level_created(params.index);
                info!(
                    filter = %self.name,
                    level = params.index,
                    capacity = params.capacity,
                    error_rate = params.error_rate,
                    size_bits = params.size_bits,
                    hash_count = params.hash_count,
                    "Appended filter level"
                );
                Ok(now)
            }
            GrowthOutcome::Lost(now) => {
                self.metrics.record_growth_race_lost();
                debug!(
                    filter = %self.name,
                    expected = levels,
                    levels = now,
                    "Filter already grown by another writer"
                );
                Ok(now)
            }
        }
    }

    /// Add an item to the current top level, growing first if it is full
    pub async fn add(&self, item: &[u8]) -> Result<AddReceipt, FilterError> {
        let start = Instant::now();
        let result = async {
            let (level, _) = self.writable_level().await?;
            level.add(item).await
        }
        .await;

        if result.is_ok() {
            self.metrics.record_add(1, start.elapsed());
        }
        self.observe("add", result)
    }

    /// Add many items, filling the current top level before growing
    ///
    /// Items are written in chunks sized to the room left in the top level,
    /// one bit write and one count increment per chunk. Returns the number of
    /// items written. On error, a prefix of the items may have been written;
    /// repeating the call is safe.
    pub async fn add_many(&self, items: &[Vec<u8>]) -> Result<u64, FilterError> {
        let start = Instant::now();
        let result: Result<u64, FilterError> = async {
            let mut rest = items;
            let mut written = 0u64;
            while !rest.is_empty() {
                let (level, count) = self.writable_level().await?;
                let room = level.capacity().saturating_sub(count).max(1);
                let take = usize::try_from(room).unwrap_or(usize::MAX).min(rest.len());

                let (chunk, tail) = rest.split_at(take);
                level.add_many(chunk).await?;
                written += chunk.len() as u64;
                rest = tail;
            }
            Ok(written)
        }
        .await;

        if let Ok(written) = result {
            self.metrics.record_add(written, start.elapsed());
        }
        self.observe("add_many", result)
    }

    /// Whether the item may have been added
    ///
    /// Every level is consulted. A level that cannot be read fails the whole
    /// call; it is never treated as not containing the item.
    pub async fn contains(&self, item: &[u8]) -> Result<bool, FilterError> {
        let start = Instant::now();
        let result: Result<bool, FilterError> = async {
            let levels = self.metadata.level_count().await?;
            let answers = try_join_all((0..levels).map(|index| async move {
                let level = self.level(index)?;
                level.contains(item).await
            }))
            .await?;
            Ok(answers.into_iter().any(|found| found))
        }
        .await;

        if let Ok(found) = result {
            self.metrics.record_lookup(start.elapsed(), found);
        }
        self.observe("contains", result)
    }

    /// Per-level parameters, item counts and set bits
    pub async fn stats(&self) -> Result<FilterStats, FilterError> {
        let result: Result<FilterStats, FilterError> = async {
            let levels = self.metadata.level_count().await?;
            let levels = try_join_all((0..levels).map(|index| async move {
                let level = self.level(index)?;
                let count = level.current_count().await?;
                let bits_set = level.bit_field().count_set().await?;
                Ok::<_, FilterError>(LevelStats {
                    params: level.params().clone(),
                    count,
                    bits_set,
                })
            }))
            .await?;

            Ok(FilterStats {
                name: self.name.clone(),
                config: self.config.clone(),
                levels,
            })
        }
        .await;

        self.observe("stats", result)
    }

    /// Delete every key of the filter
    ///
    /// Returns the number of keys removed. Other handles on the filter see
    /// `NotFound` afterwards until it is initialized again.
    pub async fn flush(&self) -> Result<u64, FilterError> {
        let result: Result<u64, FilterError> = async {
            let keys = self.all_keys().await?;
            Ok(self.store.delete(&keys).await?)
        }
        .await;

        if let Ok(removed) = &result {
            info!(filter = %self.name, removed, "Flushed filter");
        }
        self.observe("flush", result)
    }

    /// Let every key of the filter expire after `ttl`
    ///
    /// Levels appended later take over the remaining expiry of the header.
    /// The header is expired before the level count is read, so a level
    /// created concurrently either sees the header expiry or is covered here.
    pub async fn expire(&self, ttl: Duration) -> Result<(), FilterError> {
        let result: Result<(), FilterError> = async {
            self.store.expire(&[self.metadata.keys().header()], ttl).await?;
            let keys = self.all_keys().await?;
            Ok(self.store.expire(&keys, ttl).await?)
        }
        .await;

        if result.is_ok() {
            debug!(filter = %self.name, ttl_ms = ttl.as_millis() as u64, "Set filter expiry");
        }
        self.observe("expire", result)
    }

    /// Keys of all existing levels, plus a level record written by an
    /// interrupted growth step
    async fn all_keys(&self) -> Result<Vec<String>, FilterError> {
        let levels = self.metadata.raw_level_count().await?.unwrap_or(0);
        Ok(self.metadata.keys().all(levels.saturating_add(1)))
    }

    fn observe<T>(&self, op: &'static str, result: Result<T, FilterError>) -> Result<T, FilterError> {
        if let Err(err) = &result {
            if err.is_retryable() {
                self.metrics.record_store_failure();
                warn!(filter = %self.name, op, error = %err, "Filter operation failed on store");
            } else {
                debug!(filter = %self.name, op, error = %err, "Filter operation rejected");
            }
        }
        result
    }
}

#[async_trait]
impl<S: FilterStore + ?Sized> ScalableFilterApi for ScalableFilter<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> &FilterConfig {
        &self.config
    }

    async fn add(&self, item: &[u8]) -> Result<AddReceipt, FilterError> {
        ScalableFilter::add(self, item).await
    }

    async fn add_many(&self, items: &[Vec<u8>]) -> Result<u64, FilterError> {
        ScalableFilter::add_many(self, items).await
    }

    async fn contains(&self, item: &[u8]) -> Result<bool, FilterError> {
        ScalableFilter::contains(self, item).await
    }

    async fn level_count(&self) -> Result<u32, FilterError> {
        ScalableFilter::level_count(self).await
    }

    async fn stats(&self) -> Result<FilterStats, FilterError> {
        ScalableFilter::stats(self).await
    }
}
