//! Inbound Ports (Driving Ports)
//!
//! The API callers use to add to and query a named scalable filter.

use async_trait::async_trait;

use crate::domain::{FilterConfig, LevelParams};
use crate::error::FilterError;

/// Result of a successful add
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddReceipt {
    /// Level the item was written to
    pub level: u32,
    /// Item count of that level after this add
    pub level_items: u64,
    /// Every bit of the item was already set in that level before the add
    pub previously_present: bool,
}

/// Point-in-time description of one level
#[derive(Clone, Debug, PartialEq)]
pub struct LevelStats {
    pub params: LevelParams,
    /// Items recorded in the level
    pub count: u64,
    /// Bits currently set in the level's region
    pub bits_set: u64,
}

impl LevelStats {
    /// Fraction of the level's bits that are set
    pub fn fill_ratio(&self) -> f64 {
        if self.params.size_bits == 0 {
            return 0.0;
        }
        self.bits_set as f64 / self.params.size_bits as f64
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.params.capacity
    }
}

/// Point-in-time description of a filter
#[derive(Clone, Debug, PartialEq)]
pub struct FilterStats {
    pub name: String,
    pub config: FilterConfig,
    pub levels: Vec<LevelStats>,
}

impl FilterStats {
    pub fn level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    /// Items recorded across all levels
    pub fn count(&self) -> u64 {
        self.levels.iter().map(|l| l.count).sum()
    }

    /// Sum of the capacities of existing levels
    pub fn capacity(&self) -> u64 {
        self.levels.iter().map(|l| l.params.capacity).sum()
    }
}

/// Primary scalable filter API (Driving Port)
#[async_trait]
pub trait ScalableFilterApi: Send + Sync {
    /// Name the filter is stored under
    fn name(&self) -> &str;

    /// Sizing parameters in effect
    fn config(&self) -> &FilterConfig;

    /// Add an item to the current top level, growing the filter first if the
    /// top level is full
    ///
    /// Retrying after a `StoreUnavailable` is safe.
    async fn add(&self, item: &[u8]) -> Result<AddReceipt, FilterError>;

    /// Add many items, filling the current level before growing
    ///
    /// Returns the number of items written.
    async fn add_many(&self, items: &[Vec<u8>]) -> Result<u64, FilterError>;

    /// Test whether an item may have been added
    ///
    /// Returns:
    /// - `Ok(true)` if the item might be in the set (could be false positive)
    /// - `Ok(false)` if the item was definitely never added
    /// - `Err(_)` if any level could not be read; never reported as `false`
    async fn contains(&self, item: &[u8]) -> Result<bool, FilterError>;

    /// Number of levels currently in the filter
    async fn level_count(&self) -> Result<u32, FilterError>;

    /// Per-level counts, capacities and fill
    async fn stats(&self) -> Result<FilterStats, FilterError>;
}
