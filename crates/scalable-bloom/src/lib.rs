//! # Scalable Bloom
//!
//! Scalable bloom filters whose bits and metadata live in a shared key-value
//! store, so that many processes can add to and query the same named filter.
//!
//! A filter is a stack of levels. Level `i` has capacity `n0 * s^i` and target
//! false positive rate `p0 * r^i`; when the top level fills up, a new level is
//! appended. The compound false positive rate stays below `p0 / (1 - r)`.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure logic, no I/O
//!   - `FilterConfig`: Sizing parameters with validation
//!   - `LevelParams`: Per-level capacity, error rate, bits and hash count
//!   - `compute_hash_positions`: Item to bit offsets
//!   - `FilterKeys`: Store key layout
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `ScalableFilterApi`: Driving port (inbound API)
//!   - `FilterStore`: Driven port (the shared store)
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `ScalableFilter`: Implements `ScalableFilterApi`
//!
//! - **Adapters Layer** (`adapters/`): Store implementations
//!   - `InMemoryFilterStore`, `TimeoutStore`, `RocksDbFilterStore` (feature `rocksdb`)
//!
//! ## Invariants
//!
//! - No false negatives: once `add(x)` returns `Ok`, `contains(x)` returns `true`
//!   on every handle, across growth and restarts.
//! - The level count only increases, by exactly one per growth step.
//! - Store failures are errors, never a `false` answer.
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use scalable_bloom::{FilterConfigBuilder, InMemoryFilterStore, ScalableFilter};
//!
//! let store = Arc::new(InMemoryFilterStore::new());
//! let config = FilterConfigBuilder::new()
//!     .base_capacity(10_000)
//!     .base_error_rate(0.001)
//!     .build()?;
//!
//! let filter = ScalableFilter::initialize(store.clone(), "visits", config).await?;
//! filter.add(b"alice").await?;
//! assert!(filter.contains(b"alice").await?);
//!
//! // Another handle, possibly in another process, sees the same filter
//! let other = ScalableFilter::open(store, "visits").await?;
//! assert!(other.contains(b"alice").await?);
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports for convenience
pub use adapters::{InMemoryFilterStore, TimeoutStore};
#[cfg(feature = "rocksdb")]
pub use adapters::{RocksDbFilterStore, RocksDbStoreConfig};
pub use domain::{FilterConfig, FilterConfigBuilder, LevelParams, LARGE_SET_GROWTH, SMALL_SET_GROWTH};
pub use error::{FilterError, StoreError};
pub use metrics::{Metrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use ports::{AddReceipt, CasOutcome, FilterStats, FilterStore, LevelStats, ScalableFilterApi};
pub use service::{GrowthOutcome, Level, ScalableFilter};
