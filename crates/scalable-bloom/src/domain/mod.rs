//! Domain Layer - Pure filter logic
//!
//! This layer contains:
//! - Hash indexing (item -> bit offsets)
//! - Per-level sizing
//! - Configuration
//! - Store key layout
//! - Persisted metadata records
//!
//! RULES:
//! - No I/O operations
//! - No async code

pub mod config;
pub mod hash_functions;
pub mod keys;
pub mod metadata;
pub mod parameters;

pub use config::{FilterConfig, FilterConfigBuilder, LARGE_SET_GROWTH, SMALL_SET_GROWTH};
pub use hash_functions::compute_hash_positions;
pub use keys::FilterKeys;
pub use metadata::{FilterHeader, FilterRecord};
pub use parameters::{calculate_fpr, LevelParams, MAX_LEVELS, MAX_LEVEL_BITS};
