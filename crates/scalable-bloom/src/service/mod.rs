//! Service Layer
//!
//! Orchestrates the domain logic against the shared store:
//!
//! - `BitField` - one level's bit region
//! - `MetadataStore` - headers, level records and counters
//! - `Level` - one fixed-size level
//! - `ScalableFilter` - the growing stack of levels

pub mod bit_field;
pub mod level;
pub mod metadata_store;
pub mod scalable_filter;

pub use bit_field::BitField;
pub use level::Level;
pub use metadata_store::{GrowthOutcome, MetadataStore};
pub use scalable_filter::ScalableFilter;
