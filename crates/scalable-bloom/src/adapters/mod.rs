//! Adapters Layer (Driven Adapters)
//!
//! Implementations of the `FilterStore` port.
//!
//! ## Adapters
//!
//! - `InMemoryFilterStore` - Process-local store with fault injection
//! - `TimeoutStore` - Deadline decorator for any store
//! - `RocksDbFilterStore` - Durable local store (feature `rocksdb`)

pub mod memory;
#[cfg(feature = "rocksdb")]
pub mod rocksdb;
pub mod timeout;

pub use memory::InMemoryFilterStore;
#[cfg(feature = "rocksdb")]
pub use self::rocksdb::{RocksDbFilterStore, RocksDbStoreConfig};
pub use timeout::{TimeoutStore, DEFAULT_STORE_TIMEOUT};
