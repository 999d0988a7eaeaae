//! # Scalable Bloom Test Suite
//!
//! Scenarios that exercise a filter through several handles on one store,
//! the way separate processes would share it.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── support.rs        # Tracing setup and filter fixtures
//! └── integration/
//!     ├── sharing.rs      # Many handles, one filter
//!     ├── growth.rs       # Level appends and sizing
//!     ├── concurrency.rs  # Racing writers and initializers
//!     ├── failures.rs     # Store outages and timeouts
//!     └── lifecycle.rs    # Open, flush, expire, durable restart
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p scalable-bloom-tests
//!
//! # Including the RocksDB store
//! cargo test -p scalable-bloom-tests --features rocksdb
//!
//! # Verbose filter logs
//! RUST_LOG=scalable_bloom=debug cargo test -p scalable-bloom-tests
//!
//! # Benchmarks
//! cargo bench -p scalable-bloom-tests
//! ```

#![allow(dead_code)]

pub mod integration;
pub mod support;
