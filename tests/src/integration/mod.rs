//! # Integration Scenarios
//!
//! Every scenario builds its handles on one shared store and asserts only on
//! what a caller can observe through the public API.

pub mod concurrency;
pub mod lifecycle;
pub mod sharing;
