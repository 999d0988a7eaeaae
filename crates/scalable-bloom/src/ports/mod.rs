//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - API for filter callers
//! - Driven Ports (outbound) - The shared key-value store

pub mod inbound;
pub mod outbound;

pub use inbound::{AddReceipt, FilterStats, LevelStats, ScalableFilterApi};
pub use outbound::{CasOutcome, FilterStore};
