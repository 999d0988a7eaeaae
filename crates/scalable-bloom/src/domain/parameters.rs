//! Per-level sizing
//!
//! Formulas:
//! - capacity_i   = n0 * s^i
//! - error_rate_i = p0 * r^i
//! - m = ceil(-n * ln(p) / ln(2)^2)   -- optimal bits
//! - k = round((m / n) * ln(2))       -- optimal hash functions, at least 1

use std::f64::consts::LN_2;

use serde::{Deserialize, Serialize};

use super::config::FilterConfig;
use crate::error::FilterError;

/// Largest bit region a single level may address (512 MiB of bits)
pub const MAX_LEVEL_BITS: u64 = 1 << 32;

/// Upper bound on the number of levels a filter may hold
///
/// With a capacity of at least 1 and a scale of at least 2, level 64 would
/// need more than `u64::MAX` items.
pub const MAX_LEVELS: u32 = 64;

/// Sizing of one level, fixed for the lifetime of the level
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelParams {
    /// Position of the level in the filter
    pub index: u32,
    /// Target item count
    pub capacity: u64,
    /// Target false positive rate
    pub error_rate: f64,
    /// Size in bits (m)
    pub size_bits: u64,
    /// Number of hash functions (k)
    pub hash_count: u32,
}

impl LevelParams {
    /// Derive the sizing of level `index` from the filter configuration
    ///
    /// Fails with `LevelTooLarge` when `index` is at or past [`MAX_LEVELS`],
    /// the capacity overflows, or the bit region would exceed [`MAX_LEVEL_BITS`].
    pub fn for_level(config: &FilterConfig, index: u32) -> Result<Self, FilterError> {
        if index >= MAX_LEVELS {
            return Err(FilterError::LevelTooLarge { index });
        }

        let capacity = config
            .scale
            .checked_pow(index)
            .and_then(|factor| config.base_capacity.checked_mul(factor))
            .ok_or(FilterError::LevelTooLarge { index })?;

        let error_rate = config.base_error_rate * config.growth_ratio.powi(index as i32);
        if error_rate <= 0.0 {
            return Err(FilterError::LevelTooLarge { index });
        }

        let size_bits = optimal_bits(capacity, error_rate);
        if !size_bits.is_finite() || size_bits > MAX_LEVEL_BITS as f64 {
            return Err(FilterError::LevelTooLarge { index });
        }
        let size_bits = size_bits as u64;

        Ok(Self {
            index,
            capacity,
            error_rate,
            size_bits,
            hash_count: optimal_k(size_bits, capacity),
        })
    }

    /// Expected false positive rate once `n` items have been added
    pub fn expected_fpr(&self, n: u64) -> f64 {
        calculate_fpr(self.size_bits, n, self.hash_count)
    }
}

/// m = ceil(-n * ln(p) / ln(2)^2), kept as f64 so callers can range-check it
fn optimal_bits(n: u64, target_fpr: f64) -> f64 {
    (-(n as f64) * target_fpr.ln() / (LN_2 * LN_2)).ceil()
}

/// Calculate optimal k for given m and n, clamped to at least 1
pub fn optimal_k(m: u64, n: u64) -> u32 {
    if n == 0 {
        return 1;
    }
    let k = ((m as f64 / n as f64) * LN_2).round();
    (k as u32).max(1)
}

/// Calculate the false positive rate for given parameters
///
/// Formula: FPR = (1 - e^(-kn/m))^k
pub fn calculate_fpr(m: u64, n: u64, k: u32) -> f64 {
    if m == 0 {
        return 1.0;
    }
    let exponent = -(k as f64) * (n as f64) / (m as f64);
    (1.0 - exponent.exp()).powi(k as i32)
}
