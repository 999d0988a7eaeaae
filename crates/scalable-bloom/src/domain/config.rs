//! Scalable filter configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use scalable_bloom::domain::FilterConfigBuilder;
//!
//! let config = FilterConfigBuilder::new()
//!     .base_capacity(10_000)
//!     .base_error_rate(0.001)
//!     .growth_ratio(0.9)
//!     .build()
//!     .expect("Valid config");
//! ```

use std::env;

use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// Capacity multiplier suited to sets expected to stay small
pub const SMALL_SET_GROWTH: u64 = 2;

/// Capacity multiplier suited to sets expected to grow by orders of magnitude
pub const LARGE_SET_GROWTH: u64 = 4;

/// Sizing parameters of a scalable filter
///
/// These four values fully determine every level's `(capacity, error_rate, m, k)`.
/// They are persisted when a filter is first created and are immutable afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Per-level tightening factor of the false positive rate (0 < r < 1)
    pub growth_ratio: f64,
    /// Target false positive rate of level 0 (0 < p0 < 1)
    pub base_error_rate: f64,
    /// Target item count of level 0
    pub base_capacity: u64,
    /// Per-level capacity multiplier (s >= 2)
    pub scale: u64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            growth_ratio: 0.9,
            base_error_rate: 0.001,
            base_capacity: 1000,
            scale: SMALL_SET_GROWTH,
        }
    }
}

impl FilterConfig {
    /// Create a new configuration with validation
    pub fn new(
        growth_ratio: f64,
        base_error_rate: f64,
        base_capacity: u64,
        scale: u64,
    ) -> Result<Self, FilterError> {
        let config = Self {
            growth_ratio,
            base_error_rate,
            base_capacity,
            scale,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SBF_GROWTH_RATIO`: Error-rate tightening ratio (default: 0.9)
    /// - `SBF_ERROR_RATE`: Level 0 false positive rate (default: 0.001)
    /// - `SBF_INITIAL_CAPACITY`: Level 0 capacity (default: 1000)
    /// - `SBF_SCALE`: Capacity multiplier per level (default: 2)
    ///
    /// Unparseable values fall back to the default; the result is validated.
    pub fn from_env() -> Result<Self, FilterError> {
        let defaults = Self::default();

        let config = Self {
            growth_ratio: env::var("SBF_GROWTH_RATIO")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.growth_ratio),

            base_error_rate: env::var("SBF_ERROR_RATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.base_error_rate),

            base_capacity: env::var("SBF_INITIAL_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.base_capacity),

            scale: env::var("SBF_SCALE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.scale),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate sizing parameters
    ///
    /// `0 < r < 1` strictly is required for the compound error bound `p0 / (1 - r)`
    /// to exist.
    pub fn validate(&self) -> Result<(), FilterError> {
        if !(self.growth_ratio > 0.0 && self.growth_ratio < 1.0) {
            return Err(FilterError::InvalidParameters(format!(
                "growth_ratio must be in (0, 1), got {}",
                self.growth_ratio
            )));
        }

        if !(self.base_error_rate > 0.0 && self.base_error_rate < 1.0) {
            return Err(FilterError::InvalidParameters(format!(
                "base_error_rate must be in (0, 1), got {}",
                self.base_error_rate
            )));
        }

        if self.base_capacity == 0 {
            return Err(FilterError::InvalidParameters(
                "base_capacity must be greater than 0".to_string(),
            ));
        }

        if self.scale < 2 {
            return Err(FilterError::InvalidParameters(format!(
                "scale must be at least 2, got {}",
                self.scale
            )));
        }

        Ok(())
    }

    /// Upper bound of the false positive rate over all levels as the item count grows
    pub fn compound_error_bound(&self) -> f64 {
        self.base_error_rate / (1.0 - self.growth_ratio)
    }

    /// Builder-style method to set the growth ratio
    pub fn with_growth_ratio(mut self, ratio: f64) -> Self {
        self.growth_ratio = ratio;
        self
    }

    /// Builder-style method to set the base error rate
    pub fn with_base_error_rate(mut self, rate: f64) -> Self {
        self.base_error_rate = rate;
        self
    }

    /// Builder-style method to set the base capacity
    pub fn with_base_capacity(mut self, capacity: u64) -> Self {
        self.base_capacity = capacity;
        self
    }

    /// Builder-style method to set the growth scale
    pub fn with_scale(mut self, scale: u64) -> Self {
        self.scale = scale;
        self
    }

    /// Name of the first parameter that differs from `other`, with both values
    pub(crate) fn first_difference(&self, other: &FilterConfig) -> Option<(&'static str, String, String)> {
        if self.growth_ratio.to_bits() != other.growth_ratio.to_bits() {
            return Some((
                "growth_ratio",
                self.growth_ratio.to_string(),
                other.growth_ratio.to_string(),
            ));
        }
        if self.base_error_rate.to_bits() != other.base_error_rate.to_bits() {
            return Some((
                "base_error_rate",
                self.base_error_rate.to_string(),
                other.base_error_rate.to_string(),
            ));
        }
        if self.base_capacity != other.base_capacity {
            return Some((
                "base_capacity",
                self.base_capacity.to_string(),
                other.base_capacity.to_string(),
            ));
        }
        if self.scale != other.scale {
            return Some(("scale", self.scale.to_string(), other.scale.to_string()));
        }
        None
    }
}

/// Builder for FilterConfig with validation
#[derive(Default)]
pub struct FilterConfigBuilder {
    growth_ratio: Option<f64>,
    base_error_rate: Option<f64>,
    base_capacity: Option<u64>,
    scale: Option<u64>,
}

impl FilterConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the error-rate tightening ratio (0 < r < 1)
    pub fn growth_ratio(mut self, ratio: f64) -> Self {
        self.growth_ratio = Some(ratio);
        self
    }

    /// Set the level 0 false positive rate (0 < p0 < 1)
    pub fn base_error_rate(mut self, rate: f64) -> Self {
        self.base_error_rate = Some(rate);
        self
    }

    /// Set the level 0 capacity
    pub fn base_capacity(mut self, capacity: u64) -> Self {
        self.base_capacity = Some(capacity);
        self
    }

    /// Set the per-level capacity multiplier
    pub fn scale(mut self, scale: u64) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Build the FilterConfig, validating all parameters
    pub fn build(self) -> Result<FilterConfig, FilterError> {
        let defaults = FilterConfig::default();

        let config = FilterConfig {
            growth_ratio: self.growth_ratio.unwrap_or(defaults.growth_ratio),
            base_error_rate: self.base_error_rate.unwrap_or(defaults.base_error_rate),
            base_capacity: self.base_capacity.unwrap_or(defaults.base_capacity),
            scale: self.scale.unwrap_or(defaults.scale),
        };

        config.validate()?;
        Ok(config)
    }
}
