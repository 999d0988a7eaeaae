//! Persisted metadata records and their encodings
//!
//! Headers and level records are bincode-encoded so floating point parameters
//! round-trip bit-exactly; counters are ASCII decimal so the store's native
//! atomic increment can operate on them.

use serde::{Deserialize, Serialize};

use super::config::FilterConfig;
use super::parameters::LevelParams;
use crate::error::FilterError;

/// Version tag written into every header
pub const METADATA_VERSION: u16 = 1;

/// Header persisted once per filter name
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterHeader {
    pub version: u16,
    pub config: FilterConfig,
}

impl FilterHeader {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            version: METADATA_VERSION,
            config,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, FilterError> {
        bincode::serialize(self).map_err(|e| FilterError::CorruptMetadata(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FilterError> {
        let header: Self = bincode::deserialize(bytes)
            .map_err(|e| FilterError::CorruptMetadata(format!("filter header: {}", e)))?;
        if header.version != METADATA_VERSION {
            return Err(FilterError::CorruptMetadata(format!(
                "unsupported metadata version {}",
                header.version
            )));
        }
        Ok(header)
    }
}

/// Encode a level sizing record
pub fn encode_level(params: &LevelParams) -> Result<Vec<u8>, FilterError> {
    bincode::serialize(params).map_err(|e| FilterError::CorruptMetadata(e.to_string()))
}

/// Decode a level sizing record
pub fn decode_level(bytes: &[u8]) -> Result<LevelParams, FilterError> {
    bincode::deserialize(bytes)
        .map_err(|e| FilterError::CorruptMetadata(format!("level record: {}", e)))
}

/// Encode a counter value as the store keeps it
pub fn encode_count(value: u64) -> Vec<u8> {
    value.to_string().into_bytes()
}

/// Decode a counter value; a missing counter reads as zero
pub fn decode_count(bytes: Option<&[u8]>) -> Result<u64, FilterError> {
    match bytes {
        None => Ok(0),
        Some(raw) => std::str::from_utf8(raw)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .ok_or_else(|| {
                FilterError::CorruptMetadata(format!(
                    "counter is not a decimal integer: {:?}",
                    String::from_utf8_lossy(raw)
                ))
            }),
    }
}

/// Snapshot of everything the store records about one filter
#[derive(Clone, Debug, PartialEq)]
pub struct FilterRecord {
    pub name: String,
    pub config: FilterConfig,
    pub level_count: u32,
    /// Item count of each level, indexed by level
    pub level_counts: Vec<u64>,
}

impl FilterRecord {
    /// Total number of items recorded across all levels
    pub fn total_count(&self) -> u64 {
        self.level_counts.iter().sum()
    }
}
