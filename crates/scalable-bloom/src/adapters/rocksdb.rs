//! # RocksDB Filter Store
//!
//! Durable `FilterStore` on a local RocksDB database. Filters survive process
//! restarts; all tasks of the owning process share them. RocksDB holds an
//! exclusive lock on its directory, so sharing across processes requires a
//! networked store instead.
//!
//! ## Record Layout
//!
//! ```text
//! [kind: u8][expires_at_ms: u64 BE, 0 = never][payload]
//! ```
//!
//! - kind 0: byte value or decimal counter
//! - kind 1: bit region, MSB-first within each byte
//!
//! Read-modify-write calls (`put_if_absent`, `compare_and_swap`, `increment`,
//! `set_bits`, `expire`) are serialized by a writer mutex.

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bitvec::prelude::*;
use parking_lot::Mutex;
use rocksdb::{Options, WriteBatch, WriteOptions, DB};

use crate::error::StoreError;
use crate::ports::{CasOutcome, FilterStore};

const KIND_BYTES: u8 = 0;
const KIND_BITS: u8 = 1;
const HEADER_LEN: usize = 9;

/// RocksDB configuration
#[derive(Debug, Clone)]
pub struct RocksDbStoreConfig {
    /// Path to the database directory
    pub path: String,
    /// fsync after each write
    pub sync_writes: bool,
    /// Write buffer size in bytes
    pub write_buffer_size: usize,
}

impl Default for RocksDbStoreConfig {
    fn default() -> Self {
        Self {
            path: "./data/filters".to_string(),
            sync_writes: true,
            write_buffer_size: 64 * 1024 * 1024, // 64MB
        }
    }
}

impl RocksDbStoreConfig {
    /// Create config for testing (small buffers, no sync)
    pub fn for_testing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sync_writes: false,
            write_buffer_size: 4 * 1024 * 1024, // 4MB
        }
    }
}

struct Record {
    kind: u8,
    expires_at_ms: u64,
    payload: Vec<u8>,
}

impl Record {
    fn new(kind: u8, payload: Vec<u8>) -> Self {
        Self {
            kind,
            expires_at_ms: 0,
            payload,
        }
    }

    fn decode(key: &str, raw: &[u8]) -> Result<Self, StoreError> {
        if raw.len() < HEADER_LEN {
            return Err(StoreError::Backend(format!("truncated record at {}", key)));
        }
        let mut expires = [0u8; 8];
        expires.copy_from_slice(&raw[1..HEADER_LEN]);
        Ok(Self {
            kind: raw[0],
            expires_at_ms: u64::from_be_bytes(expires),
            payload: raw[HEADER_LEN..].to_vec(),
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(HEADER_LEN + self.payload.len());
        raw.push(self.kind);
        raw.extend_from_slice(&self.expires_at_ms.to_be_bytes());
        raw.extend_from_slice(&self.payload);
        raw
    }

    fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at_ms != 0 && self.expires_at_ms <= now_ms
    }

    fn expect_kind(self, key: &str, kind: u8) -> Result<Self, StoreError> {
        if self.kind == kind {
            Ok(self)
        } else {
            Err(StoreError::WrongType {
                key: key.to_string(),
            })
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn backend(e: rocksdb::Error) -> StoreError {
    StoreError::Backend(format!("RocksDB: {}", e))
}

/// RocksDB-backed filter store
pub struct RocksDbFilterStore {
    db: DB,
    config: RocksDbStoreConfig,
    writer: Mutex<()>,
}

impl RocksDbFilterStore {
    /// Open or create a database
    pub fn open(config: RocksDbStoreConfig) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let db = DB::open(&opts, &config.path).map_err(|e| {
            StoreError::Unavailable(format!("Failed to open RocksDB: {}", e))
        })?;

        Ok(Self {
            db,
            config,
            writer: Mutex::new(()),
        })
    }

    /// Open with default tuning at `path`
    pub fn open_default(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let config = RocksDbStoreConfig {
            path: path.as_ref().to_string_lossy().to_string(),
            ..Default::default()
        };
        Self::open(config)
    }

    fn write_opts(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.config.sync_writes);
        opts
    }

    /// Live record at `key`; expired records read as absent
    fn load(&self, key: &str) -> Result<Option<Record>, StoreError> {
        let raw = match self.db.get(key.as_bytes()).map_err(backend)? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        let record = Record::decode(key, &raw)?;
        if record.is_expired(now_ms()) {
            return Ok(None);
        }
        Ok(Some(record))
    }

    fn store(&self, key: &str, record: &Record) -> Result<(), StoreError> {
        self.db
            .put_opt(key.as_bytes(), record.encode(), &self.write_opts())
            .map_err(backend)
    }
}

#[async_trait]
impl FilterStore for RocksDbFilterStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match self.load(key)? {
            None => Ok(None),
            Some(record) => Ok(Some(record.expect_kind(key, KIND_BYTES)?.payload)),
        }
    }

    async fn put_if_absent(&self, key: &str, value: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let _guard = self.writer.lock();
        match self.load(key)? {
            Some(record) => Ok(Some(record.expect_kind(key, KIND_BYTES)?.payload)),
            None => {
                self.store(key, &Record::new(KIND_BYTES, value.to_vec()))?;
                Ok(None)
            }
        }
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &[u8],
        new: &[u8],
    ) -> Result<CasOutcome, StoreError> {
        let _guard = self.writer.lock();
        let mut record = match self.load(key)? {
            Some(record) => record.expect_kind(key, KIND_BYTES)?,
            None => return Ok(CasOutcome::Mismatch(None)),
        };
        if record.payload != expected {
            return Ok(CasOutcome::Mismatch(Some(record.payload)));
        }
        record.payload = new.to_vec();
        self.store(key, &record)?;
        Ok(CasOutcome::Swapped)
    }

    async fn increment(&self, key: &str, delta: u64) -> Result<u64, StoreError> {
        let _guard = self.writer.lock();
        let mut record = match self.load(key)? {
            Some(record) => record.expect_kind(key, KIND_BYTES)?,
            None => Record::new(KIND_BYTES, b"0".to_vec()),
        };
        let current = std::str::from_utf8(&record.payload)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| StoreError::WrongType {
                key: key.to_string(),
            })?;
        let next = current
            .checked_add(delta)
            .ok_or_else(|| StoreError::Backend(format!("counter {} overflow", key)))?;
        record.payload = next.to_string().into_bytes();
        self.store(key, &record)?;
        Ok(next)
    }

    async fn set_bits(&self, key: &str, offsets: &[u64]) -> Result<Vec<bool>, StoreError> {
        let _guard = self.writer.lock();
        let mut record = match self.load(key)? {
            Some(record) => record.expect_kind(key, KIND_BITS)?,
            None => Record::new(KIND_BITS, Vec::new()),
        };

        let mut bits = BitVec::<u8, Msb0>::from_vec(std::mem::take(&mut record.payload));
        if let Some(&max) = offsets.iter().max() {
            let needed = max as usize + 1;
            if bits.len() < needed {
                bits.resize(needed, false);
            }
        }
        let previous = offsets
            .iter()
            .map(|&offset| bits.replace(offset as usize, true))
            .collect();

        record.payload = bits.into_vec();
        self.store(key, &record)?;
        Ok(previous)
    }

    async fn get_bits(&self, key: &str, offsets: &[u64]) -> Result<Vec<bool>, StoreError> {
        let bits = match self.load(key)? {
            Some(record) => {
                BitVec::<u8, Msb0>::from_vec(record.expect_kind(key, KIND_BITS)?.payload)
            }
            None => return Ok(vec![false; offsets.len()]),
        };
        Ok(offsets
            .iter()
            .map(|&offset| bits.get(offset as usize).map_or(false, |bit| *bit))
            .collect())
    }

    async fn count_bits(&self, key: &str) -> Result<u64, StoreError> {
        match self.load(key)? {
            Some(record) => Ok(record
                .expect_kind(key, KIND_BITS)?
                .payload
                .iter()
                .map(|byte| byte.count_ones() as u64)
                .sum()),
            None => Ok(0),
        }
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, StoreError> {
        let _guard = self.writer.lock();
        let mut batch = WriteBatch::default();
        let mut removed = 0;
        for key in keys {
            if self.load(key)?.is_some() {
                removed += 1;
            }
            batch.delete(key.as_bytes());
        }
        self.db
            .write_opt(batch, &self.write_opts())
            .map_err(backend)?;
        Ok(removed)
    }

    async fn expire(&self, keys: &[String], ttl: Duration) -> Result<(), StoreError> {
        let _guard = self.writer.lock();
        let deadline = now_ms().saturating_add(ttl.as_millis() as u64).max(1);
        for key in keys {
            if let Some(mut record) = self.load(key)? {
                record.expires_at_ms = deadline;
                self.store(key, &record)?;
            }
        }
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        Ok(self.load(key)?.and_then(|record| match record.expires_at_ms {
            0 => None,
            at => Some(Duration::from_millis(at.saturating_sub(now_ms()))),
        }))
    }
}
