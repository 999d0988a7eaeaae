//! In-memory filter store
//!
//! Process-local implementation of the full `FilterStore` contract. Every call
//! takes a single mutex for its duration, which makes each call atomic with
//! respect to all others, the same guarantee a networked store gives per command.
//!
//! Used by unit and integration tests, and by hosts that share a filter between
//! tasks of a single process. Supports fault and latency injection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bitvec::prelude::*;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::error::StoreError;
use crate::ports::{CasOutcome, FilterStore};

enum Value {
    Bytes(Vec<u8>),
    Bits(BitVec<u8, Msb0>),
}

struct Slot {
    value: Value,
    expires_at: Option<Instant>,
}

impl Slot {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |at| at <= now)
    }
}

/// In-memory store with fault injection
#[derive(Default)]
pub struct InMemoryFilterStore {
    data: Mutex<HashMap<String, Slot>>,
    /// When set, every call fails with `StoreError::Unavailable`
    unavailable: AtomicBool,
    /// Artificial delay applied before every call, in microseconds
    latency_us: AtomicU64,
    /// Calls served, successful or not
    operations: AtomicU64,
}

impl InMemoryFilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing (or regaining) connectivity to the store
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Delay every subsequent call by `latency`
    pub fn set_latency(&self, latency: Duration) {
        self.latency_us
            .store(latency.as_micros() as u64, Ordering::SeqCst);
    }

    /// Number of calls served so far
    pub fn operation_count(&self) -> u64 {
        self.operations.load(Ordering::Relaxed)
    }

    /// Number of live keys
    pub fn key_count(&self) -> usize {
        let now = Instant::now();
        self.data
            .lock()
            .values()
            .filter(|slot| !slot.is_expired(now))
            .count()
    }

    async fn enter(&self) -> Result<(), StoreError> {
        self.operations.fetch_add(1, Ordering::Relaxed);

        let latency = self.latency_us.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_micros(latency)).await;
        }

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

/// Look up a live slot, dropping it first if it has expired
fn live<'a>(data: &'a mut HashMap<String, Slot>, key: &str) -> Option<&'a mut Slot> {
    let now = Instant::now();
    if data.get(key).map_or(false, |slot| slot.is_expired(now)) {
        data.remove(key);
    }
    data.get_mut(key)
}

fn wrong_type(key: &str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
    }
}

fn parse_counter(key: &str, raw: &[u8]) -> Result<u64, StoreError> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| wrong_type(key))
}

#[async_trait]
impl FilterStore for InMemoryFilterStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.enter().await?;
        let mut data = self.data.lock();

        match live(&mut data, key) {
            None => Ok(None),
            Some(Slot {
                value: Value::Bytes(bytes),
                ..
            }) => Ok(Some(bytes.clone())),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn put_if_absent(&self, key: &str, value: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.enter().await?;
        let mut data = self.data.lock();

        match live(&mut data, key) {
            Some(Slot {
                value: Value::Bytes(existing),
                ..
            }) => Ok(Some(existing.clone())),
            Some(_) => Err(wrong_type(key)),
            None => {
                data.insert(key.to_string(), Slot::new(Value::Bytes(value.to_vec())));
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
        self.enter().await?;
        let mut data = self.data.lock();

        match live(&mut data, key) {
            None => Ok(CasOutcome::Mismatch(None)),
            Some(Slot {
                value: Value::Bytes(current),
                ..
            }) => {
                if current.as_slice() == expected {
                    *current = new.to_vec();
                    Ok(CasOutcome::Swapped)
                } else {
                    Ok(CasOutcome::Mismatch(Some(current.clone())))
                }
            }
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn increment(&self, key: &str, delta: u64) -> Result<u64, StoreError> {
        self.enter().await?;
        let mut data = self.data.lock();

        match live(&mut data, key) {
            None => {
                data.insert(
                    key.to_string(),
                    Slot::new(Value::Bytes(delta.to_string().into_bytes())),
                );
                Ok(delta)
            }
            Some(Slot {
                value: Value::Bytes(raw),
                ..
            }) => {
                let next = parse_counter(key, raw)?
                    .checked_add(delta)
                    .ok_or_else(|| StoreError::Backend(format!("counter {} overflow", key)))?;
                *raw = next.to_string().into_bytes();
                Ok(next)
            }
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn set_bits(&self, key: &str, offsets: &[u64]) -> Result<Vec<bool>, StoreError> {
        self.enter().await?;
        let mut data = self.data.lock();

        if live(&mut data, key).is_none() {
            data.insert(key.to_string(), Slot::new(Value::Bits(BitVec::new())));
        }
        let bits = match data.get_mut(key) {
            Some(Slot {
                value: Value::Bits(bits),
                ..
            }) => bits,
            _ => return Err(wrong_type(key)),
        };

        if let Some(&max) = offsets.iter().max() {
            let needed = max as usize + 1;
            if bits.len() < needed {
                bits.resize(needed, false);
            }
        }

        Ok(offsets
            .iter()
            .map(|&offset| bits.replace(offset as usize, true))
            .collect())
    }

    async fn get_bits(&self, key: &str, offsets: &[u64]) -> Result<Vec<bool>, StoreError> {
        self.enter().await?;
        let mut data = self.data.lock();

        match live(&mut data, key) {
            None => Ok(vec![false; offsets.len()]),
            Some(Slot {
                value: Value::Bits(bits),
                ..
            }) => Ok(offsets
                .iter()
                .map(|&offset| bits.get(offset as usize).map_or(false, |bit| *bit))
                .collect()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn count_bits(&self, key: &str) -> Result<u64, StoreError> {
        self.enter().await?;
        let mut data = self.data.lock();

        match live(&mut data, key) {
            None => Ok(0),
            Some(Slot {
                value: Value::Bits(bits),
                ..
            }) => Ok(bits.count_ones() as u64),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn delete(&self, keys: &[String]) -> Result<u64, StoreError> {
        self.enter().await?;
        let mut data = self.data.lock();

        let mut removed = 0;
        for key in keys {
            if live(&mut data, key).is_some() {
                data.remove(key);
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn expire(&self, keys: &[String], ttl: Duration) -> Result<(), StoreError> {
        self.enter().await?;
        let mut data = self.data.lock();

        let deadline = Instant::now() + ttl;
        for key in keys {
            if let Some(slot) = live(&mut data, key) {
                slot.expires_at = Some(deadline);
            }
        }
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        self.enter().await?;
        let mut data = self.data.lock();

        let now = Instant::now();
        Ok(live(&mut data, key)
            .and_then(|slot| slot.expires_at)
            .map(|at| at.saturating_duration_since(now)))
    }
}
