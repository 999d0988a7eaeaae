//! Hash indexing for filter levels
//!
//! Maps an arbitrary item to the `k` bit offsets it occupies in a level of `m` bits.
//!
//! Uses MurmurHash3 with two seeds and the Kirsch-Mitzenmacher construction:
//! `g_i(x) = h1(x) + i * h2(x) mod m`.

use std::io::Cursor;

/// Seed of the first base hash
const SEED_H1: u32 = 0;
/// Seed of the second base hash
const SEED_H2: u32 = 1;

/// Hash an element with MurmurHash3 (x64, 128-bit) and keep the lower 64 bits
pub fn murmur_hash(element: &[u8], seed: u32) -> u64 {
    let mut cursor = Cursor::new(element);

    // Reading from an in-memory cursor cannot fail
    let hash = murmur3::murmur3_x64_128(&mut cursor, seed).unwrap_or(0);
    hash as u64
}

/// Compute the `k` bit offsets of `element` in a level of `m` bits
///
/// The result is ordered by hash index and is identical for identical
/// `(element, m, k)` across calls and process restarts. `add` and `contains`
/// both rely on this to address the same bits.
pub fn compute_hash_positions(element: &[u8], m: u64, k: u32) -> Vec<u64> {
    if m == 0 {
        return Vec::new();
    }

    let h1 = murmur_hash(element, SEED_H1);
    let h2 = murmur_hash(element, SEED_H2);

    (0..k as u64)
        .map(|i| h1.wrapping_add(i.wrapping_mul(h2)) % m)
        .collect()
}
