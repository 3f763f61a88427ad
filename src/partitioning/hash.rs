//! 32-bit hash functions for placing points and items on the ring.

use crate::types::HashPoint;
use serde::{Deserialize, Serialize};
use std::hash::Hasher;
use twox_hash::XxHash32;

const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;

/// Hash function used to place virtual points and items on the ring.
///
/// All variants are deterministic across processes and platforms, so two
/// trackers built from the same owners always agree on placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashFunction {
    /// 32-bit FNV-1 (multiply, then xor).
    ///
    /// The final byte of a key is never multiplied, so keys that differ only
    /// in their last character land close together on the ring.
    #[default]
    Fnv32,
    /// 32-bit FNV-1a (xor, then multiply).
    Fnv32a,
    /// 32-bit xxHash with seed 0.
    XxHash32,
}

impl HashFunction {
    /// Hash a byte string to a ring position.
    pub fn hash(&self, key: &[u8]) -> HashPoint {
        match self {
            HashFunction::Fnv32 => fnv32(key),
            HashFunction::Fnv32a => fnv32a(key),
            HashFunction::XxHash32 => xxhash32(key),
        }
    }

    /// Hash the `index`-th virtual point of `owner`.
    pub fn vnode_point(&self, owner: &str, index: usize) -> HashPoint {
        self.hash(vnode_key(owner, index).as_bytes())
    }
}

/// Key for a virtual point: the owner name, `#`, then the point index.
pub fn vnode_key(owner: &str, index: usize) -> String {
    format!("{}#{}", owner, index)
}

/// FNV-1 32-bit hash.
pub fn fnv32(data: &[u8]) -> u32 {
    let mut hash = FNV32_OFFSET_BASIS;
    for &byte in data {
        hash = hash.wrapping_mul(FNV32_PRIME);
        hash ^= byte as u32;
    }
    hash
}

/// FNV-1a 32-bit hash.
pub fn fnv32a(data: &[u8]) -> u32 {
    let mut hash = FNV32_OFFSET_BASIS;
    for &byte in data {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(FNV32_PRIME);
    }
    hash
}

fn xxhash32(data: &[u8]) -> u32 {
    let mut hasher = XxHash32::with_seed(0);
    hasher.write(data);
    // The 32-bit digest is widened into the u64 returned by `finish`.
    hasher.finish() as u32
}
