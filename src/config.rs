//! Configuration types for the ownership ring.

use crate::error::{Error, Result};
use crate::partitioning::HashFunction;
use serde::{Deserialize, Serialize};

/// Default number of virtual points each owner places on the ring.
pub const DEFAULT_VNODES_PER_OWNER: usize = 1000;

/// Main configuration for an [`OwnershipTracker`](crate::OwnershipTracker).
///
/// Configuration is fixed once the tracker is built, so every owner on a ring
/// always carries the same number of virtual points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Number of virtual points per owner.
    pub vnodes_per_owner: usize,

    /// Hash function used for both virtual points and item names.
    pub hash_function: HashFunction,

    /// How item insertion acquires the ring lock.
    pub insert_lock_mode: InsertLockMode,

    /// How assignments are recomputed after a membership change.
    pub rebalance_strategy: RebalanceStrategy,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            vnodes_per_owner: DEFAULT_VNODES_PER_OWNER,
            hash_function: HashFunction::Fnv32,
            insert_lock_mode: InsertLockMode::Exclusive,
            rebalance_strategy: RebalanceStrategy::Full,
        }
    }
}

impl RingConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of virtual points per owner.
    pub fn with_vnodes_per_owner(mut self, vnodes: usize) -> Self {
        self.vnodes_per_owner = vnodes;
        self
    }

    /// Set the hash function.
    pub fn with_hash_function(mut self, hash_function: HashFunction) -> Self {
        self.hash_function = hash_function;
        self
    }

    /// Set the insertion lock mode.
    pub fn with_insert_lock_mode(mut self, mode: InsertLockMode) -> Self {
        self.insert_lock_mode = mode;
        self
    }

    /// Set the rebalance strategy.
    pub fn with_rebalance_strategy(mut self, strategy: RebalanceStrategy) -> Self {
        self.rebalance_strategy = strategy;
        self
    }

    /// Check that the configuration can build a usable ring.
    pub fn validate(&self) -> Result<()> {
        if self.vnodes_per_owner == 0 {
            return Err(Error::Config("vnodes_per_owner must be > 0".into()));
        }
        Ok(())
    }
}

/// Lock acquisition mode for item insertion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertLockMode {
    /// Hold the write lock for the whole insertion.
    #[default]
    Exclusive,

    /// Check and filter under an upgradable read lock, then upgrade to write
    /// before mutating.
    ///
    /// Plain readers keep running during the read phase. Mutation still
    /// happens under exclusive access, so concurrent insertions never race.
    SharedThenUpgrade,
}

/// Strategy for recomputing assignments after owners are added or removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceStrategy {
    /// Clear the owner index and re-insert every known item.
    #[default]
    Full,

    /// Recompute each item's owner and move only the items that changed.
    Incremental,
}

impl RebalanceStrategy {
    /// Name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            RebalanceStrategy::Full => "full",
            RebalanceStrategy::Incremental => "incremental",
        }
    }
}
