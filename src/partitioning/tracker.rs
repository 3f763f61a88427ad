//! Thread-safe ownership tracking.
//!
//! [`OwnershipTracker`] guards the ring and the assignment store with a single
//! reader/writer lock, so the two are always observed in a consistent state.
//! Membership changes take the lock exclusively for the mutation and the
//! rebalance that follows it.

use crate::config::{InsertLockMode, RingConfig};
use crate::error::{Error, Result};
use crate::metrics::RingMetrics;
use crate::partitioning::assignment::AssignmentStore;
use crate::partitioning::hashring::HashRing;
use crate::types::{Reassignment, RingStats};
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard, RwLockUpgradableReadGuard};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info};

/// Ring and assignments, locked as one unit.
#[derive(Debug)]
struct RingState {
    ring: HashRing,
    store: AssignmentStore,
}

/// Assigns items to owners on a consistent hash ring.
///
/// Owners are added and removed as a group changes membership; every change
/// recomputes the owner of each known item. Share it between threads with
/// `Arc`.
pub struct OwnershipTracker {
    state: RwLock<RingState>,
    config: RingConfig,
    metrics: RingMetrics,
}

impl OwnershipTracker {
    /// Create a tracker with the default configuration.
    pub fn new() -> Self {
        Self::build(RingConfig::default())
    }

    /// Create a tracker with a custom configuration.
    pub fn with_config(config: RingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: RingConfig) -> Self {
        Self {
            state: RwLock::new(RingState {
                ring: HashRing::from_config(&config),
                store: AssignmentStore::new(),
            }),
            config,
            metrics: RingMetrics::new(),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    /// Get the metrics.
    pub fn metrics(&self) -> &RingMetrics {
        &self.metrics
    }

    /// Get a read-locked view of the hash ring.
    pub fn ring(&self) -> MappedRwLockReadGuard<'_, HashRing> {
        RwLockReadGuard::map(self.state.read(), |state| &state.ring)
    }

    /// Register owners and rebalance existing items.
    ///
    /// Returns the items that changed owner.
    pub fn add_owners<I, S>(&self, owners: I) -> Vec<Reassignment>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.state.write();
        let added = state.ring.add_owners(owners);
        self.metrics.owner_adds.inc_by(added as u64);

        let moves = self.rebalance_locked(&mut state);
        self.update_gauges(&state);
        moves
    }

    /// Deregister an owner and rebalance existing items.
    ///
    /// Removing an unknown owner is a no-op. Returns the items that changed
    /// owner; if the last owner was removed they are reported as dropped.
    pub fn remove_owner(&self, owner: &str) -> Vec<Reassignment> {
        let mut state = self.state.write();
        if !state.ring.remove_owner(owner) {
            return Vec::new();
        }
        self.metrics.owner_removes.inc();

        let moves = self.rebalance_locked(&mut state);
        self.update_gauges(&state);
        moves
    }

    /// Assign items to their nearest owners.
    ///
    /// Items that are already assigned keep their owner. Fails with
    /// [`Error::EmptyRing`] if no owner is registered, in which case nothing
    /// is assigned. Returns how many items were newly assigned.
    pub fn insert_items<I, S>(&self, items: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let result = match self.config.insert_lock_mode {
            InsertLockMode::Exclusive => {
                let mut guard = self.state.write();
                let state = &mut *guard;
                let result = state.store.insert_items(&state.ring, items);
                self.update_gauges(state);
                result
            }
            InsertLockMode::SharedThenUpgrade => self.insert_upgradable(items),
        };

        match &result {
            Ok(inserted) => {
                self.metrics.items_inserted.inc_by(*inserted as u64);
                debug!(inserted, "inserted items");
            }
            Err(Error::EmptyRing) => self.metrics.insert_empty_ring_errors.inc(),
            Err(_) => {}
        }
        result
    }

    /// Filter under a shared lock, then upgrade to exclusive to assign.
    fn insert_upgradable<I, S>(&self, items: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let guard = self.state.upgradable_read();
        if guard.ring.is_empty() {
            return Err(Error::EmptyRing);
        }

        let pending = guard.store.unassigned(items);
        if pending.is_empty() {
            return Ok(0);
        }

        let mut guard = RwLockUpgradableReadGuard::upgrade(guard);
        let state = &mut *guard;
        let result = state.store.insert_items(&state.ring, &pending);
        self.update_gauges(state);
        result
    }

    /// Remove an item. Returns the owner it was assigned to.
    pub fn remove_item(&self, item: &str) -> Option<String> {
        let mut state = self.state.write();
        let owner = state.store.remove_item(item)?;
        self.metrics.items_removed.inc();
        self.update_gauges(&state);
        Some(owner)
    }

    /// Items assigned to an owner. Empty for unknown owners.
    pub fn owner_items(&self, owner: &str) -> Vec<String> {
        self.state.read().store.owner_items(owner).to_vec()
    }

    /// Owner an item is assigned to.
    pub fn owner_of(&self, item: &str) -> Option<String> {
        self.state.read().store.owner_of(item).map(str::to_string)
    }

    /// Owner an item would be assigned to, without assigning it.
    pub fn owner_for(&self, item: &str) -> Option<String> {
        self.state.read().ring.owner_for(item).map(str::to_string)
    }

    /// Registered owners in ascending name order.
    pub fn owners(&self) -> Vec<String> {
        self.state.read().ring.owners().map(str::to_string).collect()
    }

    /// Whether an owner is registered.
    pub fn contains_owner(&self, owner: &str) -> bool {
        self.state.read().ring.contains_owner(owner)
    }

    /// Number of registered owners.
    pub fn owner_count(&self) -> usize {
        self.state.read().ring.owner_count()
    }

    /// Number of assigned items.
    pub fn item_count(&self) -> usize {
        self.state.read().store.item_count()
    }

    /// Sorted owner → items view of all assignments.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<String>> {
        self.state.read().store.snapshot()
    }

    /// Summary of ring size and load spread.
    pub fn stats(&self) -> RingStats {
        let state = self.state.read();
        let loads: Vec<usize> = state
            .ring
            .owners()
            .map(|owner| state.store.owner_items(owner).len())
            .collect();

        RingStats {
            owner_count: state.ring.owner_count(),
            point_count: state.ring.point_count(),
            vnodes_per_owner: state.ring.vnodes_per_owner(),
            item_count: state.store.item_count(),
            min_items_per_owner: loads.iter().copied().min().unwrap_or(0),
            max_items_per_owner: loads.iter().copied().max().unwrap_or(0),
        }
    }

    /// Rebalance while holding the write lock. Skipped when nothing is
    /// assigned.
    fn rebalance_locked(&self, state: &mut RingState) -> Vec<Reassignment> {
        if state.store.is_empty() {
            return Vec::new();
        }

        let start = Instant::now();
        let strategy = self.config.rebalance_strategy;
        let moves = state.store.rebalance(&state.ring, strategy);
        let elapsed = start.elapsed();

        let dropped = moves.iter().filter(|m| m.is_dropped()).count();
        let moved = moves.len() - dropped;
        self.metrics
            .record_rebalance(elapsed, moved as u64, dropped as u64);
        info!(
            strategy = strategy.as_str(),
            owners = state.ring.owner_count(),
            items = state.store.item_count(),
            moved,
            dropped,
            elapsed_us = elapsed.as_micros() as u64,
            "rebalanced item assignments"
        );
        moves
    }

    fn update_gauges(&self, state: &RingState) {
        self.metrics.update_ring_stats(
            state.ring.owner_count(),
            state.ring.point_count(),
            state.store.item_count(),
        );
    }
}

impl Default for OwnershipTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OwnershipTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnershipTracker")
            .field("config", &self.config)
            .field("owner_count", &self.owner_count())
            .field("item_count", &self.item_count())
            .finish()
    }
}
