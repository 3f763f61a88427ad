//! Core types used throughout the ring.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position on the ring.
pub type HashPoint = u32;

/// An item whose owner changed during a rebalance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reassignment {
    /// The item that moved.
    pub item: String,
    /// The owner that held the item before the membership change.
    pub from: String,
    /// The owner that holds the item after the membership change.
    ///
    /// `None` when the ring became empty and the item was dropped.
    pub to: Option<String>,
}

impl Reassignment {
    /// Create a reassignment to a new owner.
    pub fn new(item: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            from: from.into(),
            to: Some(to.into()),
        }
    }

    /// Create a reassignment for an item that lost its owner.
    pub fn dropped(item: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            from: from.into(),
            to: None,
        }
    }

    /// Whether the item was dropped rather than moved.
    pub fn is_dropped(&self) -> bool {
        self.to.is_none()
    }
}

impl fmt::Display for Reassignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.to {
            Some(to) => write!(f, "{}: {} -> {}", self.item, self.from, to),
            None => write!(f, "{}: {} -> (none)", self.item, self.from),
        }
    }
}

/// Point-in-time view of the ring and its assignments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingStats {
    /// Number of registered owners.
    pub owner_count: usize,
    /// Number of virtual points on the ring.
    pub point_count: usize,
    /// Configured virtual points per owner.
    pub vnodes_per_owner: usize,
    /// Number of assigned items.
    pub item_count: usize,
    /// Smallest number of items held by a registered owner.
    pub min_items_per_owner: usize,
    /// Largest number of items held by a registered owner.
    pub max_items_per_owner: usize,
}

impl RingStats {
    /// Ratio of the busiest owner's load to the mean load.
    ///
    /// Returns 0.0 when there are no owners or no items.
    pub fn imbalance(&self) -> f64 {
        if self.owner_count == 0 || self.item_count == 0 {
            return 0.0;
        }
        let mean = self.item_count as f64 / self.owner_count as f64;
        self.max_items_per_owner as f64 / mean
    }
}
