//! Metrics for monitoring ring membership and assignment churn.
//!
//! Counters and gauges are plain atomics, so recording never takes the ring
//! lock. [`RingMetrics::to_prometheus`] renders them in the Prometheus text
//! exposition format.
//!
//! # Example
//!
//! ```rust,ignore
//! use shard_ring::OwnershipTracker;
//!
//! let tracker = OwnershipTracker::new();
//! tracker.add_owners(["collector-1", "collector-2"]);
//! tracker.insert_items(["pod-a", "pod-b"])?;
//!
//! let snapshot = tracker.metrics().snapshot();
//! println!("moved {} items over {} rebalances", snapshot.items_moved, snapshot.rebalances);
//! ```

mod counters;
mod gauges;

pub use counters::Counter;
pub use gauges::Gauge;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Metrics for an [`OwnershipTracker`](crate::OwnershipTracker).
#[derive(Debug)]
pub struct RingMetrics {
    // Membership counters
    /// Owners registered.
    pub owner_adds: Counter,
    /// Owners removed.
    pub owner_removes: Counter,

    // Item counters
    /// Items newly assigned by insertion.
    pub items_inserted: Counter,
    /// Items removed.
    pub items_removed: Counter,
    /// Insertions rejected because the ring was empty.
    pub insert_empty_ring_errors: Counter,

    // Rebalancing
    /// Rebalances run.
    pub rebalances: Counter,
    /// Items whose owner changed during a rebalance.
    pub items_moved: Counter,
    /// Items dropped because the last owner left.
    pub items_dropped: Counter,
    /// Total time spent rebalancing, in microseconds.
    pub rebalance_micros: Counter,

    // State gauges
    /// Registered owners.
    pub owners: Gauge,
    /// Points on the ring.
    pub ring_points: Gauge,
    /// Assigned items.
    pub items: Gauge,
}

impl RingMetrics {
    /// Create a new metrics instance.
    pub fn new() -> Self {
        Self {
            owner_adds: Counter::new("ring_owner_adds_total", "Owners registered"),
            owner_removes: Counter::new("ring_owner_removes_total", "Owners removed"),
            items_inserted: Counter::new("ring_items_inserted_total", "Items newly assigned"),
            items_removed: Counter::new("ring_items_removed_total", "Items removed"),
            insert_empty_ring_errors: Counter::new(
                "ring_insert_empty_ring_errors_total",
                "Insertions rejected on an empty ring",
            ),
            rebalances: Counter::new("ring_rebalances_total", "Rebalances run"),
            items_moved: Counter::new("ring_items_moved_total", "Items moved by rebalancing"),
            items_dropped: Counter::new(
                "ring_items_dropped_total",
                "Items dropped because no owner remained",
            ),
            rebalance_micros: Counter::new(
                "ring_rebalance_micros_total",
                "Time spent rebalancing in microseconds",
            ),
            owners: Gauge::new("ring_owners", "Registered owners"),
            ring_points: Gauge::new("ring_points", "Virtual points on the ring"),
            items: Gauge::new("ring_items", "Assigned items"),
        }
    }

    /// Record a completed rebalance.
    pub fn record_rebalance(&self, duration: Duration, moved: u64, dropped: u64) {
        self.rebalances.inc();
        self.items_moved.inc_by(moved);
        self.items_dropped.inc_by(dropped);
        self.rebalance_micros
            .inc_by(u64::try_from(duration.as_micros()).unwrap_or(u64::MAX));
    }

    /// Update state gauges.
    pub fn update_ring_stats(&self, owners: usize, points: usize, items: usize) {
        self.owners.set_count(owners);
        self.ring_points.set_count(points);
        self.items.set_count(items);
    }

    /// Get a snapshot of current metrics.
    pub fn snapshot(&self) -> RingMetricsSnapshot {
        RingMetricsSnapshot {
            owner_adds: self.owner_adds.get(),
            owner_removes: self.owner_removes.get(),
            items_inserted: self.items_inserted.get(),
            items_removed: self.items_removed.get(),
            insert_empty_ring_errors: self.insert_empty_ring_errors.get(),
            rebalances: self.rebalances.get(),
            items_moved: self.items_moved.get(),
            items_dropped: self.items_dropped.get(),
            rebalance_micros: self.rebalance_micros.get(),
            owners: self.owners.get(),
            ring_points: self.ring_points.get(),
            items: self.items.get(),
        }
    }

    /// Format metrics in Prometheus exposition format.
    pub fn to_prometheus(&self) -> String {
        let mut output = String::new();

        macro_rules! add_metric {
            ($kind:literal, $metric:expr) => {
                output.push_str(&format!(
                    "# HELP {} {}\n# TYPE {} {}\n{} {}\n",
                    $metric.name(),
                    $metric.help(),
                    $metric.name(),
                    $kind,
                    $metric.name(),
                    $metric.get()
                ));
            };
        }

        // Counters
        add_metric!("counter", self.owner_adds);
        add_metric!("counter", self.owner_removes);
        add_metric!("counter", self.items_inserted);
        add_metric!("counter", self.items_removed);
        add_metric!("counter", self.insert_empty_ring_errors);
        add_metric!("counter", self.rebalances);
        add_metric!("counter", self.items_moved);
        add_metric!("counter", self.items_dropped);
        add_metric!("counter", self.rebalance_micros);

        // Gauges
        add_metric!("gauge", self.owners);
        add_metric!("gauge", self.ring_points);
        add_metric!("gauge", self.items);

        output
    }
}

impl Default for RingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of ring metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingMetricsSnapshot {
    pub owner_adds: u64,
    pub owner_removes: u64,
    pub items_inserted: u64,
    pub items_removed: u64,
    pub insert_empty_ring_errors: u64,
    pub rebalances: u64,
    pub items_moved: u64,
    pub items_dropped: u64,
    pub rebalance_micros: u64,
    pub owners: i64,
    pub ring_points: i64,
    pub items: i64,
}

impl RingMetricsSnapshot {
    /// Average number of items moved per rebalance.
    pub fn avg_items_moved(&self) -> f64 {
        if self.rebalances == 0 {
            0.0
        } else {
            self.items_moved as f64 / self.rebalances as f64
        }
    }
}
