//! Walk through owner churn on a shared ownership tracker.

use shard_ring::{HashFunction, OwnershipTracker, RebalanceStrategy, RingConfig};
use std::sync::Arc;
use std::thread;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter("shard_ring=debug,info")
        .init();

    let config = RingConfig::new()
        .with_hash_function(HashFunction::XxHash32)
        .with_rebalance_strategy(RebalanceStrategy::Incremental);
    let tracker = Arc::new(OwnershipTracker::with_config(config)?);

    println!("--- Empty ring ---");
    match tracker.insert_items(["pod-0"]) {
        Ok(_) => println!("unexpected success"),
        Err(e) => println!("insert rejected: {}", e),
    }

    println!("\n--- Three collectors ---");
    tracker.add_owners(["collector-1", "collector-2", "collector-3"]);

    // Producers insert items concurrently
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let tracker = Arc::clone(&tracker);
            thread::spawn(move || {
                let items: Vec<String> = (0..2500).map(|i| format!("pod-{}-{}", t, i)).collect();
                tracker.insert_items(&items)
            })
        })
        .collect();
    for handle in handles {
        handle.join().map_err(|_| "producer thread panicked")??;
    }
    print_load(&tracker);

    println!("\n--- Adding collector-4 ---");
    let moves = tracker.add_owners(["collector-4"]);
    println!(
        "{} of {} items moved ({:.1}%)",
        moves.len(),
        tracker.item_count(),
        100.0 * moves.len() as f64 / tracker.item_count() as f64
    );
    for m in moves.iter().take(3) {
        println!("  {}", m);
    }
    print_load(&tracker);

    println!("\n--- Removing collector-2 ---");
    let moves = tracker.remove_owner("collector-2");
    println!("{} items reassigned", moves.len());
    print_load(&tracker);

    println!("\n--- Metrics ---");
    print!("{}", tracker.metrics().to_prometheus());

    Ok(())
}

fn print_load(tracker: &OwnershipTracker) {
    for owner in tracker.owners() {
        println!("  {}: {} items", owner, tracker.owner_items(&owner).len());
    }
    let stats = tracker.stats();
    println!("  imbalance: {:.2}", stats.imbalance());
}
