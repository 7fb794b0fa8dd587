//! Resource ledger — reserve and release against a cluster's counters.
//!
//! Both operations mutate an in-memory `Cluster` record; durability is the
//! orchestrator's job (it commits the record through the state store while
//! holding the cluster's lock). A reservation is all-or-nothing across the
//! three dimensions: if any dimension lacks headroom, nothing changes.

use slicegrid_state::{Cluster, Resources};

/// A reservation did not fit.
///
/// Not a caller-visible failure: the orchestrator treats it as the trigger
/// for the preemption path or the pending fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsufficientCapacity;

/// Decrement `available` by `amounts` in every dimension, or mutate nothing.
pub fn reserve(cluster: &mut Cluster, amounts: &Resources) -> Result<(), InsufficientCapacity> {
    match cluster.available.minus(amounts) {
        Some(remaining) => {
            cluster.available = remaining;
            Ok(())
        }
        None => Err(InsufficientCapacity),
    }
}

/// Increment `available` by `amounts` in every dimension.
///
/// Released amounts must have been previously reserved; the result is
/// clamped to `limits` so the `available <= limits` invariant holds even
/// if a caller breaks that contract.
pub fn release(cluster: &mut Cluster, amounts: &Resources) {
    let restored = cluster.available.plus(amounts);
    debug_assert!(
        cluster.limits.covers(&restored),
        "release of unreserved capacity on cluster {}",
        cluster.id
    );
    cluster.available = Resources {
        cpu: restored.cpu.min(cluster.limits.cpu),
        ram_gb: restored.ram_gb.min(cluster.limits.ram_gb),
        gpu: restored.gpu.min(cluster.limits.gpu),
    };
}
