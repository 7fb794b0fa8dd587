//! Preemption selector — greedy minimal-prefix victim selection.
//!
//! Given a request that does not fit, finds the shortest priority-ascending
//! prefix of lower-priority running deployments whose release would free
//! enough capacity. Greedy by priority with creation order as the stable
//! tie-break: least-important work is sacrificed first and repeated runs
//! over the same snapshot pick the same victims. This is O(n log n) and
//! deliberately not a knapsack optimum — no attempt is made to find a
//! smaller or cheaper victim set that would also suffice.

use slicegrid_state::{Cluster, Deployment, DeploymentStatus, Resources};

/// Select the deployments to evict so that `request` fits on `cluster`.
///
/// Candidates are the RUNNING deployments on the cluster with strictly
/// lower priority than the requester. Returns the victims in eviction
/// order, or `None` if even evicting all of them would not free enough
/// capacity (the requester must stay pending).
pub fn select_victims(
    cluster: &Cluster,
    running: &[Deployment],
    request: &Resources,
    requester_priority: i64,
) -> Option<Vec<Deployment>> {
    if cluster.available.covers(request) {
        // Already admittable; nothing to evict.
        return Some(Vec::new());
    }

    let mut candidates: Vec<&Deployment> = running
        .iter()
        .filter(|d| {
            d.status == DeploymentStatus::Running
                && d.cluster_id == cluster.id
                && d.priority < requester_priority
        })
        .collect();
    candidates.sort_by_key(|d| (d.priority, d.created_seq));

    let mut freed = cluster.available;
    let mut victims = Vec::new();
    for candidate in candidates {
        freed = freed.plus(&candidate.required);
        victims.push(candidate.clone());
        if freed.covers(request) {
            return Some(victims);
        }
    }

    None
}
