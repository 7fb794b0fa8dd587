//! Admission evaluator — the fast-path capacity check.

use slicegrid_state::{Cluster, Resources};

/// True iff the cluster can admit the request without preemption.
///
/// Pure and read-only: `available[d] >= request[d]` for every dimension.
/// Also serves as the termination test of the preemption search (the
/// selector stops as soon as freed capacity would make this true).
pub fn can_admit(cluster: &Cluster, request: &Resources) -> bool {
    cluster.available.covers(request)
}
