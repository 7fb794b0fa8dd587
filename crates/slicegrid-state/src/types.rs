//! Domain types for the SliceGrid state store.
//!
//! These types represent the persisted state of organizations, clusters,
//! and deployments. All types are serializable to/from JSON for storage
//! in redb tables.

use serde::{Deserialize, Serialize};

/// Unique identifier for an organization.
pub type OrgId = String;

/// Unique identifier for a cluster.
pub type ClusterId = String;

/// Unique identifier for a deployment.
pub type DeploymentId = String;

// ── Resources ─────────────────────────────────────────────────────

/// A quantity in each of the three resource dimensions.
///
/// Used both for cluster capacity (limits / available) and for deployment
/// requirements. Quantities are abstract whole units (cores, GB, GPU
/// units) with no topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub cpu: u64,
    pub ram_gb: u64,
    pub gpu: u64,
}

impl Resources {
    /// The zero quantity in every dimension.
    pub const ZERO: Resources = Resources {
        cpu: 0,
        ram_gb: 0,
        gpu: 0,
    };

    pub fn new(cpu: u64, ram_gb: u64, gpu: u64) -> Self {
        Self { cpu, ram_gb, gpu }
    }

    /// True if `self` is at least `other` in every dimension.
    pub fn covers(&self, other: &Resources) -> bool {
        self.cpu >= other.cpu && self.ram_gb >= other.ram_gb && self.gpu >= other.gpu
    }

    /// Component-wise sum, saturating per dimension.
    pub fn plus(&self, other: &Resources) -> Resources {
        Resources {
            cpu: self.cpu.saturating_add(other.cpu),
            ram_gb: self.ram_gb.saturating_add(other.ram_gb),
            gpu: self.gpu.saturating_add(other.gpu),
        }
    }

    /// Component-wise difference; `None` if any dimension would underflow.
    pub fn minus(&self, other: &Resources) -> Option<Resources> {
        Some(Resources {
            cpu: self.cpu.checked_sub(other.cpu)?,
            ram_gb: self.ram_gb.checked_sub(other.ram_gb)?,
            gpu: self.gpu.checked_sub(other.gpu)?,
        })
    }
}

// ── Organization ──────────────────────────────────────────────────

/// A tenant: groups clusters and the callers allowed to use them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Organization {
    pub id: OrgId,
    pub name: String,
    /// Unix timestamp (seconds) when this organization was created.
    pub created_at: u64,
}

// ── Cluster ───────────────────────────────────────────────────────

/// A pool of schedulable capacity owned by exactly one organization.
///
/// `limits` is the immutable ceiling set at creation; `available` is the
/// remaining capacity, mutated only by the scheduler's ledger. The store
/// invariant is `0 <= available <= limits` in every dimension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cluster {
    pub id: ClusterId,
    pub organization_id: OrgId,
    pub name: String,
    pub limits: Resources,
    pub available: Resources,
    /// Unix timestamp (seconds) when this cluster was created.
    pub created_at: u64,
}

impl Cluster {
    /// Create a cluster with all capacity available.
    pub fn new(id: ClusterId, organization_id: OrgId, name: String, limits: Resources, created_at: u64) -> Self {
        Self {
            id,
            organization_id,
            name,
            limits,
            available: limits,
            created_at,
        }
    }
}

// ── Deployment ────────────────────────────────────────────────────

/// A workload submitted against a cluster.
///
/// `organization_id` is denormalized from the owning cluster so org-scoped
/// listings don't need a join. `created_seq` is the store-assigned creation
/// order, used as the deterministic tie-break when two running deployments
/// share a priority during victim selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deployment {
    pub id: DeploymentId,
    pub cluster_id: ClusterId,
    pub organization_id: OrgId,
    pub name: String,
    /// Container image reference (opaque to the scheduler).
    pub image: String,
    pub required: Resources,
    /// Higher = more important. Zero never preempts.
    pub priority: i64,
    pub status: DeploymentStatus,
    pub created_seq: u64,
    /// Unix timestamp (seconds) when this deployment was submitted.
    pub created_at: u64,
}

/// Lifecycle status of a deployment.
///
/// `Running` deployments have their `required` resources reserved against
/// their cluster. `Completed` is terminal and set outside the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Pending,
    Running,
    Failed,
    Completed,
}

/// Current Unix epoch in seconds.
pub fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
