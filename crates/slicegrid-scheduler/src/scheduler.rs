//! Scheduler orchestrator — the transactional submission loop.
//!
//! `Scheduler::submit` is the externally-visible entry point: it validates
//! a request, tries fast-path admission, falls back to preemption for
//! positive-priority requests, and otherwise records the deployment as
//! pending. A per-cluster async lock serializes the whole
//! evaluate→select→reserve→commit sequence, so two submissions against the
//! same cluster can never double-spend capacity; submissions against
//! different clusters proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use slicegrid_state::{
    Cluster, ClusterId, Deployment, DeploymentStatus, Resources, StateStore, epoch_secs,
};

use crate::error::{SchedulerError, SchedulerResult};
use crate::preemption::select_victims;
use crate::{admission, ledger};

/// The caller identity the scheduler trusts.
///
/// Authentication and session handling happen upstream; the scheduler only
/// uses the organization for the ownership check.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: String,
    pub organization_id: String,
}

/// A deployment submission.
///
/// Resource quantities and priority are signed at this boundary so that
/// negative inputs are representable — and rejected — before any state is
/// touched.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub cluster_id: ClusterId,
    pub name: String,
    pub image: String,
    pub cpu_required: i64,
    pub ram_required: i64,
    pub gpu_required: i64,
    pub priority: i64,
}

/// The admission-and-preemption scheduler.
///
/// Holds the state store and one lazily-created lock per cluster. Cheap to
/// clone via the shared lock map; typically wrapped in an `Arc` and shared
/// with the API layer.
pub struct Scheduler {
    state: StateStore,
    locks: Arc<RwLock<HashMap<ClusterId, Arc<Mutex<()>>>>>,
}

impl Scheduler {
    /// Create a new scheduler over the given store.
    pub fn new(state: StateStore) -> Self {
        Self {
            state,
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Submit a deployment for scheduling.
    ///
    /// Returns the persisted deployment in its decided state: `Running`
    /// (admitted directly or via preemption) or `Pending` (no admission
    /// path; eligible once capacity frees up). Validation and
    /// authorization failures mutate nothing.
    pub async fn submit(&self, caller: &Caller, req: SubmitRequest) -> SchedulerResult<Deployment> {
        let required = validate(&req)?;

        // One submission at a time per cluster, held through commit.
        let lock = self.cluster_lock(&req.cluster_id).await;
        let _guard = lock.lock().await;

        // Ownership check folded into not-found: a foreign cluster is
        // indistinguishable from a missing one.
        let mut cluster = self
            .state
            .get_cluster(&req.cluster_id)?
            .filter(|c| c.organization_id == caller.organization_id)
            .ok_or_else(|| SchedulerError::ClusterNotFound(req.cluster_id.clone()))?;

        let seq = self.state.next_seq()?;
        let mut deployment = Deployment {
            id: format!("dep-{seq:06}"),
            cluster_id: cluster.id.clone(),
            organization_id: cluster.organization_id.clone(),
            name: req.name,
            image: req.image,
            required,
            priority: req.priority,
            status: DeploymentStatus::Pending,
            created_seq: seq,
            created_at: epoch_secs(),
        };

        // Fast path: capacity is there, reserve and run.
        if admission::can_admit(&cluster, &required) {
            if ledger::reserve(&mut cluster, &required).is_err() {
                // can_admit and reserve share the same predicate.
                unreachable!("admitted request failed to reserve");
            }
            deployment.status = DeploymentStatus::Running;
            self.state
                .apply_submission(&cluster, std::slice::from_ref(&deployment))?;
            info!(
                deployment_id = %deployment.id,
                cluster_id = %cluster.id,
                priority = deployment.priority,
                "deployment admitted"
            );
            return Ok(deployment);
        }

        // Preemption path. Zero-priority requests never evict: they either
        // fit or wait.
        if deployment.priority > 0 {
            let running: Vec<Deployment> = self
                .state
                .list_deployments_for_cluster(&cluster.id)?
                .into_iter()
                .filter(|d| d.status == DeploymentStatus::Running)
                .collect();
            debug!(
                cluster_id = %cluster.id,
                running = running.len(),
                "insufficient capacity, evaluating preemption"
            );

            if let Some(victims) = select_victims(&cluster, &running, &required, deployment.priority)
            {
                let mut writes = Vec::with_capacity(victims.len() + 1);
                for mut victim in victims {
                    ledger::release(&mut cluster, &victim.required);
                    victim.status = DeploymentStatus::Failed;
                    warn!(
                        deployment_id = %victim.id,
                        priority = victim.priority,
                        evicted_for = %deployment.id,
                        "preempting running deployment"
                    );
                    writes.push(victim);
                }

                if ledger::reserve(&mut cluster, &required).is_ok() {
                    deployment.status = DeploymentStatus::Running;
                    writes.push(deployment.clone());
                    self.state.apply_submission(&cluster, &writes)?;
                    info!(
                        deployment_id = %deployment.id,
                        cluster_id = %cluster.id,
                        victims = writes.len() - 1,
                        "deployment admitted via preemption"
                    );
                    return Ok(deployment);
                }
                // The selector guarantees the freed prefix covers the
                // request; if not, discard the local mutations and fall
                // through to the pending fallback.
                debug_assert!(false, "victim set must free enough capacity");
            }
        }

        // Fallback: no admission path. Persist as pending with no ledger
        // change and no side effects on other deployments.
        self.state.put_deployment(&deployment)?;
        info!(
            deployment_id = %deployment.id,
            cluster_id = %deployment.cluster_id,
            "no admission path, deployment pending"
        );
        Ok(deployment)
    }

    /// Get (or create) the submission lock for a cluster.
    async fn cluster_lock(&self, cluster_id: &str) -> Arc<Mutex<()>> {
        {
            let locks = self.locks.read().await;
            if let Some(lock) = locks.get(cluster_id) {
                return lock.clone();
            }
        }
        let mut locks = self.locks.write().await;
        locks
            .entry(cluster_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Validate a submission before any state is touched.
fn validate(req: &SubmitRequest) -> SchedulerResult<Resources> {
    if req.name.trim().is_empty() {
        return Err(SchedulerError::InvalidRequest(
            "deployment name must not be empty".to_string(),
        ));
    }
    if req.cpu_required < 0 || req.ram_required < 0 || req.gpu_required < 0 {
        return Err(SchedulerError::InvalidRequest(
            "resource requirements cannot be negative".to_string(),
        ));
    }
    if req.priority < 0 {
        return Err(SchedulerError::InvalidRequest(
            "priority cannot be negative".to_string(),
        ));
    }
    Ok(Resources::new(
        req.cpu_required as u64,
        req.ram_required as u64,
        req.gpu_required as u64,
    ))
}
