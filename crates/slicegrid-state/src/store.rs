//! StateStore — redb-backed state persistence for SliceGrid.
//!
//! Provides typed CRUD operations over organizations, clusters, and
//! deployments. All values are JSON-serialized into redb's `&[u8]` value
//! columns. The store supports both on-disk and in-memory backends (the
//! latter for testing).
//!
//! `apply_submission` is the scheduler's commit point: it writes the
//! updated cluster counters and every deployment touched by a submission
//! in a single write transaction.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Key under which the id sequence counter lives in the `meta` table.
const SEQ_KEY: &str = "seq";

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(ORGANIZATIONS).map_err(map_err!(Table))?;
        txn.open_table(CLUSTERS).map_err(map_err!(Table))?;
        txn.open_table(DEPLOYMENTS).map_err(map_err!(Table))?;
        txn.open_table(META).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Allocate the next value of the store-wide id sequence.
    ///
    /// The sequence starts at 1 and survives restarts; it doubles as the
    /// creation-order number stamped onto deployments.
    pub fn next_seq(&self) -> StateResult<u64> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let next;
        {
            let mut table = txn.open_table(META).map_err(map_err!(Table))?;
            let current = table
                .get(SEQ_KEY)
                .map_err(map_err!(Read))?
                .map(|g| g.value())
                .unwrap_or(0);
            next = current + 1;
            table.insert(SEQ_KEY, next).map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(next)
    }

    // ── Organizations ──────────────────────────────────────────────

    /// Insert or update an organization.
    pub fn put_organization(&self, org: &Organization) -> StateResult<()> {
        let value = serde_json::to_vec(org).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(ORGANIZATIONS).map_err(map_err!(Table))?;
            table
                .insert(org.id.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(org_id = %org.id, "organization stored");
        Ok(())
    }

    /// Get an organization by id.
    pub fn get_organization(&self, org_id: &str) -> StateResult<Option<Organization>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(ORGANIZATIONS).map_err(map_err!(Table))?;
        match table.get(org_id).map_err(map_err!(Read))? {
            Some(guard) => {
                let org: Organization =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(org))
            }
            None => Ok(None),
        }
    }

    // ── Clusters ───────────────────────────────────────────────────

    /// Insert or update a cluster.
    pub fn put_cluster(&self, cluster: &Cluster) -> StateResult<()> {
        let value = serde_json::to_vec(cluster).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(CLUSTERS).map_err(map_err!(Table))?;
            table
                .insert(cluster.id.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(cluster_id = %cluster.id, "cluster stored");
        Ok(())
    }

    /// Get a cluster by id.
    pub fn get_cluster(&self, cluster_id: &str) -> StateResult<Option<Cluster>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(CLUSTERS).map_err(map_err!(Table))?;
        match table.get(cluster_id).map_err(map_err!(Read))? {
            Some(guard) => {
                let cluster: Cluster =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(cluster))
            }
            None => Ok(None),
        }
    }

    /// List all clusters owned by an organization.
    pub fn list_clusters_for_org(&self, org_id: &str) -> StateResult<Vec<Cluster>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(CLUSTERS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let cluster: Cluster =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            if cluster.organization_id == org_id {
                results.push(cluster);
            }
        }
        Ok(results)
    }

    // ── Deployments ────────────────────────────────────────────────

    /// Insert or update a deployment.
    pub fn put_deployment(&self, deployment: &Deployment) -> StateResult<()> {
        let value = serde_json::to_vec(deployment).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(DEPLOYMENTS).map_err(map_err!(Table))?;
            table
                .insert(deployment.id.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(deployment_id = %deployment.id, status = ?deployment.status, "deployment stored");
        Ok(())
    }

    /// Get a deployment by id.
    pub fn get_deployment(&self, deployment_id: &str) -> StateResult<Option<Deployment>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(DEPLOYMENTS).map_err(map_err!(Table))?;
        match table.get(deployment_id).map_err(map_err!(Read))? {
            Some(guard) => {
                let deployment: Deployment =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(deployment))
            }
            None => Ok(None),
        }
    }

    /// List all deployments on a cluster.
    pub fn list_deployments_for_cluster(&self, cluster_id: &str) -> StateResult<Vec<Deployment>> {
        self.filter_deployments(|d| d.cluster_id == cluster_id)
    }

    /// List all deployments across an organization's clusters.
    pub fn list_deployments_for_org(&self, org_id: &str) -> StateResult<Vec<Deployment>> {
        self.filter_deployments(|d| d.organization_id == org_id)
    }

    fn filter_deployments(
        &self,
        keep: impl Fn(&Deployment) -> bool,
    ) -> StateResult<Vec<Deployment>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(DEPLOYMENTS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let deployment: Deployment =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            if keep(&deployment) {
                results.push(deployment);
            }
        }
        Ok(results)
    }

    // ── Submission commit ──────────────────────────────────────────

    /// Atomically persist the outcome of a scheduling decision.
    ///
    /// Writes the cluster's updated counters and every deployment whose
    /// status changed (the admitted deployment plus any preemption victims)
    /// in one write transaction. Either everything commits or nothing does.
    pub fn apply_submission(
        &self,
        cluster: &Cluster,
        deployments: &[Deployment],
    ) -> StateResult<()> {
        let cluster_value = serde_json::to_vec(cluster).map_err(map_err!(Serialize))?;
        let mut deployment_values = Vec::with_capacity(deployments.len());
        for d in deployments {
            deployment_values.push((d.id.as_str(), serde_json::to_vec(d).map_err(map_err!(Serialize))?));
        }

        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut clusters = txn.open_table(CLUSTERS).map_err(map_err!(Table))?;
            clusters
                .insert(cluster.id.as_str(), cluster_value.as_slice())
                .map_err(map_err!(Write))?;
        }
        {
            let mut table = txn.open_table(DEPLOYMENTS).map_err(map_err!(Table))?;
            for (id, value) in &deployment_values {
                table.insert(*id, value.as_slice()).map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(
            cluster_id = %cluster.id,
            deployments = deployments.len(),
            "submission committed"
        );
        Ok(())
    }
}
