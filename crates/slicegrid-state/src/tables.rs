//! redb table definitions for the SliceGrid state store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized domain
//! types), except `meta` which holds raw `u64` counters.

use redb::TableDefinition;

/// Organizations keyed by `{org_id}`.
pub const ORGANIZATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("organizations");

/// Clusters keyed by `{cluster_id}`.
pub const CLUSTERS: TableDefinition<&str, &[u8]> = TableDefinition::new("clusters");

/// Deployments keyed by `{deployment_id}`.
pub const DEPLOYMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("deployments");

/// Store-wide counters (id sequence lives under the `seq` key).
pub const META: TableDefinition<&str, u64> = TableDefinition::new("meta");
