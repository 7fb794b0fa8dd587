//! slicegrid-state — embedded state store for SliceGrid.
//!
//! Backed by [redb](https://docs.rs/redb), provides persistent and in-memory
//! state management for organizations, clusters, and deployments.
//!
//! # Architecture
//!
//! All domain types are JSON-serialized into redb's `&[u8]` value columns,
//! keyed by their generated id. Record ids come from a persisted sequence
//! (`meta` table), which also supplies the creation-order sequence number
//! the scheduler uses as a deterministic tie-break.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks. `apply_submission` persists a full
//! scheduling outcome — cluster counters plus every touched deployment — in
//! a single write transaction, so a submission either commits in full or
//! leaves no trace.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
