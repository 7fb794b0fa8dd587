//! slicegrid-scheduler — admission-and-preemption scheduling.
//!
//! Decides, for each submitted deployment, whether to admit it immediately,
//! free capacity by evicting lower-priority running deployments, or leave
//! it pending — while keeping the cluster's resource ledger consistent
//! under concurrent submissions.
//!
//! # Architecture
//!
//! ```text
//! Scheduler
//!   ├── per-cluster lock map (one submission at a time per cluster)
//!   ├── admission::can_admit (fast path, pure)
//!   ├── preemption::select_victims (greedy minimal prefix, pure)
//!   ├── ledger::reserve / release (counter mutation, all-or-nothing)
//!   └── StateStore::apply_submission (single-transaction commit)
//! ```
//!
//! The evaluator and selector are pure functions over snapshots; all
//! mutation happens on cloned records and reaches the store through one
//! atomic commit, so a failed submission leaves no partial state.

pub mod admission;
pub mod error;
pub mod ledger;
pub mod preemption;
pub mod scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use scheduler::{Caller, Scheduler, SubmitRequest};
