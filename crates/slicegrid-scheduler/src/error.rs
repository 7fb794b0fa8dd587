//! Scheduler error types.

use thiserror::Error;

/// Errors that can occur during scheduling operations.
///
/// A cluster that exists but belongs to another organization reports
/// `ClusterNotFound`, so callers cannot probe for foreign clusters.
/// Insufficient capacity is deliberately absent: it routes a submission
/// to the preemption path or the pending fallback, never to an error.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("cluster not found: {0}")]
    ClusterNotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("state store error: {0}")]
    State(#[from] slicegrid_state::StateError),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
