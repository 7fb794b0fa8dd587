//! slicegrid-api — REST API for SliceGrid.
//!
//! Provides axum route handlers for organizations, clusters, and
//! deployment submission. Every org-scoped route trusts the caller
//! identity extracted from request headers (see [`auth`]).
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/api/v1/organizations` | Create an organization |
//! | POST | `/api/v1/clusters` | Create a cluster (available = limits) |
//! | GET | `/api/v1/clusters` | List the caller's clusters |
//! | GET | `/api/v1/clusters/:id` | Get cluster details |
//! | POST | `/api/v1/deployments` | Submit a deployment for scheduling |
//! | GET | `/api/v1/deployments` | List the caller's deployments |
//! | GET | `/api/v1/deployments/:id` | Get deployment details |
//! | GET | `/healthz` | Liveness probe |

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use slicegrid_scheduler::Scheduler;
use slicegrid_state::StateStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: StateStore,
    pub scheduler: Arc<Scheduler>,
}

/// Build the complete API router.
pub fn build_router(store: StateStore) -> Router {
    let api_state = ApiState {
        scheduler: Arc::new(Scheduler::new(store.clone())),
        store,
    };

    let api_routes = Router::new()
        .route("/organizations", axum::routing::post(handlers::create_organization))
        .route("/clusters", get(handlers::list_clusters).post(handlers::create_cluster))
        .route("/clusters/{id}", get(handlers::get_cluster))
        .route("/deployments", get(handlers::list_deployments).post(handlers::submit_deployment))
        .route("/deployments/{id}", get(handlers::get_deployment))
        .with_state(api_state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/healthz", get(handlers::healthz))
}
