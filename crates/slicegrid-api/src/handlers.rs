//! REST API handlers.
//!
//! Each handler reads/writes via `StateStore` (read projections, record
//! creation) or goes through the `Scheduler` (deployment submission) and
//! returns JSON responses.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::error;

use slicegrid_scheduler::{SchedulerError, SubmitRequest};
use slicegrid_state::{Cluster, Organization, Resources, epoch_secs};

use crate::ApiState;
use crate::auth::Identity;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse + use<> {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

fn scheduler_error(e: &SchedulerError) -> impl IntoResponse {
    let status = match e {
        SchedulerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        SchedulerError::ClusterNotFound(_) => StatusCode::NOT_FOUND,
        SchedulerError::State(_) => {
            error!(error = %e, "submission failed in the state store");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(&e.to_string(), status)
}

// ── Organizations ──────────────────────────────────────────────

/// Create-organization request body.
#[derive(serde::Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
}

/// POST /api/v1/organizations
///
/// Bootstrap endpoint: needs no identity headers, since the returned org
/// id is what callers put in them afterwards.
pub async fn create_organization(
    State(state): State<ApiState>,
    Json(req): Json<CreateOrganizationRequest>,
) -> impl IntoResponse {
    if req.name.trim().is_empty() {
        return error_response("organization name must not be empty", StatusCode::BAD_REQUEST)
            .into_response();
    }

    let seq = match state.store.next_seq() {
        Ok(seq) => seq,
        Err(e) => {
            return error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
                .into_response();
        }
    };
    let org = Organization {
        id: format!("org-{seq:06}"),
        name: req.name,
        created_at: epoch_secs(),
    };

    match state.store.put_organization(&org) {
        Ok(()) => (StatusCode::CREATED, ApiResponse::ok(org)).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

// ── Clusters ───────────────────────────────────────────────────

/// Create-cluster request body. Limits are signed so negative input is
/// rejected rather than wrapped.
#[derive(serde::Deserialize)]
pub struct CreateClusterRequest {
    pub name: String,
    pub cpu_limit: i64,
    pub ram_limit: i64,
    pub gpu_limit: i64,
}

/// POST /api/v1/clusters
pub async fn create_cluster(
    State(state): State<ApiState>,
    Identity(caller): Identity,
    Json(req): Json<CreateClusterRequest>,
) -> impl IntoResponse {
    if req.name.trim().is_empty() {
        return error_response("cluster name must not be empty", StatusCode::BAD_REQUEST)
            .into_response();
    }
    if req.cpu_limit < 0 || req.ram_limit < 0 || req.gpu_limit < 0 {
        return error_response("resource limits cannot be negative", StatusCode::BAD_REQUEST)
            .into_response();
    }

    match state.store.get_organization(&caller.organization_id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return error_response("organization not found", StatusCode::NOT_FOUND).into_response();
        }
        Err(e) => {
            return error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
                .into_response();
        }
    }

    let seq = match state.store.next_seq() {
        Ok(seq) => seq,
        Err(e) => {
            return error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
                .into_response();
        }
    };
    let cluster = Cluster::new(
        format!("cl-{seq:06}"),
        caller.organization_id,
        req.name,
        Resources::new(
            req.cpu_limit as u64,
            req.ram_limit as u64,
            req.gpu_limit as u64,
        ),
        epoch_secs(),
    );

    match state.store.put_cluster(&cluster) {
        Ok(()) => (StatusCode::CREATED, ApiResponse::ok(cluster)).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// GET /api/v1/clusters
pub async fn list_clusters(
    State(state): State<ApiState>,
    Identity(caller): Identity,
) -> impl IntoResponse {
    match state.store.list_clusters_for_org(&caller.organization_id) {
        Ok(clusters) => ApiResponse::ok(clusters).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// GET /api/v1/clusters/:id
pub async fn get_cluster(
    State(state): State<ApiState>,
    Identity(caller): Identity,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_cluster(&id) {
        // A foreign org's cluster reads as not-found.
        Ok(Some(cluster)) if cluster.organization_id == caller.organization_id => {
            ApiResponse::ok(cluster).into_response()
        }
        Ok(_) => error_response("cluster not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

// ── Deployments ────────────────────────────────────────────────

/// Deployment submission body.
#[derive(serde::Deserialize)]
pub struct SubmitDeploymentRequest {
    pub cluster_id: String,
    pub name: String,
    pub image: String,
    pub cpu_required: i64,
    pub ram_required: i64,
    pub gpu_required: i64,
    #[serde(default)]
    pub priority: i64,
}

/// POST /api/v1/deployments
///
/// The scheduling entry point: the deployment comes back `running` or
/// `pending` depending on the admission decision.
pub async fn submit_deployment(
    State(state): State<ApiState>,
    Identity(caller): Identity,
    Json(req): Json<SubmitDeploymentRequest>,
) -> impl IntoResponse {
    let submit = SubmitRequest {
        cluster_id: req.cluster_id,
        name: req.name,
        image: req.image,
        cpu_required: req.cpu_required,
        ram_required: req.ram_required,
        gpu_required: req.gpu_required,
        priority: req.priority,
    };

    match state.scheduler.submit(&caller, submit).await {
        Ok(deployment) => (StatusCode::CREATED, ApiResponse::ok(deployment)).into_response(),
        Err(e) => scheduler_error(&e).into_response(),
    }
}

/// GET /api/v1/deployments
pub async fn list_deployments(
    State(state): State<ApiState>,
    Identity(caller): Identity,
) -> impl IntoResponse {
    match state.store.list_deployments_for_org(&caller.organization_id) {
        Ok(deployments) => ApiResponse::ok(deployments).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// GET /api/v1/deployments/:id
pub async fn get_deployment(
    State(state): State<ApiState>,
    Identity(caller): Identity,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_deployment(&id) {
        Ok(Some(deployment)) if deployment.organization_id == caller.organization_id => {
            ApiResponse::ok(deployment).into_response()
        }
        Ok(_) => error_response("deployment not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

// ── Health ─────────────────────────────────────────────────────

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    ApiResponse::ok("ok")
}
