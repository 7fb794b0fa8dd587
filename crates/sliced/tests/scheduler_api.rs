//! End-to-end API tests.
//!
//! Exercises the full HTTP surface against an in-memory store: org and
//! cluster provisioning, deployment submission through the scheduler,
//! preemption, and tenant isolation.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use slicegrid_api::build_router;
use slicegrid_state::StateStore;

const ORG_HEADER: &str = "x-slicegrid-org";

fn test_router() -> Router {
    build_router(StateStore::open_in_memory().unwrap())
}

async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    org: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(org) = org {
        builder = builder.header(ORG_HEADER, org);
    }
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Creates an org and returns its id.
async fn create_org(router: &Router, name: &str) -> String {
    let (status, body) = send(
        router,
        "POST",
        "/api/v1/organizations",
        None,
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_str().unwrap().to_string()
}

/// Creates a cluster for `org` and returns its id.
async fn create_cluster(router: &Router, org: &str, cpu: i64, ram: i64, gpu: i64) -> String {
    let (status, body) = send(
        router,
        "POST",
        "/api/v1/clusters",
        Some(org),
        Some(json!({
            "name": "prod",
            "cpu_limit": cpu,
            "ram_limit": ram,
            "gpu_limit": gpu,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn submit(
    router: &Router,
    org: &str,
    cluster: &str,
    cpu: i64,
    ram: i64,
    priority: i64,
) -> (StatusCode, Value) {
    send(
        router,
        "POST",
        "/api/v1/deployments",
        Some(org),
        Some(json!({
            "cluster_id": cluster,
            "name": "api",
            "image": "registry.local/api:v1",
            "cpu_required": cpu,
            "ram_required": ram,
            "gpu_required": 0,
            "priority": priority,
        })),
    )
    .await
}

#[tokio::test]
async fn healthz_responds() {
    let router = test_router();
    let (status, body) = send(&router, "GET", "/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn org_and_cluster_provisioning_flow() {
    let router = test_router();
    let org = create_org(&router, "acme").await;
    let cluster = create_cluster(&router, &org, 16, 64, 2).await;

    let (status, body) = send(
        &router,
        "GET",
        &format!("/api/v1/clusters/{cluster}"),
        Some(&org),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["limits"]["cpu"], 16);
    // A fresh cluster has everything available.
    assert_eq!(body["data"]["available"], body["data"]["limits"]);
}

#[tokio::test]
async fn org_scoped_routes_require_identity_header() {
    let router = test_router();
    let (status, _) = send(&router, "GET", "/api/v1/clusters", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&router, "GET", "/api/v1/deployments", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn submission_with_free_capacity_runs_immediately() {
    let router = test_router();
    let org = create_org(&router, "acme").await;
    let cluster = create_cluster(&router, &org, 10, 10, 0).await;

    let (status, body) = submit(&router, &org, &cluster, 4, 4, 0).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "running");

    // Ledger reflects the reservation.
    let (_, body) = send(
        &router,
        "GET",
        &format!("/api/v1/clusters/{cluster}"),
        Some(&org),
        None,
    )
    .await;
    assert_eq!(body["data"]["available"]["cpu"], 6);
    assert_eq!(body["data"]["available"]["ram_gb"], 6);
}

#[tokio::test]
async fn higher_priority_submission_preempts_lower() {
    let router = test_router();
    let org = create_org(&router, "acme").await;
    let cluster = create_cluster(&router, &org, 10, 10, 0).await;

    let (_, low) = submit(&router, &org, &cluster, 8, 8, 1).await;
    let low_id = low["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = submit(&router, &org, &cluster, 6, 6, 5).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "running");

    // The low-priority victim was failed to make room.
    let (_, body) = send(
        &router,
        "GET",
        &format!("/api/v1/deployments/{low_id}"),
        Some(&org),
        None,
    )
    .await;
    assert_eq!(body["data"]["status"], "failed");
}

#[tokio::test]
async fn unsatisfiable_submission_is_accepted_as_pending() {
    let router = test_router();
    let org = create_org(&router, "acme").await;
    let cluster = create_cluster(&router, &org, 10, 10, 0).await;

    let (_, high) = submit(&router, &org, &cluster, 8, 8, 9).await;
    assert_eq!(high["data"]["status"], "running");

    // Lower priority than the incumbent: nothing to preempt.
    let (status, body) = submit(&router, &org, &cluster, 6, 6, 2).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "pending");

    // The incumbent keeps running and the ledger is untouched.
    let (_, body) = send(
        &router,
        "GET",
        &format!("/api/v1/clusters/{cluster}"),
        Some(&org),
        None,
    )
    .await;
    assert_eq!(body["data"]["available"]["cpu"], 2);
}

#[tokio::test]
async fn priority_zero_never_preempts() {
    let router = test_router();
    let org = create_org(&router, "acme").await;
    let cluster = create_cluster(&router, &org, 10, 10, 0).await;

    let (_, first) = submit(&router, &org, &cluster, 10, 10, 0).await;
    assert_eq!(first["data"]["status"], "running");

    let (status, body) = submit(&router, &org, &cluster, 1, 1, 0).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "pending");
}

#[tokio::test]
async fn negative_resources_are_rejected() {
    let router = test_router();
    let org = create_org(&router, "acme").await;
    let cluster = create_cluster(&router, &org, 10, 10, 0).await;

    let (status, body) = submit(&router, &org, &cluster, -1, 4, 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    // Nothing was recorded.
    let (_, body) = send(&router, "GET", "/api/v1/deployments", Some(&org), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn foreign_cluster_reads_as_not_found() {
    let router = test_router();
    let org_a = create_org(&router, "acme").await;
    let org_b = create_org(&router, "globex").await;
    let cluster = create_cluster(&router, &org_a, 10, 10, 0).await;

    let (status, _) = send(
        &router,
        "GET",
        &format!("/api/v1/clusters/{cluster}"),
        Some(&org_b),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = submit(&router, &org_b, &cluster, 1, 1, 0).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deployment_listing_is_org_scoped() {
    let router = test_router();
    let org_a = create_org(&router, "acme").await;
    let org_b = create_org(&router, "globex").await;
    let cluster_a = create_cluster(&router, &org_a, 10, 10, 0).await;
    let cluster_b = create_cluster(&router, &org_b, 10, 10, 0).await;

    submit(&router, &org_a, &cluster_a, 1, 1, 0).await;
    submit(&router, &org_a, &cluster_a, 1, 1, 0).await;
    submit(&router, &org_b, &cluster_b, 1, 1, 0).await;

    let (_, body) = send(&router, "GET", "/api/v1/deployments", Some(&org_a), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = send(&router, "GET", "/api/v1/deployments", Some(&org_b), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_cluster_is_not_found() {
    let router = test_router();
    let org = create_org(&router, "acme").await;

    let (status, _) = submit(&router, &org, "cl-999999", 1, 1, 0).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
