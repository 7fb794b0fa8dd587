//! Caller identity extraction.
//!
//! Authentication and session handling live upstream (gateway, reverse
//! proxy); this layer trusts the identity headers it receives and only
//! resolves them into a [`Caller`]. A request without an organization
//! header is rejected before any handler runs.

use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use slicegrid_scheduler::Caller;

/// Header naming the caller's organization.
pub const ORG_HEADER: &str = "x-slicegrid-org";

/// Header naming the caller (optional, for traceability only).
pub const USER_HEADER: &str = "x-slicegrid-user";

/// Extractor wrapping the trusted [`Caller`] identity.
#[derive(Debug, Clone)]
pub struct Identity(pub Caller);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let Some(organization_id) = header(ORG_HEADER) else {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "success": false,
                    "error": format!("missing {ORG_HEADER} header"),
                })),
            )
                .into_response());
        };

        let user_id = header(USER_HEADER).unwrap_or_else(|| "anonymous".to_string());

        Ok(Identity(Caller {
            user_id,
            organization_id,
        }))
    }
}
