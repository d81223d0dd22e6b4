/// Rematch request endpoints
///
/// # Endpoints
///
/// - `POST /v1/rematch-requests` - Submit a request
/// - `GET  /v1/rematch-requests` - Pending review queue (admin, cached)
/// - `POST /v1/rematch-requests/:id/resolve` - Approve or deny (admin)

use crate::{
    app::AppState,
    error::{validation_error, ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tandem_shared::error::SideEffectWarning;
use tandem_shared::models::rematch_request::RematchRequest;
use tandem_shared::services::rematch::{RematchDecision, SubmitRematchRequest};
use uuid::Uuid;
use validator::Validate;

/// Submission request
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitRequest {
    /// The member filing the request
    pub member_id: Uuid,

    /// Why a new partner is needed (domain rule: at least 10 characters)
    #[validate(length(min = 1, message = "Reason is required"))]
    pub reason: String,

    pub preferred_match_type: Option<String>,

    pub preferred_partner: Option<String>,
}

/// Resolution request
#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    /// "approve" or "deny"
    pub action: String,

    pub admin_notes: Option<String>,
}

/// Response carrying a request plus side-effect warnings
#[derive(Debug, Serialize)]
pub struct RematchRequestResponse {
    pub request: RematchRequest,

    pub warnings: Vec<SideEffectWarning>,
}

/// Pending queue response
#[derive(Debug, Serialize)]
pub struct PendingRequestsResponse {
    pub requests: Vec<RematchRequest>,
}

/// Submits a rematch request for a member.
///
/// The member's current match id is captured as an immutable snapshot at
/// submission time.
///
/// # Errors
///
/// - `400 Bad Request`: reason shorter than 10 characters
/// - `404 Not Found`: member does not exist
/// - `409 Conflict`: the member already has a pending request
pub async fn submit_request(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> ApiResult<Json<RematchRequestResponse>> {
    req.validate().map_err(validation_error)?;

    let outcome = state
        .rematch
        .submit_request(
            req.member_id,
            SubmitRematchRequest {
                reason: req.reason,
                preferred_match_type: req.preferred_match_type,
                preferred_partner: req.preferred_partner,
            },
        )
        .await?;

    Ok(Json(RematchRequestResponse {
        request: outcome.value,
        warnings: outcome.warnings,
    }))
}

/// The pending review queue, oldest first
pub async fn list_pending(
    State(state): State<AppState>,
) -> ApiResult<Json<PendingRequestsResponse>> {
    let requests = state.rematch.list_pending().await?;
    Ok(Json(PendingRequestsResponse { requests }))
}

/// Resolves a pending request.
///
/// Approval is only a status change: the member stays matched until the
/// admin separately dissolves the old match and creates a new one.
///
/// # Errors
///
/// - `400 Bad Request`: unknown action
/// - `404 Not Found`: the id does not resolve to a request
/// - `409 Conflict`: the request was already resolved
pub async fn resolve_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Json(req): Json<ResolveRequest>,
) -> ApiResult<Json<RematchRequestResponse>> {
    let decision = RematchDecision::parse(&req.action)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown action: {}", req.action)))?;

    let outcome = state
        .rematch
        .resolve_request(request_id, decision, req.admin_notes)
        .await?;

    Ok(Json(RematchRequestResponse {
        request: outcome.value,
        warnings: outcome.warnings,
    }))
}
