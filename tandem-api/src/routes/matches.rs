/// Match endpoints
///
/// # Endpoints
///
/// - `POST /v1/matches` - Create a match (admin)
/// - `POST /v1/matches/:id/dissolve` - Dissolve a match (admin)
/// - `GET  /v1/matches/:id` - Match with its member roster

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tandem_shared::error::SideEffectWarning;
use tandem_shared::models::matches::Match;
use tandem_shared::services::matching::{CreateMatchRequest, MatchWithMembers};
use uuid::Uuid;

/// Match creation response
#[derive(Debug, Serialize)]
pub struct CreateMatchResponse {
    #[serde(rename = "match")]
    pub created: MatchWithMembers,

    /// Side effects that degraded (cache purges, "match made" emails)
    pub warnings: Vec<SideEffectWarning>,
}

/// Dissolution response
#[derive(Debug, Serialize)]
pub struct DissolveMatchResponse {
    #[serde(rename = "match")]
    pub dissolved: Match,

    pub affected_member_count: usize,

    pub warnings: Vec<SideEffectWarning>,
}

/// Creates a match from two or more unmatched members.
///
/// # Endpoint
///
/// ```text
/// POST /v1/matches
/// Content-Type: application/json
///
/// {
///   "member_ids": ["uuid", "uuid"],
///   "match_type": "one-on-one",
///   "notes": "paired on shared fitness goals",
///   "notify": true
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: member count invalid for the match type
/// - `409 Conflict`: some member is not available for matching
pub async fn create_match(
    State(state): State<AppState>,
    Json(req): Json<CreateMatchRequest>,
) -> ApiResult<Json<CreateMatchResponse>> {
    let outcome = state.matching.create_match(req).await?;

    Ok(Json(CreateMatchResponse {
        created: outcome.value,
        warnings: outcome.warnings,
    }))
}

/// Dissolves an active match, releasing its members back to `unmatched`.
///
/// # Errors
///
/// - `404 Not Found`: the id does not resolve to an active match (an
///   already-dissolved match is not dissolved twice)
pub async fn dissolve_match(
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
) -> ApiResult<Json<DissolveMatchResponse>> {
    let outcome = state.matching.dissolve_match(match_id).await?;

    Ok(Json(DissolveMatchResponse {
        dissolved: outcome.value.details,
        affected_member_count: outcome.value.affected_member_count,
        warnings: outcome.warnings,
    }))
}

/// Loads a match with its roster, read through the cache
pub async fn get_match(
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
) -> ApiResult<Json<MatchWithMembers>> {
    state
        .matching
        .get_match(match_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Match not found".to_string()))
}
