/// Member endpoints
///
/// # Endpoints
///
/// - `GET    /v1/members` - List members by status (admin, cached)
/// - `GET    /v1/members/:id` - Member profile (cached)
/// - `DELETE /v1/members/:id` - Delete a member and all dependent rows (admin)
/// - `POST   /v1/members/:id/status` - Administrative status override (admin)
/// - `POST   /v1/members/:id/onboarding` - Complete onboarding
/// - `PUT    /v1/members/:id/goal/progress` - Update active goal progress
/// - `GET    /v1/members/:id/match` - Current match lookup

use crate::{
    app::AppState,
    error::{validation_error, ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tandem_shared::cache::keys;
use tandem_shared::error::SideEffectWarning;
use tandem_shared::models::goal::{Goal, NewGoal};
use tandem_shared::models::member::{Member, MemberPreferences, MemberStatus};
use tandem_shared::services::matching::MatchWithMembers;
use uuid::Uuid;
use validator::Validate;

/// Member list query parameters
#[derive(Debug, Deserialize)]
pub struct ListMembersQuery {
    /// Status to filter by (defaults to `unmatched`, the admin's matching
    /// worklist)
    pub status: Option<String>,

    pub limit: Option<i64>,

    pub offset: Option<i64>,
}

/// Member list response
#[derive(Debug, Serialize, Deserialize)]
pub struct ListMembersResponse {
    pub members: Vec<Member>,

    pub limit: i64,

    pub offset: i64,
}

/// Status override request
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    /// Target status ("pending", "unmatched", "matched", "inactive")
    pub status: String,
}

/// Response carrying a member plus side-effect warnings
#[derive(Debug, Serialize)]
pub struct MemberMutationResponse {
    pub member: Member,

    pub warnings: Vec<SideEffectWarning>,
}

/// Onboarding completion request
#[derive(Debug, Deserialize, Validate)]
pub struct CompleteOnboardingRequest {
    /// First goal category (e.g., "fitness")
    #[validate(length(min = 1, max = 100, message = "Category must be 1-100 characters"))]
    pub category: String,

    /// First goal description
    #[validate(length(min = 1, message = "Goal text is required"))]
    pub goal_text: String,

    #[serde(default)]
    pub preferences: MemberPreferences,
}

/// Onboarding completion response
#[derive(Debug, Serialize)]
pub struct CompleteOnboardingResponse {
    pub member: Member,

    pub goal: Goal,

    pub warnings: Vec<SideEffectWarning>,
}

/// Goal progress request
#[derive(Debug, Deserialize)]
pub struct UpdateProgressRequest {
    /// New progress value; clamped to the 1-12 scale
    pub progress: i32,
}

/// Goal mutation response
#[derive(Debug, Serialize)]
pub struct GoalMutationResponse {
    pub goal: Goal,

    pub warnings: Vec<SideEffectWarning>,
}

/// Deletion response
#[derive(Debug, Serialize)]
pub struct DeleteMemberResponse {
    pub deleted: bool,

    pub warnings: Vec<SideEffectWarning>,
}

/// Current match response; `match` is null for unmatched members
#[derive(Debug, Serialize)]
pub struct CurrentMatchResponse {
    #[serde(rename = "match")]
    pub current: Option<MatchWithMembers>,
}

/// Lists members by status, read through the cache.
///
/// This backs the admin matching worklist, so it uses the short TTL and is
/// purged by every member mutation.
pub async fn list_members(
    State(state): State<AppState>,
    Query(query): Query<ListMembersQuery>,
) -> ApiResult<Json<ListMembersResponse>> {
    let status_str = query.status.as_deref().unwrap_or("unmatched");
    let status = MemberStatus::parse(status_str)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown status: {}", status_str)))?;

    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let key = keys::members_by_status_key(status, limit, offset);
    let db = state.db.clone();
    let members = state
        .cache
        .get_cached(&key, keys::TTL_SHORT, || async move {
            Ok(Some(
                Member::list_by_status(&db, status, limit, offset).await?,
            ))
        })
        .await?
        .unwrap_or_default();

    Ok(Json(ListMembersResponse {
        members,
        limit,
        offset,
    }))
}

/// Member profile, read through the cache
pub async fn get_member(
    State(state): State<AppState>,
    Path(member_id): Path<Uuid>,
) -> ApiResult<Json<Member>> {
    let key = keys::member_key(member_id);
    let db = state.db.clone();
    let member = state
        .cache
        .get_cached(&key, keys::TTL_MEDIUM, || async move {
            Ok(Member::find_by_id(&db, member_id).await?)
        })
        .await?;

    member
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))
}

/// Administrative status override.
///
/// Validates the transition against the member state machine; the write is
/// guarded by the expected current status so two admin tabs cannot
/// double-apply. The member's cache entries are purged with the write.
pub async fn set_status(
    State(state): State<AppState>,
    Path(member_id): Path<Uuid>,
    Json(req): Json<SetStatusRequest>,
) -> ApiResult<Json<MemberMutationResponse>> {
    let target = MemberStatus::parse(&req.status)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown status: {}", req.status)))?;

    let member = Member::find_by_id(&state.db, member_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Member not found".to_string()))?;

    if !member.status.can_transition_to(target) {
        return Err(ApiError::Conflict(format!(
            "cannot transition member from {} to {}",
            member.status.as_str(),
            target.as_str()
        )));
    }

    let updated = Member::set_status(&state.db, member_id, member.status, target)
        .await?
        .ok_or_else(|| {
            ApiError::Conflict("member status changed concurrently, retry".to_string())
        })?;

    let mut warnings = Vec::new();
    if !state.cache.invalidate_member(member_id).await {
        warnings.push(SideEffectWarning::cache(format!(
            "cache purge incomplete for member {}",
            member_id
        )));
    }

    Ok(Json(MemberMutationResponse {
        member: updated,
        warnings,
    }))
}

/// Completes onboarding: `pending → unmatched` plus the first goal
pub async fn complete_onboarding(
    State(state): State<AppState>,
    Path(member_id): Path<Uuid>,
    Json(req): Json<CompleteOnboardingRequest>,
) -> ApiResult<Json<CompleteOnboardingResponse>> {
    req.validate().map_err(validation_error)?;

    let outcome = state
        .onboarding
        .complete_onboarding(
            member_id,
            NewGoal {
                category: req.category,
                goal_text: req.goal_text,
            },
            req.preferences,
        )
        .await?;

    Ok(Json(CompleteOnboardingResponse {
        member: outcome.value.member,
        goal: outcome.value.goal,
        warnings: outcome.warnings,
    }))
}

/// Updates the member's active goal progress (clamped to 1-12)
pub async fn update_goal_progress(
    State(state): State<AppState>,
    Path(member_id): Path<Uuid>,
    Json(req): Json<UpdateProgressRequest>,
) -> ApiResult<Json<GoalMutationResponse>> {
    let goal = Goal::update_progress(&state.db, member_id, req.progress)
        .await?
        .ok_or_else(|| ApiError::NotFound("Active goal not found".to_string()))?;

    let mut warnings = Vec::new();
    if !state.cache.invalidate_member(member_id).await {
        warnings.push(SideEffectWarning::cache(format!(
            "cache purge incomplete for member {}",
            member_id
        )));
    }

    Ok(Json(GoalMutationResponse { goal, warnings }))
}

/// The member's current match with its roster
pub async fn current_match(
    State(state): State<AppState>,
    Path(member_id): Path<Uuid>,
) -> ApiResult<Json<CurrentMatchResponse>> {
    let current = state.matching.current_match(member_id).await?;
    Ok(Json(CurrentMatchResponse { current }))
}

/// Deletes a member; goals, memberships, and rematch requests cascade
pub async fn delete_member(
    State(state): State<AppState>,
    Path(member_id): Path<Uuid>,
) -> ApiResult<Json<DeleteMemberResponse>> {
    let deleted = Member::delete(&state.db, member_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Member not found".to_string()));
    }

    let mut warnings = Vec::new();
    if !state.cache.invalidate_member(member_id).await {
        warnings.push(SideEffectWarning::cache(format!(
            "cache purge incomplete for member {}",
            member_id
        )));
    }

    Ok(Json(DeleteMemberResponse { deleted, warnings }))
}
