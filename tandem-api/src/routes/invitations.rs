/// Invitation endpoints
///
/// # Endpoints
///
/// - `POST /v1/invitations` - Issue (or re-issue) an invitation (admin)
/// - `POST /v1/invitations/redeem` - Redeem a token and create the member

use crate::{
    app::AppState,
    error::{validation_error, ApiResult},
};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tandem_shared::error::SideEffectWarning;
use tandem_shared::models::invitation::Invitation;
use tandem_shared::models::member::{Member, MemberPreferences};
use tandem_shared::services::onboarding::RedeemInvitation;
use validator::Validate;

/// Create invitation request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvitationRequest {
    /// Email address to invite
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Create invitation response
#[derive(Debug, Serialize)]
pub struct CreateInvitationResponse {
    pub invitation: Invitation,

    /// Signup link carrying the token
    pub link: String,

    /// Side effects that degraded (e.g., invitation email undeliverable)
    pub warnings: Vec<SideEffectWarning>,
}

/// Redeem invitation request
#[derive(Debug, Deserialize, Validate)]
pub struct RedeemInvitationRequest {
    /// The token from the invitation link
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,

    /// Display name for the new member
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Optional matching preferences (can also be set during onboarding)
    #[serde(default)]
    pub preferences: MemberPreferences,
}

/// Issues an invitation for an email address.
///
/// A prior `pending`/`expired` invitation for the same email is reused
/// with a rotated token and a fresh 7-day expiry.
///
/// # Errors
///
/// - `409 Conflict`: a member already exists with this email, or the
///   invitation was already accepted
/// - `422 Unprocessable Entity`: invalid email
pub async fn create_invitation(
    State(state): State<AppState>,
    Json(req): Json<CreateInvitationRequest>,
) -> ApiResult<Json<CreateInvitationResponse>> {
    req.validate().map_err(validation_error)?;

    let outcome = state.onboarding.create_invitation(&req.email).await?;

    Ok(Json(CreateInvitationResponse {
        invitation: outcome.value.invitation,
        link: outcome.value.link,
        warnings: outcome.warnings,
    }))
}

/// Redeems an invitation token, creating the member in `pending` status.
///
/// # Errors
///
/// - `404 Not Found`: unknown token
/// - `409 Conflict`: invitation already used or expired
pub async fn redeem_invitation(
    State(state): State<AppState>,
    Json(req): Json<RedeemInvitationRequest>,
) -> ApiResult<Json<Member>> {
    req.validate().map_err(validation_error)?;

    let member = state
        .onboarding
        .redeem_invitation(
            &req.token,
            RedeemInvitation {
                name: req.name,
                preferences: req.preferences,
            },
        )
        .await?;

    Ok(Json(member))
}
