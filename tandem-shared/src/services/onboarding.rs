/// Invitation and onboarding gate
///
/// Membership is invitation-only. The gate seeds a member's initial
/// `pending` status before the matching subsystem can act on them:
/// invitation → redemption (member created `pending`) → onboarding
/// completion (`pending → unmatched`, first goal created).

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::cache::CacheClient;
use crate::error::{CoreError, CoreResult, Outcome, SideEffectWarning};
use crate::models::goal::{Goal, NewGoal};
use crate::models::invitation::Invitation;
use crate::models::member::{CreateMember, Member, MemberPreferences};
use crate::notify::{EmailTemplate, Notifier};
use crate::services::conflict_on_unique;

/// A created (or re-issued) invitation with its signup link
#[derive(Debug, Clone, Serialize)]
pub struct InvitationWithLink {
    pub invitation: Invitation,

    /// Full signup URL carrying the token
    pub link: String,
}

/// Profile supplied when redeeming an invitation
#[derive(Debug, Clone, Deserialize)]
pub struct RedeemInvitation {
    pub name: String,

    #[serde(default)]
    pub preferences: MemberPreferences,
}

/// A member who just finished onboarding, with their first goal
#[derive(Debug, Clone, Serialize)]
pub struct OnboardedMember {
    pub member: Member,

    pub goal: Goal,
}

/// Creates invitations and walks members through onboarding
#[derive(Clone)]
pub struct OnboardingService {
    pool: PgPool,
    cache: CacheClient,
    notifier: Notifier,
    signup_base_url: String,
}

impl OnboardingService {
    pub fn new(
        pool: PgPool,
        cache: CacheClient,
        notifier: Notifier,
        signup_base_url: String,
    ) -> Self {
        Self {
            pool,
            cache,
            notifier,
            signup_base_url,
        }
    }

    /// Creates an invitation for an email address, or re-issues the
    /// existing one.
    ///
    /// A `pending`/`expired` invitation for the same email is reused: the
    /// token is rotated and the expiry reset to 7 days out, so there is
    /// never more than one invitation row per email.
    ///
    /// # Errors
    ///
    /// `Conflict` when a member already exists with this email or the
    /// invitation was already accepted.
    pub async fn create_invitation(&self, email: &str) -> CoreResult<Outcome<InvitationWithLink>> {
        let email = email.trim().to_lowercase();

        if Member::find_by_email(&self.pool, &email).await?.is_some() {
            return Err(CoreError::Conflict(
                "a member with this email already exists".to_string(),
            ));
        }

        let invitation = match Invitation::find_by_email(&self.pool, &email).await? {
            Some(existing) => Invitation::rotate(&self.pool, existing.id)
                .await?
                .ok_or_else(|| {
                    CoreError::Conflict("invitation has already been accepted".to_string())
                })?,
            None => Invitation::create(&self.pool, &email)
                .await
                .map_err(|e| conflict_on_unique(e, "an invitation already exists for this email"))?,
        };

        let link = format!(
            "{}/signup?token={}",
            self.signup_base_url.trim_end_matches('/'),
            invitation.token
        );

        tracing::info!(email = %email, invitation_id = %invitation.id, "Invitation issued");

        let mut outcome = Outcome::clean(InvitationWithLink {
            invitation,
            link: link.clone(),
        });

        if let Some(warning) = self
            .notifier
            .notify_address(&email, &EmailTemplate::Invitation { link })
            .await
        {
            outcome.warn(warning);
        }

        Ok(outcome)
    }

    /// Redeems an invitation token, creating the member in `pending`
    /// status and flipping the invitation to `accepted` atomically.
    ///
    /// # Errors
    ///
    /// - `NotFound`: unknown token
    /// - `Conflict`: invitation already accepted, expired, or the email
    ///   already belongs to a member
    pub async fn redeem_invitation(
        &self,
        token: &str,
        profile: RedeemInvitation,
    ) -> CoreResult<Member> {
        let Some(invitation) = Invitation::find_by_token(&self.pool, token).await? else {
            return Err(CoreError::NotFound("invitation".to_string()));
        };

        if invitation.status == crate::models::invitation::InvitationStatus::Accepted {
            return Err(CoreError::Conflict(
                "invitation has already been used".to_string(),
            ));
        }
        if invitation.is_expired(chrono::Utc::now()) {
            return Err(CoreError::Conflict("invitation has expired".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let member = Member::create(
            &mut *tx,
            CreateMember {
                email: invitation.email.clone(),
                name: profile.name,
            },
        )
        .await
        .map_err(|e| conflict_on_unique(e, "a member with this email already exists"))?;

        Member::apply_preferences(&mut *tx, member.id, &profile.preferences).await?;

        if Invitation::transition_to_accepted(&mut *tx, invitation.id)
            .await?
            .is_none()
        {
            // Lost a race with a concurrent redemption; roll back the member
            return Err(CoreError::Conflict(
                "invitation has already been used".to_string(),
            ));
        }

        tx.commit().await?;

        tracing::info!(
            member_id = %member.id,
            email = %member.email,
            "Invitation redeemed, member created"
        );

        Ok(member)
    }

    /// Completes onboarding: transitions the member `pending → unmatched`
    /// (exactly once), stores their preferences, and creates their first
    /// goal at the start of the progress scale.
    ///
    /// # Errors
    ///
    /// - `NotFound`: member does not exist
    /// - `Conflict`: the member already completed onboarding
    pub async fn complete_onboarding(
        &self,
        member_id: Uuid,
        goal: NewGoal,
        preferences: MemberPreferences,
    ) -> CoreResult<Outcome<OnboardedMember>> {
        let mut tx = self.pool.begin().await?;

        let Some(member) = Member::transition_to_unmatched(&mut *tx, member_id).await? else {
            drop(tx);
            return match Member::find_by_id(&self.pool, member_id).await? {
                Some(_) => Err(CoreError::Conflict(
                    "onboarding has already been completed".to_string(),
                )),
                None => Err(CoreError::NotFound("member".to_string())),
            };
        };

        Member::apply_preferences(&mut *tx, member_id, &preferences).await?;

        let goal = Goal::create(&mut *tx, member_id, goal)
            .await
            .map_err(|e| conflict_on_unique(e, "member already has an active goal"))?;

        tx.commit().await?;

        tracing::info!(member_id = %member_id, "Onboarding completed");

        // Re-read so the response reflects the stored preferences
        let member = Member::find_by_id(&self.pool, member_id)
            .await?
            .unwrap_or(member);

        let mut outcome = Outcome::clean(OnboardedMember {
            member: member.clone(),
            goal,
        });

        if !self.cache.invalidate_member(member_id).await {
            outcome.warn(SideEffectWarning::cache(format!(
                "cache purge incomplete for member {}",
                member_id
            )));
        }

        let template = EmailTemplate::Welcome {
            name: member.name.clone(),
        };
        if let Some(warning) = self.notifier.notify_member(&member, &template).await {
            outcome.warn(warning);
        }

        Ok(outcome)
    }
}
