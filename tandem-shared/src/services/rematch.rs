/// Rematch request workflow
///
/// Members file requests against their current match; admins approve or
/// deny. Resolution is deliberately decoupled from matching: approving a
/// request changes nothing about the member's match or status, it only
/// authorizes the admin's separate dissolve-and-recreate follow-up. That
/// keeps the request workflow idempotent and auditable, at the cost of
/// "approved" and "actually rematched" being distinct states.

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::cache::{keys, CacheClient};
use crate::error::{CoreError, CoreResult, Outcome, SideEffectWarning};
use crate::models::matches::Match;
use crate::models::member::Member;
use crate::models::rematch_request::{
    CreateRematchRequest, RematchRequest, RematchStatus, MIN_REASON_LEN,
};
use crate::notify::{EmailTemplate, Notifier};
use crate::services::conflict_on_unique;

/// Input for submitting a rematch request
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRematchRequest {
    /// Why the member wants a new partner (at least 10 characters)
    pub reason: String,

    pub preferred_match_type: Option<String>,

    pub preferred_partner: Option<String>,
}

/// Admin decision on a pending request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RematchDecision {
    Approve,
    Deny,
}

impl RematchDecision {
    /// The terminal status this decision produces
    pub fn as_status(&self) -> RematchStatus {
        match self {
            RematchDecision::Approve => RematchStatus::Approved,
            RematchDecision::Deny => RematchStatus::Denied,
        }
    }

    /// Parses an action string (admin API input)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "approve" => Some(RematchDecision::Approve),
            "deny" => Some(RematchDecision::Deny),
            _ => None,
        }
    }
}

/// Submits and resolves rematch requests
#[derive(Clone)]
pub struct RematchService {
    pool: PgPool,
    cache: CacheClient,
    notifier: Notifier,
}

impl RematchService {
    pub fn new(pool: PgPool, cache: CacheClient, notifier: Notifier) -> Self {
        Self {
            pool,
            cache,
            notifier,
        }
    }

    /// Submits a rematch request for a member.
    ///
    /// The member's current match id is captured here as an immutable
    /// snapshot; dissolving that match later does not rewrite the request.
    ///
    /// # Errors
    ///
    /// - `Validation`: reason shorter than 10 characters
    /// - `NotFound`: member does not exist
    /// - `Conflict`: the member already has a pending request
    pub async fn submit_request(
        &self,
        member_id: Uuid,
        request: SubmitRematchRequest,
    ) -> CoreResult<Outcome<RematchRequest>> {
        let reason = request.reason.trim().to_string();
        if reason.len() < MIN_REASON_LEN {
            return Err(CoreError::Validation(format!(
                "reason must be at least {} characters",
                MIN_REASON_LEN
            )));
        }

        if Member::find_by_id(&self.pool, member_id).await?.is_none() {
            return Err(CoreError::NotFound("member".to_string()));
        }

        if RematchRequest::find_pending_for_member(&self.pool, member_id)
            .await?
            .is_some()
        {
            return Err(CoreError::Conflict(
                "a rematch request is already pending for this member".to_string(),
            ));
        }

        let current_match_id = Match::current_for_member(&self.pool, member_id)
            .await?
            .map(|m| m.id);

        let created = RematchRequest::create(
            &self.pool,
            CreateRematchRequest {
                member_id,
                current_match_id,
                reason,
                preferred_match_type: request.preferred_match_type,
                preferred_partner: request.preferred_partner,
            },
        )
        .await
        .map_err(|e| {
            // The pending-uniqueness check above raced with another submit
            conflict_on_unique(e, "a rematch request is already pending for this member")
        })?;

        tracing::info!(
            request_id = %created.id,
            member_id = %member_id,
            "Rematch request submitted"
        );

        let mut outcome = Outcome::clean(created);
        if !self.cache.invalidate_rematch_requests().await {
            outcome.warn(SideEffectWarning::cache(
                "cache purge incomplete for rematch queue".to_string(),
            ));
        }

        Ok(outcome)
    }

    /// Resolves a pending request.
    ///
    /// This is purely a status change: approving a request neither
    /// dissolves the old match nor creates a new one. The decision email
    /// is best-effort.
    ///
    /// # Errors
    ///
    /// - `Conflict`: the request was already resolved
    /// - `NotFound`: the id does not resolve to a request
    pub async fn resolve_request(
        &self,
        request_id: Uuid,
        decision: RematchDecision,
        admin_notes: Option<String>,
    ) -> CoreResult<Outcome<RematchRequest>> {
        let resolved = RematchRequest::transition_to_resolved(
            &self.pool,
            request_id,
            decision.as_status(),
            admin_notes.as_deref(),
        )
        .await?;

        let Some(resolved) = resolved else {
            return match RematchRequest::find_by_id(&self.pool, request_id).await? {
                Some(_) => Err(CoreError::Conflict(
                    "rematch request has already been resolved".to_string(),
                )),
                None => Err(CoreError::NotFound("rematch request".to_string())),
            };
        };

        tracing::info!(
            request_id = %request_id,
            status = resolved.status.as_str(),
            "Rematch request resolved"
        );

        let mut outcome = Outcome::clean(resolved);

        if !self.cache.invalidate_rematch_requests().await {
            outcome.warn(SideEffectWarning::cache(
                "cache purge incomplete for rematch queue".to_string(),
            ));
        }

        if let Some(member) = Member::find_by_id(&self.pool, outcome.value.member_id).await? {
            let template = EmailTemplate::RematchResolved {
                approved: decision == RematchDecision::Approve,
                admin_notes: outcome.value.admin_notes.clone(),
            };
            if let Some(warning) = self.notifier.notify_member(&member, &template).await {
                outcome.warn(warning);
            }
        }

        Ok(outcome)
    }

    /// The pending admin queue, read through the cache (short TTL: the
    /// list must track submissions closely)
    pub async fn list_pending(&self) -> CoreResult<Vec<RematchRequest>> {
        let key = keys::pending_rematch_key();
        let cached = self
            .cache
            .get_cached(&key, keys::TTL_SHORT, || async move {
                Ok(Some(RematchRequest::list_pending(&self.pool).await?))
            })
            .await?;

        Ok(cached.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_parse() {
        assert_eq!(RematchDecision::parse("approve"), Some(RematchDecision::Approve));
        assert_eq!(RematchDecision::parse("deny"), Some(RematchDecision::Deny));
        assert_eq!(RematchDecision::parse("maybe"), None);
    }

    #[test]
    fn test_decision_as_status() {
        assert_eq!(RematchDecision::Approve.as_status(), RematchStatus::Approved);
        assert_eq!(RematchDecision::Deny.as_status(), RematchStatus::Denied);
    }
}
