/// Match creation and dissolution
///
/// The match manager is the only component that moves members into or out
/// of `matched`. Member status, match rows, and membership rows always
/// change together inside one transaction, and the members' cache entries
/// are purged right after the commit; a missed purge here is what would
/// leave a matched member on the admin's "unmatched" list.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::cache::{keys, CacheClient};
use crate::error::{CoreError, CoreResult, Outcome, SideEffectWarning};
use crate::models::goal::Goal;
use crate::models::matches::{Match, MatchType};
use crate::models::member::Member;
use crate::notify::{EmailTemplate, Notifier};
use crate::services::conflict_on_unique;

/// Input for creating a match
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMatchRequest {
    /// Members to place together (all must be `unmatched`)
    pub member_ids: Vec<Uuid>,

    pub match_type: MatchType,

    /// Optional admin notes stored on the match
    pub notes: Option<String>,

    /// Whether to send "match made" emails
    #[serde(default)]
    pub notify: bool,
}

/// A member with their active goal, as shown on a match roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberWithGoal {
    pub member: Member,

    pub goal: Option<Goal>,
}

/// A match joined with its member roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchWithMembers {
    pub details: Match,

    pub members: Vec<MemberWithGoal>,
}

/// Result of dissolving a match
#[derive(Debug, Clone, Serialize)]
pub struct DissolvedMatch {
    pub details: Match,

    /// How many members were released back to `unmatched`
    pub affected_member_count: usize,
}

/// Creates and dissolves matches
#[derive(Clone)]
pub struct MatchManager {
    pool: PgPool,
    cache: CacheClient,
    notifier: Notifier,
}

impl MatchManager {
    pub fn new(pool: PgPool, cache: CacheClient, notifier: Notifier) -> Self {
        Self {
            pool,
            cache,
            notifier,
        }
    }

    /// Creates a match from two or more unmatched members.
    ///
    /// All writes (match row, membership rows, member status flips) commit
    /// atomically. Two concurrent creations referencing the same member
    /// cannot both succeed: the status update is a compare-and-swap and
    /// the open-membership unique index backs it up.
    ///
    /// # Errors
    ///
    /// - `Validation`: fewer than two members, duplicate ids, or a member
    ///   count the match type does not allow
    /// - `Conflict`: some member is not available for matching
    pub async fn create_match(
        &self,
        request: CreateMatchRequest,
    ) -> CoreResult<Outcome<MatchWithMembers>> {
        let member_ids = request.member_ids;

        if member_ids.len() < 2 {
            return Err(CoreError::Validation(
                "a match requires at least 2 members".to_string(),
            ));
        }

        let mut deduped = member_ids.clone();
        deduped.sort();
        deduped.dedup();
        if deduped.len() != member_ids.len() {
            return Err(CoreError::Validation(
                "member ids must be distinct".to_string(),
            ));
        }

        if !request.match_type.allows_size(member_ids.len()) {
            return Err(CoreError::Validation(format!(
                "a {} match requires {}",
                request.match_type.as_str(),
                request.match_type.size_requirement()
            )));
        }

        let mut tx = self.pool.begin().await?;

        let record = Match::create(&mut *tx, request.match_type, request.notes.as_deref()).await?;

        Match::add_members(&mut *tx, record.id, &member_ids)
            .await
            .map_err(|e| conflict_on_unique(e, "a member is already in an active match"))?;

        let updated = Member::mark_matched(&mut *tx, &member_ids).await?;
        if updated != member_ids.len() as u64 {
            // Rolls back on drop: some member was not unmatched
            return Err(CoreError::Conflict(
                "one or more members are not available for matching".to_string(),
            ));
        }

        tx.commit().await?;

        tracing::info!(
            match_id = %record.id,
            match_type = record.match_type.as_str(),
            member_count = member_ids.len(),
            "Match created"
        );

        let mut outcome = Outcome::clean(self.load_roster(record).await?);

        for member_id in &member_ids {
            if !self.cache.invalidate_member(*member_id).await {
                outcome.warn(SideEffectWarning::cache(format!(
                    "cache purge incomplete for member {}",
                    member_id
                )));
            }
        }

        if request.notify {
            let members: Vec<Member> = outcome
                .value
                .members
                .iter()
                .map(|m| m.member.clone())
                .collect();
            let warnings = self
                .notifier
                .notify_members(&members, |member| EmailTemplate::MatchMade {
                    partner_names: members
                        .iter()
                        .filter(|other| other.id != member.id)
                        .map(|other| other.name.clone())
                        .collect(),
                })
                .await;
            for warning in warnings {
                outcome.warn(warning);
            }
        }

        Ok(outcome)
    }

    /// Dissolves an active match, releasing every member back to
    /// `unmatched`.
    ///
    /// # Errors
    ///
    /// `NotFound` when the id does not resolve to an *active* match; an
    /// already-dissolved match is not dissolved (or invalidated) twice.
    pub async fn dissolve_match(&self, match_id: Uuid) -> CoreResult<Outcome<DissolvedMatch>> {
        let mut tx = self.pool.begin().await?;

        let Some(record) = Match::transition_to_dissolved(&mut *tx, match_id).await? else {
            return Err(CoreError::NotFound("active match".to_string()));
        };

        let member_ids = Match::open_member_ids(&mut *tx, match_id).await?;
        Match::close_open_memberships(&mut *tx, match_id).await?;
        Member::mark_unmatched(&mut *tx, &member_ids).await?;

        tx.commit().await?;

        tracing::info!(
            match_id = %match_id,
            affected_members = member_ids.len(),
            "Match dissolved"
        );

        let mut outcome = Outcome::clean(DissolvedMatch {
            details: record,
            affected_member_count: member_ids.len(),
        });

        for member_id in &member_ids {
            if !self.cache.invalidate_member(*member_id).await {
                outcome.warn(SideEffectWarning::cache(format!(
                    "cache purge incomplete for member {}",
                    member_id
                )));
            }
        }
        if !self.cache.invalidate_match(match_id).await {
            outcome.warn(SideEffectWarning::cache(format!(
                "cache purge incomplete for match {}",
                match_id
            )));
        }

        Ok(outcome)
    }

    /// A member's current match with its roster, read through the cache.
    ///
    /// Defined as the open membership row joined to an active match, so
    /// the answer is `None` from the moment a dissolution commits.
    pub async fn current_match(&self, member_id: Uuid) -> CoreResult<Option<MatchWithMembers>> {
        let key = keys::member_current_match_key(member_id);
        self.cache
            .get_cached(&key, keys::TTL_MEDIUM, || async move {
                match Match::current_for_member(&self.pool, member_id).await? {
                    Some(record) => Ok(Some(self.load_roster(record).await?)),
                    None => Ok(None),
                }
            })
            .await
    }

    /// Loads a match with its roster, read through the cache
    pub async fn get_match(&self, match_id: Uuid) -> CoreResult<Option<MatchWithMembers>> {
        let key = keys::match_key(match_id);
        self.cache
            .get_cached(&key, keys::TTL_MEDIUM, || async move {
                match Match::find_by_id(&self.pool, match_id).await? {
                    Some(record) => Ok(Some(self.load_roster(record).await?)),
                    None => Ok(None),
                }
            })
            .await
    }

    /// Joins a match with its open members and their active goals
    async fn load_roster(&self, record: Match) -> CoreResult<MatchWithMembers> {
        let member_ids = Match::open_member_ids(&self.pool, record.id).await?;
        let members = Member::find_by_ids(&self.pool, &member_ids).await?;
        let goals = Goal::active_for_members(&self.pool, &member_ids).await?;

        let members = members
            .into_iter()
            .map(|member| {
                let goal = goals.iter().find(|g| g.member_id == member.id).cloned();
                MemberWithGoal { member, goal }
            })
            .collect();

        Ok(MatchWithMembers {
            details: record,
            members,
        })
    }
}
