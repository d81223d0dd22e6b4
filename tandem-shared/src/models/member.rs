/// Member model and lifecycle status transitions
///
/// Members are the central entity of the matching platform. The `status`
/// column drives everything: who shows up in the admin "unmatched" list,
/// who may join a match, and who is done onboarding.
///
/// # State Machine
///
/// ```text
/// pending → unmatched          (onboarding completion, exactly once)
/// unmatched ⇄ matched          (match creation / dissolution only)
/// any → inactive               (administrative override, terminal)
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TYPE member_status AS ENUM ('pending', 'unmatched', 'matched', 'inactive');
///
/// CREATE TABLE members (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     name VARCHAR(255) NOT NULL,
///     status member_status NOT NULL DEFAULT 'pending',
///     preferred_communication VARCHAR(50),
///     preferred_match_type VARCHAR(20),
///     commitment_level SMALLINT NOT NULL DEFAULT 5,
///     accountability_style VARCHAR(50),
///     matched_at TIMESTAMPTZ,
///     last_active_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Every status write must be followed by a member cache purge in the same
/// request handler; the transitions here are compare-and-swap updates so a
/// concurrent writer loses cleanly instead of double-applying.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Member lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    /// Invitation redeemed, onboarding not yet complete
    Pending,

    /// Onboarded and available for matching
    Unmatched,

    /// Currently in an active match
    Matched,

    /// Administratively parked; no automatic transitions out
    Inactive,
}

impl MemberStatus {
    /// Converts status to string for cache keys and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Pending => "pending",
            MemberStatus::Unmatched => "unmatched",
            MemberStatus::Matched => "matched",
            MemberStatus::Inactive => "inactive",
        }
    }

    /// Parses a status string (admin API input)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(MemberStatus::Pending),
            "unmatched" => Some(MemberStatus::Unmatched),
            "matched" => Some(MemberStatus::Matched),
            "inactive" => Some(MemberStatus::Inactive),
            _ => None,
        }
    }

    /// Checks if transition to target status is valid
    ///
    /// `pending → unmatched` happens exactly once (onboarding);
    /// `unmatched ⇄ matched` repeats via match creation/dissolution;
    /// anything may be parked `inactive`, which is terminal.
    pub fn can_transition_to(&self, target: MemberStatus) -> bool {
        match (self, target) {
            (MemberStatus::Pending, MemberStatus::Unmatched) => true,
            (MemberStatus::Unmatched, MemberStatus::Matched) => true,
            (MemberStatus::Matched, MemberStatus::Unmatched) => true,
            (MemberStatus::Inactive, _) => false,
            (_, MemberStatus::Inactive) => true,
            _ => false,
        }
    }

    /// True when the member may be placed into a new match
    pub fn is_matchable(&self) -> bool {
        matches!(self, MemberStatus::Unmatched)
    }
}

/// Member model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Member {
    /// Unique member ID
    pub id: Uuid,

    /// Email address, unique across all members
    pub email: String,

    /// Display name
    pub name: String,

    /// Lifecycle status
    pub status: MemberStatus,

    /// Preferred communication channel (e.g., "email", "text", "video")
    pub preferred_communication: Option<String>,

    /// Preferred match type ("one-on-one" or "pod")
    pub preferred_match_type: Option<String>,

    /// Self-reported commitment level, 1-10
    pub commitment_level: i16,

    /// Accountability style (e.g., "gentle", "tough-love")
    pub accountability_style: Option<String>,

    /// When the member last entered a match
    pub matched_at: Option<DateTime<Utc>>,

    /// Last meaningful activity (stamped at onboarding completion)
    pub last_active_at: Option<DateTime<Utc>>,

    /// When the member was created
    pub created_at: DateTime<Utc>,

    /// When the member was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new member (invitation redemption)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMember {
    /// Email address (must match the redeemed invitation)
    pub email: String,

    /// Display name
    pub name: String,
}

/// Matching preferences collected during onboarding
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberPreferences {
    pub preferred_communication: Option<String>,

    pub preferred_match_type: Option<String>,

    /// Commitment level 1-10; values outside the range are rejected by the
    /// database check constraint
    pub commitment_level: Option<i16>,

    pub accountability_style: Option<String>,
}

impl Member {
    /// Creates a new member in `pending` status
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists (unique constraint) or
    /// the database operation fails.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        data: CreateMember,
    ) -> Result<Self, sqlx::Error> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (email, name)
            VALUES ($1, $2)
            RETURNING id, email, name, status, preferred_communication,
                      preferred_match_type, commitment_level, accountability_style,
                      matched_at, last_active_at, created_at, updated_at
            "#,
        )
        .bind(data.email)
        .bind(data.name)
        .fetch_one(executor)
        .await?;

        Ok(member)
    }

    /// Finds a member by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, email, name, status, preferred_communication,
                   preferred_match_type, commitment_level, accountability_style,
                   matched_at, last_active_at, created_at, updated_at
            FROM members
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(member)
    }

    /// Finds a member by email address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, email, name, status, preferred_communication,
                   preferred_match_type, commitment_level, accountability_style,
                   matched_at, last_active_at, created_at, updated_at
            FROM members
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(member)
    }

    /// Lists members by status with pagination, oldest first.
    ///
    /// Drives the admin "unmatched members" view, which is why a stale
    /// cached status is the most consequential bug class in this system.
    pub async fn list_by_status(
        pool: &PgPool,
        status: MemberStatus,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let members = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, email, name, status, preferred_communication,
                   preferred_match_type, commitment_level, accountability_style,
                   matched_at, last_active_at, created_at, updated_at
            FROM members
            WHERE status = $1
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }

    /// Loads several members by id (match roster assembly)
    pub async fn find_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        let members = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, email, name, status, preferred_communication,
                   preferred_match_type, commitment_level, accountability_style,
                   matched_at, last_active_at, created_at, updated_at
            FROM members
            WHERE id = ANY($1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }

    /// Onboarding transition: `pending → unmatched`, stamping
    /// `last_active_at`.
    ///
    /// Compare-and-swap: returns `None` when the member is missing or not
    /// in `pending`, so completing onboarding twice is rejected without a
    /// read-modify-write race.
    pub async fn transition_to_unmatched<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            UPDATE members
            SET status = 'unmatched',
                last_active_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING id, email, name, status, preferred_communication,
                      preferred_match_type, commitment_level, accountability_style,
                      matched_at, last_active_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(member)
    }

    /// Bulk transition `unmatched → matched`, stamping `matched_at`.
    ///
    /// Returns the number of rows updated. A caller placing N members into
    /// a match must verify the count equals N and abort its transaction
    /// otherwise: a short count means some member was not available.
    pub async fn mark_matched<'e, E: PgExecutor<'e>>(
        executor: E,
        member_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE members
            SET status = 'matched',
                matched_at = NOW(),
                updated_at = NOW()
            WHERE id = ANY($1) AND status = 'unmatched'
            "#,
        )
        .bind(member_ids)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Bulk transition `matched → unmatched` (match dissolution)
    pub async fn mark_unmatched<'e, E: PgExecutor<'e>>(
        executor: E,
        member_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE members
            SET status = 'unmatched',
                updated_at = NOW()
            WHERE id = ANY($1) AND status = 'matched'
            "#,
        )
        .bind(member_ids)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Administrative status override, guarded by the expected current
    /// status. Returns `None` when the member is missing or its status
    /// moved underneath the admin.
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        from: MemberStatus,
        to: MemberStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            UPDATE members
            SET status = $3,
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING id, email, name, status, preferred_communication,
                      preferred_match_type, commitment_level, accountability_style,
                      matched_at, last_active_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(pool)
        .await?;

        Ok(member)
    }

    /// Stores onboarding preferences
    pub async fn apply_preferences<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
        prefs: &MemberPreferences,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE members
            SET preferred_communication = COALESCE($2, preferred_communication),
                preferred_match_type = COALESCE($3, preferred_match_type),
                commitment_level = COALESCE($4, commitment_level),
                accountability_style = COALESCE($5, accountability_style),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(prefs.preferred_communication.as_deref())
        .bind(prefs.preferred_match_type.as_deref())
        .bind(prefs.commitment_level)
        .bind(prefs.accountability_style.as_deref())
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Deletes a member. Dependent rows (goals, match memberships, rematch
    /// requests) cascade.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_status_as_str() {
        assert_eq!(MemberStatus::Pending.as_str(), "pending");
        assert_eq!(MemberStatus::Unmatched.as_str(), "unmatched");
        assert_eq!(MemberStatus::Matched.as_str(), "matched");
        assert_eq!(MemberStatus::Inactive.as_str(), "inactive");
    }

    #[test]
    fn test_member_status_parse_round_trip() {
        for status in [
            MemberStatus::Pending,
            MemberStatus::Unmatched,
            MemberStatus::Matched,
            MemberStatus::Inactive,
        ] {
            assert_eq!(MemberStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(MemberStatus::parse("bogus"), None);
    }

    #[test]
    fn test_member_status_transitions() {
        // Onboarding is the only way out of pending
        assert!(MemberStatus::Pending.can_transition_to(MemberStatus::Unmatched));
        assert!(!MemberStatus::Pending.can_transition_to(MemberStatus::Matched));

        // Matching cycle
        assert!(MemberStatus::Unmatched.can_transition_to(MemberStatus::Matched));
        assert!(MemberStatus::Matched.can_transition_to(MemberStatus::Unmatched));
        assert!(!MemberStatus::Unmatched.can_transition_to(MemberStatus::Pending));
        assert!(!MemberStatus::Matched.can_transition_to(MemberStatus::Pending));

        // A member never re-onboards
        assert!(!MemberStatus::Unmatched.can_transition_to(MemberStatus::Unmatched));

        // Administrative parking, from anywhere, terminal
        assert!(MemberStatus::Pending.can_transition_to(MemberStatus::Inactive));
        assert!(MemberStatus::Unmatched.can_transition_to(MemberStatus::Inactive));
        assert!(MemberStatus::Matched.can_transition_to(MemberStatus::Inactive));
        assert!(!MemberStatus::Inactive.can_transition_to(MemberStatus::Unmatched));
        assert!(!MemberStatus::Inactive.can_transition_to(MemberStatus::Matched));
    }

    #[test]
    fn test_only_unmatched_is_matchable() {
        assert!(MemberStatus::Unmatched.is_matchable());
        assert!(!MemberStatus::Pending.is_matchable());
        assert!(!MemberStatus::Matched.is_matchable());
        assert!(!MemberStatus::Inactive.is_matchable());
    }
}
