/// Match model and the match-member join entity
///
/// A match groups two or more members for mutual accountability. Members
/// join through `match_members` rows; a member's *current match* is the
/// row with `left_at IS NULL` joined to a match with `status = 'active'`,
/// so dissolution (which stamps both `dissolved_at` and `left_at`) is the
/// only way to clear it.
///
/// # State Machine
///
/// ```text
/// active → dissolved    (terminal; no resurrection)
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TYPE match_type AS ENUM ('one-on-one', 'pod');
/// CREATE TYPE match_status AS ENUM ('active', 'dissolved');
///
/// CREATE TABLE matches (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     match_type match_type NOT NULL,
///     status match_status NOT NULL DEFAULT 'active',
///     notes TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     dissolved_at TIMESTAMPTZ
/// );
///
/// CREATE TABLE match_members (
///     match_id UUID NOT NULL REFERENCES matches(id) ON DELETE CASCADE,
///     member_id UUID NOT NULL REFERENCES members(id) ON DELETE CASCADE,
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     left_at TIMESTAMPTZ,
///     PRIMARY KEY (match_id, member_id)
/// );
///
/// -- At most one open membership row per member
/// CREATE UNIQUE INDEX idx_match_members_one_open_per_member
///     ON match_members (member_id) WHERE left_at IS NULL;
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Pod size bounds, enforced server-side at match creation
pub const POD_MIN_MEMBERS: usize = 3;
pub const POD_MAX_MEMBERS: usize = 5;

/// Match format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "match_type", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum MatchType {
    /// Exactly two members
    OneOnOne,

    /// Small group, 3-5 members
    Pod,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::OneOnOne => "one-on-one",
            MatchType::Pod => "pod",
        }
    }

    /// Checks whether a member count is valid for this format
    pub fn allows_size(&self, count: usize) -> bool {
        match self {
            MatchType::OneOnOne => count == 2,
            MatchType::Pod => (POD_MIN_MEMBERS..=POD_MAX_MEMBERS).contains(&count),
        }
    }

    /// Human-readable size requirement for validation messages
    pub fn size_requirement(&self) -> &'static str {
        match self {
            MatchType::OneOnOne => "exactly 2 members",
            MatchType::Pod => "3 to 5 members",
        }
    }
}

/// Match lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "match_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Active,
    Dissolved,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Active => "active",
            MatchStatus::Dissolved => "dissolved",
        }
    }

    /// Dissolved is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchStatus::Dissolved)
    }
}

/// Match model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Match {
    pub id: Uuid,

    pub match_type: MatchType,

    pub status: MatchStatus,

    /// Admin notes attached at creation
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,

    /// Set exactly once, at dissolution
    pub dissolved_at: Option<DateTime<Utc>>,
}

/// Join entity tying a member to a match
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MatchMember {
    pub match_id: Uuid,

    pub member_id: Uuid,

    pub joined_at: DateTime<Utc>,

    /// Set when the match is dissolved; NULL marks the open membership
    pub left_at: Option<DateTime<Utc>>,
}

impl Match {
    /// Inserts a new active match
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        match_type: MatchType,
        notes: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        let record = sqlx::query_as::<_, Match>(
            r#"
            INSERT INTO matches (match_type, notes)
            VALUES ($1, $2)
            RETURNING id, match_type, status, notes, created_at, dissolved_at
            "#,
        )
        .bind(match_type)
        .bind(notes)
        .fetch_one(executor)
        .await?;

        Ok(record)
    }

    /// Bulk-inserts the membership rows for a new match.
    ///
    /// # Errors
    ///
    /// Returns an error if any member already has an open membership row
    /// (partial unique index) or the database operation fails.
    pub async fn add_members<'e, E: PgExecutor<'e>>(
        executor: E,
        match_id: Uuid,
        member_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO match_members (match_id, member_id)
            SELECT $1, UNNEST($2::uuid[])
            "#,
        )
        .bind(match_id)
        .bind(member_ids)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Finds a match by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let record = sqlx::query_as::<_, Match>(
            r#"
            SELECT id, match_type, status, notes, created_at, dissolved_at
            FROM matches
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Dissolution transition: `active → dissolved`, stamping
    /// `dissolved_at`.
    ///
    /// Compare-and-swap: returns `None` when the match is missing or
    /// already dissolved, so a double-dissolve performs zero writes.
    pub async fn transition_to_dissolved<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let record = sqlx::query_as::<_, Match>(
            r#"
            UPDATE matches
            SET status = 'dissolved',
                dissolved_at = NOW()
            WHERE id = $1 AND status = 'active'
            RETURNING id, match_type, status, notes, created_at, dissolved_at
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(record)
    }

    /// Member ids of the still-open membership rows for a match
    pub async fn open_member_ids<'e, E: PgExecutor<'e>>(
        executor: E,
        match_id: Uuid,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        let ids: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT member_id
            FROM match_members
            WHERE match_id = $1 AND left_at IS NULL
            "#,
        )
        .bind(match_id)
        .fetch_all(executor)
        .await?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    /// Stamps `left_at` on every open membership row of a match, returning
    /// the number of members released
    pub async fn close_open_memberships<'e, E: PgExecutor<'e>>(
        executor: E,
        match_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE match_members
            SET left_at = NOW()
            WHERE match_id = $1 AND left_at IS NULL
            "#,
        )
        .bind(match_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// A member's current match: open membership row joined to an active
    /// match. At most one row can exist thanks to the partial unique index.
    pub async fn current_for_member(
        pool: &PgPool,
        member_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let record = sqlx::query_as::<_, Match>(
            r#"
            SELECT m.id, m.match_type, m.status, m.notes, m.created_at, m.dissolved_at
            FROM matches m
            JOIN match_members mm ON mm.match_id = m.id
            WHERE mm.member_id = $1
              AND mm.left_at IS NULL
              AND m.status = 'active'
            "#,
        )
        .bind(member_id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_type_as_str() {
        assert_eq!(MatchType::OneOnOne.as_str(), "one-on-one");
        assert_eq!(MatchType::Pod.as_str(), "pod");
    }

    #[test]
    fn test_one_on_one_requires_exactly_two() {
        assert!(!MatchType::OneOnOne.allows_size(0));
        assert!(!MatchType::OneOnOne.allows_size(1));
        assert!(MatchType::OneOnOne.allows_size(2));
        assert!(!MatchType::OneOnOne.allows_size(3));
    }

    #[test]
    fn test_pod_size_bounds() {
        assert!(!MatchType::Pod.allows_size(2));
        assert!(MatchType::Pod.allows_size(3));
        assert!(MatchType::Pod.allows_size(4));
        assert!(MatchType::Pod.allows_size(5));
        assert!(!MatchType::Pod.allows_size(6));
    }

    #[test]
    fn test_match_status_terminal() {
        assert!(!MatchStatus::Active.is_terminal());
        assert!(MatchStatus::Dissolved.is_terminal());
    }
}
