/// Rematch request model
///
/// A matched member may ask to be re-matched. Requests go through an admin
/// review queue; resolution is purely a status change and never touches the
/// member's match. "Approved" and "actually rematched" are distinct states,
/// and the admin dissolves/creates matches as a separate manual step.
///
/// # State Machine
///
/// ```text
/// pending → approved    (terminal for this request)
/// pending → denied      (terminal for this request)
/// ```
///
/// A member may hold at most one `pending` request; after resolution a new
/// request may be submitted.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE rematch_status AS ENUM ('pending', 'approved', 'denied');
///
/// CREATE TABLE rematch_requests (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     member_id UUID NOT NULL REFERENCES members(id) ON DELETE CASCADE,
///     current_match_id UUID REFERENCES matches(id) ON DELETE SET NULL,
///     reason TEXT NOT NULL,
///     preferred_match_type VARCHAR(20),
///     preferred_partner VARCHAR(255),
///     status rematch_status NOT NULL DEFAULT 'pending',
///     admin_notes TEXT,
///     resolved_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// -- At most one pending request per member
/// CREATE UNIQUE INDEX idx_rematch_requests_one_pending_per_member
///     ON rematch_requests (member_id) WHERE status = 'pending';
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Minimum length of the free-text reason
pub const MIN_REASON_LEN: usize = 10;

/// Rematch request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "rematch_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RematchStatus {
    /// Awaiting admin review
    Pending,

    /// Admin agreed; the member stays matched until the old match is
    /// explicitly dissolved
    Approved,

    /// Admin declined
    Denied,
}

impl RematchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RematchStatus::Pending => "pending",
            RematchStatus::Approved => "approved",
            RematchStatus::Denied => "denied",
        }
    }

    /// Approved and denied are terminal; no request leaves either
    pub fn is_terminal(&self) -> bool {
        matches!(self, RematchStatus::Approved | RematchStatus::Denied)
    }
}

/// Rematch request model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RematchRequest {
    pub id: Uuid,

    pub member_id: Uuid,

    /// The member's match at submission time, captured as an immutable
    /// snapshot; later dissolution does not rewrite it. Nullable: the UI
    /// gates unmatched submitters, the data model does not.
    pub current_match_id: Option<Uuid>,

    /// Why the member wants a new partner (at least 10 characters)
    pub reason: String,

    pub preferred_match_type: Option<String>,

    pub preferred_partner: Option<String>,

    pub status: RematchStatus,

    /// Set on admin resolution
    pub admin_notes: Option<String>,

    /// Set on admin resolution
    pub resolved_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

/// Input for submitting a rematch request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRematchRequest {
    pub member_id: Uuid,

    pub current_match_id: Option<Uuid>,

    pub reason: String,

    pub preferred_match_type: Option<String>,

    pub preferred_partner: Option<String>,
}

impl RematchRequest {
    /// Inserts a new pending request.
    ///
    /// # Errors
    ///
    /// Returns an error if the member already has a pending request
    /// (partial unique index) or the database operation fails.
    pub async fn create(pool: &PgPool, data: CreateRematchRequest) -> Result<Self, sqlx::Error> {
        let request = sqlx::query_as::<_, RematchRequest>(
            r#"
            INSERT INTO rematch_requests
                (member_id, current_match_id, reason, preferred_match_type, preferred_partner)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, member_id, current_match_id, reason, preferred_match_type,
                      preferred_partner, status, admin_notes, resolved_at, created_at
            "#,
        )
        .bind(data.member_id)
        .bind(data.current_match_id)
        .bind(data.reason)
        .bind(data.preferred_match_type)
        .bind(data.preferred_partner)
        .fetch_one(pool)
        .await?;

        Ok(request)
    }

    /// Finds a request by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let request = sqlx::query_as::<_, RematchRequest>(
            r#"
            SELECT id, member_id, current_match_id, reason, preferred_match_type,
                   preferred_partner, status, admin_notes, resolved_at, created_at
            FROM rematch_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(request)
    }

    /// The member's pending request, if any (checked before insert)
    pub async fn find_pending_for_member(
        pool: &PgPool,
        member_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let request = sqlx::query_as::<_, RematchRequest>(
            r#"
            SELECT id, member_id, current_match_id, reason, preferred_match_type,
                   preferred_partner, status, admin_notes, resolved_at, created_at
            FROM rematch_requests
            WHERE member_id = $1 AND status = 'pending'
            "#,
        )
        .bind(member_id)
        .fetch_optional(pool)
        .await?;

        Ok(request)
    }

    /// The admin review queue, oldest first
    pub async fn list_pending(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let requests = sqlx::query_as::<_, RematchRequest>(
            r#"
            SELECT id, member_id, current_match_id, reason, preferred_match_type,
                   preferred_partner, status, admin_notes, resolved_at, created_at
            FROM rematch_requests
            WHERE status = 'pending'
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(requests)
    }

    /// Resolution transition: `pending → approved|denied`, stamping
    /// `resolved_at` and storing the admin notes.
    ///
    /// Compare-and-swap: returns `None` when the request is missing or no
    /// longer pending, so resolving twice is rejected.
    pub async fn transition_to_resolved(
        pool: &PgPool,
        id: Uuid,
        resolution: RematchStatus,
        admin_notes: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        debug_assert!(resolution.is_terminal());

        let request = sqlx::query_as::<_, RematchRequest>(
            r#"
            UPDATE rematch_requests
            SET status = $2,
                admin_notes = $3,
                resolved_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING id, member_id, current_match_id, reason, preferred_match_type,
                      preferred_partner, status, admin_notes, resolved_at, created_at
            "#,
        )
        .bind(id)
        .bind(resolution)
        .bind(admin_notes)
        .fetch_optional(pool)
        .await?;

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rematch_status_as_str() {
        assert_eq!(RematchStatus::Pending.as_str(), "pending");
        assert_eq!(RematchStatus::Approved.as_str(), "approved");
        assert_eq!(RematchStatus::Denied.as_str(), "denied");
    }

    #[test]
    fn test_terminal_states() {
        assert!(!RematchStatus::Pending.is_terminal());
        assert!(RematchStatus::Approved.is_terminal());
        assert!(RematchStatus::Denied.is_terminal());
    }

    #[test]
    fn test_min_reason_len() {
        // "partner ghosted me" qualifies, "too quiet" does not
        assert!("partner ghosted me".len() >= MIN_REASON_LEN);
        assert!("too quiet".len() < MIN_REASON_LEN);
    }
}
