/// Invitation model
///
/// Members join by invitation only. An invitation carries a random token
/// and a 7-day expiry; redeeming it creates the member in `pending` status
/// and flips the invitation to `accepted`. Re-inviting an email reuses the
/// existing row (token rotated, expiry extended) instead of accumulating
/// duplicates, and an `accepted` invitation can never be resent.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE invitation_status AS ENUM ('pending', 'accepted', 'expired');
///
/// CREATE TABLE invitations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     token VARCHAR(64) NOT NULL UNIQUE,
///     status invitation_status NOT NULL DEFAULT 'pending',
///     expires_at TIMESTAMPTZ NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Invitations are valid for 7 days from creation or rotation
pub const INVITATION_VALID_DAYS: i64 = 7;

/// Random bytes per token (hex-encoded to 64 characters)
const TOKEN_BYTES: usize = 32;

/// Invitation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    /// Issued, awaiting redemption
    Pending,

    /// Redeemed; a member exists for this email
    Accepted,

    /// Past its expiry; may be re-issued with a fresh token
    Expired,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Expired => "expired",
        }
    }
}

/// Invitation model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invitation {
    pub id: Uuid,

    /// Invited email address, unique per invitation row
    pub email: String,

    /// Opaque redemption token (rotated on re-invite)
    pub token: String,

    pub status: InvitationStatus,

    pub expires_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Generates a fresh random token
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Expiry timestamp for a token issued now
pub fn expiry_from(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(INVITATION_VALID_DAYS)
}

impl Invitation {
    /// True when the invitation can no longer be redeemed as-is
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Expired || self.expires_at <= now
    }

    /// Inserts a new pending invitation with a fresh token
    pub async fn create(pool: &PgPool, email: &str) -> Result<Self, sqlx::Error> {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            INSERT INTO invitations (email, token, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, email, token, status, expires_at, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(generate_token())
        .bind(expiry_from(Utc::now()))
        .fetch_one(pool)
        .await?;

        Ok(invitation)
    }

    /// Finds an invitation by email
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, email, token, status, expires_at, created_at, updated_at
            FROM invitations
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(invitation)
    }

    /// Finds an invitation by token
    pub async fn find_by_token(pool: &PgPool, token: &str) -> Result<Option<Self>, sqlx::Error> {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, email, token, status, expires_at, created_at, updated_at
            FROM invitations
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await?;

        Ok(invitation)
    }

    /// Re-issues an existing `pending`/`expired` invitation: rotates the
    /// token, resets the expiry to now + 7 days, and resets the status.
    ///
    /// Guarded so an `accepted` invitation is never rotated; returns `None`
    /// in that case.
    pub async fn rotate(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            UPDATE invitations
            SET token = $2,
                expires_at = $3,
                status = 'pending',
                updated_at = NOW()
            WHERE id = $1 AND status <> 'accepted'
            RETURNING id, email, token, status, expires_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(generate_token())
        .bind(expiry_from(Utc::now()))
        .fetch_optional(pool)
        .await?;

        Ok(invitation)
    }

    /// Redemption transition: `pending → accepted`.
    ///
    /// Compare-and-swap: returns `None` when the invitation was already
    /// accepted (or otherwise left `pending`) by a concurrent redemption.
    pub async fn transition_to_accepted<'e, E: PgExecutor<'e>>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            UPDATE invitations
            SET status = 'accepted',
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING id, email, token, status, expires_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(invitation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_unique_hex() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), TOKEN_BYTES * 2);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_expiry_is_seven_days_out() {
        let now = Utc::now();
        let expiry = expiry_from(now);
        assert_eq!(expiry - now, Duration::days(7));
    }

    #[test]
    fn test_is_expired() {
        let now = Utc::now();
        let invitation = Invitation {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            token: generate_token(),
            status: InvitationStatus::Pending,
            expires_at: expiry_from(now),
            created_at: now,
            updated_at: now,
        };
        assert!(!invitation.is_expired(now));

        // Past the deadline
        assert!(invitation.is_expired(now + Duration::days(8)));

        // Status wins even with time left on the clock
        let expired = Invitation {
            status: InvitationStatus::Expired,
            ..invitation
        };
        assert!(expired.is_expired(now));
    }
}
