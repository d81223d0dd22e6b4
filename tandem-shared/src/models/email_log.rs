/// Outbound email audit trail
///
/// Every email the platform tries to send is recorded here, including
/// failures. Delivery problems never propagate to the caller, so this log
/// is the only place they are visible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Delivery result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "email_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EmailStatus {
    Sent,
    Failed,
}

impl EmailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailStatus::Sent => "sent",
            EmailStatus::Failed => "failed",
        }
    }
}

/// One logged delivery attempt
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EmailLog {
    pub id: Uuid,

    /// Recipient member, if known (NULL for pre-signup invitations)
    pub member_id: Option<Uuid>,

    pub recipient: String,

    /// Template name (e.g., "match-made", "welcome")
    pub template: String,

    pub subject: String,

    pub status: EmailStatus,

    /// Transport error detail when status is `failed`
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Input for recording a delivery attempt
#[derive(Debug, Clone)]
pub struct NewEmailLog<'a> {
    pub member_id: Option<Uuid>,
    pub recipient: &'a str,
    pub template: &'a str,
    pub subject: &'a str,
    pub status: EmailStatus,
    pub error: Option<&'a str>,
}

impl EmailLog {
    /// Appends a delivery attempt to the log
    pub async fn record(pool: &PgPool, data: NewEmailLog<'_>) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO email_log (member_id, recipient, template, subject, status, error)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(data.member_id)
        .bind(data.recipient)
        .bind(data.template)
        .bind(data.subject)
        .bind(data.status)
        .bind(data.error)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Delivery history for a member, newest first
    pub async fn list_for_member(
        pool: &PgPool,
        member_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let entries = sqlx::query_as::<_, EmailLog>(
            r#"
            SELECT id, member_id, recipient, template, subject, status, error, created_at
            FROM email_log
            WHERE member_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(member_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_status_as_str() {
        assert_eq!(EmailStatus::Sent.as_str(), "sent");
        assert_eq!(EmailStatus::Failed.as_str(), "failed");
    }
}
