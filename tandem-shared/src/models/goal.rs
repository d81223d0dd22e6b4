/// Goal model
///
/// Each member has at most one `active` goal at a time (partial unique
/// index). Progress is an integer on a 1-12 scale, clamped on write, and
/// only mutated through the member's own progress updates.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE goal_status AS ENUM ('active', 'completed', 'abandoned');
///
/// CREATE TABLE goals (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     member_id UUID NOT NULL REFERENCES members(id) ON DELETE CASCADE,
///     category VARCHAR(100) NOT NULL,
///     goal_text TEXT NOT NULL,
///     current_progress INTEGER NOT NULL DEFAULT 1,
///     status goal_status NOT NULL DEFAULT 'active',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Lower bound of the progress scale
pub const MIN_PROGRESS: i32 = 1;

/// Upper bound of the progress scale
pub const MAX_PROGRESS: i32 = 12;

/// Goal lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "goal_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Active,
    Completed,
    Abandoned,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
            GoalStatus::Abandoned => "abandoned",
        }
    }
}

/// Goal model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Goal {
    pub id: Uuid,

    /// Owning member
    pub member_id: Uuid,

    /// Goal category (e.g., "fitness", "career")
    pub category: String,

    /// Free-text goal description
    pub goal_text: String,

    /// Progress on a 1-12 scale
    pub current_progress: i32,

    pub status: GoalStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a goal (onboarding)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGoal {
    pub category: String,

    pub goal_text: String,
}

/// Clamps a progress value to the 1-12 scale
pub fn clamp_progress(progress: i32) -> i32 {
    progress.clamp(MIN_PROGRESS, MAX_PROGRESS)
}

impl Goal {
    /// Creates a member's goal at the start of the scale.
    ///
    /// # Errors
    ///
    /// Returns an error if the member already has an active goal (partial
    /// unique index) or the database operation fails.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        member_id: Uuid,
        data: NewGoal,
    ) -> Result<Self, sqlx::Error> {
        let goal = sqlx::query_as::<_, Goal>(
            r#"
            INSERT INTO goals (member_id, category, goal_text)
            VALUES ($1, $2, $3)
            RETURNING id, member_id, category, goal_text, current_progress,
                      status, created_at, updated_at
            "#,
        )
        .bind(member_id)
        .bind(data.category)
        .bind(data.goal_text)
        .fetch_one(executor)
        .await?;

        Ok(goal)
    }

    /// Finds a member's active goal
    pub async fn active_for_member(
        pool: &PgPool,
        member_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let goal = sqlx::query_as::<_, Goal>(
            r#"
            SELECT id, member_id, category, goal_text, current_progress,
                   status, created_at, updated_at
            FROM goals
            WHERE member_id = $1 AND status = 'active'
            "#,
        )
        .bind(member_id)
        .fetch_optional(pool)
        .await?;

        Ok(goal)
    }

    /// Loads the active goals for a set of members (match roster assembly)
    pub async fn active_for_members(
        pool: &PgPool,
        member_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        let goals = sqlx::query_as::<_, Goal>(
            r#"
            SELECT id, member_id, category, goal_text, current_progress,
                   status, created_at, updated_at
            FROM goals
            WHERE member_id = ANY($1) AND status = 'active'
            "#,
        )
        .bind(member_ids)
        .fetch_all(pool)
        .await?;

        Ok(goals)
    }

    /// Updates the member's active goal progress, clamped to 1-12.
    ///
    /// Returns `None` when the member has no active goal.
    pub async fn update_progress(
        pool: &PgPool,
        member_id: Uuid,
        progress: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        let goal = sqlx::query_as::<_, Goal>(
            r#"
            UPDATE goals
            SET current_progress = $2,
                updated_at = NOW()
            WHERE member_id = $1 AND status = 'active'
            RETURNING id, member_id, category, goal_text, current_progress,
                      status, created_at, updated_at
            "#,
        )
        .bind(member_id)
        .bind(clamp_progress(progress))
        .fetch_optional(pool)
        .await?;

        Ok(goal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_progress() {
        assert_eq!(clamp_progress(-3), 1);
        assert_eq!(clamp_progress(0), 1);
        assert_eq!(clamp_progress(1), 1);
        assert_eq!(clamp_progress(7), 7);
        assert_eq!(clamp_progress(12), 12);
        assert_eq!(clamp_progress(13), 12);
        assert_eq!(clamp_progress(100), 12);
    }

    #[test]
    fn test_goal_status_as_str() {
        assert_eq!(GoalStatus::Active.as_str(), "active");
        assert_eq!(GoalStatus::Completed.as_str(), "completed");
        assert_eq!(GoalStatus::Abandoned.as_str(), "abandoned");
    }
}
