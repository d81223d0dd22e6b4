/// Domain services for the member lifecycle
///
/// Each service is constructed once at process start with its dependencies
/// (pool, cache client, notifier) and lives until shutdown: no
/// module-level globals, no implicit re-initialization.
///
/// Every mutating operation follows the same commit-and-invalidate shape:
///
/// 1. All database statements run inside one transaction; a validation or
///    conflict failure aborts with zero committed writes.
/// 2. Cache invalidation runs only after a successful commit and is
///    fire-and-forget (a failed purge becomes an [`Outcome`] warning).
/// 3. Email dispatch runs last and is equally best-effort.
///
/// DB failure blocks the cache step; cache failure never blocks nor
/// reverses the DB step.
///
/// [`Outcome`]: crate::error::Outcome

pub mod matching;
pub mod onboarding;
pub mod rematch;

pub use matching::MatchManager;
pub use onboarding::OnboardingService;
pub use rematch::RematchService;

use crate::error::CoreError;

/// Maps a unique-constraint violation to a domain conflict, leaving every
/// other database error untouched.
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: &str) -> CoreError {
    match &err {
        sqlx::Error::Database(db) if db.constraint().is_some() => {
            CoreError::Conflict(message.to_string())
        }
        _ => CoreError::Database(err),
    }
}
