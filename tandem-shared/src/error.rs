/// Common error types for the Tandem core
///
/// All domain services return `Result<T, CoreError>`. The taxonomy mirrors
/// how callers must react: validation and conflict errors abort the whole
/// operation with no partial state change; a `Database` error is an
/// infrastructure failure.
///
/// Side-effect failures (email delivery, cache invalidation) are *not*
/// errors. Mutating operations return [`Outcome`], which carries the
/// committed primary result together with any [`SideEffectWarning`]s, so a
/// failed email never masks a successful match creation.

use thiserror::Error;

/// Result alias used throughout the domain services
pub type CoreResult<T> = Result<T, CoreError>;

/// Unified domain error
#[derive(Debug, Error)]
pub enum CoreError {
    /// Bad input shape or size (member count, reason length, ...)
    #[error("validation failed: {0}")]
    Validation(String),

    /// Current state disallows the request (duplicate pending rematch,
    /// invitation already accepted, request already resolved, ...)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Id does not resolve to a live row
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller lacks the required role
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Underlying database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CoreError {
    /// Short machine-readable code for logs and API bodies
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "validation_error",
            CoreError::Conflict(_) => "conflict",
            CoreError::NotFound(_) => "not_found",
            CoreError::Unauthorized(_) => "unauthorized",
            CoreError::Database(_) => "database_error",
        }
    }
}

/// Which best-effort side effect degraded
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideEffectKind {
    /// Cache invalidation did not complete; readers may see stale data
    /// for up to one TTL
    Cache,

    /// An email could not be delivered (recorded in the email log)
    Email,
}

/// A contained side-effect failure attached to a successful mutation
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SideEffectWarning {
    /// Which side effect degraded
    pub kind: SideEffectKind,

    /// Human-readable detail for operators
    pub detail: String,
}

impl SideEffectWarning {
    pub fn cache(detail: impl Into<String>) -> Self {
        Self {
            kind: SideEffectKind::Cache,
            detail: detail.into(),
        }
    }

    pub fn email(detail: impl Into<String>) -> Self {
        Self {
            kind: SideEffectKind::Email,
            detail: detail.into(),
        }
    }
}

/// The result of a mutating operation: the committed primary value plus
/// warnings from best-effort side effects that did not complete.
///
/// The primary mutation is the source of truth. Cache and email failures
/// must never roll it back or surface as errors; they accumulate here so
/// tests and operators can observe them independently.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Outcome<T> {
    /// The committed result of the primary mutation
    pub value: T,

    /// Side effects that degraded (empty on the happy path)
    pub warnings: Vec<SideEffectWarning>,
}

impl<T> Outcome<T> {
    /// Wraps a value with no warnings
    pub fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    /// Appends a warning
    pub fn warn(&mut self, warning: SideEffectWarning) {
        self.warnings.push(warning);
    }

    /// True when every side effect completed
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(CoreError::Validation("x".into()).code(), "validation_error");
        assert_eq!(CoreError::Conflict("x".into()).code(), "conflict");
        assert_eq!(CoreError::NotFound("x".into()).code(), "not_found");
        assert_eq!(CoreError::Unauthorized("x".into()).code(), "unauthorized");
    }

    #[test]
    fn test_error_display() {
        let err = CoreError::Validation("reason must be at least 10 characters".into());
        assert_eq!(
            err.to_string(),
            "validation failed: reason must be at least 10 characters"
        );
    }

    #[test]
    fn test_outcome_accumulates_warnings() {
        let mut outcome = Outcome::clean(42);
        assert!(outcome.is_clean());

        outcome.warn(SideEffectWarning::cache("purge failed for member:1"));
        outcome.warn(SideEffectWarning::email("mailer timed out"));

        assert!(!outcome.is_clean());
        assert_eq!(outcome.value, 42);
        assert_eq!(outcome.warnings.len(), 2);
        assert_eq!(outcome.warnings[0].kind, SideEffectKind::Cache);
        assert_eq!(outcome.warnings[1].kind, SideEffectKind::Email);
    }
}
