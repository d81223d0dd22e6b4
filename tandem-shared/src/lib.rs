//! # Tandem Shared Library
//!
//! This crate contains the models, cache layer, notification layer, and
//! domain services shared by the Tandem API server and its tooling.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `cache`: Redis read-through cache and invalidation helpers
//! - `notify`: Outbound email dispatch (best-effort, audited)
//! - `services`: Member lifecycle, matching, and rematch workflows
//! - `db`: Connection pool and migration utilities
//! - `error`: Common error types and operation outcomes

pub mod cache;
pub mod db;
pub mod error;
pub mod models;
pub mod notify;
pub mod services;

/// Current version of the Tandem shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
