/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `invitations`: Invitation creation and redemption
/// - `members`: Member administration, onboarding, goals, current match
/// - `matches`: Match creation and dissolution
/// - `rematch_requests`: Rematch request submission and review

pub mod health;
pub mod invitations;
pub mod matches;
pub mod members;
pub mod rematch_requests;
