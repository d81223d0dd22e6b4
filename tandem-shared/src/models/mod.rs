/// Database models for Tandem
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `member`: Members and their lifecycle status
/// - `goal`: Accountability goals (one active per member)
/// - `matches`: Matches and the match-member join entity
/// - `rematch_request`: Rematch request workflow
/// - `invitation`: Token-based invitations
/// - `email_log`: Outbound email audit trail
///
/// # Example
///
/// ```no_run
/// use tandem_shared::models::member::{Member, CreateMember};
/// use tandem_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let member = Member::create(&pool, CreateMember {
///     email: "member@example.com".to_string(),
///     name: "Jane Runner".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod email_log;
pub mod goal;
pub mod invitation;
pub mod matches;
pub mod member;
pub mod rematch_request;
