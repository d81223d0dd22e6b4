/// Redis caching for Tandem
///
/// Read-through caching with explicit, per-entity invalidation. The cache
/// is a pure performance layer and never a source of truth:
///
/// - An unconfigured or unreachable Redis is a fully supported mode; every
///   lookup silently degrades to direct computation.
/// - Invalidation is fire-and-forget. A failed purge is logged and reported
///   as a warning, never as an error, so a cache outage cannot block the
///   business mutation that triggered it.
/// - Staleness is bounded by the entry TTL plus explicit purges issued
///   right after each database commit.
///
/// # Example
///
/// ```no_run
/// use tandem_shared::cache::{CacheClient, keys};
///
/// # async fn example() -> Result<(), tandem_shared::error::CoreError> {
/// let cache = CacheClient::connect(Some("redis://localhost:6379")).await;
///
/// let profile: Option<String> = cache
///     .get_cached(&keys::member_key(uuid::Uuid::new_v4()), keys::TTL_MEDIUM, || async {
///         Ok(Some("computed".to_string()))
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```

pub mod client;
pub mod keys;

pub use client::CacheClient;
