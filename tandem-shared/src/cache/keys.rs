/// Cache key construction and invalidation patterns
///
/// Keys are deterministic functions of entity ids; no entity metadata is
/// stored in-band. Each entity family has a declarative list of key
/// patterns that its invalidation helper purges, so every mutating
/// operation invalidates exactly one well-known set.

use uuid::Uuid;

use crate::models::member::MemberStatus;

/// Short-lived entries: admin lists that must track mutations closely
pub const TTL_SHORT: u64 = 60;

/// Default tier: entity profiles and current-match lookups
pub const TTL_MEDIUM: u64 = 300;

/// Long-lived entries: rarely-changing reference data
pub const TTL_LONG: u64 = 3600;

/// Key for a member's profile
pub fn member_key(member_id: Uuid) -> String {
    format!("member:{}", member_id)
}

/// Key for a member's current-match lookup
pub fn member_current_match_key(member_id: Uuid) -> String {
    format!("member:{}:current-match", member_id)
}

/// Key for one page of the admin member list, scoped by status
pub fn members_by_status_key(status: MemberStatus, limit: i64, offset: i64) -> String {
    format!("members:status:{}:{}:{}", status.as_str(), limit, offset)
}

/// Key for a match with its member roster
pub fn match_key(match_id: Uuid) -> String {
    format!("match:{}", match_id)
}

/// Key for the admin pending-rematch queue
pub fn pending_rematch_key() -> String {
    "rematch-requests:pending".to_string()
}

/// Patterns purged when anything about a member changes.
///
/// Covers the profile, every member-scoped sub-key, and all admin list
/// pages (a status change moves the member between lists).
pub fn member_patterns(member_id: Uuid) -> Vec<String> {
    vec![
        format!("member:{}", member_id),
        format!("member:{}:*", member_id),
        "members:status:*".to_string(),
    ]
}

/// Patterns purged when a match is created or dissolved
pub fn match_patterns(match_id: Uuid) -> Vec<String> {
    vec![format!("match:{}", match_id)]
}

/// Patterns purged when a rematch request is submitted or resolved
pub fn rematch_patterns() -> Vec<String> {
    vec!["rematch-requests:*".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_deterministic() {
        let id = Uuid::nil();
        assert_eq!(
            member_key(id),
            "member:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(
            member_current_match_key(id),
            "member:00000000-0000-0000-0000-000000000000:current-match"
        );
        assert_eq!(
            match_key(id),
            "match:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(pending_rematch_key(), "rematch-requests:pending");
    }

    #[test]
    fn test_member_list_key_includes_page() {
        let key = members_by_status_key(MemberStatus::Unmatched, 20, 40);
        assert_eq!(key, "members:status:unmatched:20:40");
    }

    #[test]
    fn test_member_patterns_cover_profile_and_lists() {
        let id = Uuid::nil();
        let patterns = member_patterns(id);
        assert!(patterns.contains(&member_key(id)));
        assert!(patterns.iter().any(|p| p.ends_with(":*")));
        assert!(patterns.contains(&"members:status:*".to_string()));
    }

    #[test]
    fn test_ttl_tiers() {
        assert!(TTL_SHORT < TTL_MEDIUM);
        assert!(TTL_MEDIUM < TTL_LONG);
        assert_eq!(TTL_SHORT, 60);
        assert_eq!(TTL_MEDIUM, 300);
        assert_eq!(TTL_LONG, 3600);
    }
}
