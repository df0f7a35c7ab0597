use serde::{Deserialize, Serialize};

/// Baseline role every principal receives at registration.
pub const BASELINE_ROLE: &str = "user";
/// Service Dashboard read access.
pub const SD_USER: &str = "SDuser";
/// Service Dashboard admin.
pub const SD_ADMIN: &str = "SDadmin";
/// IndusIT Dashboard read access.
pub const ID_USER: &str = "IDuser";
/// IndusIT Dashboard admin.
pub const ID_ADMIN: &str = "IDadmin";
/// All-access role: satisfies every capability check regardless of the
/// specific roles a route requires.
pub const ALL_ACCESS_ROLE: &str = "appadmin";

/// Every role token the application recognizes. Tokens are fixed,
/// code-defined strings compared byte-for-byte; no normalization.
pub const ROLE_VOCABULARY: &[&str] = &[
    BASELINE_ROLE,
    SD_USER,
    SD_ADMIN,
    ID_USER,
    ID_ADMIN,
    ALL_ACCESS_ROLE,
];

/// Roles a principal may ask for through the request workflow. The
/// baseline role is granted at registration and the all-access role is
/// only ever assigned through the bulk-replace admin path.
pub const REQUESTABLE_ROLES: &[&str] = &[SD_USER, SD_ADMIN, ID_USER, ID_ADMIN];

pub fn is_recognized_role(token: &str) -> bool {
    ROLE_VOCABULARY.contains(&token)
}

pub fn is_requestable_role(token: &str) -> bool {
    REQUESTABLE_ROLES.contains(&token)
}

/// Admin roles with authority to resolve a request for `role`. The
/// all-access role always has authority; that bypass lives in
/// [`can_resolve`], not here.
pub fn admin_roles_for(role: &str) -> &'static [&'static str] {
    match role {
        SD_USER | SD_ADMIN => &[SD_ADMIN],
        ID_USER | ID_ADMIN => &[ID_ADMIN],
        _ => &[],
    }
}

/// Canonical, deduplicated set of role tokens held by a principal.
///
/// Stored as a sorted vector so equality, serialization and membership
/// checks are all order-independent. Construct via [`resolve_roles`] or
/// [`RoleSet::from_tokens`]; both dedupe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(Vec<String>);

impl RoleSet {
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut roles: Vec<String> = tokens.into_iter().map(Into::into).collect();
        roles.sort();
        roles.dedup();
        RoleSet(roles)
    }

    pub fn contains(&self, role: &str) -> bool {
        self.0.binary_search_by(|held| held.as_str().cmp(role)).is_ok()
    }

    /// Adds a role, keeping the set sorted. Returns false if the role
    /// was already present (idempotent union).
    pub fn insert(&mut self, role: &str) -> bool {
        match self.0.binary_search_by(|held| held.as_str().cmp(role)) {
            Ok(_) => false,
            Err(pos) => {
                self.0.insert(pos, role.to_string());
                true
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Normalizes a principal's stored role information into a canonical set.
///
/// Stored records may carry a `roles` list, only the legacy single-role
/// scalar from before the multi-role migration, or neither. Precedence:
/// a non-empty `roles` list wins (deduplicated), then a non-empty
/// `legacy_role`, then the baseline role. The result is never empty.
///
/// Unknown tokens pass through unchanged; request-time vocabulary
/// validation belongs to the lifecycle manager, not the resolver.
pub fn resolve_roles(roles: Option<&[String]>, legacy_role: Option<&str>) -> RoleSet {
    match roles {
        Some(list) if !list.is_empty() => RoleSet::from_tokens(list.iter().cloned()),
        _ => match legacy_role {
            Some(role) if !role.is_empty() => RoleSet::from_tokens([role]),
            _ => RoleSet::from_tokens([BASELINE_ROLE]),
        },
    }
}

/// Decides whether a role set satisfies a route/feature requirement.
///
/// An empty `required` list means any authenticated principal suffices.
/// The all-access role passes every check. Otherwise the set must
/// intersect `required`. Inactive principals must be screened out by the
/// caller (they have an empty effective role set).
pub fn has_capability(role_set: &RoleSet, required: &[&str]) -> bool {
    if required.is_empty() {
        return true;
    }
    if role_set.contains(ALL_ACCESS_ROLE) {
        return true;
    }
    required.iter().any(|role| role_set.contains(role))
}

/// Advisory check used by the whoami/profile surface: can this principal
/// sensibly submit a request for `candidate`? False if the role is
/// already held or already has an outstanding pending request. The
/// lifecycle manager re-enforces both rules authoritatively at creation
/// time; never trust a client-side pass of this check.
pub fn can_request_role(role_set: &RoleSet, pending_requested_roles: &[String], candidate: &str) -> bool {
    if role_set.contains(candidate) {
        return false;
    }
    !pending_requested_roles.iter().any(|pending| pending == candidate)
}

/// Whether `resolver_roles` carries the authority to resolve a request
/// for `requested_role`: the all-access role, or one of the domain's
/// admin roles.
pub fn can_resolve(resolver_roles: &RoleSet, requested_role: &str) -> bool {
    if resolver_roles.contains(ALL_ACCESS_ROLE) {
        return true;
    }
    admin_roles_for(requested_role)
        .iter()
        .any(|role| resolver_roles.contains(role))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn resolve_prefers_roles_list_and_dedupes() {
        let roles = owned(&["SDuser", "user", "SDuser"]);
        let resolved = resolve_roles(Some(&roles), Some("IDadmin"));
        assert_eq!(resolved.as_slice(), &["SDuser".to_string(), "user".to_string()]);
    }

    #[test]
    fn resolve_falls_back_to_legacy_role() {
        let resolved = resolve_roles(None, Some("SDadmin"));
        assert_eq!(resolved.as_slice(), &["SDadmin".to_string()]);

        // Empty list behaves the same as an absent list
        let resolved = resolve_roles(Some(&[]), Some("SDadmin"));
        assert_eq!(resolved.as_slice(), &["SDadmin".to_string()]);
    }

    #[test]
    fn resolve_never_returns_empty() {
        let resolved = resolve_roles(None, None);
        assert_eq!(resolved.as_slice(), &[BASELINE_ROLE.to_string()]);

        let resolved = resolve_roles(Some(&[]), Some(""));
        assert_eq!(resolved.as_slice(), &[BASELINE_ROLE.to_string()]);
    }

    #[test]
    fn resolve_is_idempotent_and_order_independent() {
        let a = resolve_roles(Some(&owned(&["IDuser", "user"])), None);
        let b = resolve_roles(Some(&owned(&["user", "IDuser"])), None);
        assert_eq!(a, b);
        assert_eq!(a, resolve_roles(Some(a.as_slice()), None));
    }

    #[test]
    fn unknown_tokens_pass_through_resolver() {
        let resolved = resolve_roles(Some(&owned(&["mystery"])), None);
        assert!(resolved.contains("mystery"));
    }

    #[test]
    fn empty_requirement_admits_any_principal() {
        let roles = RoleSet::from_tokens([BASELINE_ROLE]);
        assert!(has_capability(&roles, &[]));
    }

    #[test]
    fn all_access_bypasses_specific_requirements() {
        let roles = RoleSet::from_tokens([BASELINE_ROLE, ALL_ACCESS_ROLE]);
        assert!(has_capability(&roles, &[SD_ADMIN]));
        assert!(has_capability(&roles, &["something-unheard-of"]));
    }

    #[test]
    fn capability_requires_intersection() {
        let roles = RoleSet::from_tokens([BASELINE_ROLE, SD_USER]);
        assert!(has_capability(&roles, &[SD_USER, ID_USER]));
        assert!(!has_capability(&roles, &[SD_ADMIN]));
    }

    #[test]
    fn can_request_excludes_held_and_pending_roles() {
        let roles = RoleSet::from_tokens([BASELINE_ROLE, SD_USER]);
        let pending = owned(&[ID_USER]);
        assert!(!can_request_role(&roles, &pending, SD_USER));
        assert!(!can_request_role(&roles, &pending, ID_USER));
        assert!(can_request_role(&roles, &pending, SD_ADMIN));
    }

    #[test]
    fn resolve_authority_is_per_domain() {
        let sd_admin = RoleSet::from_tokens([BASELINE_ROLE, SD_ADMIN]);
        assert!(can_resolve(&sd_admin, SD_USER));
        assert!(can_resolve(&sd_admin, SD_ADMIN));
        assert!(!can_resolve(&sd_admin, ID_USER));

        let app_admin = RoleSet::from_tokens([ALL_ACCESS_ROLE]);
        assert!(can_resolve(&app_admin, SD_USER));
        assert!(can_resolve(&app_admin, ID_ADMIN));
    }

    #[test]
    fn insert_is_idempotent_union() {
        let mut roles = RoleSet::from_tokens([BASELINE_ROLE]);
        assert!(roles.insert(SD_USER));
        assert!(!roles.insert(SD_USER));
        assert_eq!(roles.len(), 2);
        assert_eq!(roles.as_slice(), &[SD_USER.to_string(), BASELINE_ROLE.to_string()]);
    }
}
