use std::sync::Arc;

use uuid::Uuid;

use crate::config;
use crate::roles::{self, RoleSet, ALL_ACCESS_ROLE, BASELINE_ROLE, REQUESTABLE_ROLES};
use crate::store::{
    AccessStore, Decision, RequestStatus, Resolution, RoleRequest, StoreError, User,
};

/// Typed failure kinds for the RBAC core. The transport layer maps each
/// to its own status and keeps the messages distinct; none of these may
/// be collapsed into a generic "operation failed".
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("'{0}' is not a requestable role")]
    InvalidRequest(String),
    #[error("role '{0}' is already granted")]
    AlreadyGranted(String),
    #[error("a pending request for role '{0}' already exists")]
    DuplicatePending(String),
    #[error("role request has already been resolved")]
    NotPending,
    #[error("{0}")]
    Forbidden(String),
    #[error("invalid role set: {0}")]
    InvalidRoleSet(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("email address is already registered")]
    EmailTaken,
    #[error("{0}")]
    Validation(String),
}

impl From<StoreError> for AccessError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UserNotFound(_) => AccessError::NotFound("user"),
            StoreError::RequestNotFound(_) => AccessError::NotFound("role request"),
            StoreError::EmailTaken(_) => AccessError::EmailTaken,
            StoreError::DuplicatePending => AccessError::DuplicatePending(String::new()),
            StoreError::NotPending => AccessError::NotPending,
        }
    }
}

/// Input for user registration.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RegisterUser {
    pub name: String,
    pub email: String,
}

/// Owns the role-request state machine and every mutation of a
/// principal's role set.
///
/// The store methods it calls are the atomic primitives; this service
/// layers the business preconditions (vocabulary, already-granted,
/// approval authority, self-approval, active principal) on top of them.
#[derive(Clone)]
pub struct RoleService {
    store: Arc<dyn AccessStore>,
}

impl RoleService {
    pub fn new(store: Arc<dyn AccessStore>) -> Self {
        Self { store }
    }

    /// Registers a new principal with the baseline role. Email is the
    /// uniqueness key; an optional configured domain restriction applies.
    pub async fn register_user(&self, input: RegisterUser) -> Result<User, AccessError> {
        let name = input.name.trim();
        let email = input.email.trim().to_lowercase();

        if name.is_empty() {
            return Err(AccessError::Validation("name must not be empty".into()));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(AccessError::Validation("a valid email address is required".into()));
        }
        if let Some(domain) = &config::config().security.allowed_email_domain {
            if !email.ends_with(&format!("@{domain}")) {
                return Err(AccessError::Validation(format!(
                    "only {domain} email addresses are allowed"
                )));
            }
        }

        // Friendly pre-check; insert_user re-enforces uniqueness
        // atomically against concurrent registrations.
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AccessError::EmailTaken);
        }

        let user = self
            .store
            .insert_user(User::new(name, email, vec![BASELINE_ROLE.to_string()]))
            .await?;
        tracing::info!(user_id = %user.id, email = %user.email, "registered new user");
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, AccessError> {
        self.store
            .get_user(id)
            .await?
            .ok_or(AccessError::NotFound("user"))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AccessError> {
        Ok(self.store.list_users().await?)
    }

    pub async fn list_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<RoleRequest>, AccessError> {
        Ok(self.store.list_requests(status).await?)
    }

    pub async fn list_requests_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<RoleRequest>, AccessError> {
        Ok(self.store.list_requests_for_user(user_id).await?)
    }

    /// Advisory list of roles the user could still request: not held,
    /// no outstanding pending request. The create path re-enforces both
    /// rules authoritatively.
    pub async fn requestable_roles(&self, user_id: Uuid) -> Result<Vec<String>, AccessError> {
        let user = self.get_user(user_id).await?;
        let role_set = user.role_set();
        let pending: Vec<String> = self
            .store
            .list_requests_for_user(user_id)
            .await?
            .into_iter()
            .filter(|request| request.status == RequestStatus::Pending)
            .map(|request| request.requested_role)
            .collect();

        Ok(REQUESTABLE_ROLES
            .iter()
            .filter(|role| roles::can_request_role(&role_set, &pending, role))
            .map(|role| role.to_string())
            .collect())
    }

    /// Creates a role request in `pending` state.
    pub async fn create_role_request(
        &self,
        requester_id: Uuid,
        requested_role: &str,
        notes: Option<String>,
    ) -> Result<RoleRequest, AccessError> {
        let requester = self.get_user(requester_id).await?;
        if !requester.is_active {
            return Err(AccessError::Forbidden(
                "inactive users cannot request roles".into(),
            ));
        }
        if !roles::is_requestable_role(requested_role) {
            return Err(AccessError::InvalidRequest(requested_role.to_string()));
        }
        if requester.role_set().contains(requested_role) {
            return Err(AccessError::AlreadyGranted(requested_role.to_string()));
        }

        let request = self
            .store
            .insert_pending_request(RoleRequest::new(&requester, requested_role, notes))
            .await
            .map_err(|err| match err {
                StoreError::DuplicatePending => {
                    AccessError::DuplicatePending(requested_role.to_string())
                }
                other => other.into(),
            })?;
        tracing::info!(
            request_id = %request.id,
            requester_id = %requester_id,
            role = requested_role,
            "created role request"
        );
        Ok(request)
    }

    /// Resolves a pending request. Approval atomically grants the
    /// requested role; the losing side of a concurrent resolution
    /// observes `NotPending`.
    pub async fn resolve_role_request(
        &self,
        request_id: Uuid,
        resolver_id: Uuid,
        decision: Decision,
        notes: Option<String>,
    ) -> Result<RoleRequest, AccessError> {
        let request = self
            .store
            .get_request(request_id)
            .await?
            .ok_or(AccessError::NotFound("role request"))?;
        let resolver = self.get_user(resolver_id).await?;

        if !resolver.is_active {
            return Err(AccessError::Forbidden(
                "inactive users cannot resolve role requests".into(),
            ));
        }
        if request.requester_id == resolver_id {
            return Err(AccessError::Forbidden(
                "you cannot resolve your own role request".into(),
            ));
        }
        if !roles::can_resolve(&resolver.role_set(), &request.requested_role) {
            return Err(AccessError::Forbidden(format!(
                "you do not have authority to resolve requests for role '{}'",
                request.requested_role
            )));
        }

        // The store re-checks the pending state under its own lock; this
        // early check only produces a friendlier path for stale callers.
        if request.status != RequestStatus::Pending {
            return Err(AccessError::NotPending);
        }

        let resolved = self
            .store
            .resolve_request(
                request_id,
                Resolution {
                    resolver_id,
                    decision,
                    notes,
                },
            )
            .await?;
        tracing::info!(
            request_id = %request_id,
            resolver_id = %resolver_id,
            status = %resolved.status,
            "resolved role request"
        );
        Ok(resolved)
    }

    /// Administrative override: replaces a principal's role set
    /// wholesale. All-access holders only; does not touch role requests.
    pub async fn bulk_replace_roles(
        &self,
        target_id: Uuid,
        new_roles: Vec<String>,
        actor_id: Uuid,
    ) -> Result<User, AccessError> {
        let actor = self.get_user(actor_id).await?;
        if !actor.is_active || !actor.role_set().contains(ALL_ACCESS_ROLE) {
            return Err(AccessError::Forbidden(
                "replacing role sets requires the app admin role".into(),
            ));
        }

        let role_set = RoleSet::from_tokens(new_roles);
        if role_set.is_empty() {
            return Err(AccessError::InvalidRoleSet(
                "a user must hold at least one role".into(),
            ));
        }
        if let Some(unknown) = role_set.iter().find(|role| !roles::is_recognized_role(role)) {
            return Err(AccessError::InvalidRoleSet(format!(
                "unrecognized role '{unknown}'"
            )));
        }

        let target = self.get_user(target_id).await?;
        if target.role_set().contains(ALL_ACCESS_ROLE) && target_id != actor_id {
            return Err(AccessError::Forbidden(
                "cannot modify another app admin's role set".into(),
            ));
        }

        let updated = self
            .store
            .replace_user_roles(target_id, role_set.into_vec())
            .await?;
        tracing::warn!(
            target_id = %target_id,
            actor_id = %actor_id,
            roles = ?updated.roles,
            "replaced user role set"
        );
        Ok(updated)
    }

    /// Seeds an all-access admin into an empty store so a fresh
    /// deployment is administrable. Returns `None` when users already
    /// exist.
    pub async fn ensure_bootstrap_admin(
        &self,
        name: &str,
        email: &str,
    ) -> Result<Option<User>, AccessError> {
        if !self.store.list_users().await?.is_empty() {
            return Ok(None);
        }
        let admin = self
            .store
            .insert_user(User::new(
                name,
                email,
                vec![BASELINE_ROLE.to_string(), ALL_ACCESS_ROLE.to_string()],
            ))
            .await?;
        tracing::info!(user_id = %admin.id, email = %admin.email, "seeded bootstrap admin");
        Ok(Some(admin))
    }
}
