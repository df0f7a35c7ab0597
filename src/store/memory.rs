use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AccessStore, Decision, RequestStatus, Resolution, RoleRequest, StoreError, User};

/// In-memory store backing the service.
///
/// All state lives behind a single `RwLock`, so every trait method runs
/// its check-then-write sequence under one write guard. That is what
/// makes `insert_pending_request` and `resolve_request` safe against
/// concurrent double-submission and double-resolution.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    users: HashMap<Uuid, User>,
    requests: HashMap<Uuid, RoleRequest>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccessStore for MemoryStore {
    async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner
            .users
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::EmailTaken(user.email));
        }
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.read().await;
        let mut users: Vec<User> = inner.users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn replace_user_roles(&self, id: Uuid, roles: Vec<String>) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        let user = inner.users.get_mut(&id).ok_or(StoreError::UserNotFound(id))?;
        user.roles = Some(roles);
        user.legacy_role = None;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn insert_pending_request(&self, request: RoleRequest) -> Result<RoleRequest, StoreError> {
        let mut inner = self.inner.write().await;
        let duplicate = inner.requests.values().any(|existing| {
            existing.requester_id == request.requester_id
                && existing.requested_role == request.requested_role
                && existing.status == RequestStatus::Pending
        });
        if duplicate {
            return Err(StoreError::DuplicatePending);
        }
        inner.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn get_request(&self, id: Uuid) -> Result<Option<RoleRequest>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.requests.get(&id).cloned())
    }

    async fn list_requests(&self, status: Option<RequestStatus>) -> Result<Vec<RoleRequest>, StoreError> {
        let inner = self.inner.read().await;
        let mut requests: Vec<RoleRequest> = inner
            .requests
            .values()
            .filter(|request| status.map_or(true, |wanted| request.status == wanted))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.request_date.cmp(&a.request_date));
        Ok(requests)
    }

    async fn list_requests_for_user(&self, user_id: Uuid) -> Result<Vec<RoleRequest>, StoreError> {
        let inner = self.inner.read().await;
        let mut requests: Vec<RoleRequest> = inner
            .requests
            .values()
            .filter(|request| request.requester_id == user_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.request_date.cmp(&a.request_date));
        Ok(requests)
    }

    async fn resolve_request(&self, id: Uuid, resolution: Resolution) -> Result<RoleRequest, StoreError> {
        let mut inner = self.inner.write().await;
        let StoreInner { users, requests } = &mut *inner;

        let request = requests.get_mut(&id).ok_or(StoreError::RequestNotFound(id))?;
        if request.status != RequestStatus::Pending {
            return Err(StoreError::NotPending);
        }

        // Validate the grant target before touching the request so a
        // failed approval leaves the request pending.
        if resolution.decision == Decision::Approved {
            let requester = users
                .get_mut(&request.requester_id)
                .ok_or(StoreError::UserNotFound(request.requester_id))?;
            let mut role_set = requester.role_set();
            role_set.insert(&request.requested_role);
            requester.roles = Some(role_set.into_vec());
            requester.legacy_role = None;
            requester.updated_at = Utc::now();
        }

        request.status = resolution.decision.as_status();
        request.approval_date = Some(Utc::now());
        request.resolved_by = Some(resolution.resolver_id);
        request.resolution_notes = resolution.notes;
        Ok(request.clone())
    }
}
