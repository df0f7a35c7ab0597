use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
mod models;

pub use models::{Decision, RequestStatus, Resolution, RoleRequest, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user not found: {0}")]
    UserNotFound(Uuid),
    #[error("role request not found: {0}")]
    RequestNotFound(Uuid),
    #[error("email already registered: {0}")]
    EmailTaken(String),
    #[error("a pending request for this role already exists")]
    DuplicatePending,
    #[error("role request is not pending")]
    NotPending,
}

/// Persistence seam for principals and role requests.
///
/// Each method is a transaction-shaped unit of work. The multi-step
/// methods (`insert_user`, `insert_pending_request`, `resolve_request`,
/// `replace_user_roles`) bundle their uniqueness/state checks with the
/// write; implementations must make each call atomic so that two
/// concurrent callers cannot both pass the check (see the service-level
/// invariants they back: pending-uniqueness per (requester, role),
/// single effective transition per request, set-union role grants).
#[async_trait]
pub trait AccessStore: Send + Sync {
    /// Inserts a new user. Fails with `EmailTaken` if the email is
    /// already registered; the check and insert are atomic.
    async fn insert_user(&self, user: User) -> Result<User, StoreError>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// Replaces a user's role set wholesale. Clears any legacy scalar
    /// role so the record is fully on the list representation.
    async fn replace_user_roles(&self, id: Uuid, roles: Vec<String>) -> Result<User, StoreError>;

    /// Inserts a request in `pending` state. Fails with
    /// `DuplicatePending` if the requester already has a pending request
    /// for the same role; the check and insert are atomic.
    async fn insert_pending_request(&self, request: RoleRequest) -> Result<RoleRequest, StoreError>;

    async fn get_request(&self, id: Uuid) -> Result<Option<RoleRequest>, StoreError>;

    /// All requests, newest first, optionally filtered by status.
    async fn list_requests(&self, status: Option<RequestStatus>) -> Result<Vec<RoleRequest>, StoreError>;

    /// One user's requests, newest first.
    async fn list_requests_for_user(&self, user_id: Uuid) -> Result<Vec<RoleRequest>, StoreError>;

    /// Moves a `pending` request to its terminal state and, on approval,
    /// unions the requested role into the requester's role set. Both
    /// writes commit together or not at all. Fails with `NotPending` if
    /// the request was already resolved (including by a concurrent
    /// caller) and with `UserNotFound` if an approval's target principal
    /// no longer exists, in which case the request stays pending.
    async fn resolve_request(&self, id: Uuid, resolution: Resolution) -> Result<RoleRequest, StoreError>;
}
