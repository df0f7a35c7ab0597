use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roles::{self, RoleSet};

/// A registered principal.
///
/// `roles` may be absent on records migrated from the single-role era;
/// `legacy_role` then carries the old scalar value. Always go through
/// [`User::role_set`] rather than reading either field directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub roles: Option<Vec<String>>,
    pub legacy_role: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, roles: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            roles: Some(roles),
            legacy_role: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Canonical role set for this principal, reconciling the list and
    /// legacy scalar representations. Never empty.
    pub fn role_set(&self) -> RoleSet {
        roles::resolve_roles(self.roles.as_deref(), self.legacy_role.as_deref())
    }
}

/// Lifecycle state of a role request. `Pending` is the only state a
/// request is created in; both other states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Administrator decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn as_status(self) -> RequestStatus {
        match self {
            Decision::Approved => RequestStatus::Approved,
            Decision::Rejected => RequestStatus::Rejected,
        }
    }
}

/// One ask by a principal for an additional role. Append-only audit
/// record: created in `pending`, resolved exactly once, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    // Denormalized for admin listings, mirroring the stored documents
    pub requester_name: String,
    pub requester_email: String,
    pub requested_role: String,
    pub status: RequestStatus,
    pub notes: Option<String>,
    pub request_date: DateTime<Utc>,
    pub approval_date: Option<DateTime<Utc>>,
    pub resolved_by: Option<Uuid>,
    pub resolution_notes: Option<String>,
}

impl RoleRequest {
    pub fn new(requester: &User, requested_role: impl Into<String>, notes: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            requester_id: requester.id,
            requester_name: requester.name.clone(),
            requester_email: requester.email.clone(),
            requested_role: requested_role.into(),
            status: RequestStatus::Pending,
            notes,
            request_date: Utc::now(),
            approval_date: None,
            resolved_by: None,
            resolution_notes: None,
        }
    }
}

/// Fields applied when a request leaves the `pending` state.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub resolver_id: Uuid,
    pub decision: Decision,
    pub notes: Option<String>,
}
