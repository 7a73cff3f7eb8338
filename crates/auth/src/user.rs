//! Authenticated user and the session payload returned by the auth endpoints.

use serde::{Deserialize, Serialize};

use skillhub_core::{TenantConfig, TenantId, UserId};

use crate::Role;

/// The signed-in user as reported by the backend.
///
/// # Invariants
/// - A user acts within exactly one tenant at a time (`tenant_id`).
/// - Switching tenants rewrites `tenant_id`, never `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    pub tenant_id: TenantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl AuthUser {
    pub fn new(
        id: impl Into<UserId>,
        email: impl Into<String>,
        name: impl Into<String>,
        tenant_id: impl Into<TenantId>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            role: Role::default(),
            tenant_id: tenant_id.into(),
            avatar_url: None,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Copy of this user re-pointed at another tenant.
    pub fn in_tenant(&self, tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            ..self.clone()
        }
    }
}

/// Session payload of a successful login, registration or refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    pub user: AuthUser,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "tenant")]
    pub tenant_config: Option<TenantConfig>,
}

/// Fresh credentials returned by the token refresh endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}
