//! The seam between workflows and the platform backend.

use async_trait::async_trait;
use serde_json::Value;

use skillhub_auth::{AuthData, LoginCredentials, RegisterData, TokenPair};
use skillhub_core::{TenantConfig, TenantId};

use crate::ApiError;

/// Calls the client makes against the platform backend.
///
/// One method per endpoint, one request per call. Implementations never
/// retry; retry policy belongs to the caller. `token` is the bearer token of
/// the signed-in user, when there is one.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// `POST /auth/login`
    async fn login(
        &self,
        tenant_id: &TenantId,
        credentials: &LoginCredentials,
    ) -> Result<AuthData, ApiError>;

    /// `POST /auth/register`
    async fn register(&self, tenant_id: &TenantId, data: &RegisterData) -> Result<AuthData, ApiError>;

    /// `POST /auth/refresh`
    async fn refresh(&self, tenant_id: &TenantId, refresh_token: &str) -> Result<TokenPair, ApiError>;

    /// `POST /auth/logout`
    async fn logout(&self, tenant_id: &TenantId, token: Option<&str>) -> Result<(), ApiError>;

    /// `GET /tenants/{id}`
    async fn get_tenant(&self, tenant_id: &TenantId, token: Option<&str>) -> Result<TenantConfig, ApiError>;

    /// `GET /tenants`
    async fn list_tenants(&self, token: Option<&str>) -> Result<Vec<TenantConfig>, ApiError>;

    /// `PUT /tenants/{id}/config`
    async fn update_tenant_config(
        &self,
        tenant_id: &TenantId,
        updates: &Value,
        token: Option<&str>,
    ) -> Result<TenantConfig, ApiError>;

    /// `GET /health`; `false` on any failure.
    async fn health(&self) -> bool;
}
