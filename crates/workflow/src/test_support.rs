//! In-process stand-in for the platform backend.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use skillhub_auth::{AuthData, AuthUser, LoginCredentials, RegisterData, TokenPair};
use skillhub_client::{ApiError, PlatformApi};
use skillhub_core::{TenantConfig, TenantFeatures, TenantId};
use skillhub_session::{InMemorySessionStore, SessionStore, SessionStoreError};

/// Canned backend.
///
/// - login succeeds for password `secret`, is rejected (401) otherwise, and
///   fails at the transport level for `offline@…` addresses
/// - register rejects `taken@acme.com` with 409
/// - refresh accepts `refresh-1` and `token-1`
/// - tenants `acme` (chatbot on) and `globex` exist; `offline` is a network
///   failure, anything else is a 404
pub(crate) struct FakeApi {
    pub fail_logout: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            fail_logout: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_logout() -> Self {
        Self {
            fail_logout: true,
            ..Self::new()
        }
    }

    /// Endpoints hit so far, e.g. `"logout:token-1"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

pub(crate) fn tenant(id: &str) -> TenantConfig {
    let mut config = TenantConfig::new(id, format!("Tenant {id}"));
    if id == "acme" {
        config = config.with_features(TenantFeatures {
            ai_chatbot: true,
            ..TenantFeatures::default()
        });
    }
    config
}

fn session(tenant_id: &TenantId, email: &str, name: &str) -> AuthData {
    AuthData {
        user: AuthUser::new("u-1", email, name, tenant_id.clone()),
        token: "token-1".to_string(),
        refresh_token: Some("refresh-1".to_string()),
        tenant_config: Some(tenant(tenant_id.as_str())),
    }
}

fn lookup(tenant_id: &TenantId) -> Result<TenantConfig, ApiError> {
    match tenant_id.as_str() {
        "acme" | "globex" => Ok(tenant(tenant_id.as_str())),
        "offline" => Err(ApiError::Network("connection refused".to_string())),
        _ => Err(ApiError::rejected(404, "Tenant not found")),
    }
}

#[async_trait]
impl PlatformApi for FakeApi {
    async fn login(&self, tenant_id: &TenantId, credentials: &LoginCredentials) -> Result<AuthData, ApiError> {
        self.record(format!("login:{}", credentials.email));
        if credentials.email.starts_with("offline@") {
            return Err(ApiError::Network("connection refused".to_string()));
        }
        if credentials.password != "secret" {
            return Err(ApiError::rejected(401, "Invalid credentials"));
        }
        Ok(session(tenant_id, &credentials.email, "Alice"))
    }

    async fn register(&self, tenant_id: &TenantId, data: &RegisterData) -> Result<AuthData, ApiError> {
        self.record(format!("register:{}", data.email));
        if data.email == "taken@acme.com" {
            return Err(ApiError::rejected(409, "Email already registered"));
        }
        let tenant_id = data.tenant_id.clone().unwrap_or_else(|| tenant_id.clone());
        Ok(session(&tenant_id, &data.email, &data.name))
    }

    async fn refresh(&self, _tenant_id: &TenantId, refresh_token: &str) -> Result<TokenPair, ApiError> {
        self.record(format!("refresh:{refresh_token}"));
        match refresh_token {
            "refresh-1" | "token-1" => Ok(TokenPair {
                token: "token-2".to_string(),
                refresh_token: Some("refresh-2".to_string()),
            }),
            _ => Err(ApiError::rejected(401, "Refresh token expired")),
        }
    }

    async fn logout(&self, _tenant_id: &TenantId, token: Option<&str>) -> Result<(), ApiError> {
        self.record(format!("logout:{}", token.unwrap_or("-")));
        if self.fail_logout {
            return Err(ApiError::Network("connection reset".to_string()));
        }
        Ok(())
    }

    async fn get_tenant(&self, tenant_id: &TenantId, _token: Option<&str>) -> Result<TenantConfig, ApiError> {
        self.record(format!("get_tenant:{tenant_id}"));
        lookup(tenant_id)
    }

    async fn list_tenants(&self, _token: Option<&str>) -> Result<Vec<TenantConfig>, ApiError> {
        self.record("list_tenants");
        Ok(vec![tenant("acme"), tenant("globex")])
    }

    async fn update_tenant_config(
        &self,
        tenant_id: &TenantId,
        updates: &Value,
        _token: Option<&str>,
    ) -> Result<TenantConfig, ApiError> {
        self.record(format!("update_tenant_config:{tenant_id}"));
        let mut config = lookup(tenant_id)?;
        if let Some(name) = updates.get("name").and_then(Value::as_str) {
            config.name = name.to_string();
        }
        Ok(config)
    }

    async fn health(&self) -> bool {
        true
    }
}

/// Session store with a broken disk: reads fail when `failing_reads` is set,
/// and removing any key in `failing_removes` fails.
#[derive(Default)]
pub(crate) struct BrokenStore {
    pub inner: InMemorySessionStore,
    pub failing_reads: bool,
    pub failing_removes: Vec<&'static str>,
}

impl BrokenStore {
    fn disk_error() -> SessionStoreError {
        SessionStoreError::Backend("disk I/O error".to_string())
    }
}

#[async_trait]
impl SessionStore for BrokenStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        if self.failing_reads {
            return Err(Self::disk_error());
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SessionStoreError> {
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), SessionStoreError> {
        if self.failing_removes.iter().any(|k| *k == key) {
            return Err(Self::disk_error());
        }
        self.inner.remove(key).await
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        self.inner.clear().await
    }

    async fn keys(&self) -> Result<Vec<String>, SessionStoreError> {
        self.inner.keys().await
    }
}
