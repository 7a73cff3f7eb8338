use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use skillhub_auth::{AuthData, AuthUser, LoginCredentials, RegisterData, TokenPair};
use skillhub_client::{ApiError, PlatformApi};
use skillhub_core::{TenantConfig, TenantFeatures, TenantId};
use skillhub_provider::{NotificationLevel, ProviderError, Theme, WorkflowProvider};
use skillhub_session::{InMemorySessionStore, SessionStore, SqliteSessionStore, keys, load_json};
use skillhub_workflow::{Workflow, WorkflowContext, WorkflowManager, WorkflowResult, codes};

/// Backend double. `globex` answers slower than `acme` so concurrent
/// switches resolve out of call order.
#[derive(Default)]
struct Backend {
    network_down: AtomicBool,
}

impl Backend {
    fn tenant(id: &TenantId) -> Result<TenantConfig, ApiError> {
        match id.as_str() {
            "acme" => Ok(TenantConfig::new("acme", "Acme").with_features(TenantFeatures {
                ai_chatbot: true,
                ..TenantFeatures::default()
            })),
            "globex" => Ok(TenantConfig::new("globex", "Globex")),
            _ => Err(ApiError::rejected(404, "Tenant not found")),
        }
    }

    fn offline(&self) -> Result<(), ApiError> {
        if self.network_down.load(Ordering::SeqCst) {
            return Err(ApiError::Network("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PlatformApi for Backend {
    async fn login(&self, tenant_id: &TenantId, credentials: &LoginCredentials) -> Result<AuthData, ApiError> {
        self.offline()?;
        if credentials.password != "secret" {
            return Err(ApiError::rejected(401, "Invalid credentials"));
        }
        Ok(AuthData {
            user: AuthUser::new("u-1", credentials.email.clone(), "Alice", tenant_id.clone()),
            token: "token-1".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            tenant_config: Backend::tenant(tenant_id).ok(),
        })
    }

    async fn register(&self, tenant_id: &TenantId, data: &RegisterData) -> Result<AuthData, ApiError> {
        self.offline()?;
        let tenant_id = data.tenant_id.clone().unwrap_or_else(|| tenant_id.clone());
        Ok(AuthData {
            user: AuthUser::new("u-2", data.email.clone(), data.name.clone(), tenant_id),
            token: "token-r".to_string(),
            refresh_token: None,
            tenant_config: None,
        })
    }

    async fn refresh(&self, _tenant_id: &TenantId, refresh_token: &str) -> Result<TokenPair, ApiError> {
        self.offline()?;
        match refresh_token {
            "token-1" => Ok(TokenPair {
                token: "token-2".to_string(),
                refresh_token: None,
            }),
            _ => Err(ApiError::rejected(401, "Refresh token expired")),
        }
    }

    async fn logout(&self, _tenant_id: &TenantId, _token: Option<&str>) -> Result<(), ApiError> {
        self.offline()
    }

    async fn get_tenant(&self, tenant_id: &TenantId, _token: Option<&str>) -> Result<TenantConfig, ApiError> {
        self.offline()?;
        let delay = if tenant_id.as_str() == "globex" { 30 } else { 5 };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Backend::tenant(tenant_id)
    }

    async fn list_tenants(&self, _token: Option<&str>) -> Result<Vec<TenantConfig>, ApiError> {
        self.offline()?;
        Ok(vec![
            Backend::tenant(&TenantId::new("acme"))?,
            Backend::tenant(&TenantId::new("globex"))?,
        ])
    }

    async fn update_tenant_config(
        &self,
        tenant_id: &TenantId,
        _updates: &Value,
        _token: Option<&str>,
    ) -> Result<TenantConfig, ApiError> {
        self.offline()?;
        Backend::tenant(tenant_id)
    }

    async fn health(&self) -> bool {
        !self.network_down.load(Ordering::SeqCst)
    }
}

struct Harness {
    backend: Arc<Backend>,
    session: Arc<dyn SessionStore>,
}

impl Harness {
    fn new() -> Self {
        Self::with_store(Arc::new(InMemorySessionStore::new()))
    }

    fn with_store(session: Arc<dyn SessionStore>) -> Self {
        Self {
            backend: Arc::new(Backend::default()),
            session,
        }
    }

    /// A fresh mount over the same backend and session store, as after an
    /// application restart.
    async fn mount(&self) -> WorkflowProvider {
        WorkflowProvider::mount(
            Arc::new(WorkflowManager::new()),
            self.backend.clone(),
            self.session.clone(),
            TenantId::new("acme"),
        )
        .await
    }
}

fn alice() -> LoginCredentials {
    LoginCredentials::new("alice@acme.com", "secret")
}

#[tokio::test]
async fn login_survives_remount() {
    let harness = Harness::new();
    let provider = harness.mount().await;

    let user = provider.login(&alice()).await.unwrap();
    assert!(provider.is_authenticated());
    assert_eq!(provider.tenant().current_tenant.unwrap().id.as_str(), "acme");

    let remounted = harness.mount().await;
    let auth = remounted.auth();
    assert!(auth.is_authenticated);
    assert_eq!(auth.user, Some(user));
    assert_eq!(auth.token.as_deref(), Some("token-1"));
    assert!(remounted.tenant().current_tenant.unwrap().features.ai_chatbot);
}

#[tokio::test]
async fn login_survives_remount_on_sqlite() {
    let harness = Harness::with_store(Arc::new(SqliteSessionStore::new("sqlite::memory:")));
    let provider = harness.mount().await;
    provider.login(&alice()).await.unwrap();

    let remounted = harness.mount().await;
    assert!(remounted.is_authenticated());
    assert_eq!(remounted.auth().user.unwrap().email, "alice@acme.com");
}

#[tokio::test]
async fn failed_login_records_error_and_returns_it() {
    let harness = Harness::new();
    let provider = harness.mount().await;

    let err = provider
        .login(&LoginCredentials::new("alice@acme.com", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), Some("LOGIN_FAILED"));
    assert!(matches!(err, ProviderError::Workflow { status_code: 401, .. }));

    let auth = provider.auth();
    assert!(!auth.is_authenticated);
    assert!(!auth.loading);
    assert_eq!(auth.error.as_deref(), Some("Invalid credentials"));
    assert_eq!(harness.session.get(keys::AUTH_TOKEN).await.unwrap(), None);
}

#[tokio::test]
async fn register_signs_in() {
    let harness = Harness::new();
    let provider = harness.mount().await;

    let user = provider
        .register(&RegisterData::new("new@acme.com", "password1", "Newbie"))
        .await
        .unwrap();

    assert_eq!(user.name, "Newbie");
    assert!(provider.is_authenticated());
}

#[tokio::test]
async fn register_into_another_tenant_drops_the_held_config() {
    let harness = Harness::new();
    let provider = harness.mount().await;
    provider.get_current_tenant().await.unwrap();
    assert!(harness.session.get(keys::TENANT_CONFIG).await.unwrap().is_some());

    let mut data = RegisterData::new("bob@globex.com", "password1", "Bob");
    data.tenant_id = Some(TenantId::new("globex"));
    let user = provider.register(&data).await.unwrap();
    assert_eq!(user.tenant_id.as_str(), "globex");

    let state = provider.state();
    assert!(state.tenant.current_tenant.is_none());
    assert_eq!(state.current_tenant_id().unwrap().as_str(), "globex");
    assert_eq!(provider.context(json!({})).tenant_id.as_str(), "globex");

    assert_eq!(harness.session.get(keys::TENANT_CONFIG).await.unwrap(), None);
    let pointer: Option<TenantId> = load_json(harness.session.as_ref(), keys::CURRENT_TENANT_ID).await.unwrap();
    assert_eq!(pointer.unwrap().as_str(), "globex");

    // A restart agrees with the live state.
    let remounted = harness.mount().await;
    assert_eq!(remounted.context(json!({})).tenant_id.as_str(), "globex");
}

#[tokio::test]
async fn logout_clears_local_session_when_network_fails() {
    let harness = Harness::new();
    let provider = harness.mount().await;
    provider.login(&alice()).await.unwrap();

    harness.backend.network_down.store(true, Ordering::SeqCst);
    provider.logout().await;

    assert!(!provider.is_authenticated());
    assert_eq!(provider.auth().user, None);
    for key in keys::AUTH_KEYS {
        assert_eq!(harness.session.get(key).await.unwrap(), None, "{key} not cleared");
    }

    let remounted = harness.mount().await;
    assert!(!remounted.is_authenticated());
}

#[tokio::test]
async fn concurrent_switches_end_on_one_of_the_targets() {
    let harness = Harness::new();
    let provider = harness.mount().await;
    provider.login(&alice()).await.unwrap();

    let acme = TenantId::new("acme");
    let globex = TenantId::new("globex");
    let (a, b) = tokio::join!(provider.switch_tenant(&globex), provider.switch_tenant(&acme));
    assert!(a.is_ok() && b.is_ok());

    let state = provider.state();
    let current = state.tenant.current_tenant.unwrap().id;
    assert!(current == acme || current == globex);
    // User pointer and tenant slice always move together.
    assert_eq!(state.auth.user.unwrap().tenant_id, current);
    assert!(!state.tenant.loading);
}

#[tokio::test]
async fn failed_switch_keeps_previous_tenant_but_moves_pointer() {
    let harness = Harness::new();
    let provider = harness.mount().await;
    provider.login(&alice()).await.unwrap();

    let err = provider.switch_tenant(&TenantId::new("nowhere")).await.unwrap_err();
    assert_eq!(err.code(), Some("TENANT_SWITCH_FAILED"));

    let tenant = provider.tenant();
    assert_eq!(tenant.current_tenant.unwrap().id.as_str(), "acme");
    assert_eq!(tenant.error.as_deref(), Some("Tenant not found"));

    let pointer: Option<TenantId> = load_json(harness.session.as_ref(), keys::CURRENT_TENANT_ID)
        .await
        .unwrap();
    assert_eq!(pointer, Some(TenantId::new("nowhere")));
}

#[tokio::test]
async fn tenant_listing_and_current_tenant() {
    let harness = Harness::new();
    let provider = harness.mount().await;

    let tenants = provider.get_all_tenants().await.unwrap();
    assert_eq!(tenants.len(), 2);
    assert_eq!(provider.tenant().available_tenants, tenants);

    let current = provider.get_current_tenant().await.unwrap();
    assert_eq!(current.id.as_str(), "acme");
}

#[tokio::test]
async fn refresh_session_stores_new_token() {
    let harness = Harness::new();
    let provider = harness.mount().await;
    provider.login(&alice()).await.unwrap();

    provider.refresh_session().await.unwrap();

    assert_eq!(provider.auth().token.as_deref(), Some("token-2"));
    let stored: Option<String> = load_json(harness.session.as_ref(), keys::AUTH_TOKEN).await.unwrap();
    assert_eq!(stored.as_deref(), Some("token-2"));
}

#[tokio::test]
async fn bogus_action_is_invalid_action() {
    let harness = Harness::new();
    let provider = harness.mount().await;

    let result = provider.execute_workflow("auth", json!({ "action": "bogus" })).await;

    assert!(!result.success);
    assert_eq!(result.status_code, Some(400));
    assert_eq!(result.error_code(), Some(codes::INVALID_ACTION));
}

#[tokio::test]
async fn data_flow_runs_in_session_context() {
    let harness = Harness::new();
    let provider = harness.mount().await;
    provider.login(&alice()).await.unwrap();

    let result = provider
        .execute_workflow("dataFlow", json!({ "action": "broadcast", "channel": "groups" }))
        .await;

    let envelope = result.data.unwrap();
    assert_eq!(envelope["source"], "u-1");
    assert_eq!(envelope["tenantId"], "acme");
}

struct CustomAuth;

#[async_trait]
impl Workflow for CustomAuth {
    fn id(&self) -> &str {
        "auth"
    }

    fn name(&self) -> &str {
        "Custom auth"
    }

    async fn execute(&self, _context: &WorkflowContext) -> anyhow::Result<WorkflowResult> {
        Ok(WorkflowResult::ok("custom", Value::Null))
    }
}

#[tokio::test]
async fn mount_keeps_already_registered_workflows() {
    let manager = Arc::new(WorkflowManager::new());
    manager.register(Arc::new(CustomAuth));

    let provider = WorkflowProvider::mount(
        manager.clone(),
        Arc::new(Backend::default()),
        Arc::new(InMemorySessionStore::new()),
        TenantId::new("acme"),
    )
    .await;

    assert!(Arc::ptr_eq(provider.manager(), &manager));
    assert_eq!(manager.get_workflow("auth").unwrap().name(), "Custom auth");
    assert_eq!(provider.manager().get_stats().total_workflows, 3);

    let result = provider.execute_workflow("auth", json!({ "action": "login" })).await;
    assert_eq!(result.message, "custom");
}

#[tokio::test]
async fn subscribers_see_transitions() {
    let harness = Harness::new();
    let provider = harness.mount().await;
    let mut rx = provider.subscribe();

    provider.login(&alice()).await.unwrap();

    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().auth.is_authenticated);
}

#[tokio::test]
async fn ui_helpers() {
    let harness = Harness::new();
    let provider = harness.mount().await;

    provider.toggle_sidebar();
    provider.set_theme(Theme::Dark);
    let id = provider.notify(NotificationLevel::Success, "Saved");
    let other = provider.notify(NotificationLevel::Info, "Hello");
    assert_ne!(id, other);

    provider.dismiss_notification(id);
    let ui = provider.ui();
    assert!(!ui.sidebar_open);
    assert_eq!(ui.theme, Theme::Dark);
    assert_eq!(ui.notifications.len(), 1);
    assert_eq!(ui.notifications[0].message, "Hello");

    let _ = provider.login(&LoginCredentials::new("alice@acme.com", "wrong")).await;
    provider.clear_errors();
    assert_eq!(provider.auth().error, None);
}
