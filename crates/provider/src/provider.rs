//! The owner of [`GlobalState`].
//!
//! Every operation follows the same shape: dispatch a start action, run one
//! workflow through the manager, then dispatch success (persisting what the
//! session needs to survive a restart) or failure (recording the message and
//! returning `Err` to the caller).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use skillhub_auth::{AuthData, AuthUser, LoginCredentials, RegisterData, TokenPair};
use skillhub_client::PlatformApi;
use skillhub_core::{TenantConfig, TenantId};
use skillhub_session::{SessionStore, SessionStoreError, keys, load_json, save_json};
use skillhub_workflow::{
    AUTH_WORKFLOW_ID, AuthWorkflow, DataFlowWorkflow, TENANT_WORKFLOW_ID, TenantWorkflow, Workflow,
    WorkflowContext, WorkflowManager, WorkflowResult,
};

use crate::reducer::{Action, reduce};
use crate::state::{AuthState, GlobalState, NotificationLevel, TenantState, Theme, UiNotification, UiState};

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The workflow answered with `success: false`.
    #[error("{message}")]
    Workflow {
        code: String,
        message: String,
        status_code: u16,
    },

    #[error(transparent)]
    Session(#[from] SessionStoreError),

    /// A payload could not be encoded for, or decoded from, a workflow.
    #[error("unexpected workflow payload: {0}")]
    Payload(String),
}

impl ProviderError {
    fn from_result<T>(result: &WorkflowResult<T>) -> Self {
        ProviderError::Workflow {
            code: result.error_code().unwrap_or("UNKNOWN_ERROR").to_string(),
            message: result.message.clone(),
            status_code: result.status_code.unwrap_or(500),
        }
    }

    /// Workflow error code, when the failure came from a workflow.
    pub fn code(&self) -> Option<&str> {
        match self {
            ProviderError::Workflow { code, .. } => Some(code),
            _ => None,
        }
    }
}

pub struct WorkflowProvider {
    manager: Arc<WorkflowManager>,
    session: Arc<dyn SessionStore>,
    default_tenant: TenantId,
    state: watch::Sender<GlobalState>,
    notification_seq: AtomicU64,
}

impl core::fmt::Debug for WorkflowProvider {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WorkflowProvider")
            .field("default_tenant", &self.default_tenant)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl WorkflowProvider {
    /// Register the auth, tenant and data-flow workflows (unless ids are
    /// already taken) and rehydrate state from `session`.
    pub async fn mount(
        manager: Arc<WorkflowManager>,
        api: Arc<dyn PlatformApi>,
        session: Arc<dyn SessionStore>,
        default_tenant: TenantId,
    ) -> Self {
        let workflows: [Arc<dyn Workflow>; 3] = [
            Arc::new(AuthWorkflow::new(api.clone(), session.clone())),
            Arc::new(TenantWorkflow::new(api, session.clone())),
            Arc::new(DataFlowWorkflow::new()),
        ];
        for workflow in workflows {
            if !manager.has_workflow(workflow.id()) {
                manager.register(workflow);
            }
        }

        let (state, _) = watch::channel(GlobalState::default());
        let provider = Self {
            manager,
            session,
            default_tenant,
            state,
            notification_seq: AtomicU64::new(1),
        };
        provider.rehydrate().await;
        provider
    }

    /// Undecodable or unreadable entries are skipped; a broken cache must not
    /// prevent mounting.
    async fn rehydrate(&self) {
        let store = self.session.as_ref();
        let token = stored::<String>(store, keys::AUTH_TOKEN).await;
        let user = stored::<AuthUser>(store, keys::USER_DATA).await;
        let tenant = stored::<TenantConfig>(store, keys::TENANT_CONFIG).await;

        info!(
            authenticated = token.is_some() && user.is_some(),
            tenant = tenant.as_ref().map(|t| t.id.as_str()).unwrap_or("-"),
            "session rehydrated"
        );
        self.dispatch(Action::Hydrate { user, token, tenant });
    }

    // ─────────────────────────────────────────────────────────────────────
    // State access
    // ─────────────────────────────────────────────────────────────────────

    pub fn dispatch(&self, action: Action) {
        self.state.send_modify(|state| *state = reduce(state, &action));
    }

    pub fn state(&self) -> GlobalState {
        self.state.borrow().clone()
    }

    /// Change notifications for the whole state.
    pub fn subscribe(&self) -> watch::Receiver<GlobalState> {
        self.state.subscribe()
    }

    pub fn auth(&self) -> AuthState {
        self.state.borrow().auth.clone()
    }

    pub fn tenant(&self) -> TenantState {
        self.state.borrow().tenant.clone()
    }

    pub fn ui(&self) -> UiState {
        self.state.borrow().ui.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().auth.is_authenticated
    }

    pub fn manager(&self) -> &Arc<WorkflowManager> {
        &self.manager
    }

    /// Context for a workflow call on behalf of the current session.
    pub fn context(&self, data: Value) -> WorkflowContext {
        let state = self.state.borrow();
        let tenant_id = state
            .current_tenant_id()
            .cloned()
            .unwrap_or_else(|| self.default_tenant.clone());
        let context = WorkflowContext::new(tenant_id, data);
        match &state.auth.user {
            Some(user) => context.with_user(user.id.clone(), Some(user.role.clone())),
            None => context,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Auth
    // ─────────────────────────────────────────────────────────────────────

    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthUser, ProviderError> {
        self.authenticate("login", credentials).await
    }

    pub async fn register(&self, data: &RegisterData) -> Result<AuthUser, ProviderError> {
        self.authenticate("register", data).await
    }

    async fn authenticate<P>(&self, action: &str, payload: &P) -> Result<AuthUser, ProviderError>
    where
        P: Serialize,
    {
        self.dispatch(Action::AuthStart);

        let result = match action_data(action, payload) {
            Ok(data) => self.run::<AuthData>(AUTH_WORKFLOW_ID, data).await,
            Err(err) => Err(err),
        };
        let data = match result {
            Ok(data) => data,
            Err(err) => {
                self.dispatch(Action::AuthFailure(err.to_string()));
                return Err(err);
            }
        };

        if let Err(err) = self.persist_auth(&data).await {
            warn!(error = %err, "failed to persist session");
            self.dispatch(Action::AuthFailure(err.to_string()));
            return Err(err.into());
        }

        info!(user_id = %data.user.id, tenant_id = %data.user.tenant_id, action, "signed in");
        let user = data.user.clone();
        self.dispatch(Action::AuthSuccess {
            user: data.user,
            token: data.token,
            tenant: data.tenant_config,
        });
        Ok(user)
    }

    async fn persist_auth(&self, data: &AuthData) -> Result<(), SessionStoreError> {
        let store = self.session.as_ref();
        save_json(store, keys::AUTH_TOKEN, &data.token).await?;
        save_json(store, keys::USER_DATA, &data.user).await?;
        save_json(store, keys::CURRENT_TENANT_ID, &data.user.tenant_id).await?;
        match &data.tenant_config {
            Some(config) => save_json(store, keys::TENANT_CONFIG, config).await?,
            None => {
                let held = self.state.borrow().tenant.current_tenant.as_ref().map(|t| t.id.clone());
                if held.is_some_and(|id| id != data.user.tenant_id) {
                    store.remove(keys::TENANT_CONFIG).await?;
                }
            }
        }
        Ok(())
    }

    /// Sign out. Never fails: the local session is cleared and auth state
    /// reset even when the backend cannot be reached.
    pub async fn logout(&self) {
        let result = self.execute_workflow(AUTH_WORKFLOW_ID, json!({ "action": "logout" })).await;
        if !result.success {
            warn!(
                code = result.error_code().unwrap_or("-"),
                "logout workflow failed: {}", result.message
            );
        }

        for key in keys::AUTH_KEYS {
            if let Err(err) = self.session.remove(key).await {
                warn!(key, error = %err, "failed to remove session key");
            }
        }
        self.dispatch(Action::Logout);
        info!("signed out");
    }

    /// Exchange the stored token for a fresh one.
    pub async fn refresh_session(&self) -> Result<(), ProviderError> {
        let pair = self
            .run::<TokenPair>(AUTH_WORKFLOW_ID, json!({ "action": "refresh" }))
            .await?;
        save_json(self.session.as_ref(), keys::AUTH_TOKEN, &pair.token).await?;
        self.dispatch(Action::TokenRefreshed(pair.token));
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tenants
    // ─────────────────────────────────────────────────────────────────────

    pub async fn switch_tenant(&self, tenant_id: &TenantId) -> Result<TenantConfig, ProviderError> {
        self.load_tenant(json!({ "action": "switchTenant", "tenantId": tenant_id })).await
    }

    pub async fn get_current_tenant(&self) -> Result<TenantConfig, ProviderError> {
        self.load_tenant(json!({ "action": "getCurrentTenant" })).await
    }

    async fn load_tenant(&self, data: Value) -> Result<TenantConfig, ProviderError> {
        self.dispatch(Action::TenantStart);

        let config = match self.run::<TenantConfig>(TENANT_WORKFLOW_ID, data).await {
            Ok(config) => config,
            Err(err) => {
                self.dispatch(Action::TenantFailure(err.to_string()));
                return Err(err);
            }
        };

        if let Err(err) = save_json(self.session.as_ref(), keys::TENANT_CONFIG, &config).await {
            self.dispatch(Action::TenantFailure(err.to_string()));
            return Err(err.into());
        }

        self.dispatch(Action::TenantSuccess(config.clone()));
        Ok(config)
    }

    pub async fn get_all_tenants(&self) -> Result<Vec<TenantConfig>, ProviderError> {
        self.dispatch(Action::TenantStart);

        match self
            .run::<Vec<TenantConfig>>(TENANT_WORKFLOW_ID, json!({ "action": "getAllTenants" }))
            .await
        {
            Ok(tenants) => {
                self.dispatch(Action::TenantsLoaded(tenants.clone()));
                Ok(tenants)
            }
            Err(err) => {
                self.dispatch(Action::TenantFailure(err.to_string()));
                Err(err)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Generic dispatch
    // ─────────────────────────────────────────────────────────────────────

    /// Run any registered workflow with a context built from the current
    /// state. State is not touched.
    pub async fn execute_workflow(&self, workflow_id: &str, data: Value) -> WorkflowResult {
        let context = self.context(data);
        self.manager.execute(workflow_id, context).await
    }

    async fn run<T>(&self, workflow_id: &str, data: Value) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
    {
        let result = self.execute_workflow(workflow_id, data).await;
        if !result.success {
            return Err(ProviderError::from_result(&result));
        }
        let data = result.data.unwrap_or(Value::Null);
        serde_json::from_value(data).map_err(|e| ProviderError::Payload(e.to_string()))
    }

    // ─────────────────────────────────────────────────────────────────────
    // UI
    // ─────────────────────────────────────────────────────────────────────

    pub fn toggle_sidebar(&self) {
        self.dispatch(Action::ToggleSidebar);
    }

    pub fn set_theme(&self, theme: Theme) {
        self.dispatch(Action::SetTheme(theme));
    }

    /// Queue a notification; returns its id for [`dismiss_notification`](Self::dismiss_notification).
    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) -> u64 {
        let id = self.notification_seq.fetch_add(1, Ordering::Relaxed);
        self.dispatch(Action::Notify(UiNotification {
            id,
            level,
            message: message.into(),
        }));
        id
    }

    pub fn dismiss_notification(&self, id: u64) {
        self.dispatch(Action::DismissNotification(id));
    }

    pub fn clear_errors(&self) {
        self.dispatch(Action::ClearErrors);
    }
}

/// `payload` as an object with `action` set.
fn action_data<P: Serialize>(action: &str, payload: &P) -> Result<Value, ProviderError> {
    let mut data = serde_json::to_value(payload).map_err(|e| ProviderError::Payload(e.to_string()))?;
    match data.as_object_mut() {
        Some(object) => {
            object.insert("action".to_string(), Value::String(action.to_string()));
            Ok(data)
        }
        None => Err(ProviderError::Payload(format!("{action} payload is not an object"))),
    }
}

async fn stored<T: DeserializeOwned>(store: &dyn SessionStore, key: &str) -> Option<T> {
    match load_json(store, key).await {
        Ok(value) => value,
        Err(err) => {
            warn!(key, error = %err, "ignoring unreadable session entry");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_data_merges_payload() {
        let creds = LoginCredentials::new("a@b.co", "pw");
        let data = action_data("login", &creds).unwrap();
        assert_eq!(data["action"], "login");
        assert_eq!(data["email"], "a@b.co");

        assert!(matches!(action_data("login", &42), Err(ProviderError::Payload(_))));
    }

    #[test]
    fn workflow_error_carries_code_and_status() {
        let result: WorkflowResult = WorkflowResult::failure("LOGIN_FAILED", "Invalid credentials", 401);
        let err = ProviderError::from_result(&result);
        assert_eq!(err.code(), Some("LOGIN_FAILED"));
        assert_eq!(err.to_string(), "Invalid credentials");
        assert!(matches!(err, ProviderError::Workflow { status_code: 401, .. }));
    }
}
