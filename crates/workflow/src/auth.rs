//! Sign-in, sign-up, sign-out and token refresh against the platform backend.

use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use skillhub_auth::{LoginCredentials, RegisterData};
use skillhub_client::PlatformApi;
use skillhub_core::{SecurityPolicy, TenantConfig};
use skillhub_session::{SessionStore, keys, load_json};

use crate::result::codes;
use crate::{Workflow, WorkflowAction, WorkflowContext, WorkflowResult, parse_action};

pub const AUTH_WORKFLOW_ID: &str = "auth";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum AuthAction {
    Login(LoginCredentials),
    Register(RegisterData),
    Logout,
    Refresh(RefreshRequest),
}

/// Payload of `refresh`. Without a token the stored session token is used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl WorkflowAction for AuthAction {
    const NAMES: &'static [&'static str] = &["login", "register", "logout", "refresh"];

    fn name(&self) -> &'static str {
        match self {
            AuthAction::Login(_) => "login",
            AuthAction::Register(_) => "register",
            AuthAction::Logout => "logout",
            AuthAction::Refresh(_) => "refresh",
        }
    }
}

pub struct AuthWorkflow {
    api: Arc<dyn PlatformApi>,
    session: Arc<dyn SessionStore>,
}

impl AuthWorkflow {
    pub fn new(api: Arc<dyn PlatformApi>, session: Arc<dyn SessionStore>) -> Self {
        Self { api, session }
    }

    async fn login(&self, context: &WorkflowContext, credentials: &LoginCredentials) -> WorkflowResult {
        if let Err(err) = credentials.validate() {
            return WorkflowResult::from_validation(&err);
        }

        match self.api.login(&context.tenant_id, credentials).await {
            Ok(data) => {
                info!(tenant_id = %context.tenant_id, user_id = %data.user.id, "login succeeded");
                WorkflowResult::ok("Login successful", data).into_untyped()
            }
            Err(err) => {
                warn!(tenant_id = %context.tenant_id, error = %err, "login failed");
                WorkflowResult::from_api_error(&err, "LOGIN_FAILED", "LOGIN_ERROR")
            }
        }
    }

    async fn register(&self, context: &WorkflowContext, data: &RegisterData) -> anyhow::Result<WorkflowResult> {
        // The current tenant's password policy applies when it is known.
        let policy = load_json::<TenantConfig>(self.session.as_ref(), keys::TENANT_CONFIG)
            .await
            .ok()
            .flatten()
            .filter(|config| config.id == context.tenant_id)
            .map(|config| config.security)
            .unwrap_or_else(SecurityPolicy::default);

        if let Err(err) = data.validate_for(&policy) {
            return Ok(WorkflowResult::from_validation(&err));
        }

        let result = match self.api.register(&context.tenant_id, data).await {
            Ok(data) => {
                info!(tenant_id = %context.tenant_id, user_id = %data.user.id, "registration succeeded");
                WorkflowResult::ok("Registration successful", data).into_untyped()
            }
            Err(err) => {
                warn!(tenant_id = %context.tenant_id, error = %err, "registration failed");
                WorkflowResult::from_api_error(&err, "REGISTRATION_FAILED", "REGISTRATION_ERROR")
            }
        };
        Ok(result)
    }

    /// Local cleanup first, then tell the backend. Every key is attempted
    /// and the backend is notified even when a removal fails.
    async fn logout(&self, context: &WorkflowContext) -> WorkflowResult {
        let token = load_json::<String>(self.session.as_ref(), keys::AUTH_TOKEN)
            .await
            .ok()
            .flatten();

        let mut failed = Vec::new();
        for key in keys::AUTH_KEYS {
            if let Err(err) = self.session.remove(key).await {
                warn!(key, error = %err, "failed to clear session key");
                failed.push(format!("{key}: {err}"));
            }
        }

        let notified = self.api.logout(&context.tenant_id, token.as_deref()).await;
        if let Err(err) = &notified {
            warn!(tenant_id = %context.tenant_id, error = %err, "logout notification failed");
        }

        if !failed.is_empty() {
            return WorkflowResult::failure(
                codes::SESSION_ERROR,
                format!("Failed to clear session: {}", failed.join("; ")),
                500,
            );
        }

        match notified {
            Ok(()) => {
                info!(tenant_id = %context.tenant_id, "logged out");
                WorkflowResult::ok("Logout successful", json!({ "cleared": keys::AUTH_KEYS }))
            }
            Err(err) => {
                WorkflowResult::failure("LOGOUT_ERROR", format!("Logout request failed: {err}"), err.status_code())
            }
        }
    }

    async fn refresh(&self, context: &WorkflowContext, request: &RefreshRequest) -> anyhow::Result<WorkflowResult> {
        let token = match &request.refresh_token {
            Some(token) => Some(token.clone()),
            None => load_json::<String>(self.session.as_ref(), keys::AUTH_TOKEN)
                .await
                .context("reading stored auth token")?,
        };

        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Ok(WorkflowResult::failure(codes::VALIDATION_ERROR, "No refresh token available", 400)
                .with_field("refreshToken"));
        };

        let result = match self.api.refresh(&context.tenant_id, &token).await {
            Ok(pair) => WorkflowResult::ok("Token refreshed", pair).into_untyped(),
            Err(err) => {
                warn!(tenant_id = %context.tenant_id, error = %err, "token refresh failed");
                WorkflowResult::from_api_error(&err, "REFRESH_FAILED", "REFRESH_ERROR")
            }
        };
        Ok(result)
    }
}

#[async_trait]
impl Workflow for AuthWorkflow {
    fn id(&self) -> &str {
        AUTH_WORKFLOW_ID
    }

    fn name(&self) -> &str {
        "Authentication Workflow"
    }

    #[instrument(skip_all, fields(tenant_id = %context.tenant_id))]
    async fn execute(&self, context: &WorkflowContext) -> anyhow::Result<WorkflowResult> {
        let action = match parse_action::<AuthAction>(&context.data) {
            Ok(action) => action,
            Err(err) => return Ok(err.into_result(AUTH_WORKFLOW_ID)),
        };

        match &action {
            AuthAction::Login(credentials) => Ok(self.login(context, credentials).await),
            AuthAction::Register(data) => self.register(context, data).await,
            AuthAction::Logout => Ok(self.logout(context).await),
            AuthAction::Refresh(request) => self.refresh(context, request).await,
        }
    }
}
