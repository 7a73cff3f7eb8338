//! Tenant lookup, listing, switching and configuration updates.

use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use skillhub_client::PlatformApi;
use skillhub_core::TenantId;
use skillhub_session::{SessionStore, keys, load_json, save_json};

use crate::result::codes;
use crate::{Workflow, WorkflowAction, WorkflowContext, WorkflowResult, parse_action};

pub const TENANT_WORKFLOW_ID: &str = "tenant";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum TenantAction {
    GetCurrentTenant,
    GetAllTenants,
    SwitchTenant(SwitchTenantRequest),
    UpdateTenantConfig(UpdateTenantConfigRequest),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchTenantRequest {
    pub tenant_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTenantConfigRequest {
    /// Defaults to the context tenant.
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    pub updates: Value,
}

impl WorkflowAction for TenantAction {
    const NAMES: &'static [&'static str] = &[
        "getCurrentTenant",
        "getAllTenants",
        "switchTenant",
        "updateTenantConfig",
    ];

    fn name(&self) -> &'static str {
        match self {
            TenantAction::GetCurrentTenant => "getCurrentTenant",
            TenantAction::GetAllTenants => "getAllTenants",
            TenantAction::SwitchTenant(_) => "switchTenant",
            TenantAction::UpdateTenantConfig(_) => "updateTenantConfig",
        }
    }
}

pub struct TenantWorkflow {
    api: Arc<dyn PlatformApi>,
    session: Arc<dyn SessionStore>,
}

impl TenantWorkflow {
    pub fn new(api: Arc<dyn PlatformApi>, session: Arc<dyn SessionStore>) -> Self {
        Self { api, session }
    }

    async fn token(&self) -> anyhow::Result<Option<String>> {
        load_json::<String>(self.session.as_ref(), keys::AUTH_TOKEN)
            .await
            .context("reading stored auth token")
    }

    async fn get_current_tenant(&self, context: &WorkflowContext) -> anyhow::Result<WorkflowResult> {
        let stored = load_json::<TenantId>(self.session.as_ref(), keys::CURRENT_TENANT_ID)
            .await
            .context("reading current tenant id")?;
        let tenant_id = stored.unwrap_or_else(|| context.tenant_id.clone());
        let token = self.token().await?;

        let result = match self.api.get_tenant(&tenant_id, token.as_deref()).await {
            Ok(config) => WorkflowResult::ok("Tenant retrieved", config).into_untyped(),
            Err(err) => {
                warn!(%tenant_id, error = %err, "tenant fetch failed");
                WorkflowResult::from_api_error(&err, "TENANT_FETCH_FAILED", "TENANT_FETCH_ERROR")
            }
        };
        Ok(result)
    }

    async fn get_all_tenants(&self) -> anyhow::Result<WorkflowResult> {
        let token = self.token().await?;

        let result = match self.api.list_tenants(token.as_deref()).await {
            Ok(tenants) => {
                debug!(count = tenants.len(), "tenants listed");
                WorkflowResult::ok("Tenants retrieved", tenants).into_untyped()
            }
            Err(err) => {
                warn!(error = %err, "tenant listing failed");
                WorkflowResult::from_api_error(&err, "TENANTS_FETCH_FAILED", "TENANTS_FETCH_ERROR")
            }
        };
        Ok(result)
    }

    /// Moves the stored pointer, then fetches the target's config.
    ///
    /// Not atomic: when the fetch fails the pointer has already moved.
    async fn switch_tenant(&self, request: &SwitchTenantRequest) -> anyhow::Result<WorkflowResult> {
        let tenant_id = match TenantId::parse(&request.tenant_id) {
            Ok(id) => id,
            Err(err) => {
                return Ok(WorkflowResult::failure(codes::VALIDATION_ERROR, err.to_string(), 400)
                    .with_field("tenantId"));
            }
        };

        if let Err(err) = save_json(self.session.as_ref(), keys::CURRENT_TENANT_ID, &tenant_id).await {
            return Ok(WorkflowResult::failure(
                codes::SESSION_ERROR,
                format!("Failed to store current tenant: {err}"),
                500,
            ));
        }

        let token = self.token().await?;
        let result = match self.api.get_tenant(&tenant_id, token.as_deref()).await {
            Ok(config) => {
                info!(%tenant_id, "switched tenant");
                WorkflowResult::ok(format!("Switched to tenant {}", config.name), config).into_untyped()
            }
            Err(err) => {
                warn!(%tenant_id, error = %err, "tenant switch fetch failed; stored pointer already moved");
                WorkflowResult::from_api_error(&err, "TENANT_SWITCH_FAILED", "TENANT_SWITCH_ERROR")
            }
        };
        Ok(result)
    }

    async fn update_tenant_config(
        &self,
        context: &WorkflowContext,
        request: &UpdateTenantConfigRequest,
    ) -> anyhow::Result<WorkflowResult> {
        if !request.updates.is_object() {
            return Ok(WorkflowResult::failure(
                codes::VALIDATION_ERROR,
                "updates must be an object",
                400,
            )
            .with_field("updates"));
        }

        let tenant_id = request.tenant_id.clone().unwrap_or_else(|| context.tenant_id.clone());
        let token = self.token().await?;

        let result = match self
            .api
            .update_tenant_config(&tenant_id, &request.updates, token.as_deref())
            .await
        {
            Ok(config) => {
                info!(%tenant_id, "tenant config updated");
                WorkflowResult::ok("Tenant configuration updated", config).into_untyped()
            }
            Err(err) => {
                warn!(%tenant_id, error = %err, "tenant config update failed");
                WorkflowResult::from_api_error(&err, "TENANT_UPDATE_FAILED", "TENANT_UPDATE_ERROR")
            }
        };
        Ok(result)
    }
}

#[async_trait]
impl Workflow for TenantWorkflow {
    fn id(&self) -> &str {
        TENANT_WORKFLOW_ID
    }

    fn name(&self) -> &str {
        "Tenant Management Workflow"
    }

    #[instrument(skip_all, fields(tenant_id = %context.tenant_id))]
    async fn execute(&self, context: &WorkflowContext) -> anyhow::Result<WorkflowResult> {
        let action = match parse_action::<TenantAction>(&context.data) {
            Ok(action) => action,
            Err(err) => return Ok(err.into_result(TENANT_WORKFLOW_ID)),
        };

        match &action {
            TenantAction::GetCurrentTenant => self.get_current_tenant(context).await,
            TenantAction::GetAllTenants => self.get_all_tenants().await,
            TenantAction::SwitchTenant(request) => self.switch_tenant(request).await,
            TenantAction::UpdateTenantConfig(request) => self.update_tenant_config(context, request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{BrokenStore, FakeApi};
    use serde_json::json;
    use skillhub_core::TenantConfig;
    use skillhub_session::InMemorySessionStore;

    fn workflow() -> (TenantWorkflow, Arc<FakeApi>, Arc<InMemorySessionStore>) {
        let api = Arc::new(FakeApi::new());
        let session = Arc::new(InMemorySessionStore::new());
        (TenantWorkflow::new(api.clone(), session.clone()), api, session)
    }

    fn ctx(data: Value) -> WorkflowContext {
        WorkflowContext::new("acme", data)
    }

    async fn stored_pointer(session: &InMemorySessionStore) -> Option<TenantId> {
        load_json(session, keys::CURRENT_TENANT_ID).await.unwrap()
    }

    #[tokio::test]
    async fn current_tenant_prefers_stored_pointer() {
        let (wf, api, session) = workflow();

        let result = wf.execute(&ctx(json!({ "action": "getCurrentTenant" }))).await.unwrap();
        let config: TenantConfig = serde_json::from_value(result.data.unwrap()).unwrap();
        assert_eq!(config.id.as_str(), "acme");

        save_json(session.as_ref(), keys::CURRENT_TENANT_ID, "globex").await.unwrap();
        wf.execute(&ctx(json!({ "action": "getCurrentTenant" }))).await.unwrap();

        assert_eq!(
            api.calls(),
            vec!["get_tenant:acme".to_string(), "get_tenant:globex".to_string()]
        );
    }

    #[tokio::test]
    async fn lists_tenants() {
        let (wf, _, _) = workflow();
        let result = wf.execute(&ctx(json!({ "action": "getAllTenants" }))).await.unwrap();
        let tenants: Vec<TenantConfig> = serde_json::from_value(result.data.unwrap()).unwrap();
        assert_eq!(tenants.len(), 2);
    }

    #[tokio::test]
    async fn switch_moves_pointer_and_returns_config() {
        let (wf, _, session) = workflow();

        let result = wf
            .execute(&ctx(json!({ "action": "switchTenant", "tenantId": "globex" })))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.message, "Switched to tenant Tenant globex");
        assert_eq!(stored_pointer(&session).await, Some(TenantId::new("globex")));
    }

    #[tokio::test]
    async fn failed_switch_leaves_pointer_moved() {
        let (wf, _, session) = workflow();

        let missing = wf
            .execute(&ctx(json!({ "action": "switchTenant", "tenantId": "nowhere" })))
            .await
            .unwrap();
        assert_eq!(missing.error_code(), Some("TENANT_SWITCH_FAILED"));
        assert_eq!(missing.status_code, Some(404));
        assert_eq!(stored_pointer(&session).await, Some(TenantId::new("nowhere")));

        let offline = wf
            .execute(&ctx(json!({ "action": "switchTenant", "tenantId": "offline" })))
            .await
            .unwrap();
        assert_eq!(offline.error_code(), Some("TENANT_SWITCH_ERROR"));
        assert_eq!(offline.status_code, Some(500));
    }

    #[tokio::test]
    async fn switch_rejects_blank_tenant_id() {
        let (wf, api, session) = workflow();

        let result = wf
            .execute(&ctx(json!({ "action": "switchTenant", "tenantId": "  " })))
            .await
            .unwrap();

        assert_eq!(result.error_code(), Some(codes::VALIDATION_ERROR));
        assert_eq!(stored_pointer(&session).await, None);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn update_config_defaults_to_context_tenant() {
        let (wf, _, _) = workflow();

        let result = wf
            .execute(&ctx(json!({ "action": "updateTenantConfig", "updates": { "name": "Acme Learning" } })))
            .await
            .unwrap();
        let config: TenantConfig = serde_json::from_value(result.data.unwrap()).unwrap();
        assert_eq!(config.name, "Acme Learning");

        let not_object = wf
            .execute(&ctx(json!({ "action": "updateTenantConfig", "updates": [1, 2] })))
            .await
            .unwrap();
        assert_eq!(not_object.errors[0].field.as_deref(), Some("updates"));

        let missing = wf
            .execute(&ctx(json!({
                "action": "updateTenantConfig",
                "tenantId": "nowhere",
                "updates": {}
            })))
            .await
            .unwrap();
        assert_eq!(missing.error_code(), Some("TENANT_UPDATE_FAILED"));
    }

    #[tokio::test]
    async fn unreadable_session_surfaces_root_cause() {
        let session = Arc::new(BrokenStore {
            failing_reads: true,
            ..BrokenStore::default()
        });
        let manager = crate::WorkflowManager::new();
        manager.register(Arc::new(TenantWorkflow::new(Arc::new(FakeApi::new()), session)));

        let result = manager
            .execute(TENANT_WORKFLOW_ID, ctx(json!({ "action": "getAllTenants" })))
            .await;

        assert_eq!(result.status_code, Some(500));
        assert_eq!(result.error_code(), Some(codes::WORKFLOW_EXECUTION_ERROR));
        assert!(result.errors[0].message.starts_with("reading stored auth token"));
        assert!(result.errors[0].message.contains("disk I/O error"));
    }

    #[tokio::test]
    async fn unknown_action_is_400() {
        let (wf, _, _) = workflow();
        let result = wf.execute(&ctx(json!({ "action": "deleteTenant" }))).await.unwrap();
        assert_eq!(result.status_code, Some(400));
        assert_eq!(result.error_code(), Some(codes::INVALID_ACTION));
    }
}
