use serde::{Deserialize, Serialize};
use serde_json::Value;

use skillhub_auth::Role;
use skillhub_core::{TenantId, UserId};

/// Input envelope of a single workflow execution.
///
/// Built fresh per call and never persisted. `data` carries the action name
/// (`data.action`) and its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowContext {
    pub tenant_id: TenantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<Role>,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl WorkflowContext {
    pub fn new(tenant_id: impl Into<TenantId>, data: Value) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            user_id: None,
            user_role: None,
            data,
            metadata: None,
        }
    }

    pub fn with_user(mut self, user_id: UserId, role: Option<Role>) -> Self {
        self.user_id = Some(user_id);
        self.user_role = role;
        self
    }

    /// The raw `data.action` string, if present.
    pub fn action(&self) -> Option<&str> {
        self.data.get("action").and_then(Value::as_str)
    }

    /// Snapshot suitable for attaching to error details.
    pub fn to_diagnostic(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
