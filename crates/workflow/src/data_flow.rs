//! Cross-component data envelopes.
//!
//! Every action builds and returns a [`DataFlowEnvelope`]. Nothing is
//! delivered: there is no subscriber registry and no fan-out.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use skillhub_core::TenantId;

use crate::{Workflow, WorkflowAction, WorkflowContext, WorkflowResult, parse_action};

pub const DATA_FLOW_WORKFLOW_ID: &str = "dataFlow";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum DataFlowAction {
    /// Push `payload` from `source` to `target`.
    #[serde(rename_all = "camelCase")]
    Sync {
        source: String,
        target: String,
        #[serde(default)]
        payload: Value,
    },
    /// Publish `payload` on `channel`.
    #[serde(rename_all = "camelCase")]
    Broadcast {
        channel: String,
        #[serde(default)]
        source: Option<String>,
        #[serde(default)]
        payload: Value,
    },
    #[serde(rename_all = "camelCase")]
    Subscribe {
        channel: String,
        #[serde(default)]
        source: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Unsubscribe {
        channel: String,
        subscription_id: Uuid,
    },
}

impl WorkflowAction for DataFlowAction {
    const NAMES: &'static [&'static str] = &["sync", "broadcast", "subscribe", "unsubscribe"];

    fn name(&self) -> &'static str {
        match self {
            DataFlowAction::Sync { .. } => "sync",
            DataFlowAction::Broadcast { .. } => "broadcast",
            DataFlowAction::Subscribe { .. } => "subscribe",
            DataFlowAction::Unsubscribe { .. } => "unsubscribe",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataFlowKind {
    Sync,
    Broadcast,
    Subscribe,
    Unsubscribe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFlowEnvelope {
    pub kind: DataFlowKind,
    pub tenant_id: TenantId,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<Uuid>,
    #[serde(default)]
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl DataFlowEnvelope {
    fn new(kind: DataFlowKind, tenant_id: TenantId, source: String) -> Self {
        Self {
            kind,
            tenant_id,
            source,
            target: None,
            channel: None,
            subscription_id: None,
            payload: Value::Null,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
pub struct DataFlowWorkflow;

impl DataFlowWorkflow {
    pub fn new() -> Self {
        Self
    }

    /// Build the envelope for `action` on behalf of `context`.
    pub fn envelope(context: &WorkflowContext, action: DataFlowAction) -> DataFlowEnvelope {
        // Without an explicit source the acting user, then the tenant, is the origin.
        let default_source = || {
            context
                .user_id
                .as_ref()
                .map(|u| u.to_string())
                .unwrap_or_else(|| context.tenant_id.to_string())
        };
        let tenant_id = context.tenant_id.clone();

        match action {
            DataFlowAction::Sync { source, target, payload } => DataFlowEnvelope {
                target: Some(target),
                payload,
                ..DataFlowEnvelope::new(DataFlowKind::Sync, tenant_id, source)
            },
            DataFlowAction::Broadcast { channel, source, payload } => DataFlowEnvelope {
                channel: Some(channel),
                payload,
                ..DataFlowEnvelope::new(
                    DataFlowKind::Broadcast,
                    tenant_id,
                    source.unwrap_or_else(default_source),
                )
            },
            DataFlowAction::Subscribe { channel, source } => DataFlowEnvelope {
                channel: Some(channel),
                subscription_id: Some(Uuid::now_v7()),
                ..DataFlowEnvelope::new(
                    DataFlowKind::Subscribe,
                    tenant_id,
                    source.unwrap_or_else(default_source),
                )
            },
            DataFlowAction::Unsubscribe { channel, subscription_id } => DataFlowEnvelope {
                channel: Some(channel),
                subscription_id: Some(subscription_id),
                ..DataFlowEnvelope::new(DataFlowKind::Unsubscribe, tenant_id, default_source())
            },
        }
    }
}

#[async_trait]
impl Workflow for DataFlowWorkflow {
    fn id(&self) -> &str {
        DATA_FLOW_WORKFLOW_ID
    }

    fn name(&self) -> &str {
        "Data Flow Workflow"
    }

    async fn execute(&self, context: &WorkflowContext) -> anyhow::Result<WorkflowResult> {
        let action = match parse_action::<DataFlowAction>(&context.data) {
            Ok(action) => action,
            Err(err) => return Ok(err.into_result(DATA_FLOW_WORKFLOW_ID)),
        };

        let name = action.name();
        let envelope = Self::envelope(context, action);
        debug!(
            tenant_id = %envelope.tenant_id,
            action = name,
            channel = envelope.channel.as_deref().unwrap_or("-"),
            "data flow envelope built"
        );

        let message = match envelope.kind {
            DataFlowKind::Sync => "Data synchronized",
            DataFlowKind::Broadcast => "Data broadcast",
            DataFlowKind::Subscribe => "Subscribed",
            DataFlowKind::Unsubscribe => "Unsubscribed",
        };
        // Caller metadata (correlation ids and the like) rides back untouched.
        let result = WorkflowResult::ok(message, envelope).into_untyped();
        Ok(match &context.metadata {
            Some(metadata) => result.with_metadata(metadata.clone()),
            None => result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::codes;
    use serde_json::json;
    use skillhub_core::UserId;

    async fn run(context: WorkflowContext) -> WorkflowResult<DataFlowEnvelope> {
        DataFlowWorkflow::new().execute(&context).await.unwrap().decode()
    }

    #[tokio::test]
    async fn sync_carries_source_target_and_payload() {
        let result = run(WorkflowContext::new(
            "acme",
            json!({ "action": "sync", "source": "editor", "target": "preview", "payload": { "v": 1 } }),
        ))
        .await;

        let envelope = result.data.unwrap();
        assert_eq!(envelope.kind, DataFlowKind::Sync);
        assert_eq!(envelope.source, "editor");
        assert_eq!(envelope.target.as_deref(), Some("preview"));
        assert_eq!(envelope.payload["v"], 1);
        assert_eq!(envelope.tenant_id.as_str(), "acme");
    }

    #[tokio::test]
    async fn broadcast_defaults_source_to_user() {
        let context = WorkflowContext::new("acme", json!({ "action": "broadcast", "channel": "groups" }))
            .with_user(UserId::new("u-7"), None);

        let envelope = run(context).await.data.unwrap();
        assert_eq!(envelope.source, "u-7");
        assert_eq!(envelope.channel.as_deref(), Some("groups"));
        assert!(envelope.subscription_id.is_none());
    }

    #[tokio::test]
    async fn subscribe_then_unsubscribe_echoes_id() {
        let subscribed = run(WorkflowContext::new("acme", json!({ "action": "subscribe", "channel": "jobs" })))
            .await
            .data
            .unwrap();
        let id = subscribed.subscription_id.unwrap();
        assert_eq!(subscribed.source, "acme");

        let unsubscribed = run(WorkflowContext::new(
            "acme",
            json!({ "action": "unsubscribe", "channel": "jobs", "subscriptionId": id }),
        ))
        .await
        .data
        .unwrap();
        assert_eq!(unsubscribed.kind, DataFlowKind::Unsubscribe);
        assert_eq!(unsubscribed.subscription_id, Some(id));
    }

    #[tokio::test]
    async fn caller_metadata_is_echoed() {
        let mut context = WorkflowContext::new("acme", json!({ "action": "broadcast", "channel": "groups" }));
        context.metadata = Some(json!({ "correlationId": "c-42" }));

        let result = run(context).await;
        assert_eq!(result.metadata.unwrap()["correlationId"], "c-42");

        let bare = run(WorkflowContext::new("acme", json!({ "action": "subscribe", "channel": "jobs" }))).await;
        assert!(bare.metadata.is_none());
    }

    #[tokio::test]
    async fn bad_input_is_400() {
        let unknown = run(WorkflowContext::new("acme", json!({ "action": "publish" }))).await;
        assert_eq!(unknown.error_code(), Some(codes::INVALID_ACTION));

        let missing_target = run(WorkflowContext::new("acme", json!({ "action": "sync", "source": "a" }))).await;
        assert_eq!(missing_target.error_code(), Some(codes::INVALID_PAYLOAD));
    }
}
