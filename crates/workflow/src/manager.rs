//! Workflow registry + dispatcher.
//!
//! ```text
//! execute(id, ctx)
//!   ├─ id not registered      → WORKFLOW_NOT_FOUND (404)
//!   ├─ workflow returns Err   → WORKFLOW_EXECUTION_ERROR (500)
//!   ├─ workflow panics        → WORKFLOW_EXECUTION_ERROR (500)
//!   └─ workflow returns Ok(r) → r, unchanged
//! ```
//!
//! Nothing escapes `execute`: callers never need to handle an `Err` or a
//! panic. No retries happen here; retry policy belongs to the caller.
//!
//! The manager is an ordinary value. Share it with `Arc` and pass it to
//! whoever dispatches; there is no process-wide instance.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::result::{WorkflowError, codes};
use crate::{Workflow, WorkflowContext, WorkflowResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStats {
    pub total_workflows: usize,
    /// Registered ids, ascending.
    pub workflow_ids: Vec<String>,
}

#[derive(Default)]
pub struct WorkflowManager {
    workflows: RwLock<HashMap<String, Arc<dyn Workflow>>>,
}

impl core::fmt::Debug for WorkflowManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WorkflowManager")
            .field("workflow_ids", &self.get_stats().workflow_ids)
            .finish()
    }
}

impl WorkflowManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `workflow` under its id.
    ///
    /// A workflow already registered under the same id is replaced silently
    /// (last write wins).
    pub fn register(&self, workflow: Arc<dyn Workflow>) {
        let id = workflow.id().to_string();
        let mut workflows = self.workflows.write().unwrap_or_else(PoisonError::into_inner);
        if workflows.insert(id.clone(), workflow).is_some() {
            debug!(workflow_id = %id, "workflow re-registered; previous instance replaced");
        } else {
            info!(workflow_id = %id, "workflow registered");
        }
    }

    /// Remove a workflow. Returns whether one was registered.
    pub fn unregister(&self, workflow_id: &str) -> bool {
        let mut workflows = self.workflows.write().unwrap_or_else(PoisonError::into_inner);
        workflows.remove(workflow_id).is_some()
    }

    pub fn get_workflow(&self, workflow_id: &str) -> Option<Arc<dyn Workflow>> {
        let workflows = self.workflows.read().unwrap_or_else(PoisonError::into_inner);
        workflows.get(workflow_id).cloned()
    }

    pub fn has_workflow(&self, workflow_id: &str) -> bool {
        let workflows = self.workflows.read().unwrap_or_else(PoisonError::into_inner);
        workflows.contains_key(workflow_id)
    }

    /// Every registered workflow, ordered by id.
    pub fn get_all_workflows(&self) -> Vec<Arc<dyn Workflow>> {
        let workflows = self.workflows.read().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<_> = workflows.values().cloned().collect();
        all.sort_by(|a, b| a.id().cmp(b.id()));
        all
    }

    pub fn clear(&self) {
        let mut workflows = self.workflows.write().unwrap_or_else(PoisonError::into_inner);
        workflows.clear();
    }

    pub fn get_stats(&self) -> WorkflowStats {
        let workflows = self.workflows.read().unwrap_or_else(PoisonError::into_inner);
        let mut workflow_ids: Vec<String> = workflows.keys().cloned().collect();
        workflow_ids.sort();
        WorkflowStats {
            total_workflows: workflow_ids.len(),
            workflow_ids,
        }
    }

    /// Run the workflow registered under `workflow_id`.
    pub async fn execute(&self, workflow_id: &str, context: WorkflowContext) -> WorkflowResult {
        let Some(workflow) = self.get_workflow(workflow_id) else {
            warn!(workflow_id, tenant_id = %context.tenant_id, "workflow not found");
            return WorkflowResult::failure(
                codes::WORKFLOW_NOT_FOUND,
                format!("Workflow '{workflow_id}' not found"),
                404,
            );
        };

        debug!(
            workflow_id,
            tenant_id = %context.tenant_id,
            action = context.action().unwrap_or("-"),
            "executing workflow"
        );

        // Run on its own task so a panic inside the workflow is observed as a
        // JoinError instead of unwinding through the caller.
        let task_context = context.clone();
        let outcome =
            tokio::spawn(async move { workflow.execute(&task_context).await }).await;

        match outcome {
            Ok(Ok(result)) => {
                if !result.success {
                    debug!(
                        workflow_id,
                        code = result.error_code().unwrap_or("-"),
                        status = ?result.status_code,
                        "workflow reported failure"
                    );
                }
                result
            }
            Ok(Err(err)) => {
                error!(workflow_id, "workflow execution failed: {err:?}");
                execution_failure(workflow_id, format!("{err:#}"), &context)
            }
            Err(join_err) => {
                let message = panic_message(join_err);
                error!(workflow_id, "workflow panicked: {message}");
                execution_failure(workflow_id, message, &context)
            }
        }
    }

    /// [`execute`](Self::execute) with the payload decoded into `T`.
    ///
    /// A payload that does not decode becomes a `RESULT_DECODE_ERROR` (500).
    pub async fn execute_as<T>(&self, workflow_id: &str, context: WorkflowContext) -> WorkflowResult<T>
    where
        T: DeserializeOwned,
    {
        self.execute(workflow_id, context).await.decode()
    }
}

fn execution_failure(workflow_id: &str, message: String, context: &WorkflowContext) -> WorkflowResult {
    WorkflowResult {
        success: false,
        message: format!("Workflow '{workflow_id}' execution failed: {message}"),
        data: None,
        errors: vec![WorkflowError {
            code: codes::WORKFLOW_EXECUTION_ERROR.to_string(),
            message,
            field: None,
            details: Some(json!({
                "workflowId": workflow_id,
                "context": context.to_diagnostic(),
            })),
        }],
        status_code: Some(500),
        metadata: None,
    }
}

fn panic_message(err: tokio::task::JoinError) -> String {
    if err.is_cancelled() {
        return "workflow task was cancelled".to_string();
    }
    match err.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "workflow panicked".to_string()),
        Err(err) => err.to_string(),
    }
}
