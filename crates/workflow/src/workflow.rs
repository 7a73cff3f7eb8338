use async_trait::async_trait;

use crate::{WorkflowContext, WorkflowResult};

/// A stateless, action-dispatching unit of client behaviour.
///
/// Implementations hold only injected handles (API client, session store);
/// all application state lives with the caller. Expected failures are
/// returned as `Ok(WorkflowResult { success: false, .. })`. An `Err` (or a
/// panic) means the workflow itself broke; [`crate::WorkflowManager`] turns
/// both into a `WORKFLOW_EXECUTION_ERROR` result.
#[async_trait]
pub trait Workflow: Send + Sync {
    /// Registry key.
    fn id(&self) -> &str;

    /// Human-readable name.
    fn name(&self) -> &str;

    async fn execute(&self, context: &WorkflowContext) -> anyhow::Result<WorkflowResult>;
}
