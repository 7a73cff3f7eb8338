//! `skillhub-workflow`: stateless workflows behind a uniform dispatcher.
//!
//! A workflow takes a [`WorkflowContext`] and always answers with a
//! [`WorkflowResult`]; failures are data, not panics or `Err`s, by the time
//! they leave [`WorkflowManager::execute`].

pub mod action;
pub mod auth;
pub mod context;
pub mod data_flow;
pub mod manager;
pub mod result;
pub mod tenant;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_support;

pub use action::{ActionError, WorkflowAction, parse_action};
pub use auth::{AUTH_WORKFLOW_ID, AuthAction, AuthWorkflow, RefreshRequest};
pub use context::WorkflowContext;
pub use data_flow::{
    DATA_FLOW_WORKFLOW_ID, DataFlowAction, DataFlowEnvelope, DataFlowKind, DataFlowWorkflow,
};
pub use manager::{WorkflowManager, WorkflowStats};
pub use result::{WorkflowError, WorkflowResult, codes};
pub use tenant::{
    SwitchTenantRequest, TENANT_WORKFLOW_ID, TenantAction, TenantWorkflow, UpdateTenantConfigRequest,
};
pub use workflow::Workflow;
