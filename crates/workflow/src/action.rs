//! Decoding `data.action` into a workflow's closed action enum.
//!
//! Actions are `#[serde(tag = "action")]` enums, so inside the crate an
//! unknown action cannot be constructed. Payloads arriving as JSON can still
//! name anything; those are classified here before serde sees them so that
//! "unknown action" and "bad payload for a known action" stay distinct.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::result::{WorkflowResult, codes};

/// A workflow's closed set of actions.
pub trait WorkflowAction: DeserializeOwned {
    /// Every accepted value of `data.action`.
    const NAMES: &'static [&'static str];

    /// Wire name of this action.
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// `data.action` absent or not a string.
    Missing,
    /// `data.action` names no action of this workflow.
    Unknown(String),
    /// The action is known but its payload does not decode.
    Payload { action: String, message: String },
}

impl ActionError {
    /// Convert into the structured 400 answer of `workflow`.
    pub fn into_result<T>(self, workflow: &str) -> WorkflowResult<T> {
        match self {
            ActionError::Missing => WorkflowResult::failure(
                codes::INVALID_ACTION,
                format!("No action specified for {workflow} workflow"),
                400,
            )
            .with_field("action"),
            ActionError::Unknown(action) => WorkflowResult::failure(
                codes::INVALID_ACTION,
                format!("Invalid action '{action}' for {workflow} workflow"),
                400,
            )
            .with_field("action"),
            ActionError::Payload { action, message } => WorkflowResult::failure(
                codes::INVALID_PAYLOAD,
                format!("Invalid payload for action '{action}': {message}"),
                400,
            ),
        }
    }
}

pub fn parse_action<A>(data: &Value) -> Result<A, ActionError>
where
    A: WorkflowAction,
{
    let action = data
        .get("action")
        .and_then(Value::as_str)
        .ok_or(ActionError::Missing)?;

    if !A::NAMES.contains(&action) {
        return Err(ActionError::Unknown(action.to_string()));
    }

    A::deserialize(data).map_err(|e| ActionError::Payload {
        action: action.to_string(),
        message: e.to_string(),
    })
}
