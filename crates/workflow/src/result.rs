//! The uniform response contract of every workflow.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use skillhub_client::ApiError;
use skillhub_core::DomainError;

/// Well-known error codes.
///
/// Workflow-specific codes follow the `<OPERATION>_FAILED` (server
/// rejection, carries the server's status) / `<OPERATION>_ERROR` (transport
/// or parse failure, 500) convention.
pub mod codes {
    pub const INVALID_ACTION: &str = "INVALID_ACTION";
    pub const INVALID_PAYLOAD: &str = "INVALID_PAYLOAD";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const WORKFLOW_NOT_FOUND: &str = "WORKFLOW_NOT_FOUND";
    pub const WORKFLOW_EXECUTION_ERROR: &str = "WORKFLOW_EXECUTION_ERROR";
    pub const RESULT_DECODE_ERROR: &str = "RESULT_DECODE_ERROR";
    pub const SESSION_ERROR: &str = "SESSION_ERROR";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl WorkflowError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            field: None,
            details: None,
        }
    }
}

/// Outcome of a workflow execution.
///
/// `success == false` always comes with at least one entry in `errors` when
/// built through [`WorkflowResult::failure`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowResult<T = Value> {
    pub success: bool,
    pub message: String,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<WorkflowError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl<T> WorkflowResult<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: Vec::new(),
            status_code: Some(200),
            metadata: None,
        }
    }

    /// Failure carrying one error whose message equals the result message.
    pub fn failure(code: &str, message: impl Into<String>, status_code: u16) -> Self {
        let message = message.into();
        Self {
            success: false,
            errors: vec![WorkflowError::new(code, message.clone())],
            message,
            data: None,
            status_code: Some(status_code),
            metadata: None,
        }
    }

    /// Attach diagnostic details to the first error.
    pub fn with_details(mut self, details: Value) -> Self {
        if let Some(first) = self.errors.first_mut() {
            first.details = Some(details);
        }
        self
    }

    /// Attribute the first error to an input field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        if let Some(first) = self.errors.first_mut() {
            first.field = Some(field.into());
        }
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Map a failed API call onto the `<OP>_FAILED` / `<OP>_ERROR` pair.
    ///
    /// Server rejections keep the server's status and message; transport and
    /// parse failures become 500.
    pub fn from_api_error(err: &ApiError, failed_code: &str, error_code: &str) -> Self {
        match err {
            ApiError::Rejected { status, message } => Self::failure(failed_code, message.clone(), *status),
            other => Self::failure(error_code, other.to_string(), other.status_code()),
        }
    }

    /// Local validation failure (400), attributed to its field when known.
    pub fn from_validation(err: &DomainError) -> Self {
        let message = match err {
            DomainError::Validation { message, .. } => message.clone(),
            other => other.to_string(),
        };
        let result = Self::failure(codes::VALIDATION_ERROR, message, 400);
        match err.field_name() {
            Some(field) => result.with_field(field),
            None => result,
        }
    }

    /// Code of the first error, if any.
    pub fn error_code(&self) -> Option<&str> {
        self.errors.first().map(|e| e.code.as_str())
    }
}

impl<T: Serialize> WorkflowResult<T> {
    /// Type-erase the payload for transport through the manager.
    pub fn into_untyped(self) -> WorkflowResult {
        let WorkflowResult {
            success,
            message,
            data,
            errors,
            status_code,
            metadata,
        } = self;

        match data.map(serde_json::to_value).transpose() {
            Ok(data) => WorkflowResult {
                success,
                message,
                data,
                errors,
                status_code,
                metadata,
            },
            Err(e) => WorkflowResult::failure(
                codes::RESULT_DECODE_ERROR,
                format!("workflow result could not be encoded: {e}"),
                500,
            ),
        }
    }
}

impl WorkflowResult {
    /// Decode the untyped payload into `T`.
    pub fn decode<T: DeserializeOwned>(self) -> WorkflowResult<T> {
        let WorkflowResult {
            success,
            message,
            data,
            errors,
            status_code,
            metadata,
        } = self;

        match data.map(serde_json::from_value::<T>).transpose() {
            Ok(data) => WorkflowResult {
                success,
                message,
                data,
                errors,
                status_code,
                metadata,
            },
            Err(e) => WorkflowResult::failure(
                codes::RESULT_DECODE_ERROR,
                format!("workflow result could not be decoded: {e}"),
                500,
            ),
        }
    }
}
