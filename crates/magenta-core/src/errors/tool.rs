// ABOUTME: Tool-specific error types for the tool registry and execution engine
// ABOUTME: Provides structured errors that integrate with the main AppError system
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

//! # Tool Error Types
//!
//! Provides structured error types for tool-related operations:
//! - `ToolError` - errors raised while looking up or executing a single tool
//! - `RegistryValidationError` - every schema/implementation mismatch found in a batch load
//! - Conversion traits to `AppError` for HTTP response formatting

use std::error::Error;
use std::fmt;

use super::{AppError, ErrorCode};

/// Errors specific to tool operations.
///
/// Execution-level variants are rendered into the tool-result message the
/// model sees; lookup-level variants abort the turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// Tool was not found in the registry
    NotFound {
        /// Name of the requested tool
        tool_name: String,
    },
    /// Tool parameter validation failed
    InvalidParameter {
        /// Name of the tool
        tool_name: String,
        /// Name of the invalid parameter
        parameter: String,
        /// Reason the parameter is invalid
        reason: String,
    },
    /// Required parameter is missing
    MissingParameter {
        /// Name of the tool
        tool_name: String,
        /// Name of the missing parameter
        parameter: String,
    },
    /// Tool execution failed
    ExecutionFailed {
        /// Name of the tool that failed
        tool_name: String,
        /// Details about the failure
        details: String,
    },
    /// External tool answered with a non-success HTTP status
    HttpStatus {
        /// Name of the tool
        tool_name: String,
        /// HTTP status code returned
        status: u16,
        /// Leading part of the response body
        body: String,
    },
    /// External tool did not answer in time
    Timeout {
        /// Name of the tool
        tool_name: String,
        /// Timeout that elapsed
        seconds: u64,
    },
    /// Tool is already registered (for registry operations)
    AlreadyRegistered {
        /// Name of the already-registered tool
        tool_name: String,
    },
}

impl ToolError {
    /// Create a "not found" error
    #[must_use]
    pub fn not_found(tool_name: impl Into<String>) -> Self {
        Self::NotFound {
            tool_name: tool_name.into(),
        }
    }

    /// Create an "invalid parameter" error
    #[must_use]
    pub fn invalid_parameter(
        tool_name: impl Into<String>,
        parameter: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            tool_name: tool_name.into(),
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Create a "missing parameter" error
    #[must_use]
    pub fn missing_parameter(tool_name: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::MissingParameter {
            tool_name: tool_name.into(),
            parameter: parameter.into(),
        }
    }

    /// Create an "execution failed" error
    #[must_use]
    pub fn execution_failed(tool_name: impl Into<String>, details: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            tool_name: tool_name.into(),
            details: details.into(),
        }
    }

    /// Create an error for a non-success HTTP response
    #[must_use]
    pub fn http_status(tool_name: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            tool_name: tool_name.into(),
            status,
            body: body.into(),
        }
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(tool_name: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            tool_name: tool_name.into(),
            seconds,
        }
    }

    /// Create an "already registered" error
    #[must_use]
    pub fn already_registered(tool_name: impl Into<String>) -> Self {
        Self::AlreadyRegistered {
            tool_name: tool_name.into(),
        }
    }

    /// Get the tool name associated with this error
    #[must_use]
    pub fn tool_name(&self) -> &str {
        match self {
            Self::NotFound { tool_name }
            | Self::InvalidParameter { tool_name, .. }
            | Self::MissingParameter { tool_name, .. }
            | Self::ExecutionFailed { tool_name, .. }
            | Self::HttpStatus { tool_name, .. }
            | Self::Timeout { tool_name, .. }
            | Self::AlreadyRegistered { tool_name } => tool_name,
        }
    }

    /// Whether this error should abort the turn instead of being shown to the model
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::AlreadyRegistered { .. })
    }

    /// Render the error as the tool-result text the model observes
    #[must_use]
    pub fn to_observation(&self) -> String {
        format!("ERROR when executing tool '{}': {self}", self.tool_name())
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { tool_name } => {
                write!(f, "Tool '{tool_name}' not found")
            }
            Self::InvalidParameter {
                tool_name,
                parameter,
                reason,
            } => {
                write!(
                    f,
                    "Invalid parameter '{parameter}' for tool '{tool_name}': {reason}"
                )
            }
            Self::MissingParameter {
                tool_name,
                parameter,
            } => {
                write!(
                    f,
                    "Missing required parameter '{parameter}' for tool '{tool_name}'"
                )
            }
            Self::ExecutionFailed { details, .. } => write!(f, "{details}"),
            Self::HttpStatus { status, body, .. } => {
                if body.is_empty() {
                    write!(f, "HTTP status {status}")
                } else {
                    write!(f, "HTTP status {status}: {body}")
                }
            }
            Self::Timeout { seconds, .. } => write!(f, "no response after {seconds}s"),
            Self::AlreadyRegistered { tool_name } => {
                write!(f, "Tool '{tool_name}' is already registered")
            }
        }
    }
}

impl Error for ToolError {}

impl From<ToolError> for AppError {
    fn from(error: ToolError) -> Self {
        let code = match &error {
            ToolError::NotFound { .. } => ErrorCode::ResourceNotFound,
            ToolError::InvalidParameter { .. } => ErrorCode::InvalidInput,
            ToolError::MissingParameter { .. } => ErrorCode::MissingRequiredField,
            ToolError::ExecutionFailed { .. } | ToolError::HttpStatus { .. } => {
                ErrorCode::ExternalServiceError
            }
            ToolError::Timeout { .. } => ErrorCode::OperationTimeout,
            ToolError::AlreadyRegistered { .. } => ErrorCode::ResourceAlreadyExists,
        };
        let tool_name = error.tool_name().to_owned();
        Self::new(code, error.to_string()).with_resource_id(tool_name)
    }
}

/// All schema/implementation mismatches found while loading a batch of tools
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryValidationError {
    /// One message per mismatch, in discovery order
    pub errors: Vec<String>,
}

impl RegistryValidationError {
    /// Whether no mismatch was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record a mismatch
    pub fn push(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

impl fmt::Display for RegistryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tool validation error(s): {}",
            self.errors.len(),
            self.errors.join("; ")
        )
    }
}

impl Error for RegistryValidationError {}

impl From<RegistryValidationError> for AppError {
    fn from(error: RegistryValidationError) -> Self {
        Self::new(ErrorCode::ConfigInvalid, error.to_string())
            .with_details(serde_json::json!({ "errors": error.errors }))
    }
}
