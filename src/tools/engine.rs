// ABOUTME: Tool execution engine dispatching calls to local callables or outbound HTTP endpoints
// ABOUTME: Converts every execution-level failure into an observation string for the model
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

//! Tool execution engine
//!
//! Only an unknown tool name is reported as an error to the caller. Invalid
//! arguments, implementation failures, panics, timeouts and non-2xx HTTP
//! responses all come back as a [`ToolOutput`] with `is_error` set, so the
//! model can react on its next round.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};
use url::Url;

use super::context::ToolExecutionContext;
use super::registry::{ToolEntry, ToolRegistry};
use super::result::ToolOutput;
use super::traits::LocalTool;
use crate::constants::tools::EXTERNAL_TOOL_CONNECT_TIMEOUT_SECS;
use crate::errors::{AppError, AppResult, ToolError};
use crate::models::HttpMethod;

/// Leading part of an error body kept in the observation
const ERROR_BODY_PREVIEW_CHARS: usize = 200;

/// Executes tool calls against a shared registry
#[derive(Clone)]
pub struct ToolExecutionEngine {
    registry: Arc<ToolRegistry>,
    client: Client,
    timeout: Duration,
}

impl ToolExecutionEngine {
    /// Create an engine; `timeout` bounds each single tool invocation
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(registry: Arc<ToolRegistry>, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(EXTERNAL_TOOL_CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            registry,
            client,
            timeout,
        })
    }

    /// The registry tools are resolved from
    #[must_use]
    pub const fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Execute one tool call
    ///
    /// # Errors
    ///
    /// Returns `ToolError::NotFound` when `name` is not registered. Every
    /// other failure is returned as an error observation.
    #[instrument(skip(self, raw_arguments, context), fields(tool = %name))]
    pub async fn execute(
        &self,
        name: &str,
        raw_arguments: &str,
        context: &ToolExecutionContext,
    ) -> Result<ToolOutput, ToolError> {
        let entry = self
            .registry
            .get(name)
            .ok_or_else(|| ToolError::not_found(name))?;

        let mut arguments = match parse_arguments(name, raw_arguments) {
            Ok(arguments) => arguments,
            Err(error) => {
                warn!(error = %error, "Rejected tool arguments");
                return Ok(ToolOutput::failure(&error));
            }
        };
        context.merge_into(entry.schema(), &mut arguments);

        let result = match entry {
            ToolEntry::Local { implementation, .. } => {
                self.call_local(name, Arc::clone(implementation), arguments)
                    .await
            }
            ToolEntry::External { url, method, .. } => {
                self.call_external(name, url, *method, &arguments).await
            }
        };

        match result {
            Ok(value) => {
                debug!("Tool call succeeded");
                Ok(ToolOutput::success(&value))
            }
            Err(error) => {
                warn!(error = %error, "Tool call failed");
                Ok(ToolOutput::failure(&error))
            }
        }
    }

    /// Run a local tool on its own task so a panic stays contained
    async fn call_local(
        &self,
        name: &str,
        implementation: Arc<dyn LocalTool>,
        arguments: Map<String, Value>,
    ) -> Result<Value, ToolError> {
        let mut handle = tokio::spawn(async move { implementation.call(arguments).await });

        match tokio::time::timeout(self.timeout, &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                let details = if join_error.is_panic() {
                    "tool panicked"
                } else {
                    "tool task was cancelled"
                };
                Err(ToolError::execution_failed(name, details))
            }
            Err(_) => {
                handle.abort();
                Err(ToolError::timeout(name, self.timeout.as_secs()))
            }
        }
    }

    /// Call an external tool; GET and DELETE send query parameters, POST and PUT a JSON body
    async fn call_external(
        &self,
        name: &str,
        url: &Url,
        method: HttpMethod,
        arguments: &Map<String, Value>,
    ) -> Result<Value, ToolError> {
        let builder = match method {
            HttpMethod::Get => self.client.get(url.clone()),
            HttpMethod::Delete => self.client.delete(url.clone()),
            HttpMethod::Post => self.client.post(url.clone()),
            HttpMethod::Put => self.client.put(url.clone()),
        };
        let request = if method.uses_query() {
            builder.query(&query_pairs(arguments))
        } else {
            builder.json(arguments)
        };

        debug!(url = %url, method = ?method, "Calling external tool");
        let response = request.timeout(self.timeout).send().await.map_err(|e| {
            if e.is_timeout() {
                ToolError::timeout(name, self.timeout.as_secs())
            } else {
                ToolError::execution_failed(name, format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ToolError::execution_failed(name, format!("failed to read response: {e}"))
        })?;

        if !status.is_success() {
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
            return Err(ToolError::http_status(name, status.as_u16(), preview));
        }

        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}

/// Parse the model's serialized arguments; empty text means no arguments
fn parse_arguments(name: &str, raw_arguments: &str) -> Result<Map<String, Value>, ToolError> {
    if raw_arguments.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(raw_arguments) {
        Ok(Value::Object(arguments)) => Ok(arguments),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(_) => Err(ToolError::invalid_parameter(
            name,
            "arguments",
            "expected a JSON object",
        )),
        Err(e) => Err(ToolError::invalid_parameter(
            name,
            "arguments",
            format!("not valid JSON: {e}"),
        )),
    }
}

/// Flatten arguments into query pairs; arrays repeat the key and nulls are dropped
fn query_pairs(arguments: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(arguments.len());
    for (key, value) in arguments {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                pairs.extend(items.iter().map(|item| (key.clone(), query_value(item))));
            }
            other => pairs.push((key.clone(), query_value(other))),
        }
    }
    pairs
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_arguments() {
        assert!(parse_arguments("t", "").unwrap().is_empty());
        assert!(parse_arguments("t", "null").unwrap().is_empty());
        assert_eq!(
            parse_arguments("t", r#"{"d": 6}"#).unwrap().get("d"),
            Some(&json!(6))
        );
        assert!(parse_arguments("t", "[1]").is_err());
        assert!(parse_arguments("t", "{oops").is_err());
    }

    #[test]
    fn test_query_pairs_repeat_array_keys() {
        let arguments = json!({"city": "Oslo", "days": 3, "tags": ["a", "b"], "skip": null});
        let pairs = query_pairs(arguments.as_object().unwrap());

        assert_eq!(
            pairs,
            vec![
                ("city".to_owned(), "Oslo".to_owned()),
                ("days".to_owned(), "3".to_owned()),
                ("tags".to_owned(), "a".to_owned()),
                ("tags".to_owned(), "b".to_owned()),
            ]
        );
    }
}
