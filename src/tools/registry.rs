// ABOUTME: Tool registry mapping function names to local or external tool entries
// ABOUTME: Loads schema batches fail-closed and resolves a prompt's toolset to schemas
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

//! # Tool Registry
//!
//! The registry is built once at startup, validated as a whole, and then
//! shared immutably behind `Arc` by the execution engine and the turn
//! orchestrator. Entries are keyed by `function.name`, the dispatch key the
//! model uses; `tool_id` is kept only on the schema.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use super::builtin::builtin_tools;
use super::traits::LocalTool;
use super::validation::{validate_declaration, validate_signature};
use crate::errors::{AppError, AppResult, RegistryValidationError, ToolError};
use crate::models::{HttpMethod, ToolKind, ToolSchema};

/// A registered tool
#[derive(Clone)]
pub enum ToolEntry {
    /// In-process callable
    Local {
        /// Implementation
        implementation: Arc<dyn LocalTool>,
        /// Declared interface
        schema: ToolSchema,
    },
    /// Outbound HTTP endpoint
    External {
        /// Endpoint
        url: Url,
        /// Request method
        method: HttpMethod,
        /// Declared interface
        schema: ToolSchema,
    },
}

impl ToolEntry {
    /// Declared interface of the entry
    #[must_use]
    pub const fn schema(&self) -> &ToolSchema {
        match self {
            Self::Local { schema, .. } | Self::External { schema, .. } => schema,
        }
    }
}

impl fmt::Debug for ToolEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { schema, .. } => f
                .debug_struct("Local")
                .field("name", &schema.name())
                .finish_non_exhaustive(),
            Self::External { url, method, schema } => f
                .debug_struct("External")
                .field("name", &schema.name())
                .field("url", &url.as_str())
                .field("method", method)
                .finish(),
        }
    }
}

/// Name-keyed registry of tools
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolEntry>,
}

impl ToolRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a batch of schemas against the given implementations.
    ///
    /// Function tools must have an implementation with a matching name and
    /// signature; external tools need a valid url and method. The batch is
    /// rejected as a whole if any tool is invalid.
    ///
    /// # Errors
    ///
    /// Returns a `CONFIG_INVALID` error carrying every validation message.
    pub fn load(
        schemas: Vec<ToolSchema>,
        implementations: Vec<Arc<dyn LocalTool>>,
    ) -> AppResult<Self> {
        let implementations: HashMap<&str, Arc<dyn LocalTool>> = implementations
            .into_iter()
            .map(|implementation| (implementation.name(), implementation))
            .collect();

        let mut report = RegistryValidationError::default();
        let mut registry = Self::new();

        for schema in schemas {
            let mut errors = validate_declaration(&schema);

            if registry.contains(schema.name()) {
                errors.push(format!(
                    "{}: Function name is registered more than once.",
                    schema.name()
                ));
            }

            let entry = match schema.kind {
                ToolKind::Function => match implementations.get(schema.name()) {
                    None => {
                        errors.push(format!(
                            "Function '{}' is defined but not implemented.",
                            schema.name()
                        ));
                        None
                    }
                    Some(implementation) => {
                        errors.extend(validate_signature(&schema, &implementation.signature()));
                        Some(ToolEntry::Local {
                            implementation: Arc::clone(implementation),
                            schema,
                        })
                    }
                },
                ToolKind::External => match (
                    schema.url.as_deref().map(Url::parse),
                    schema.method,
                ) {
                    (Some(Ok(url)), Some(method)) => {
                        Some(ToolEntry::External { url, method, schema })
                    }
                    // reported by validate_declaration
                    _ => None,
                },
            };

            if errors.is_empty() {
                if let Some(entry) = entry {
                    registry.insert(entry);
                }
            } else {
                for error in errors {
                    warn!("{error}");
                    report.push(error);
                }
            }
        }

        if !report.is_empty() {
            return Err(report.into());
        }

        info!(tools = registry.len(), "Tool registry loaded");
        Ok(registry)
    }

    /// Registry holding only the built-in tools
    ///
    /// # Errors
    ///
    /// Returns a validation error if a built-in schema drifts from its implementation.
    pub fn with_builtin_tools() -> AppResult<Self> {
        let (schemas, implementations) = builtin_tools();
        Self::load(schemas, implementations)
    }

    fn insert(&mut self, entry: ToolEntry) {
        let name = entry.schema().name().to_owned();
        debug!(tool = %name, "Registering tool");
        self.tools.insert(name, entry);
    }

    /// Register a single local tool after validating it
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or the signature does not match.
    pub fn register_local(
        &mut self,
        implementation: Arc<dyn LocalTool>,
        schema: ToolSchema,
    ) -> AppResult<()> {
        if self.contains(schema.name()) {
            return Err(ToolError::already_registered(schema.name()).into());
        }
        let mut errors = validate_declaration(&schema);
        errors.extend(validate_signature(&schema, &implementation.signature()));
        if !errors.is_empty() {
            return Err(RegistryValidationError { errors }.into());
        }
        self.insert(ToolEntry::Local {
            implementation,
            schema,
        });
        Ok(())
    }

    /// Register a single external tool after validating it
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or the url or method is invalid.
    pub fn register_external(&mut self, schema: ToolSchema) -> AppResult<()> {
        if self.contains(schema.name()) {
            return Err(ToolError::already_registered(schema.name()).into());
        }
        let errors = validate_declaration(&schema);
        if !errors.is_empty() {
            return Err(RegistryValidationError { errors }.into());
        }
        let (Some(Ok(url)), Some(method)) = (schema.url.as_deref().map(Url::parse), schema.method)
        else {
            return Err(AppError::config(format!(
                "External tool '{}' needs a url and method",
                schema.name()
            )));
        };
        self.insert(ToolEntry::External { url, method, schema });
        Ok(())
    }

    /// Get a tool by function name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolEntry> {
        self.tools.get(name)
    }

    /// Check if a tool is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Number of registered tools
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tool is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Registered function names, sorted
    #[must_use]
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve a toolset (function names) to schemas, keeping the toolset order
    ///
    /// # Errors
    ///
    /// Returns `ToolError::NotFound` for the first unknown name.
    pub fn schemas_for(&self, toolset: &[String]) -> Result<Vec<ToolSchema>, ToolError> {
        toolset
            .iter()
            .map(|name| {
                self.get(name)
                    .map(|entry| entry.schema().clone())
                    .ok_or_else(|| ToolError::not_found(name))
            })
            .collect()
    }
}
