// ABOUTME: System prompt documents with optional toolset and retrieval specification
// ABOUTME: Read-only input to a turn; resolved fresh for every turn
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

use serde::{Deserialize, Serialize};

/// Kind of prompt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptKind {
    /// Plain system prompt
    #[default]
    System,
    /// Agent prompt with tools
    Agent,
}

/// Reference to a stored document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Referenced document id
    pub document_id: String,
    /// Collection the document lives in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
}

impl DocumentRef {
    /// Reference a document by id
    #[must_use]
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            table_name: None,
        }
    }
}

/// Documents attached to a prompt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagSpec {
    /// Documents retrieval is restricted to
    #[serde(default)]
    pub rag_documents: Vec<DocumentRef>,
    /// Documents whose full text is appended to the system prompt
    #[serde(default)]
    pub context_documents: Vec<DocumentRef>,
    /// Phrase placed before retrieved excerpts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rag_connecting_prompt: Option<String>,
    /// Phrase placed before context document bodies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_connecting_prompt: Option<String>,
}

/// A system prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// Prompt identity
    pub prompt_id: String,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Prompt kind
    #[serde(rename = "type", default)]
    pub kind: PromptKind,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Prompt text
    pub prompt: String,
    /// Tool function names offered to the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolset: Option<Vec<String>>,
    /// Attached documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<RagSpec>,
}

impl Prompt {
    /// Create a plain system prompt
    #[must_use]
    pub fn new(prompt_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            prompt_id: prompt_id.into(),
            name: None,
            kind: PromptKind::System,
            description: None,
            prompt: prompt.into(),
            toolset: None,
            documents: None,
        }
    }

    /// Attach a toolset; the prompt becomes an agent prompt
    #[must_use]
    pub fn with_toolset<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.toolset = Some(tools.into_iter().map(Into::into).collect());
        self.kind = PromptKind::Agent;
        self
    }

    /// Attach documents
    #[must_use]
    pub fn with_documents(mut self, documents: RagSpec) -> Self {
        self.documents = Some(documents);
        self
    }

    /// Tool names offered to the model; empty when no toolset is attached
    #[must_use]
    pub fn tool_names(&self) -> &[String] {
        self.toolset.as_deref().unwrap_or_default()
    }
}
