// ABOUTME: Document bodies referenced by prompts as permanent context or retrieval scope
// ABOUTME: Ingestion happens elsewhere; the runtime only reads stored documents
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

use serde::{Deserialize, Serialize};

/// A stored document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Document identity
    pub document_id: String,
    /// Display name used when quoting excerpts
    pub name: String,
    /// Full extracted text
    pub text: String,
}

impl Document {
    /// Create a document
    #[must_use]
    pub fn new(
        document_id: impl Into<String>,
        name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            name: name.into(),
            text: text.into(),
        }
    }
}
