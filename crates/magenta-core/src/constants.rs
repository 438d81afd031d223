// ABOUTME: Domain constants for turn processing, retrieval, and tool execution
// ABOUTME: Central place for defaults that configuration falls back to
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

//! Application constants organized by domain

/// Turn orchestration defaults
pub mod turn {
    /// Default bound on consecutive tool-call rounds within one turn
    pub const MAX_CHAINED_TOOL_CALLS: usize = 10;

    /// Canned assistant reply produced by dry-run turns
    pub const DRY_RUN_TEXT: &str = "This is a test message.";

    /// Prefix applied to the stored user message id so it pairs with the reply id
    pub const USER_MESSAGE_ID_PREFIX: &str = "q-";

    /// Placeholder rendered for internal messages that carry no content
    pub const INTERNAL_MESSAGE_PLACEHOLDER: &str = "--INTERNAL--";

    /// Default whole-turn timeout in seconds
    pub const TURN_TIMEOUT_SECS: u64 = 600;
}

/// Retrieval defaults
pub mod retrieval {
    /// Maximum number of passages returned by a retrieval query
    pub const DEFAULT_TOP_N: usize = 5;

    /// Minimum similarity a passage needs to be returned
    pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.7;

    /// Connecting phrase placed before retrieved passages when the prompt sets none
    pub const DEFAULT_RAG_CONNECTING_PROMPT: &str = "Related information:";

    /// Dimension of the offline hashing embedder
    pub const HASHING_EMBEDDING_DIM: usize = 256;
}

/// Tool execution defaults
pub mod tools {
    /// Timeout for outbound HTTP calls made by external tools
    pub const EXTERNAL_TOOL_TIMEOUT_SECS: u64 = 30;

    /// Connection timeout for external tool calls
    pub const EXTERNAL_TOOL_CONNECT_TIMEOUT_SECS: u64 = 10;
}

/// LLM gateway defaults
pub mod llm {
    /// Default base URL for the OpenAI-compatible completion endpoint
    pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

    /// Default completion model
    pub const DEFAULT_MODEL: &str = "gpt-4o";

    /// Default embedding model
    pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

    /// Request timeout for completion calls
    pub const REQUEST_TIMEOUT_SECS: u64 = 120;

    /// Connection timeout for completion calls
    pub const CONNECT_TIMEOUT_SECS: u64 = 30;
}

/// Service identity
pub mod service_names {
    /// Service name used in structured logs
    pub const MAGENTA_SERVER: &str = "magenta-server";
}
