// ABOUTME: Prompt assembly service merging system prompt, context documents, and retrieval results
// ABOUTME: Produces the effective system prompt plus stored and model-facing views of the user message
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::RetrievalConfig;
use crate::constants::retrieval::DEFAULT_RAG_CONNECTING_PROMPT;
use crate::database::DatabaseProvider;
use crate::errors::{AppError, AppResult};
use crate::models::{Chat, Prompt};
use crate::retrieval::{format_passages, Passage, RetrievalQuery, Retriever};

/// Everything one turn needs from its prompt
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledPrompt {
    /// Resolved prompt (toolset, documents)
    pub prompt: Prompt,
    /// System prompt with suffix and context documents applied
    pub system_prompt: String,
    /// User message text as persisted
    pub stored_message: String,
    /// User message text as sent to the model
    pub llm_message: String,
    /// Passages retrieved for this turn
    pub passages: Vec<Passage>,
}

/// Builds per-turn prompts; nothing is cached between turns
pub struct PromptAssembler {
    database: Arc<dyn DatabaseProvider>,
    retriever: Option<Arc<dyn Retriever>>,
    retrieval: RetrievalConfig,
    persist_rag_results: bool,
}

impl PromptAssembler {
    /// Create an assembler; without a retriever, prompts declaring `rag_documents` fail
    #[must_use]
    pub fn new(
        database: Arc<dyn DatabaseProvider>,
        retriever: Option<Arc<dyn Retriever>>,
        retrieval: RetrievalConfig,
        persist_rag_results: bool,
    ) -> Self {
        Self {
            database,
            retriever,
            retrieval,
            persist_rag_results,
        }
    }

    /// Load the prompt for a turn: the override if given, else the conversation's own
    ///
    /// # Errors
    ///
    /// Returns not-found when neither id is set or the prompt does not exist.
    pub async fn resolve_prompt(&self, chat: &Chat, override_id: Option<&str>) -> AppResult<Prompt> {
        let prompt_id = override_id
            .or(chat.sysprompt_id.as_deref())
            .ok_or_else(|| {
                AppError::not_found(format!("System prompt for chat '{}'", chat.chat_id))
            })?;

        self.database
            .get_prompt(prompt_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Prompt '{prompt_id}'")))
    }

    /// Apply the suffix, then append the full text of every context document
    ///
    /// # Errors
    ///
    /// Returns not-found if a referenced document does not exist.
    pub async fn system_prompt(&self, prompt: &Prompt, suffix: Option<&str>) -> AppResult<String> {
        let mut system_prompt = prompt.prompt.clone();
        if let Some(suffix) = suffix {
            system_prompt = format!("{system_prompt}\n\n{suffix}");
        }

        let Some(spec) = prompt
            .documents
            .as_ref()
            .filter(|spec| !spec.context_documents.is_empty())
        else {
            return Ok(system_prompt);
        };

        let mut bodies = Vec::with_capacity(spec.context_documents.len());
        for reference in &spec.context_documents {
            let document = self
                .database
                .get_document(&reference.document_id)
                .await?
                .ok_or_else(|| {
                    AppError::not_found(format!("Document '{}'", reference.document_id))
                })?;
            bodies.push(document.text);
        }
        debug!(
            prompt_id = %prompt.prompt_id,
            documents = bodies.len(),
            "Appending context documents to system prompt"
        );

        let connecting = spec.context_connecting_prompt.as_deref().unwrap_or("");
        Ok(format!(
            "{system_prompt}\n\n{connecting}\n\n{}",
            bodies.join("\n\n")
        ))
    }

    /// Retrieve passages for `message` and fold them into the stored and model views
    ///
    /// Returns `(stored, llm, passages)`. Ephemeral mode leaves the stored
    /// text untouched; persisted mode writes the augmented text.
    ///
    /// # Errors
    ///
    /// Returns a config error if the prompt requests retrieval but no
    /// retriever is configured, or the retriever's own error.
    pub async fn augment_message(
        &self,
        prompt: &Prompt,
        message: &str,
    ) -> AppResult<(String, String, Vec<Passage>)> {
        let Some(spec) = prompt
            .documents
            .as_ref()
            .filter(|spec| !spec.rag_documents.is_empty())
        else {
            return Ok((message.to_owned(), message.to_owned(), Vec::new()));
        };

        let retriever = self.retriever.as_ref().ok_or_else(|| {
            AppError::config(format!(
                "Prompt '{}' requests retrieval but no retriever is configured",
                prompt.prompt_id
            ))
        })?;

        let query = RetrievalQuery {
            text: message.to_owned(),
            document_ids: Some(
                spec.rag_documents
                    .iter()
                    .map(|reference| reference.document_id.clone())
                    .collect(),
            ),
            similarity_threshold: self.retrieval.similarity_threshold,
            top_n: self.retrieval.top_n,
        };
        let passages = retriever.retrieve(&query).await?;
        if passages.is_empty() {
            info!(prompt_id = %prompt.prompt_id, "No relevant passages found");
            return Ok((message.to_owned(), message.to_owned(), passages));
        }

        let connecting = spec
            .rag_connecting_prompt
            .as_deref()
            .unwrap_or(DEFAULT_RAG_CONNECTING_PROMPT);
        let augmented = format!("{message}\n\n{connecting}\n{}", format_passages(&passages));

        let stored = if self.persist_rag_results {
            augmented.clone()
        } else {
            message.to_owned()
        };
        Ok((stored, augmented, passages))
    }

    /// Resolve and assemble everything a turn needs
    ///
    /// # Errors
    ///
    /// Propagates lookup, retrieval, and configuration errors.
    pub async fn assemble(
        &self,
        chat: &Chat,
        message: &str,
        sysprompt_id: Option<&str>,
        sysprompt_suffix: Option<&str>,
    ) -> AppResult<AssembledPrompt> {
        let prompt = self.resolve_prompt(chat, sysprompt_id).await?;
        let system_prompt = self.system_prompt(&prompt, sysprompt_suffix).await?;
        let (stored_message, llm_message, passages) = self.augment_message(&prompt, message).await?;

        Ok(AssembledPrompt {
            prompt,
            system_prompt,
            stored_message,
            llm_message,
            passages,
        })
    }
}
