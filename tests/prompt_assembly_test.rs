// ABOUTME: Integration tests for system prompt and user message assembly
// ABOUTME: Covers suffix and context document ordering, retrieval augmentation, and persistence modes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use magenta_server::config::RetrievalConfig;
use magenta_server::database::DatabaseProvider;
use magenta_server::errors::{AppResult, ErrorCode};
use magenta_server::models::{Chat, Document, DocumentRef, Prompt, RagSpec};
use magenta_server::retrieval::{Passage, RetrievalQuery, Retriever};
use magenta_server::services::PromptAssembler;

/// Retriever returning canned passages and remembering the last query
#[derive(Default)]
struct StubRetriever {
    passages: Vec<Passage>,
    last_query: Mutex<Option<RetrievalQuery>>,
}

#[async_trait]
impl Retriever for StubRetriever {
    async fn retrieve(&self, query: &RetrievalQuery) -> AppResult<Vec<Passage>> {
        *self.last_query.lock().unwrap() = Some(query.clone());
        Ok(self.passages.clone())
    }
}

fn passage(name: &str, text: &str) -> Passage {
    Passage {
        document_id: name.to_lowercase(),
        name: name.to_owned(),
        text: text.to_owned(),
        similarity: 0.9,
    }
}

fn rag_prompt(connecting: Option<&str>) -> Prompt {
    Prompt::new("support", "You answer support questions.").with_documents(RagSpec {
        rag_documents: vec![DocumentRef::new("faq")],
        rag_connecting_prompt: connecting.map(str::to_owned),
        ..RagSpec::default()
    })
}

fn retrieval_config() -> RetrievalConfig {
    RetrievalConfig {
        top_n: 4,
        similarity_threshold: 0.25,
        ..RetrievalConfig::default()
    }
}

async fn setup(
    retriever: Option<Arc<dyn Retriever>>,
    persist_rag_results: bool,
) -> (Arc<dyn DatabaseProvider>, PromptAssembler) {
    let database: Arc<dyn DatabaseProvider> = common::create_test_database();
    database
        .upsert_document(&Document::new("policy", "Policy", "Refunds within 30 days."))
        .await
        .unwrap();
    database
        .upsert_document(&Document::new("hours", "Hours", "Open 9 to 5."))
        .await
        .unwrap();
    let assembler = PromptAssembler::new(
        Arc::clone(&database),
        retriever,
        retrieval_config(),
        persist_rag_results,
    );
    (database, assembler)
}

// ============================================================================
// System prompt
// ============================================================================

#[tokio::test]
async fn test_plain_prompt_is_used_verbatim() {
    let (_db, assembler) = setup(None, false).await;
    let prompt = Prompt::new("p", "Be brief.");

    assert_eq!(assembler.system_prompt(&prompt, None).await.unwrap(), "Be brief.");
}

#[tokio::test]
async fn test_suffix_precedes_context_documents() {
    let (_db, assembler) = setup(None, false).await;
    let prompt = Prompt::new("p", "Be brief.").with_documents(RagSpec {
        context_documents: vec![DocumentRef::new("policy"), DocumentRef::new("hours")],
        context_connecting_prompt: Some("Reference material:".to_owned()),
        ..RagSpec::default()
    });

    let system_prompt = assembler
        .system_prompt(&prompt, Some("Today is Friday."))
        .await
        .unwrap();

    assert_eq!(
        system_prompt,
        "Be brief.\n\nToday is Friday.\n\nReference material:\n\nRefunds within 30 days.\n\nOpen 9 to 5."
    );
}

#[tokio::test]
async fn test_missing_context_document_is_not_found() {
    let (_db, assembler) = setup(None, false).await;
    let prompt = Prompt::new("p", "Be brief.").with_documents(RagSpec {
        context_documents: vec![DocumentRef::new("gone")],
        ..RagSpec::default()
    });

    let error = assembler.system_prompt(&prompt, None).await.unwrap_err();

    assert_eq!(error.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_override_prompt_wins_over_chat_prompt() {
    let (database, assembler) = setup(None, false).await;
    database
        .upsert_prompt(&Prompt::new("default", "Default prompt."))
        .await
        .unwrap();
    database
        .upsert_prompt(&Prompt::new("pirate", "Talk like a pirate."))
        .await
        .unwrap();
    let chat = Chat::new("c1").with_sysprompt("default");

    let resolved = assembler.resolve_prompt(&chat, Some("pirate")).await.unwrap();
    assert_eq!(resolved.prompt_id, "pirate");

    let fallback = assembler.resolve_prompt(&chat, None).await.unwrap();
    assert_eq!(fallback.prompt_id, "default");

    let error = assembler
        .resolve_prompt(&Chat::new("c2"), None)
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::ResourceNotFound);
}

// ============================================================================
// Retrieval augmentation
// ============================================================================

#[tokio::test]
async fn test_ephemeral_augmentation_leaves_stored_text_alone() {
    let retriever = Arc::new(StubRetriever {
        passages: vec![passage("FAQ", "Refunds take 5 days.")],
        ..StubRetriever::default()
    });
    let (_db, assembler) = setup(Some(retriever.clone() as Arc<dyn Retriever>), false).await;

    let (stored, llm, passages) = assembler
        .augment_message(&rag_prompt(None), "How long do refunds take?")
        .await
        .unwrap();

    assert_eq!(stored, "How long do refunds take?");
    assert_eq!(
        llm,
        "How long do refunds take?\n\nRelated information:\nDocument: FAQ\nPotentially Relevant Text Excerpt: Refunds take 5 days."
    );
    assert_eq!(passages.len(), 1);

    let query = retriever.last_query.lock().unwrap().clone().unwrap();
    assert_eq!(query.document_ids, Some(vec!["faq".to_owned()]));
    assert_eq!(query.top_n, 4);
    assert!((query.similarity_threshold - 0.25).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_persisted_augmentation_stores_augmented_text() {
    let retriever: Arc<dyn Retriever> = Arc::new(StubRetriever {
        passages: vec![passage("FAQ", "Refunds take 5 days."), passage("Terms", "No cash.")],
        ..StubRetriever::default()
    });
    let (_db, assembler) = setup(Some(retriever), true).await;

    let (stored, llm, _) = assembler
        .augment_message(&rag_prompt(Some("Use these notes:")), "Refund?")
        .await
        .unwrap();

    assert_eq!(stored, llm);
    assert!(stored.starts_with("Refund?\n\nUse these notes:\nDocument: FAQ"));
    assert!(stored.ends_with("Document: Terms\nPotentially Relevant Text Excerpt: No cash."));
}

#[tokio::test]
async fn test_no_passages_leaves_message_unchanged() {
    let retriever: Arc<dyn Retriever> = Arc::new(StubRetriever::default());
    let (_db, assembler) = setup(Some(retriever), true).await;

    let (stored, llm, passages) = assembler
        .augment_message(&rag_prompt(None), "Hello")
        .await
        .unwrap();

    assert_eq!(stored, "Hello");
    assert_eq!(llm, "Hello");
    assert!(passages.is_empty());
}

#[tokio::test]
async fn test_retrieval_without_retriever_is_config_error() {
    let (_db, assembler) = setup(None, false).await;

    let error = assembler
        .augment_message(&rag_prompt(None), "Hello")
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::ConfigError);
}
