// ABOUTME: Storage tests run against both the in-memory and the SQLite backend
// ABOUTME: Covers chat creation, status and message appends, prompts, documents, and tools
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, missing_docs)]

mod common;

use magenta_server::{
    database::{Database, DatabaseProvider, MemoryDatabase, SqliteDatabase},
    errors::ErrorCode,
    models::{
        Chat, Document, DocumentRef, FunctionSpec, HttpMethod, Message, ParameterSchema,
        ParameterType, Prompt, RagSpec, StatusRecord, TaskStatus, ToolSchema,
    },
};
use tempfile::TempDir;

async fn sqlite_in(dir: &TempDir) -> SqliteDatabase {
    let path = dir.path().join("magenta.db");
    SqliteDatabase::connect(&format!("sqlite:{}", path.display()))
        .await
        .unwrap()
}

async fn exercise_chat_lifecycle(db: &dyn DatabaseProvider) {
    let chat = Chat::new("chat-1")
        .with_sysprompt("support")
        .with_context_id("ctx-9");
    db.create_chat(&chat).await.unwrap();

    let duplicate = db.create_chat(&Chat::new("chat-1")).await.unwrap_err();
    assert_eq!(duplicate.code, ErrorCode::ResourceAlreadyExists);

    db.append_status("chat-1", &StatusRecord::new("m1", TaskStatus::Pending))
        .await
        .unwrap();
    db.append_status("chat-1", &StatusRecord::new("m1", TaskStatus::InProgress))
        .await
        .unwrap();
    db.append_status(
        "chat-1",
        &StatusRecord::with_error("m1", TaskStatus::Failed, "LLM unavailable"),
    )
    .await
    .unwrap();

    let messages = vec![
        Message::user("m1", "hello"),
        Message::assistant_reply("m1", Some("hi there".to_owned())),
    ];
    db.update_messages("chat-1", &messages).await.unwrap();

    let stored = db.get_chat("chat-1").await.unwrap().unwrap();
    assert_eq!(stored.sysprompt_id.as_deref(), Some("support"));
    assert_eq!(stored.context_id.as_deref(), Some("ctx-9"));
    assert_eq!(stored.messages, messages);
    let statuses: Vec<TaskStatus> = stored.statuses.iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        vec![TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Failed]
    );
    assert_eq!(
        stored.latest_status().unwrap().error.as_deref(),
        Some("LLM unavailable")
    );

    let missing = db
        .append_status("nope", &StatusRecord::new("m1", TaskStatus::Pending))
        .await
        .unwrap_err();
    assert_eq!(missing.code, ErrorCode::ResourceNotFound);
    let missing = db.update_messages("nope", &messages).await.unwrap_err();
    assert_eq!(missing.code, ErrorCode::ResourceNotFound);

    assert!(db.delete_chat("chat-1").await.unwrap());
    assert!(!db.delete_chat("chat-1").await.unwrap());
    assert!(db.get_chat("chat-1").await.unwrap().is_none());
}

async fn exercise_catalog(db: &dyn DatabaseProvider) {
    let prompt = Prompt::new("support", "You answer support questions.")
        .with_toolset(["roll_dice"])
        .with_documents(RagSpec {
            rag_documents: vec![DocumentRef::new("faq")],
            ..RagSpec::default()
        });
    db.upsert_prompt(&prompt).await.unwrap();
    assert_eq!(db.get_prompt("support").await.unwrap(), Some(prompt.clone()));

    let revised = Prompt::new("support", "Be brief.");
    db.upsert_prompt(&revised).await.unwrap();
    assert_eq!(db.get_prompt("support").await.unwrap(), Some(revised));
    assert!(db.get_prompt("unknown").await.unwrap().is_none());

    db.upsert_document(&Document::new("faq", "FAQ", "Refunds within 30 days."))
        .await
        .unwrap();
    db.upsert_document(&Document::new("hours", "Hours", "Open 9 to 5."))
        .await
        .unwrap();
    assert_eq!(
        db.get_document("hours").await.unwrap().unwrap().text,
        "Open 9 to 5."
    );
    let mut ids: Vec<String> = db
        .list_documents()
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.document_id)
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["faq", "hours"]);

    let weather = ToolSchema::external(
        "weather-1",
        FunctionSpec::new("weather", "Current weather").with_parameter(
            "city",
            ParameterSchema::new(ParameterType::String, "City name"),
            true,
        ),
        "http://localhost:9000/weather",
        HttpMethod::Get,
    );
    db.upsert_tool(&weather).await.unwrap();
    db.upsert_tool(&weather).await.unwrap();
    assert_eq!(db.list_tools().await.unwrap(), vec![weather]);
}

#[tokio::test]
async fn test_memory_chat_lifecycle() {
    common::init_test_logging();
    exercise_chat_lifecycle(&MemoryDatabase::new()).await;
}

#[tokio::test]
async fn test_memory_catalog() {
    exercise_catalog(&MemoryDatabase::new()).await;
}

#[tokio::test]
async fn test_sqlite_chat_lifecycle() {
    common::init_test_logging();
    let dir = TempDir::new().unwrap();
    exercise_chat_lifecycle(&sqlite_in(&dir).await).await;
}

#[tokio::test]
async fn test_sqlite_catalog() {
    let dir = TempDir::new().unwrap();
    exercise_catalog(&sqlite_in(&dir).await).await;
}

#[tokio::test]
async fn test_sqlite_data_survives_reconnect() {
    let dir = TempDir::new().unwrap();
    {
        let db = sqlite_in(&dir).await;
        db.create_chat(&Chat::new("persisted")).await.unwrap();
        db.append_status("persisted", &StatusRecord::new("m1", TaskStatus::Completed))
            .await
            .unwrap();
        db.pool().close().await;
    }

    let reopened = sqlite_in(&dir).await;
    let chat = reopened.get_chat("persisted").await.unwrap().unwrap();
    assert!(chat.has_terminal_status("m1"));
}

#[tokio::test]
async fn test_in_memory_sqlite_url() {
    let db = Database::new("sqlite::memory:").await.unwrap();
    assert_eq!(db.backend_info(), "SQLite");
    exercise_chat_lifecycle(&db).await;
}

#[tokio::test]
async fn test_unsupported_url_is_config_error() {
    let Err(err) = Database::new("postgres://localhost/magenta").await else {
        panic!("postgres URLs are not supported");
    };
    assert_eq!(err.code, ErrorCode::ConfigError);
}
