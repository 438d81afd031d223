// ABOUTME: Integration tests for background turn dispatch
// ABOUTME: Covers pending tasks, inline dry runs, duplicate ids, timeouts, shutdown, and per-chat serialization
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Magenta Agent Runtime

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    create_test_database, create_test_orchestrator, seed_chat, text_response, ScriptedProvider,
};
use magenta_server::database::DatabaseProvider;
use magenta_server::errors::ErrorCode;
use magenta_server::models::{Prompt, StatusRecord, TaskStatus};
use magenta_server::services::{TurnDispatcher, TurnRequest, TurnSettings};

async fn setup(
    provider: ScriptedProvider,
    turn_timeout: Duration,
) -> (Arc<dyn DatabaseProvider>, TurnDispatcher) {
    let database: Arc<dyn DatabaseProvider> = create_test_database();
    seed_chat(database.as_ref(), "c1", &Prompt::new("plain", "Be brief."))
        .await
        .unwrap();
    let orchestrator = create_test_orchestrator(
        Arc::clone(&database),
        Arc::new(provider),
        TurnSettings::default(),
        None,
    )
    .unwrap();
    let dispatcher = TurnDispatcher::new(Arc::new(orchestrator), turn_timeout);
    (database, dispatcher)
}

async fn wait_for_terminal(
    database: &dyn DatabaseProvider,
    chat_id: &str,
    message_id: &str,
) -> StatusRecord {
    for _ in 0..300 {
        let chat = database.get_chat(chat_id).await.unwrap().unwrap();
        if let Some(record) = chat.status_for(message_id) {
            if record.status.is_terminal() {
                return record.clone();
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("turn {message_id} never reached a terminal status");
}

#[tokio::test]
async fn test_submit_returns_pending_and_turn_completes() {
    let (database, dispatcher) = setup(
        ScriptedProvider::new(vec![text_response("pong")]),
        Duration::from_secs(5),
    )
    .await;

    let task = dispatcher
        .submit(TurnRequest::new("c1", "m1", "ping"))
        .await
        .unwrap();
    assert_eq!(task.task_id, "m1");
    assert_eq!(task.status, TaskStatus::Pending);

    let record = wait_for_terminal(database.as_ref(), "c1", "m1").await;
    assert_eq!(record.status, TaskStatus::Completed);

    let chat = database.get_chat("c1").await.unwrap().unwrap();
    let statuses: Vec<TaskStatus> = chat.statuses.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            TaskStatus::Pending,
            TaskStatus::InProgress,
            TaskStatus::Completed
        ]
    );
}

#[tokio::test]
async fn test_dry_run_completes_inline() {
    let (database, dispatcher) =
        setup(ScriptedProvider::new(Vec::new()), Duration::from_secs(5)).await;

    let task = dispatcher
        .submit(TurnRequest::new("c1", "m1", "test").with_dry_run(true))
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.result.as_deref(), Some("This is a test message."));
    let chat = database.get_chat("c1").await.unwrap().unwrap();
    assert_eq!(chat.status_for("m1").unwrap().status, TaskStatus::Completed);
}

#[tokio::test]
async fn test_reused_message_id_is_rejected() {
    let (_database, dispatcher) = setup(
        ScriptedProvider::new(vec![text_response("one"), text_response("two")]),
        Duration::from_secs(5),
    )
    .await;
    dispatcher
        .submit(TurnRequest::new("c1", "m1", "first"))
        .await
        .unwrap();

    let error = dispatcher
        .submit(TurnRequest::new("c1", "m1", "again"))
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::ResourceAlreadyExists);
}

#[tokio::test]
async fn test_unknown_chat_is_rejected_synchronously() {
    let (_database, dispatcher) =
        setup(ScriptedProvider::new(Vec::new()), Duration::from_secs(5)).await;

    let error = dispatcher
        .submit(TurnRequest::new("missing", "m1", "hi"))
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_turn_timeout_marks_turn_failed() {
    let provider =
        ScriptedProvider::new(vec![text_response("late")]).with_delay(Duration::from_secs(3));
    let (database, dispatcher) = setup(provider, Duration::from_millis(100)).await;

    dispatcher
        .submit(TurnRequest::new("c1", "m1", "slow"))
        .await
        .unwrap();

    let record = wait_for_terminal(database.as_ref(), "c1", "m1").await;
    assert_eq!(record.status, TaskStatus::Failed);
    assert!(record.error.unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_timed_out_turn_fails_without_waiting_for_queued_turns() {
    let provider = ScriptedProvider::new(vec![text_response("late"), text_response("later")])
        .with_delay(Duration::from_secs(5));
    let (database, dispatcher) = setup(provider, Duration::from_millis(400)).await;

    dispatcher
        .submit(TurnRequest::new("c1", "m1", "slow"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    dispatcher
        .submit(TurnRequest::new("c1", "m2", "queued"))
        .await
        .unwrap();

    let record = wait_for_terminal(database.as_ref(), "c1", "m1").await;
    assert_eq!(record.status, TaskStatus::Failed);
    assert!(record.error.unwrap().contains("timed out"));

    // m2 now holds the conversation and is still waiting on the model
    let chat = database.get_chat("c1").await.unwrap().unwrap();
    assert!(!chat.has_terminal_status("m2"));

    let record = wait_for_terminal(database.as_ref(), "c1", "m2").await;
    assert_eq!(record.status, TaskStatus::Failed);
}

#[tokio::test]
async fn test_shutdown_cancels_in_flight_turns() {
    let provider =
        ScriptedProvider::new(vec![text_response("late")]).with_delay(Duration::from_secs(10));
    let (database, dispatcher) = setup(provider, Duration::from_secs(30)).await;

    dispatcher
        .submit(TurnRequest::new("c1", "m1", "slow"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    tokio::time::timeout(Duration::from_secs(5), dispatcher.shutdown())
        .await
        .unwrap();

    let chat = database.get_chat("c1").await.unwrap().unwrap();
    let record = chat.status_for("m1").unwrap();
    assert_eq!(record.status, TaskStatus::Cancelled);
    assert_eq!(dispatcher.in_flight(), 0);

    let error = dispatcher
        .submit(TurnRequest::new("c1", "m2", "after"))
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::OperationCancelled);
}

#[tokio::test]
async fn test_turns_on_one_chat_do_not_interleave() {
    let provider = ScriptedProvider::new(vec![text_response("a"), text_response("b")])
        .with_delay(Duration::from_millis(30));
    let (database, dispatcher) = setup(provider, Duration::from_secs(5)).await;

    dispatcher
        .submit(TurnRequest::new("c1", "m1", "first"))
        .await
        .unwrap();
    dispatcher
        .submit(TurnRequest::new("c1", "m2", "second"))
        .await
        .unwrap();
    wait_for_terminal(database.as_ref(), "c1", "m1").await;
    wait_for_terminal(database.as_ref(), "c1", "m2").await;

    let chat = database.get_chat("c1").await.unwrap().unwrap();
    let ids: Vec<&str> = chat
        .messages
        .iter()
        .filter_map(|m| m.message_id.as_deref())
        .collect();
    assert_eq!(ids.len(), 4);
    for pair in ids.chunks(2) {
        assert_eq!(pair[0], format!("q-{}", pair[1]));
    }
}
