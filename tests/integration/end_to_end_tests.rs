//! End-to-end scenarios driven through the public session API.
//!
//! Mirrors a live two-turn memory check: turn one asks the agent to remember
//! a number and the adapter answers with a log line, a reasoning item, a
//! reply delta, a rollout checkpoint and the completion signal.

use std::collections::HashMap;

use adapter_probe::proto::{ContextFile, RunResponse, SessionConfig};
use adapter_probe::session::{run_once, RequestTemplate, SessionCoordinator};
use adapter_probe::stream::demux::DemuxOptions;
use adapter_probe::stream::event::StartedItem;
use adapter_probe::stream::render::{ConsoleSink, Rendered};
use bytes::Bytes;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use super::test_helpers::{method_event, turn_completed, Script, ScriptedTransport};

fn remember_turn() -> Vec<RunResponse> {
    vec![
        RunResponse::log_line("starting"),
        method_event(
            "item/started",
            &json!({ "item": { "type": "reasoning", "summary": [] } }),
        ),
        method_event("item/agentMessage/delta", &json!({ "delta": "OK" })),
        RunResponse::rollout(Bytes::from_static(b"\x01\x02")),
        turn_completed(),
    ]
}

fn template() -> RequestTemplate {
    RequestTemplate {
        session_config: Some(SessionConfig {
            model: "gpt-5-codex".into(),
            cwd: "/workspace".into(),
            ..SessionConfig::default()
        }),
        env_vars: HashMap::from([("OPENAI_API_KEY".to_owned(), "sk-test".to_owned())]),
        base_dir: String::new(),
        context_files: vec![ContextFile {
            path: "AGENTS.md".into(),
            content: "be brief".into(),
        }],
    }
}

#[tokio::test]
async fn remember_number_turn_produces_rollout_and_single_marker() {
    let transport = ScriptedTransport::new(vec![Script::frames(remember_turn())]);
    let mut coordinator = SessionCoordinator::with_session_id(transport.clone(), template(), "s1");
    let mut out: Vec<Rendered> = Vec::new();

    let outcome = coordinator
        .run_turn("Remember the number 888. Reply OK.", &mut out, &CancellationToken::new())
        .await
        .expect("turn succeeds");

    assert_eq!(outcome.rollout, Some(Bytes::from_static(b"\x01\x02")));
    assert_eq!(outcome.agent_text, "OK");
    assert!(outcome.turn_completed);
    assert_eq!(
        out,
        vec![
            Rendered::System("starting".into()),
            Rendered::ItemStarted(StartedItem::Reasoning { summary: None }),
            Rendered::Delta("OK".into()),
            Rendered::TurnCompleted,
        ]
    );
    assert_eq!(
        coordinator.carried_rollout(),
        Some(&Bytes::from_static(b"\x01\x02"))
    );
}

#[tokio::test]
async fn second_turn_recalls_with_first_turn_history() {
    let transport = ScriptedTransport::new(vec![
        Script::frames(remember_turn()),
        Script::frames(vec![
            method_event("item/agentMessage/delta", &json!({ "delta": "888" })),
            turn_completed(),
        ]),
    ]);
    let mut coordinator = SessionCoordinator::with_session_id(transport.clone(), template(), "s1");
    let mut out: Vec<Rendered> = Vec::new();

    let outcomes = coordinator
        .run_turns(
            &["Remember the number 888.", "What number did I ask you to remember?"],
            &mut out,
            &CancellationToken::new(),
        )
        .await
        .expect("session succeeds");

    assert_eq!(outcomes[1].agent_text, "888");
    let requests = transport.task_requests.lock().unwrap();
    assert_eq!(
        requests[1].history_rollout,
        Some(Bytes::from_static(b"\x01\x02"))
    );
    assert_eq!(requests[1].session_config, template().session_config);
    assert_eq!(requests[1].context_files, template().context_files);
    assert_eq!(requests[1].env_vars["OPENAI_API_KEY"], "sk-test");
}

#[tokio::test]
async fn run_once_sends_template_payload() {
    let transport = ScriptedTransport::new(vec![Script::frames(remember_turn())]);
    let mut out: Vec<Rendered> = Vec::new();

    let outcome = run_once(
        &transport,
        &template(),
        DemuxOptions::default(),
        "hello",
        &mut out,
        &CancellationToken::new(),
    )
    .await
    .expect("run succeeds");

    assert_eq!(outcome.rollout, Some(Bytes::from_static(b"\x01\x02")));
    assert!(transport.task_requests.lock().unwrap().is_empty());

    let requests = transport.run_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].prompt, "hello");
    assert!(requests[0].request_id.starts_with("probe-"));
    assert_eq!(requests[0].session_config, template().session_config);
}

#[tokio::test]
async fn console_output_for_a_full_turn() {
    let transport = ScriptedTransport::new(vec![Script::frames(vec![
        RunResponse::log_line("[STDERR] otel_manager flushed"),
        RunResponse::log_line("starting"),
        method_event(
            "item/started",
            &json!({ "item": { "type": "commandExecution", "command": "ls -la" } }),
        ),
        method_event(
            "item/completed",
            &json!({ "item": { "type": "commandExecution", "exitCode": 0 } }),
        ),
        method_event("item/agentMessage/delta", &json!({ "delta": "Done" })),
        turn_completed(),
    ])]);
    let mut sink = ConsoleSink::new(Vec::new());

    run_once(
        &transport,
        &RequestTemplate::default(),
        DemuxOptions::default(),
        "list files",
        &mut sink,
        &CancellationToken::new(),
    )
    .await
    .expect("run succeeds");

    let text = String::from_utf8(sink.into_inner()).unwrap();
    assert!(!text.contains("otel_manager"), "suppressed noise leaked: {text}");
    assert!(text.contains("📋 [SYSTEM] starting\n"));
    assert!(text.contains("🛠️  [COMMAND] ls -la\n"));
    assert!(text.contains("✅ [RESULT] exit code 0\n"));
    assert!(text.contains("Done\n\n🏁 [TURN COMPLETE]\n"));
    assert_eq!(text.matches("[TURN COMPLETE]").count(), 1);
}
