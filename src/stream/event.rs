//! Inner agent-event decoding.
//!
//! A `codex_event_json` frame carries one JSON object emitted by the agent.
//! Two record shapes are in circulation and a stream may mix them, so each
//! payload is decoded twice, once per shape, and both results are kept.
//!
//! # `method` shape (app-server style)
//!
//! | Method                    | Maps to                               |
//! |---------------------------|---------------------------------------|
//! | `item/agentMessage/delta` | [`CodexEvent::AgentMessageDelta`]     |
//! | `item/started`            | [`CodexEvent::ItemStarted`]           |
//! | `item/completed`          | [`CodexEvent::ItemCompleted`]         |
//! | `turn/completed`          | [`CodexEvent::TurnCompleted`]         |
//! | *(any other)*             | Skipped; logged at `TRACE`            |
//!
//! # Flat `type` shape (exec JSONL style)
//!
//! | Type        | Maps to                         |
//! |-------------|---------------------------------|
//! | `message`   | [`CodexEvent::AgentMessage`]    |
//! | `reasoning` | [`CodexEvent::Reasoning`]       |
//! | *(other)*   | Skipped                         |

use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use crate::{AppError, Result};

/// Method carrying an incremental chunk of agent message text.
pub const METHOD_AGENT_MESSAGE_DELTA: &str = "item/agentMessage/delta";
/// Method announcing a new unit of work.
pub const METHOD_ITEM_STARTED: &str = "item/started";
/// Method finalizing a unit of work.
pub const METHOD_ITEM_COMPLETED: &str = "item/completed";
/// Method marking the end of one agent turn.
pub const METHOD_TURN_COMPLETED: &str = "turn/completed";

/// Unit of work announced by `item/started`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartedItem {
    /// The model is reasoning; `summary` is present when the agent shares one.
    Reasoning {
        /// Reasoning summary text.
        summary: Option<String>,
    },
    /// A shell command is about to run.
    CommandExecution {
        /// Command line, if reported.
        command: Option<String>,
    },
    /// An MCP tool is being called.
    McpToolCall {
        /// Tool name, if reported.
        tool: Option<String>,
    },
}

/// Unit of work finalized by `item/completed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletedItem {
    /// A shell command finished.
    CommandExecution {
        /// Process exit code, if reported.
        exit_code: Option<i64>,
    },
}

/// Normalized agent event decoded from either record shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodexEvent {
    /// Incremental agent message text.
    AgentMessageDelta(String),
    /// A unit of work started.
    ItemStarted(StartedItem),
    /// A unit of work completed.
    ItemCompleted(CompletedItem),
    /// One reasoning/action turn ended.
    TurnCompleted,
    /// Complete agent message (flat shape).
    AgentMessage(String),
    /// Reasoning note (flat shape).
    Reasoning(Option<String>),
}

// ── Inbound record types ──────────────────────────────────────────────────────

/// App-server style envelope.
#[derive(Debug, Deserialize)]
struct MethodEnvelope {
    method: String,
    #[serde(default)]
    params: Value,
}

/// Parameters for `item/agentMessage/delta`.
#[derive(Debug, Deserialize)]
struct DeltaParams {
    #[serde(default)]
    delta: String,
}

/// Parameters for `item/started` and `item/completed`.
#[derive(Debug, Deserialize)]
struct ItemParams {
    item: ItemRecord,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemRecord {
    /// Original field name in the wire format is `type`.
    #[serde(rename = "type")]
    item_type: String,
    summary: Option<Value>,
    command: Option<Value>,
    tool: Option<String>,
    exit_code: Option<i64>,
}

/// Exec JSONL style record.
#[derive(Debug, Deserialize)]
struct FlatRecord {
    /// Original field name in the wire format is `type`.
    #[serde(rename = "type")]
    kind: String,
    content: Option<Value>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decode one `codex_event_json` payload into normalized events.
///
/// Both record shapes are attempted independently against the same payload;
/// a shape that does not match, or a recognized method whose parameters are
/// incomplete, contributes nothing.
///
/// Events come back in `method`-shape then `type`-shape order. Unknown
/// discriminators yield an empty vector.
///
/// # Errors
///
/// Returns [`AppError::Decode`]`("malformed json: …")` when `raw` is not a
/// JSON document.
pub fn parse_codex_event(raw: &str) -> Result<Vec<CodexEvent>> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| AppError::Decode(format!("malformed json: {e}")))?;

    let mut events = Vec::new();
    if let Some(event) = decode_method_shape(&value) {
        events.push(event);
    }
    if let Some(event) = decode_flat_shape(&value) {
        events.push(event);
    }
    Ok(events)
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn decode_method_shape(value: &Value) -> Option<CodexEvent> {
    let envelope = MethodEnvelope::deserialize(value).ok()?;

    match envelope.method.as_str() {
        METHOD_AGENT_MESSAGE_DELTA => {
            let params = DeltaParams::deserialize(&envelope.params).ok()?;
            Some(CodexEvent::AgentMessageDelta(params.delta))
        }
        METHOD_ITEM_STARTED => {
            let params = ItemParams::deserialize(&envelope.params).ok()?;
            started_item(params.item).map(CodexEvent::ItemStarted)
        }
        METHOD_ITEM_COMPLETED => {
            let params = ItemParams::deserialize(&envelope.params).ok()?;
            completed_item(params.item).map(CodexEvent::ItemCompleted)
        }
        METHOD_TURN_COMPLETED => Some(CodexEvent::TurnCompleted),
        other => {
            trace!(method = other, "codex event: skipping unknown method");
            None
        }
    }
}

fn decode_flat_shape(value: &Value) -> Option<CodexEvent> {
    let record = FlatRecord::deserialize(value).ok()?;

    match record.kind.as_str() {
        // A message without content has nothing to show.
        "message" => record
            .content
            .as_ref()
            .map(|content| CodexEvent::AgentMessage(value_text(content))),
        "reasoning" => Some(CodexEvent::Reasoning(record.content.as_ref().map(value_text))),
        other => {
            trace!(kind = other, "codex event: skipping unknown record type");
            None
        }
    }
}

fn started_item(item: ItemRecord) -> Option<StartedItem> {
    match item.item_type.as_str() {
        "reasoning" => Some(StartedItem::Reasoning {
            summary: item.summary.as_ref().and_then(summary_text),
        }),
        "commandExecution" => Some(StartedItem::CommandExecution {
            command: item.command.as_ref().map(value_text),
        }),
        "mcpToolCall" => Some(StartedItem::McpToolCall { tool: item.tool }),
        _ => None,
    }
}

fn completed_item(item: ItemRecord) -> Option<CompletedItem> {
    match item.item_type.as_str() {
        "commandExecution" => Some(CompletedItem::CommandExecution {
            exit_code: item.exit_code,
        }),
        _ => None,
    }
}

/// Reasoning summaries arrive either as a string or as a list of parts.
///
/// An empty list carries no text and is treated like a missing summary, so
/// the renderer shows its placeholder rather than a blank line.
fn summary_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Array(parts) => {
            let joined = parts
                .iter()
                .map(value_text)
                .collect::<Vec<_>>()
                .join("\n");
            (!joined.is_empty()).then_some(joined)
        }
        other => Some(value_text(other)),
    }
}

/// Commands arrive either as a string or as an argv array.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(parts) if parts.iter().all(Value::is_string) => parts
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}
