//! `prost` message definitions for the `codex.agent` package.
//!
//! This is the client's own mirror of the adapter schema. Message and field
//! names follow the adapter server and its Python test client; tag numbers
//! are pinned by the wire tests and the in-process server test.
//!
//! The response frame is declared with one optional field per `event` oneof
//! case: on the wire a oneof and a set of optional fields with the same tags
//! are encoded identically, and keeping them separate lets the client see
//! frames where zero or several cases were populated instead of silently
//! keeping the last.

use std::collections::HashMap;

use bytes::Bytes;
use serde::Deserialize;

/// Wire protocol spoken between the agent and its model provider.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum WireApi {
    /// OpenAI-compatible chat completions.
    Chat = 0,
    /// Responses API over HTTP.
    Responses = 1,
    /// Responses API over a websocket.
    ResponsesWebsocket = 2,
}

/// Filesystem sandbox applied to commands the agent executes.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum SandboxPolicy {
    /// Adapter default.
    Unspecified = 0,
    /// Read-only access to the workspace.
    ReadOnly = 1,
    /// Writes allowed inside the workspace.
    WorkspaceWrite = 2,
    /// No sandbox.
    DangerFullAccess = 3,
}

/// When the agent must ask before running a command.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum ApprovalPolicy {
    /// Adapter default.
    Unspecified = 0,
    /// Never ask.
    Never = 1,
    /// Ask when the model requests it.
    OnRequest = 2,
    /// Ask after a sandboxed command fails.
    OnFailure = 3,
    /// Ask for anything not known to be safe.
    Untrusted = 4,
}

/// Model provider connection details.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ModelProviderInfo {
    /// Provider identifier, also used as the config table key.
    #[prost(string, tag = "1")]
    pub name: String,
    /// Base URL of the provider API.
    #[prost(string, optional, tag = "2")]
    pub base_url: Option<String>,
    /// Name of the `env_vars` entry carrying the API key.
    #[prost(string, optional, tag = "3")]
    pub env_key: Option<String>,
    /// Provider wire protocol.
    #[prost(enumeration = "WireApi", tag = "4")]
    pub wire_api: i32,
    /// Whether the provider expects OpenAI account auth.
    #[prost(bool, tag = "5")]
    pub requires_openai_auth: bool,
    /// Bearer token injected by the adapter from `env_vars`.
    #[prost(string, optional, tag = "6")]
    pub experimental_bearer_token: Option<String>,
}

/// Auxiliary MCP tool server made available to the agent.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct McpServerDef {
    /// Transport kind, e.g. `stdio` or `streamable_http`.
    #[prost(string, tag = "1")]
    pub server_type: String,
    /// Command line for stdio servers.
    #[prost(string, tag = "2")]
    pub command: String,
    /// Endpoint for HTTP servers.
    #[prost(string, tag = "3")]
    pub url: String,
}

/// Opaque session configuration forwarded to the adapter.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SessionConfig {
    /// Model name.
    #[prost(string, tag = "1")]
    pub model: String,
    /// Provider settings.
    #[prost(message, optional, tag = "2")]
    pub provider: Option<ModelProviderInfo>,
    /// Sandbox policy.
    #[prost(enumeration = "SandboxPolicy", tag = "3")]
    pub sandbox_policy: i32,
    /// Approval policy.
    #[prost(enumeration = "ApprovalPolicy", tag = "4")]
    pub approval_policy: i32,
    /// Agent working directory.
    #[prost(string, tag = "5")]
    pub cwd: String,
    /// Named MCP servers.
    #[prost(map = "string, message", tag = "6")]
    pub mcp_servers: HashMap<String, McpServerDef>,
    /// System-level instructions prepended to the prompt.
    #[prost(string, optional, tag = "7")]
    pub base_instructions: Option<String>,
    /// Developer instructions prepended to the prompt.
    #[prost(string, optional, tag = "8")]
    pub developer_instructions: Option<String>,
    /// User instructions prepended to the prompt.
    #[prost(string, optional, tag = "9")]
    pub user_instructions: Option<String>,
}

/// File written into the agent workspace before the task starts.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ContextFile {
    /// Workspace-relative path.
    #[prost(string, tag = "1")]
    pub path: String,
    /// File contents.
    #[prost(string, tag = "2")]
    pub content: String,
}

/// Single-shot request for `AdapterService/Run`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RunRequest {
    /// Caller-generated correlation id.
    #[prost(string, tag = "1")]
    pub request_id: String,
    /// Task instruction.
    #[prost(string, tag = "2")]
    pub prompt: String,
    /// Pass-through session configuration.
    #[prost(message, optional, tag = "3")]
    pub session_config: Option<SessionConfig>,
    /// Pass-through environment for the agent process.
    #[prost(map = "string, string", tag = "4")]
    pub env_vars: HashMap<String, String>,
    /// Working directory on the adapter host; empty for a scratch dir.
    #[prost(string, tag = "5")]
    pub base_dir: String,
    /// Files injected into the workspace.
    #[prost(message, repeated, tag = "6")]
    pub context_files: Vec<ContextFile>,
}

/// Session-aware request for `AgentService/RunTask`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TaskRequest {
    /// Caller-generated correlation id, unique per turn.
    #[prost(string, tag = "1")]
    pub request_id: String,
    /// Stable identifier of the logical conversation.
    #[prost(string, tag = "2")]
    pub session_id: String,
    /// Task instruction for this turn.
    #[prost(string, tag = "3")]
    pub prompt: String,
    /// Pass-through session configuration.
    #[prost(message, optional, tag = "4")]
    pub session_config: Option<SessionConfig>,
    /// Rollout captured from the previous turn; absent on the first turn.
    #[prost(bytes = "bytes", optional, tag = "5")]
    pub history_rollout: Option<Bytes>,
    /// Pass-through environment for the agent process.
    #[prost(map = "string, string", tag = "6")]
    pub env_vars: HashMap<String, String>,
    /// Working directory on the adapter host; empty for a scratch dir.
    #[prost(string, tag = "7")]
    pub base_dir: String,
    /// Files injected into the workspace.
    #[prost(message, repeated, tag = "8")]
    pub context_files: Vec<ContextFile>,
}

/// One frame of a response stream, as decoded from the wire.
///
/// Exactly one field is expected to be set; see
/// [`Frame`](crate::stream::frame::Frame) for the validated form.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RunResponse {
    /// Diagnostic line from the adapter.
    #[prost(string, optional, tag = "1")]
    pub adapter_log: Option<String>,
    /// Error text.
    #[prost(string, optional, tag = "2")]
    pub error: Option<String>,
    /// JSON-encoded agent event.
    #[prost(string, optional, tag = "3")]
    pub codex_event_json: Option<String>,
    /// Session checkpoint to echo back on the next turn.
    #[prost(bytes = "bytes", optional, tag = "4")]
    pub updated_rollout: Option<Bytes>,
}

impl RunResponse {
    /// Frame carrying only an adapter log line.
    #[must_use]
    pub fn log_line(line: impl Into<String>) -> Self {
        Self {
            adapter_log: Some(line.into()),
            ..Self::default()
        }
    }

    /// Frame carrying only an error message.
    #[must_use]
    pub fn error_text(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Frame carrying only a JSON event payload.
    #[must_use]
    pub fn event_json(json: impl Into<String>) -> Self {
        Self {
            codex_event_json: Some(json.into()),
            ..Self::default()
        }
    }

    /// Frame carrying only a rollout checkpoint.
    #[must_use]
    pub fn rollout(bytes: impl Into<Bytes>) -> Self {
        Self {
            updated_rollout: Some(bytes.into()),
            ..Self::default()
        }
    }
}
