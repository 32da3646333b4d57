//! Wire schema of the `codex.agent` gRPC services.
//!
//! The service definition is owned by the adapter; this module mirrors the
//! subset of the schema the client sends and receives, expressed directly as
//! [`prost`] messages so no build-time code generation is required.
//!
//! Two services share one response shape:
//!
//! | Service          | Method    | Request        | Response stream    |
//! |------------------|-----------|----------------|--------------------|
//! | `AdapterService` | `Run`     | [`RunRequest`] | [`RunResponse`]    |
//! | `AgentService`   | `RunTask` | [`TaskRequest`]| [`RunResponse`]    |

pub mod messages;

pub use messages::{
    ApprovalPolicy, ContextFile, McpServerDef, ModelProviderInfo, RunRequest, RunResponse,
    SandboxPolicy, SessionConfig, TaskRequest, WireApi,
};

/// Fully-qualified name of the single-shot service.
pub const ADAPTER_SERVICE: &str = "codex.agent.AdapterService";

/// Fully-qualified name of the session-oriented service.
pub const AGENT_SERVICE: &str = "codex.agent.AgentService";

/// gRPC path of `AdapterService/Run`.
pub const RUN_PATH: &str = "/codex.agent.AdapterService/Run";

/// gRPC path of `AgentService/RunTask`.
pub const RUN_TASK_PATH: &str = "/codex.agent.AgentService/RunTask";
