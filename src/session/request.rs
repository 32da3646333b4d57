//! Per-turn request construction.

use std::collections::HashMap;

use bytes::Bytes;

use crate::proto::{ContextFile, RunRequest, SessionConfig, TaskRequest};

/// Pass-through payload shared by every request of a run.
///
/// Nothing here is inspected by the client; it is cloned into each request
/// as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestTemplate {
    /// Opaque session configuration.
    pub session_config: Option<SessionConfig>,
    /// Environment forwarded to the agent (resolved secrets included).
    pub env_vars: HashMap<String, String>,
    /// Working directory on the adapter host; empty for a scratch dir.
    pub base_dir: String,
    /// Files injected into the agent workspace.
    pub context_files: Vec<ContextFile>,
}

impl RequestTemplate {
    /// Build a single-shot `Run` request.
    #[must_use]
    pub fn run_request(&self, request_id: &str, prompt: &str) -> RunRequest {
        RunRequest {
            request_id: request_id.to_owned(),
            prompt: prompt.to_owned(),
            session_config: self.session_config.clone(),
            env_vars: self.env_vars.clone(),
            base_dir: self.base_dir.clone(),
            context_files: self.context_files.clone(),
        }
    }

    /// Build a `RunTask` request for one turn of `session_id`.
    #[must_use]
    pub fn task_request(
        &self,
        request_id: &str,
        session_id: &str,
        prompt: &str,
        history_rollout: Option<Bytes>,
    ) -> TaskRequest {
        TaskRequest {
            request_id: request_id.to_owned(),
            session_id: session_id.to_owned(),
            prompt: prompt.to_owned(),
            session_config: self.session_config.clone(),
            history_rollout,
            env_vars: self.env_vars.clone(),
            base_dir: self.base_dir.clone(),
            context_files: self.context_files.clone(),
        }
    }
}

/// Generate a fresh request id.
#[must_use]
pub fn new_request_id() -> String {
    format!("probe-{}", uuid::Uuid::new_v4())
}

/// Generate a fresh session id.
#[must_use]
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
