//! Validated response frames.

use bytes::Bytes;

use crate::proto::RunResponse;
use crate::{AppError, Result};

/// One response frame with exactly one populated variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Diagnostic line from the adapter.
    AdapterLog(String),
    /// Error reported by the adapter; not necessarily terminal.
    Error(String),
    /// JSON-encoded agent event.
    CodexEventJson(String),
    /// Session checkpoint to carry into the next turn.
    UpdatedRollout(Bytes),
}

impl Frame {
    /// Validate that exactly one variant of `response` is populated.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Decode`] when no variant or more than one
    /// variant is set.
    pub fn from_response(response: RunResponse) -> Result<Self> {
        let RunResponse {
            adapter_log,
            error,
            codex_event_json,
            updated_rollout,
        } = response;

        let mut populated = Vec::with_capacity(1);
        if let Some(line) = adapter_log {
            populated.push(Self::AdapterLog(line));
        }
        if let Some(message) = error {
            populated.push(Self::Error(message));
        }
        if let Some(json) = codex_event_json {
            populated.push(Self::CodexEventJson(json));
        }
        if let Some(bytes) = updated_rollout {
            populated.push(Self::UpdatedRollout(bytes));
        }

        if populated.len() > 1 {
            let kinds: Vec<&str> = populated.iter().map(Frame::kind).collect();
            return Err(AppError::Decode(format!(
                "frame has {} populated variants: {}",
                kinds.len(),
                kinds.join(", ")
            )));
        }

        populated
            .pop()
            .ok_or_else(|| AppError::Decode("frame has no populated variant".into()))
    }

    /// Short name of the populated variant, used in log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AdapterLog(_) => "adapter_log",
            Self::Error(_) => "error",
            Self::CodexEventJson(_) => "codex_event_json",
            Self::UpdatedRollout(_) => "updated_rollout",
        }
    }
}

impl TryFrom<RunResponse> for Frame {
    type Error = AppError;

    fn try_from(response: RunResponse) -> Result<Self> {
        Frame::from_response(response)
    }
}
