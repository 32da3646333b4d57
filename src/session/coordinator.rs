//! Multi-turn session coordinator.
//!
//! Runs turns against one `session_id`, one at a time. Each turn's request
//! carries the rollout captured at the end of the previous turn; a turn that
//! produced no rollout leaves the carried value unchanged.
//!
//! Any failed turn halts the coordinator: the failed turn has no trustworthy
//! rollout, so no later turn may be issued on top of it.

use bytes::Bytes;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::session::request::{new_request_id, new_session_id, RequestTemplate};
use crate::stream::demux::{DemuxOptions, Demultiplexer, TurnOutcome};
use crate::stream::render::RenderSink;
use crate::transport::AgentTransport;
use crate::{AppError, Result};

/// How a turn that reported error frames affects session continuity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorFramePolicy {
    /// Do not adopt the turn's rollout and halt the session.
    #[default]
    FailClosed,
    /// Treat error frames as informational; adopt the rollout and go on.
    Continue,
}

/// Drives successive `RunTask` calls for one logical conversation.
pub struct SessionCoordinator<T: AgentTransport> {
    transport: T,
    template: RequestTemplate,
    options: DemuxOptions,
    on_error_frame: ErrorFramePolicy,
    session_id: String,
    rollout: Option<Bytes>,
    turns_completed: u32,
    halted: Option<String>,
}

impl<T: AgentTransport> SessionCoordinator<T> {
    /// Start a fresh session with a generated id.
    pub fn new(transport: T, template: RequestTemplate) -> Self {
        Self::with_session_id(transport, template, new_session_id())
    }

    /// Continue (or start) the session identified by `session_id`.
    pub fn with_session_id(
        transport: T,
        template: RequestTemplate,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            template,
            options: DemuxOptions::default(),
            on_error_frame: ErrorFramePolicy::default(),
            session_id: session_id.into(),
            rollout: None,
            turns_completed: 0,
            halted: None,
        }
    }

    /// Seed the carried rollout, e.g. from a checkpoint saved by a previous
    /// run of the same session.
    #[must_use]
    pub fn with_rollout(mut self, rollout: Option<Bytes>) -> Self {
        self.rollout = rollout;
        self
    }

    /// Override the demultiplexer settings used for every turn.
    #[must_use]
    pub fn with_demux_options(mut self, options: DemuxOptions) -> Self {
        self.options = options;
        self
    }

    /// Override the error-frame continuity policy.
    #[must_use]
    pub fn with_error_frame_policy(mut self, policy: ErrorFramePolicy) -> Self {
        self.on_error_frame = policy;
        self
    }

    /// Session identifier sent with every turn.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Rollout that the next turn will send.
    #[must_use]
    pub fn carried_rollout(&self) -> Option<&Bytes> {
        self.rollout.as_ref()
    }

    /// Number of turns that completed successfully.
    #[must_use]
    pub fn turns_completed(&self) -> u32 {
        self.turns_completed
    }

    /// Whether a failed turn has halted the session.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// Run one turn: send `prompt` with the carried rollout and drain the
    /// response stream to completion.
    ///
    /// # Errors
    ///
    /// - [`AppError::Session`] if the session was already halted, or if this
    ///   turn reported error frames under [`ErrorFramePolicy::FailClosed`].
    /// - [`AppError::Transport`], [`AppError::Cancelled`],
    ///   [`AppError::Decode`] propagated from the call; the session halts.
    pub async fn run_turn(
        &mut self,
        prompt: &str,
        sink: &mut dyn RenderSink,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome> {
        if let Some(reason) = &self.halted {
            return Err(AppError::Session(format!("session halted: {reason}")));
        }

        let turn = self.turns_completed + 1;
        let request_id = new_request_id();
        let span = info_span!(
            "turn",
            session_id = %self.session_id,
            request_id = %request_id,
            turn
        );

        let request = self.template.task_request(
            &request_id,
            &self.session_id,
            prompt,
            self.rollout.clone(),
        );
        info!(
            parent: &span,
            history_len = self.rollout.as_ref().map_or(0, Bytes::len),
            "starting turn"
        );

        let result = async {
            let stream = self.transport.run_task(request).await?;
            Demultiplexer::new(self.options.clone())
                .drain(stream, sink, cancel)
                .await
        }
        .instrument(span.clone())
        .await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(parent: &span, error = %err, "turn failed, halting session");
                self.halted = Some(format!("turn {turn} failed: {err}"));
                return Err(err);
            }
        };

        if outcome.has_errors() && self.on_error_frame == ErrorFramePolicy::FailClosed {
            let reason = format!(
                "turn {turn} reported {} error frame(s); rollout not carried forward",
                outcome.errors.len()
            );
            warn!(parent: &span, reason = reason.as_str(), "halting session");
            self.halted = Some(reason.clone());
            return Err(AppError::Session(reason));
        }

        if let Some(rollout) = &outcome.rollout {
            self.rollout = Some(rollout.clone());
        }
        self.turns_completed = turn;
        info!(
            parent: &span,
            frames = outcome.frames,
            rollout_captured = outcome.rollout.is_some(),
            "turn complete"
        );

        Ok(outcome)
    }

    /// Run `prompts` as consecutive turns.
    ///
    /// Each turn starts only after the previous stream has fully drained.
    /// Stops at the first failing turn.
    ///
    /// # Errors
    ///
    /// Returns the first turn error; see [`Self::run_turn`].
    pub async fn run_turns<S: AsRef<str>>(
        &mut self,
        prompts: &[S],
        sink: &mut dyn RenderSink,
        cancel: &CancellationToken,
    ) -> Result<Vec<TurnOutcome>> {
        let mut outcomes = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            outcomes.push(self.run_turn(prompt.as_ref(), sink, cancel).await?);
        }
        Ok(outcomes)
    }
}

/// Issue one single-shot `Run` call and drain it.
///
/// Any rollout in the stream is reported on the outcome but not reused.
///
/// # Errors
///
/// Propagates transport, cancellation, and abort-policy decode errors.
pub async fn run_once(
    transport: &dyn AgentTransport,
    template: &RequestTemplate,
    options: DemuxOptions,
    prompt: &str,
    sink: &mut dyn RenderSink,
    cancel: &CancellationToken,
) -> Result<TurnOutcome> {
    let request_id = new_request_id();
    let span = info_span!("run", request_id = %request_id);
    info!(parent: &span, "starting single-shot run");

    async {
        let stream = transport
            .run(template.run_request(&request_id, prompt))
            .await?;
        Demultiplexer::new(options).drain(stream, sink, cancel).await
    }
    .instrument(span)
    .await
}
