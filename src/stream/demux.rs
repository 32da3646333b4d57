//! Response stream demultiplexer.
//!
//! Consumes the frames of one call strictly in arrival order, one at a time,
//! and dispatches each by its populated variant:
//!
//! | Variant            | Effect                                              |
//! |--------------------|-----------------------------------------------------|
//! | `adapter_log`      | [`Rendered::System`] unless suppressed by filter    |
//! | `error`            | [`Rendered::Error`]; recorded, stream continues     |
//! | `codex_event_json` | decoded via [`parse_codex_event`]; bad JSON dropped |
//! | `updated_rollout`  | overwrites the call's rollout slot                  |
//!
//! The completion marker is emitted once: on the first `turn/completed`
//! event, or at end of stream if the agent never sent one.

use bytes::Bytes;
use futures_util::StreamExt;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::stream::event::{parse_codex_event, CodexEvent, CompletedItem};
use crate::stream::filter::LogFilter;
use crate::stream::frame::Frame;
use crate::stream::render::{RenderSink, Rendered, REASONING_PLACEHOLDER};
use crate::transport::FrameStream;
use crate::{AppError, Result};

/// What to do with a frame that has zero or several populated variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationPolicy {
    /// Log the decode error, count it, and keep reading.
    #[default]
    Skip,
    /// Fail the call with the decode error.
    Abort,
}

/// Per-call demultiplexer settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemuxOptions {
    /// Adapter log noise filter.
    pub filter: LogFilter,
    /// Protocol violation handling.
    pub on_violation: ViolationPolicy,
}

/// Result of draining one call's stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Last `updated_rollout` seen, if any.
    pub rollout: Option<Bytes>,
    /// Concatenated agent message deltas.
    pub agent_text: String,
    /// Error frames, in arrival order.
    pub errors: Vec<String>,
    /// Whether the agent signalled `turn/completed`.
    pub turn_completed: bool,
    /// Number of frames received, including rejected ones.
    pub frames: usize,
    /// Number of frames rejected as protocol violations.
    pub violations: usize,
}

impl TurnOutcome {
    /// Whether the call reported any error frame.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Stateful dispatcher for the frames of a single call.
#[derive(Debug, Default)]
pub struct Demultiplexer {
    options: DemuxOptions,
    outcome: TurnOutcome,
    marker_emitted: bool,
}

impl Demultiplexer {
    /// Create a demultiplexer for one call.
    #[must_use]
    pub fn new(options: DemuxOptions) -> Self {
        Self {
            options,
            outcome: TurnOutcome::default(),
            marker_emitted: false,
        }
    }

    /// Dispatch one validated frame.
    pub fn handle_frame(&mut self, frame: Frame, sink: &mut dyn RenderSink) {
        self.outcome.frames += 1;
        trace!(kind = frame.kind(), "demux: frame received");

        match frame {
            Frame::AdapterLog(line) => {
                if !self.options.filter.suppresses(&line) {
                    sink.emit(Rendered::System(line.trim().to_owned()));
                }
            }
            Frame::Error(message) => {
                warn!(error = message.as_str(), "demux: adapter reported error");
                sink.emit(Rendered::Error(message.clone()));
                self.outcome.errors.push(message);
            }
            Frame::CodexEventJson(json) => match parse_codex_event(&json) {
                Ok(events) => {
                    for event in events {
                        self.handle_event(event, sink);
                    }
                }
                Err(e) => {
                    debug!(error = %e, "demux: dropping undecodable event payload");
                }
            },
            Frame::UpdatedRollout(bytes) => {
                debug!(len = bytes.len(), "demux: rollout checkpoint captured");
                self.outcome.rollout = Some(bytes);
            }
        }
    }

    /// Account for a frame rejected by [`Frame::from_response`].
    ///
    /// # Errors
    ///
    /// Returns `err` unchanged when the policy is [`ViolationPolicy::Abort`].
    pub fn handle_violation(&mut self, err: AppError) -> Result<()> {
        self.outcome.frames += 1;
        self.outcome.violations += 1;
        match self.options.on_violation {
            ViolationPolicy::Skip => {
                warn!(error = %err, "demux: protocol violation, skipping frame");
                Ok(())
            }
            ViolationPolicy::Abort => Err(err),
        }
    }

    /// Finish the call: emit the completion marker if still pending.
    pub fn finish(mut self, sink: &mut dyn RenderSink) -> TurnOutcome {
        self.emit_marker(sink);
        self.outcome
    }

    /// Drain `stream` to completion.
    ///
    /// Frames are processed one at a time in arrival order; the next frame is
    /// not polled until the current one has been dispatched.
    ///
    /// # Errors
    ///
    /// - [`AppError::Transport`] if the stream ended with a transport failure.
    /// - [`AppError::Cancelled`] if `cancel` fired before the stream ended.
    /// - [`AppError::Decode`] on a protocol violation under
    ///   [`ViolationPolicy::Abort`].
    pub async fn drain(
        mut self,
        mut stream: FrameStream,
        sink: &mut dyn RenderSink,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome> {
        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    debug!(frames = self.outcome.frames, "demux: cancellation received, stopping");
                    return Err(AppError::Cancelled(format!(
                        "stream abandoned after {} frame(s)",
                        self.outcome.frames
                    )));
                }

                item = stream.next() => {
                    match item {
                        None => {
                            debug!(frames = self.outcome.frames, "demux: stream closed");
                            break;
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, "demux: stream failed");
                            return Err(e);
                        }
                        Some(Ok(response)) => match Frame::from_response(response) {
                            Ok(frame) => self.handle_frame(frame, sink),
                            Err(e) => self.handle_violation(e)?,
                        },
                    }
                }
            }
        }

        Ok(self.finish(sink))
    }

    fn handle_event(&mut self, event: CodexEvent, sink: &mut dyn RenderSink) {
        match event {
            CodexEvent::AgentMessageDelta(delta) => {
                if !delta.is_empty() {
                    self.outcome.agent_text.push_str(&delta);
                    sink.emit(Rendered::Delta(delta));
                }
            }
            CodexEvent::ItemStarted(item) => sink.emit(Rendered::ItemStarted(item)),
            CodexEvent::ItemCompleted(CompletedItem::CommandExecution { exit_code }) => {
                sink.emit(Rendered::CommandFinished { exit_code });
            }
            CodexEvent::TurnCompleted => {
                self.outcome.turn_completed = true;
                self.emit_marker(sink);
            }
            CodexEvent::AgentMessage(text) => sink.emit(Rendered::AgentMessage(text)),
            CodexEvent::Reasoning(note) => sink.emit(Rendered::Reasoning(
                note.unwrap_or_else(|| REASONING_PLACEHOLDER.to_owned()),
            )),
        }
    }

    fn emit_marker(&mut self, sink: &mut dyn RenderSink) {
        if !self.marker_emitted {
            self.marker_emitted = true;
            sink.emit(Rendered::TurnCompleted);
        }
    }
}
