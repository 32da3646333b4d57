//! Protocol-agnostic transport abstraction.
//!
//! The [`AgentTransport`] trait decouples the demultiplexer and the session
//! coordinator from how requests reach the adapter. The production
//! implementation speaks gRPC ([`grpc::GrpcTransport`]); tests substitute a
//! scripted in-memory transport.

pub mod grpc;

pub use grpc::GrpcTransport;

use std::future::Future;
use std::pin::Pin;

use futures_util::Stream;

use crate::proto::{RunRequest, RunResponse, TaskRequest};
use crate::Result;

/// Lazy, finite stream of response frames for one call.
///
/// An `Err` item is a transport-level failure; the stream yields nothing
/// useful after it.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<RunResponse>> + Send>>;

/// Unary-request / server-streaming-response interface to the adapter.
pub trait AgentTransport: Send + Sync {
    /// Issue a single-shot `Run` call.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`](crate::AppError::Transport) if the call
    /// cannot be started.
    fn run(
        &self,
        request: RunRequest,
    ) -> Pin<Box<dyn Future<Output = Result<FrameStream>> + Send + '_>>;

    /// Issue a session-oriented `RunTask` call.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`](crate::AppError::Transport) if the call
    /// cannot be started.
    fn run_task(
        &self,
        request: TaskRequest,
    ) -> Pin<Box<dyn Future<Output = Result<FrameStream>> + Send + '_>>;
}
