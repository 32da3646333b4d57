//! Error types shared across the client.

use std::fmt::{Display, Formatter};

/// Shared client result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Client error enumeration covering all failure modes of a probe run.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing, validation, or credential resolution failure.
    Config(String),
    /// Channel setup failure or a stream that ended with a gRPC status.
    Transport(String),
    /// A response frame violated the single-variant invariant, or an inner
    /// event payload could not be decoded.
    Decode(String),
    /// The session cannot continue (a prior turn failed or reported errors).
    Session(String),
    /// The turn was cancelled before its stream completed.
    Cancelled(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Transport(msg) => write!(f, "transport: {msg}"),
            Self::Decode(msg) => write!(f, "decode: {msg}"),
            Self::Session(msg) => write!(f, "session: {msg}"),
            Self::Cancelled(msg) => write!(f, "cancelled: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<tonic::Status> for AppError {
    fn from(status: tonic::Status) -> Self {
        Self::Transport(format!(
            "rpc failed ({:?}): {}",
            status.code(),
            status.message()
        ))
    }
}

impl From<tonic::transport::Error> for AppError {
    fn from(err: tonic::transport::Error) -> Self {
        Self::Transport(format!("channel error: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
