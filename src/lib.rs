#![forbid(unsafe_code)]

//! `adapter-probe`: test client for the codex agent adapter.
//!
//! Sends task requests over gRPC, demultiplexes the streamed response frames
//! into readable output, and threads the adapter's rollout checkpoint from
//! one turn to the next.

pub mod config;
pub mod errors;
pub mod proto;
pub mod session;
pub mod stream;
pub mod transport;

pub use config::ProbeConfig;
pub use errors::{AppError, Result};
