//! Response stream handling.
//!
//! Every call to the adapter yields a server-streamed sequence of
//! [`RunResponse`](crate::proto::RunResponse) frames. This module validates
//! each frame ([`frame`]), decodes the JSON agent events some frames carry
//! ([`event`]), and dispatches everything to a render sink while tracking the
//! session rollout ([`demux`]).
//!
//! - `frame`: single-variant validation of wire frames.
//! - `event`: two-shape decoding of `codex_event_json` payloads.
//! - `filter`: substring-based adapter log noise filter.
//! - `render`: output items and sinks.
//! - `demux`: the per-call dispatcher and stream drain loop.

pub mod demux;
pub mod event;
pub mod filter;
pub mod frame;
pub mod render;
