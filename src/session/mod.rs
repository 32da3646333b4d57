//! Session continuity.
//!
//! A session is a sequence of turns sharing one `session_id`. The adapter
//! returns an opaque rollout checkpoint in each turn's stream; the
//! [`coordinator::SessionCoordinator`] replays the last one on the next turn
//! so the agent keeps its context.

pub mod coordinator;
pub mod request;

pub use coordinator::{run_once, ErrorFramePolicy, SessionCoordinator};
pub use request::RequestTemplate;
