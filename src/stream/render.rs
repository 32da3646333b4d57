//! Rendered output produced by the demultiplexer.
//!
//! The demultiplexer never writes to the terminal itself; every side effect
//! goes through a [`RenderSink`]. [`ConsoleSink`] prints lines for an
//! operator, and `Vec<Rendered>` records them (used by tests and by callers
//! that post-process a turn).

use std::io::{self, Write};

use tracing::warn;

use crate::stream::event::StartedItem;

/// Placeholder shown when a reasoning item carries no summary.
pub const REASONING_PLACEHOLDER: &str = "thinking...";

/// One user-visible output item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// Adapter diagnostic line (already trimmed).
    System(String),
    /// Adapter error line.
    Error(String),
    /// Chunk of streaming agent text, printed inline.
    Delta(String),
    /// A unit of work started.
    ItemStarted(StartedItem),
    /// A command finished.
    CommandFinished {
        /// Exit code, if reported.
        exit_code: Option<i64>,
    },
    /// Complete agent message.
    AgentMessage(String),
    /// Reasoning note.
    Reasoning(String),
    /// Completion marker; emitted once per call.
    TurnCompleted,
}

/// Destination for rendered output.
pub trait RenderSink: Send {
    /// Emit one rendered item.
    fn emit(&mut self, item: Rendered);
}

impl RenderSink for Vec<Rendered> {
    fn emit(&mut self, item: Rendered) {
        self.push(item);
    }
}

/// Writes rendered items to a terminal-like writer.
///
/// Deltas are written without a newline and flushed immediately so text
/// appears as it streams; the next non-delta item starts on a fresh line.
/// After the first write failure (e.g. a closed pipe) the sink logs once and
/// discards everything that follows.
pub struct ConsoleSink<W: Write + Send> {
    out: W,
    mid_line: bool,
    closed: bool,
}

impl ConsoleSink<std::io::Stdout> {
    /// Sink writing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    /// Sink writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            mid_line: false,
            closed: false,
        }
    }

    /// Whether a write has failed and output is being discarded.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Consume the sink and return the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        let mid_line = std::mem::replace(&mut self.mid_line, false);
        self.write_with(|out| {
            if mid_line {
                writeln!(out)?;
            }
            writeln!(out, "{text}")
        });
    }

    fn inline(&mut self, text: &str) {
        self.mid_line = !text.ends_with('\n');
        self.write_with(|out| {
            write!(out, "{text}")?;
            out.flush()
        });
    }

    fn write_with(&mut self, write: impl FnOnce(&mut W) -> io::Result<()>) {
        if self.closed {
            return;
        }
        if let Err(err) = write(&mut self.out) {
            warn!(error = %err, "console output failed, discarding further output");
            self.closed = true;
        }
    }
}

impl<W: Write + Send> RenderSink for ConsoleSink<W> {
    fn emit(&mut self, item: Rendered) {
        match item {
            Rendered::System(line) => self.line(&format!("📋 [SYSTEM] {line}")),
            Rendered::Error(message) => self.line(&format!("❌ [ERROR] {message}")),
            Rendered::Delta(text) => self.inline(&text),
            Rendered::ItemStarted(StartedItem::Reasoning { summary }) => self.line(&format!(
                "🧠 [REASONING] {}",
                summary.as_deref().unwrap_or(REASONING_PLACEHOLDER)
            )),
            Rendered::ItemStarted(StartedItem::CommandExecution { command }) => {
                self.line(&format!("🛠️  [COMMAND] {}", command.as_deref().unwrap_or("")));
            }
            Rendered::ItemStarted(StartedItem::McpToolCall { tool }) => {
                self.line(&format!("🔗 [TOOL] {}", tool.as_deref().unwrap_or("")));
            }
            Rendered::CommandFinished { exit_code } => match exit_code {
                Some(code) => self.line(&format!("✅ [RESULT] exit code {code}")),
                None => self.line("✅ [RESULT] exit code unknown"),
            },
            Rendered::AgentMessage(text) => self.line(&format!("💬 [AGENT] {text}")),
            Rendered::Reasoning(text) => self.line(&format!("🧠 [REASONING] {text}")),
            Rendered::TurnCompleted => self.line("\n🏁 [TURN COMPLETE]"),
        }
    }
}
