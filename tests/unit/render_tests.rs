//! Unit tests for console rendering.

use adapter_probe::stream::event::StartedItem;
use adapter_probe::stream::render::{ConsoleSink, RenderSink, Rendered};

fn render(items: Vec<Rendered>) -> String {
    let mut sink = ConsoleSink::new(Vec::new());
    for item in items {
        sink.emit(item);
    }
    String::from_utf8(sink.into_inner()).expect("utf8 output")
}

#[test]
fn system_and_error_lines_are_tagged() {
    let out = render(vec![
        Rendered::System("starting".into()),
        Rendered::Error("quota exceeded".into()),
    ]);
    assert_eq!(out, "📋 [SYSTEM] starting\n❌ [ERROR] quota exceeded\n");
}

#[test]
fn deltas_stream_inline_and_next_line_starts_fresh() {
    let out = render(vec![
        Rendered::Delta("Hel".into()),
        Rendered::Delta("lo".into()),
        Rendered::CommandFinished { exit_code: Some(0) },
    ]);
    assert_eq!(out, "Hello\n✅ [RESULT] exit code 0\n");
}

#[test]
fn delta_ending_in_newline_does_not_add_blank_line() {
    let out = render(vec![
        Rendered::Delta("line\n".into()),
        Rendered::AgentMessage("next".into()),
    ]);
    assert_eq!(out, "line\n💬 [AGENT] next\n");
}

#[test]
fn reasoning_without_summary_uses_placeholder() {
    let out = render(vec![Rendered::ItemStarted(StartedItem::Reasoning {
        summary: None,
    })]);
    assert_eq!(out, "🧠 [REASONING] thinking...\n");
}

#[test]
fn tool_and_command_starts_name_their_target() {
    let out = render(vec![
        Rendered::ItemStarted(StartedItem::CommandExecution {
            command: Some("ls".into()),
        }),
        Rendered::ItemStarted(StartedItem::McpToolCall {
            tool: Some("search".into()),
        }),
    ]);
    assert!(out.contains("[COMMAND] ls"));
    assert!(out.contains("[TOOL] search"));
}

#[test]
fn completion_marker_is_rendered() {
    let out = render(vec![Rendered::TurnCompleted]);
    assert!(out.contains("[TURN COMPLETE]"));
}

#[test]
fn vec_sink_records_items_in_order() {
    let mut sink: Vec<Rendered> = Vec::new();
    sink.emit(Rendered::System("a".into()));
    sink.emit(Rendered::TurnCompleted);
    assert_eq!(
        sink,
        vec![Rendered::System("a".into()), Rendered::TurnCompleted]
    );
}

/// Writer that rejects every write, like stdout after the reader hung up.
struct BrokenPipe {
    attempts: usize,
}

impl std::io::Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        self.attempts += 1;
        Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn write_failure_closes_sink_and_stops_writing() {
    let mut sink = ConsoleSink::new(BrokenPipe { attempts: 0 });
    assert!(!sink.is_closed());

    sink.emit(Rendered::System("first".into()));
    assert!(sink.is_closed());

    sink.emit(Rendered::Delta("more".into()));
    sink.emit(Rendered::TurnCompleted);

    assert_eq!(sink.into_inner().attempts, 1, "no writes after the first failure");
}
