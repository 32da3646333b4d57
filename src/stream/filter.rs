//! Adapter log noise filter.

/// Substrings of adapter log lines that are suppressed by default
/// (SSE heartbeats and telemetry tracing).
pub const DEFAULT_SUPPRESSED_PATTERNS: &[&str] = &["sse_event", "otel_manager"];

/// Suppresses adapter log lines containing any configured substring.
///
/// Filtering is presentation only: suppressed lines still count as received
/// frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    patterns: Vec<String>,
}

impl LogFilter {
    /// Create a filter from explicit patterns. Empty patterns are dropped.
    #[must_use]
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(Into::into)
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// A filter that passes every line.
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Whether `line` should be hidden.
    #[must_use]
    pub fn suppresses(&self, line: &str) -> bool {
        self.patterns.iter().any(|p| line.contains(p.as_str()))
    }
}

impl Default for LogFilter {
    fn default() -> Self {
        Self::new(DEFAULT_SUPPRESSED_PATTERNS.iter().copied())
    }
}
