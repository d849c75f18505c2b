//! Captured console output.

use js_engine::LogLevel;
use std::fmt;

/// Text shown in the output pane while the buffer is empty.
pub const EMPTY_PLACEHOLDER: &str = "Console output will appear here...";

/// One captured console line, displayed as `[LEVEL] message`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogLine {
    level: LogLevel,
    message: String,
}

impl LogLine {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// Ordered, append-only log of one run's output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogBuffer {
    lines: Vec<LogLine>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: LogLine) {
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogLine> {
        self.lines.iter()
    }

    /// The lines as the output pane displays them.
    pub fn rendered(&self) -> Vec<String> {
        self.lines.iter().map(ToString::to_string).collect()
    }

    /// Message count shown in the output pane header.
    pub fn summary(&self) -> String {
        let count = self.lines.len();
        format!("{} message{}", count, if count == 1 { "" } else { "s" })
    }
}

impl Extend<LogLine> for LogBuffer {
    fn extend<T: IntoIterator<Item = LogLine>>(&mut self, iter: T) {
        self.lines.extend(iter);
    }
}

impl<'a> IntoIterator for &'a LogBuffer {
    type Item = &'a LogLine;
    type IntoIter = std::slice::Iter<'a, LogLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}
