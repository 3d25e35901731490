//! Diagnostics reported back to the preview webview.
//!
//! Every per-unit failure and warning ends up here. The wire shape mirrors
//! what the webview renders: `{ start: { line, column }, message }`.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: i32,
    pub column: i32,
}

impl Position {
    /// Non-positional failure (nothing sensible to point at).
    pub const NONE: Position = Position {
        line: -1,
        column: -1,
    };

    /// Fallback when a failure did not report where it happened.
    pub const ZERO: Position = Position { line: 0, column: 0 };

    pub fn new(line: i32, column: i32) -> Self {
        Self { line, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub start: Position,
    pub message: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Diagnostic {
    pub fn error(start: Position, message: impl Into<String>) -> Self {
        Self {
            start,
            message: message.into(),
            severity: Severity::Error,
            file: None,
        }
    }

    pub fn warning(start: Position, message: impl Into<String>) -> Self {
        Self {
            start,
            message: message.into(),
            severity: Severity::Warning,
            file: None,
        }
    }

    pub fn in_file(mut self, path: &Path) -> Self {
        self.file = Some(path.to_string_lossy().to_string());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Convert a byte offset into a 1-based line and 0-based column.
///
/// Offsets past the end clamp to the end of the source. Columns count
/// characters, not bytes.
pub fn line_column(source: &str, offset: usize) -> Position {
    let mut end = offset.min(source.len());
    while !source.is_char_boundary(end) {
        end -= 1;
    }
    let before = &source[..end];
    let line = before.matches('\n').count() + 1;
    let column = match before.rfind('\n') {
        Some(newline) => before[newline + 1..].chars().count(),
        None => before.chars().count(),
    };
    Position::new(line as i32, column as i32)
}
