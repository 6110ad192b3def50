#[cfg(feature = "napi")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// POSITIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Line is 1-based, column is 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self {
            line: line.max(1),
            column,
        }
    }

    /// Locate a byte offset inside `code`. Columns count characters.
    pub fn from_offset(code: &str, offset: usize) -> Self {
        let offset = floor_char_boundary(code, offset);
        let before = &code[..offset];
        let line = before.matches('\n').count() as u32 + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() as u32;
        Self { line, column }
    }
}

/// Clamp `offset` into `code` and step back onto a char boundary.
pub(crate) fn floor_char_boundary(code: &str, offset: usize) -> usize {
    let mut offset = offset.min(code.len());
    while !code.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// A position anchored to a path (display form, relative to the project root
/// when possible).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct FileLocation {
    pub path: String,
    pub line: u32,
    pub column: u32,
}

impl FileLocation {
    pub fn new(path: impl Into<String>, position: Position) -> Self {
        Self {
            path: path.into(),
            line: position.line,
            column: position.column,
        }
    }
}

impl std::fmt::Display for FileLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.path, self.line, self.column)
    }
}

/// Where an error should be shown to the author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub path: String,
    pub line: u32,
    pub column: u32,
    /// Best-effort filesystem path. Equals the output path when nothing was mapped.
    pub absolute_path: String,
    /// Rendered excerpt: a pointer line, or a multi-line frame.
    pub code: String,
}

impl SourceLocation {
    pub fn location(&self) -> FileLocation {
        FileLocation {
            path: self.path.clone(),
            line: self.line,
            column: self.column,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSE FAILURE
// ═══════════════════════════════════════════════════════════════════════════════

/// Raw parser output for code that does not fit the requested edition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseFailure {
    pub message: String,
    pub byte_offset: usize,
    pub position: Position,
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPATIBILITY ERROR
// ═══════════════════════════════════════════════════════════════════════════════

/// One reported syntax violation.
///
/// `output` is set only when the position was remapped through a source map;
/// otherwise `source` already points into the build artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityError {
    pub message: String,
    pub source: SourceLocation,
    pub output: Option<FileLocation>,
}

impl std::fmt::Display for CompatibilityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.source.location())
    }
}
