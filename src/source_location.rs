//! Line/column positions for streamed text.
//!
//! Positions are byte oriented: lines are 1-based, columns are 0-based, and a
//! newline byte starts the next line at column 0. [`StreamPosition`] adds the
//! absolute byte offset from the start of the stream, which is what the ring
//! buffer uses to address retained text.

use serde::Serialize;
use std::fmt;

/// A human-readable location in the input text.
///
/// Ordered by line first, then column, so "deeper into the input" compares
/// greater. This is what failure diagnostics carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    /// Line number, 1-based.
    pub line: u32,
    /// Column number, 0-based.
    pub column: u32,
}

impl Position {
    /// Creates a position at the given line and column.
    pub fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }

    /// The position of the very first byte of a stream.
    pub fn start() -> Self {
        Position { line: 1, column: 0 }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A [`Position`] plus the absolute byte offset from the start of the stream.
///
/// The offset is what checkpoints and the ring buffer work in; the line and
/// column travel along so diagnostics stay cheap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamPosition {
    /// Line number, 1-based.
    pub line: u32,
    /// Column number, 0-based.
    pub column: u32,
    /// Absolute byte offset from the start of the stream.
    pub offset: u64,
}

impl StreamPosition {
    /// The start of a stream: line 1, column 0, offset 0.
    pub fn start() -> Self {
        StreamPosition {
            line: 1,
            column: 0,
            offset: 0,
        }
    }

    /// Advances past one byte. A newline starts the next line; every byte
    /// advances the offset.
    pub fn advance(&mut self, byte: u8) {
        if byte == b'\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        self.offset += 1;
    }

    /// The line/column part of this position.
    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }
}

impl Default for StreamPosition {
    fn default() -> Self {
        StreamPosition::start()
    }
}

impl fmt::Display for StreamPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}, column {} (offset {})",
            self.line, self.column, self.offset
        )
    }
}
