//! Error types reported by the axon compiler.
//!
//! There are two kinds of failure: parse failures, which carry the byte
//! position of the offending text, and compile failures, which do not. Both
//! abort the current compilation; there is no partial recovery.

use thiserror::Error;

/// A parsing failure at a byte position of the parsed text.
///
/// Positions are relative to the text handed to the parser; script-level
/// parsing translates them to whole-script coordinates before surfacing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at character {}", .position + 1)]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub(crate) fn new<M: Into<String>>(message: M, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }

    /// Shifts the error position by `offset`, e.g. from line-local to
    /// script-global coordinates.
    pub(crate) fn offset(mut self, offset: usize) -> Self {
        self.position += offset;
        self
    }
}

/// A compilation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CompileError {
    pub message: String,
}

impl CompileError {
    pub(crate) fn new<M: Into<String>>(message: M) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Any failure the compiler can report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Compile(#[from] CompileError),
}
