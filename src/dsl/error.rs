//! Parse diagnostics.
//!
//! The compiler never fails: a malformed line is dropped and compilation
//! carries on. Each dropped line is recorded as a [`ParseAnomaly`] so tools
//! can report what was ignored.

use std::fmt;

/// A source line the compiler skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseAnomaly {
    pub message: String,
    /// 1-based source line.
    pub line: usize,
    pub kind: AnomalyKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyKind {
    /// Front-matter line without a `key: value` pair.
    Metadata,
    /// Line inside `# Sounds` that fits no sound grammar.
    SoundLine,
    /// Property the sound's shape does not recognise, or a mistyped value.
    SoundProperty,
    /// Line inside a pattern that is not `name: steps`.
    TrackLine,
    /// Content outside any pattern, sound block, or front matter.
    Stray,
    /// Pattern heading with no tracks under it.
    EmptyPattern,
}

impl ParseAnomaly {
    pub fn new(kind: AnomalyKind, message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
            kind,
        }
    }
}

impl fmt::Display for ParseAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] {:?}: {}", self.line, self.kind, self.message)
    }
}

impl std::error::Error for ParseAnomaly {}
