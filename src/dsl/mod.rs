//! Pattern compiler: source text → [`Document`].
//!
//! The text format is line based: `---` front matter, a `# Sounds` block of
//! instrument definitions, and `# Name` pattern sections of `Track: steps`
//! lines. Compilation never fails; malformed lines are skipped.

pub mod document;
pub mod error;
pub mod note;
pub mod parser;
pub mod presets;
pub mod serialize;
pub mod sound;

pub use document::{Document, MetaValue, Metadata, Pattern, Track};
pub use error::{AnomalyKind, ParseAnomaly};
pub use sound::{
    DrumKind, FilterType, PercussionSound, SoundDefinition, SoundKind, SynthSound, Waveform,
};

use parser::Parser;

/// The pattern compiler.
///
/// Stateless: every call builds a fresh [`Document`].
pub struct Compiler;

impl Compiler {
    /// Compile source text, dropping malformed lines.
    pub fn compile(source: &str) -> Document {
        Parser::new(source).parse().0
    }

    /// Compile source text and also return every line that was dropped.
    pub fn compile_with_diagnostics(source: &str) -> (Document, Vec<ParseAnomaly>) {
        Parser::new(source).parse()
    }
}
