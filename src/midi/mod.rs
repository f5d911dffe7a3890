//! MIDI codec: documents to and from Standard MIDI Files.
//!
//! Only the first pattern of a document is exported, and an import always
//! produces a single pattern. Pitched tracks come back as inline note names,
//! so a digit-based `notes` table does not survive a round trip.

pub mod config;
pub mod decode;
pub mod encode;
pub mod gm;

use std::fmt;

pub use config::MidiConfig;
pub use decode::{decode, decode_to_text, decode_with};
pub use encode::{encode, encode_with};

/// Codec failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiError {
    /// The document has no pattern to export.
    EmptyDocument,
    /// The bytes are not a Standard MIDI File.
    Parse(String),
    /// The file could not be written.
    Write(String),
}

impl fmt::Display for MidiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDocument => write!(f, "nothing to export: the document has no patterns"),
            Self::Parse(msg) => write!(f, "not a MIDI file: {msg}"),
            Self::Write(msg) => write!(f, "failed to write MIDI data: {msg}"),
        }
    }
}

impl std::error::Error for MidiError {}
