//! Beatmark: a markdown step sequencer.
//!
//! Patterns are written as plain text: front matter, `# Name` sections of
//! `Track: steps` lines, and an optional `# Sounds` block. [`dsl`] compiles
//! that text, [`event`] plays it step by step, [`midi`] converts it to and
//! from Standard MIDI Files, and [`generate`] asks an external tool for new
//! patterns.

pub mod dsl;
pub mod event;
pub mod generate;
pub mod midi;
