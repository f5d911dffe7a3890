//! MIDI codec configuration loaded from ~/.beatmark/midi.yaml.

use serde::{Deserialize, Serialize};

/// Resolution, note lengths and velocities used when writing and reading files.
///
/// Velocities are in the range 0.0–1.0 and scaled to 0–127 on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    /// Pulses per quarter note written to the file header.
    pub ticks_per_quarter: u16,
    /// Fixed length of every exported drum hit.
    pub drum_hit_seconds: f64,
    /// Velocity for `X` steps.
    pub accent_velocity: f64,
    /// Velocity for `x` steps.
    pub ghost_velocity: f64,
    /// Velocity for pitched notes.
    pub pitched_velocity: f64,
    /// Imported drum notes louder than this become `X`, the rest `x`.
    pub accent_threshold: f64,
}

impl MidiConfig {
    /// Load config from the standard path (~/.beatmark/midi.yaml).
    /// Returns None if the file doesn't exist or doesn't parse.
    pub fn load() -> Option<Self> {
        let home = dirs::home_dir()?;
        let path = home.join(".beatmark").join("midi.yaml");
        let content = std::fs::read_to_string(path).ok()?;
        serde_yaml::from_str(&content).ok()
    }

    /// Header resolution clamped to what a metrical MIDI header can hold.
    pub(crate) fn resolution(&self) -> u16 {
        self.ticks_per_quarter.clamp(1, 0x7FFF)
    }
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            ticks_per_quarter: 480,
            drum_hit_seconds: 0.1,
            accent_velocity: 1.0,
            ghost_velocity: 0.6,
            pitched_velocity: 0.7,
            accent_threshold: 0.8,
        }
    }
}

/// Scale a 0.0–1.0 velocity to a MIDI data byte.
pub(crate) fn velocity_to_byte(velocity: f64) -> u8 {
    (velocity.clamp(0.0, 1.0) * 127.0).round() as u8
}
