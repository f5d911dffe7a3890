//! General MIDI percussion key map.

use crate::dsl::sound::DrumKind;

/// Channel 10 (zero-based 9) carries percussion in General MIDI.
pub const PERCUSSION_CHANNEL: u8 = 9;

/// Key used for percussion tracks that are not part of the built-in set.
pub const DEFAULT_DRUM_KEY: u8 = 38;

impl DrumKind {
    /// The General MIDI key this drum is written as.
    pub fn gm_key(self) -> u8 {
        match self {
            Self::Kick => 36,
            Self::Snare => 38,
            Self::HiHat => 42,
            Self::OpenHH => 46,
            Self::Clap => 39,
        }
    }

    /// Reverse lookup of [`DrumKind::gm_key`].
    pub fn from_gm_key(key: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.gm_key() == key)
    }
}

/// Key for a percussion track, by exact track name.
pub fn drum_key(track_name: &str) -> u8 {
    DrumKind::from_track_name(track_name).map_or(DEFAULT_DRUM_KEY, DrumKind::gm_key)
}

/// Track name for an imported percussion key: a built-in drum name, else `Drum<key>`.
pub fn drum_track_name(key: u8) -> String {
    match DrumKind::from_gm_key(key) {
        Some(kind) => kind.name().to_string(),
        None => format!("Drum{key}"),
    }
}
