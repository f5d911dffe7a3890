//! Event data model: what the sequencer hands to the audio backend.
//!
//! An [`Event`] is one drum hit or one pitched voice (possibly a chord) on a
//! named track, timed relative to the tick that produced it.

/// Velocity of an accented drum hit (`X`).
pub const ACCENT_VELOCITY: f32 = 1.0;

/// Velocity of a normal drum hit (`x`).
pub const GHOST_VELOCITY: f32 = 0.6;

/// Velocity for pitched voices.
pub const PITCHED_VELOCITY: f32 = 0.3;

/// What the event triggers.
#[derive(Debug, Clone, PartialEq)]
pub enum Hit {
    /// A percussion hit; `accent` selects full velocity.
    Drum { accent: bool },
    /// One or more simultaneous pitches held for `duration_seconds`.
    Pitched {
        frequencies_hz: Vec<f64>,
        duration_seconds: f64,
    },
}

/// A single performance event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// The track that produced this event.
    pub track_name: String,
    /// Offset from the start of the tick, in seconds.
    pub time_offset_seconds: f64,
    pub hit: Hit,
}

impl Event {
    /// Create a drum-hit event at the start of the tick.
    pub fn drum(track_name: &str, accent: bool) -> Self {
        Self {
            track_name: track_name.to_string(),
            time_offset_seconds: 0.0,
            hit: Hit::Drum { accent },
        }
    }

    /// Create a pitched event at the start of the tick.
    pub fn pitched(track_name: &str, frequencies_hz: Vec<f64>, duration_seconds: f64) -> Self {
        Self {
            track_name: track_name.to_string(),
            time_offset_seconds: 0.0,
            hit: Hit::Pitched {
                frequencies_hz,
                duration_seconds,
            },
        }
    }

    /// Playback velocity in the range 0.0–1.0.
    pub fn velocity(&self) -> f32 {
        match self.hit {
            Hit::Drum { accent: true } => ACCENT_VELOCITY,
            Hit::Drum { accent: false } => GHOST_VELOCITY,
            Hit::Pitched { .. } => PITCHED_VELOCITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drum_constructor() {
        let e = Event::drum("Kick", true);
        assert_eq!(e.track_name, "Kick");
        assert_eq!(e.time_offset_seconds, 0.0);
        assert_eq!(e.hit, Hit::Drum { accent: true });
    }

    #[test]
    fn pitched_constructor() {
        let e = Event::pitched("Bass", vec![65.41, 82.41], 0.125);
        match e.hit {
            Hit::Pitched {
                ref frequencies_hz,
                duration_seconds,
            } => {
                assert_eq!(frequencies_hz.len(), 2);
                assert!((duration_seconds - 0.125).abs() < f64::EPSILON);
            }
            _ => panic!("expected pitched hit"),
        }
    }

    #[test]
    fn velocities() {
        assert!((Event::drum("Kick", true).velocity() - 1.0).abs() < f32::EPSILON);
        assert!((Event::drum("Kick", false).velocity() - 0.6).abs() < f32::EPSILON);
        assert!((Event::pitched("Keys", vec![440.0], 0.1).velocity() - 0.3).abs() < f32::EPSILON);
    }
}
