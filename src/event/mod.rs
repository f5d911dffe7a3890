//! Playback: the step sequencer and the real-time player around it.
//!
//! [`StepSequencer`] is pure tick logic: given the current source text it
//! returns the events for one step and advances its cursor. [`Player`] runs
//! that logic on a timer thread and hands events to an [`AudioBackend`].
//!
//! Neither owns any audio output. Rendering samples is the backend's job,
//! which keeps all scheduling logic testable without audio hardware.

pub mod player;
pub mod sequencer;
pub mod types;

pub use player::{AudioBackend, FileText, LiveText, Player, PlayerError, TextSource};
pub use sequencer::{events_at, track_position, PlayState, StepSequencer, Tick};
pub use types::{Event, Hit, ACCENT_VELOCITY, GHOST_VELOCITY, PITCHED_VELOCITY};
