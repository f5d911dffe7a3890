//! Step sequencer: play/stop state and the per-tick walk over a pattern.
//!
//! Each tick re-reads the latest source text, so edits made while playing
//! take effect on the next step. The compiled document is cached by exact
//! source text; an unchanged text is not recompiled.

use tracing::debug;

use crate::dsl::note::{chord_frequencies, resolve_step_token};
use crate::dsl::{Compiler, Document, Pattern};

use super::types::Event;

/// Playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Stopped,
    Running,
}

/// The outcome of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    /// The step that was played.
    pub step: usize,
    /// Events in track order.
    pub events: Vec<Event>,
    /// Step length at the tempo in effect for this tick; `None` when the tick
    /// was skipped (no pattern, or an invalid tempo).
    pub step_seconds: Option<f64>,
}

impl Tick {
    fn skipped(step: usize) -> Self {
        Self {
            step,
            events: Vec::new(),
            step_seconds: None,
        }
    }
}

/// Walks the first pattern of a document one sixteenth at a time.
#[derive(Debug)]
pub struct StepSequencer {
    state: PlayState,
    current_step: usize,
    cache: Option<(String, Document)>,
}

impl Default for StepSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl StepSequencer {
    /// Create a sequencer in the stopped state at step zero.
    pub fn new() -> Self {
        Self {
            state: PlayState::Stopped,
            current_step: 0,
            cache: None,
        }
    }

    /// Start playback from step zero.
    pub fn start(&mut self) {
        self.state = PlayState::Running;
        self.current_step = 0;
    }

    /// Stop playback and rewind to step zero.
    pub fn stop(&mut self) {
        self.state = PlayState::Stopped;
        self.current_step = 0;
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    /// The step the next tick will play.
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Play the current step of `source` and advance.
    ///
    /// Returns `None` when stopped. A tick with no pattern or an invalid
    /// tempo emits nothing and leaves the cursor where it is.
    pub fn tick(&mut self, source: &str) -> Option<Tick> {
        if self.state == PlayState::Stopped {
            return None;
        }

        let step = self.current_step;
        let doc = self.document(source);

        let Some(pattern) = doc.first_pattern() else {
            debug!(step, "tick skipped: no pattern");
            return Some(Tick::skipped(step));
        };
        let Some(tempo) = doc.tempo() else {
            debug!(step, "tick skipped: invalid tempo");
            return Some(Tick::skipped(step));
        };

        let step_seconds = Document::step_seconds(tempo);
        let max_steps = pattern.max_steps().max(1);
        let events = events_at(doc, pattern, step, step_seconds);

        self.current_step = (step + 1) % max_steps;
        Some(Tick {
            step,
            events,
            step_seconds: Some(step_seconds),
        })
    }

    fn document(&mut self, source: &str) -> &Document {
        if self
            .cache
            .as_ref()
            .is_some_and(|(cached, _)| cached != source)
        {
            self.cache = None;
        }
        let (_, doc) = self
            .cache
            .get_or_insert_with(|| (source.to_string(), Compiler::compile(source)));
        doc
    }
}

/// Position within a track of length `track_len` at global `step`.
pub fn track_position(step: usize, track_len: usize) -> usize {
    if track_len == 0 {
        0
    } else {
        step % track_len
    }
}

/// Events every track of `pattern` produces at global `step`.
///
/// Tracks naming a synth sound resolve their step token to a note or chord;
/// every other track is percussion, where `X` is an accent, `x` a normal hit,
/// and anything else a rest.
pub fn events_at(doc: &Document, pattern: &Pattern, step: usize, step_seconds: f64) -> Vec<Event> {
    let mut events = Vec::new();

    for track in &pattern.tracks {
        let len = track.len();
        if len == 0 {
            continue;
        }
        let position = track_position(step, len);

        match doc.sound(&track.name) {
            Some(sound) if !sound.is_percussion() => {
                let Some(token) = resolve_step_token(&track.steps, position, Some(sound)).token
                else {
                    continue;
                };
                let frequencies = chord_frequencies(token);
                if frequencies.is_empty() {
                    debug!(track = %track.name, token, "unresolved note dropped");
                    continue;
                }
                events.push(Event::pitched(&track.name, frequencies, step_seconds));
            }
            _ => match track.step_at(position) {
                Some('X') => events.push(Event::drum(&track.name, true)),
                Some('x') => events.push(Event::drum(&track.name, false)),
                _ => {}
            },
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::note::note_to_frequency;
    use crate::event::types::Hit;

    const DRUMS: &str = "# Main\nKick: X...x...\nSnare: ..X.\n";

    const SYNTH: &str = "\
---
tempo: 60
---
# Main
Keys: 1.2.c#3..
# Sounds
Keys:
  notes:
    1: c2-e2-g2
    2: c4
";

    fn hits(tick: &Tick) -> Vec<(&str, Hit)> {
        tick.events
            .iter()
            .map(|e| (e.track_name.as_str(), e.hit.clone()))
            .collect()
    }

    #[test]
    fn stopped_tick_is_none() {
        let mut s = StepSequencer::new();
        assert_eq!(s.state(), PlayState::Stopped);
        assert!(s.tick(DRUMS).is_none());
    }

    #[test]
    fn start_and_stop_reset_cursor() {
        let mut s = StepSequencer::new();
        s.start();
        s.tick(DRUMS);
        s.tick(DRUMS);
        assert_eq!(s.current_step(), 2);
        s.stop();
        assert_eq!(s.current_step(), 0);
        s.start();
        assert_eq!(s.current_step(), 0);
        assert_eq!(s.state(), PlayState::Running);
    }

    #[test]
    fn wraparound_positions() {
        assert_eq!(track_position(20, 16), track_position(4, 16));
        assert_eq!(track_position(20, 4), 0);
        assert_eq!(track_position(3, 0), 0);
    }

    #[test]
    fn short_tracks_loop_independently() {
        let mut s = StepSequencer::new();
        s.start();
        let ticks: Vec<Tick> = (0..8).filter_map(|_| s.tick(DRUMS)).collect();
        let snare_steps: Vec<usize> = ticks
            .iter()
            .filter(|t| t.events.iter().any(|e| e.track_name == "Snare"))
            .map(|t| t.step)
            .collect();
        assert_eq!(snare_steps, vec![2, 6]);
        // cursor wraps at the longest track
        assert_eq!(s.current_step(), 0);
    }

    #[test]
    fn percussion_velocity_symbols() {
        let mut s = StepSequencer::new();
        s.start();
        let first = s.tick(DRUMS).unwrap();
        assert_eq!(hits(&first), vec![("Kick", Hit::Drum { accent: true })]);
        let _ = s.tick(DRUMS);
        let third = s.tick(DRUMS).unwrap();
        assert_eq!(hits(&third), vec![("Snare", Hit::Drum { accent: true })]);
        let _ = s.tick(DRUMS);
        let fifth = s.tick(DRUMS).unwrap();
        assert_eq!(hits(&fifth), vec![("Kick", Hit::Drum { accent: false })]);
    }

    #[test]
    fn step_duration_follows_tempo() {
        let mut s = StepSequencer::new();
        s.start();
        let tick = s.tick(DRUMS).unwrap();
        assert_eq!(tick.step_seconds, Some(0.125));
        let tick = s.tick(SYNTH).unwrap();
        assert_eq!(tick.step_seconds, Some(0.25));
    }

    #[test]
    fn chord_token_emits_one_event_with_all_members() {
        let mut s = StepSequencer::new();
        s.start();
        let tick = s.tick(SYNTH).unwrap();
        assert_eq!(tick.events.len(), 1);
        let expected: Vec<f64> = ["c2", "e2", "g2"]
            .iter()
            .filter_map(|n| note_to_frequency(n))
            .collect();
        assert_eq!(
            tick.events[0].hit,
            Hit::Pitched {
                frequencies_hz: expected,
                duration_seconds: 0.25
            }
        );
    }

    #[test]
    fn inline_notes_and_rests() {
        let mut s = StepSequencer::new();
        s.start();
        let ticks: Vec<Tick> = (0..9).filter_map(|_| s.tick(SYNTH)).collect();
        let sounding: Vec<usize> = ticks
            .iter()
            .filter(|t| !t.events.is_empty())
            .map(|t| t.step)
            .collect();
        // 1 at 0, 2 at 2, c#3 at 4; '#' and '3' positions are not tokens
        assert_eq!(sounding, vec![0, 2, 4]);
        assert_eq!(s.current_step(), 0);
    }

    #[test]
    fn missing_pattern_skips_without_advancing() {
        let mut s = StepSequencer::new();
        s.start();
        let tick = s.tick("---\ntempo: 90\n---\n").unwrap();
        assert!(tick.events.is_empty());
        assert_eq!(tick.step_seconds, None);
        assert_eq!(s.current_step(), 0);
        assert_eq!(s.state(), PlayState::Running);
    }

    #[test]
    fn invalid_tempo_emits_nothing() {
        let mut s = StepSequencer::new();
        s.start();
        let tick = s.tick("---\ntempo: 0\n---\n# P\nKick: X\n").unwrap();
        assert!(tick.events.is_empty());
        assert_eq!(tick.step_seconds, None);
    }

    #[test]
    fn live_edit_takes_effect_next_tick() {
        let mut s = StepSequencer::new();
        s.start();
        let _ = s.tick("# P\nKick: X...\n");
        let tick = s.tick("# P\nKick: XX..\n").unwrap();
        assert_eq!(tick.step, 1);
        assert_eq!(tick.events.len(), 1);
    }

    #[test]
    fn percussion_sound_definitions_stay_percussion() {
        let src = "# P\nKick: X...\n# Sounds\nKick:\n  type: drum\n  pitch: 60\n";
        let mut s = StepSequencer::new();
        s.start();
        let tick = s.tick(src).unwrap();
        assert_eq!(hits(&tick), vec![("Kick", Hit::Drum { accent: true })]);
    }

    #[test]
    fn out_of_range_octave_is_dropped_not_fatal() {
        let src = "# P\nLead: c999999999\n# Sounds\nLead:\n  type: synth\n";
        let mut s = StepSequencer::new();
        s.start();
        let tick = s.tick(src).unwrap();
        assert!(tick.events.is_empty());
        assert_eq!(s.state(), PlayState::Running);
    }

    #[test]
    fn unknown_symbols_on_synth_tracks_are_rests() {
        let src = "# P\nLead: 9zX\n# Sounds\nLead:\n  notes:\n    1: c4\n";
        let mut s = StepSequencer::new();
        s.start();
        for _ in 0..3 {
            assert!(s.tick(src).unwrap().events.is_empty());
        }
    }
}
