//! Document → Standard MIDI File (format 1).
//!
//! Track 0 carries the tempo; every sequencer track of the first pattern
//! becomes one further MIDI track. Percussion goes to the General MIDI drum
//! channel with a fixed hit length; pitched tracks hold each note for one step.

use midly::num::{u15, u24, u28, u4, u7};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use tracing::debug;

use crate::dsl::document::{Document, Track as StepTrack, DEFAULT_TEMPO};
use crate::dsl::note::{chord_members, note_to_midi, resolve_step_token};

use super::config::{velocity_to_byte, MidiConfig};
use super::gm::{drum_key, PERCUSSION_CHANNEL};
use super::MidiError;

/// A note in seconds, before quantizing to ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TimedNote {
    pub key: u8,
    pub velocity: u8,
    pub start_seconds: f64,
    pub duration_seconds: f64,
}

/// Encode the first pattern of `doc` with the default configuration.
pub fn encode(doc: &Document) -> Result<Vec<u8>, MidiError> {
    encode_with(doc, &MidiConfig::default())
}

/// Encode the first pattern of `doc`.
///
/// Fails with [`MidiError::EmptyDocument`] when there is no pattern; never
/// writes a file without note tracks.
pub fn encode_with(doc: &Document, config: &MidiConfig) -> Result<Vec<u8>, MidiError> {
    let pattern = doc.first_pattern().ok_or(MidiError::EmptyDocument)?;
    if doc.patterns.len() > 1 {
        debug!(
            patterns = doc.patterns.len(),
            "only the first pattern is exported"
        );
    }

    let tempo = doc.tempo().unwrap_or(DEFAULT_TEMPO);
    let step_seconds = Document::step_seconds(tempo);
    let ppq = config.resolution();
    let to_ticks = |seconds: f64| seconds_to_ticks(seconds, tempo, ppq);

    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(ppq)),
    ));
    smf.tracks.push(tempo_track(tempo));

    let mut pitched_tracks = 0;
    for track in &pattern.tracks {
        let percussion = doc.sound(&track.name).map_or(true, |s| s.is_percussion());
        let (channel, notes) = if percussion {
            (
                PERCUSSION_CHANNEL,
                percussion_notes(track, step_seconds, config),
            )
        } else {
            let channel = melodic_channel(pitched_tracks);
            pitched_tracks += 1;
            (channel, pitched_notes(doc, track, step_seconds, config))
        };
        debug!(
            track = %track.name,
            channel,
            notes = notes.len(),
            "encoded track"
        );
        smf.tracks
            .push(note_track(&track.name, channel, &notes, &to_ticks));
    }

    let mut buf = Vec::new();
    smf.write(&mut buf)
        .map_err(|err| MidiError::Write(err.to_string()))?;
    debug!(bytes = buf.len(), tempo, "midi file written");
    Ok(buf)
}

/// Seconds → ticks at a constant tempo.
pub(crate) fn seconds_to_ticks(seconds: f64, tempo: f64, ppq: u16) -> u32 {
    (seconds * tempo / 60.0 * f64::from(ppq)).round().max(0.0) as u32
}

/// Channels for pitched tracks, skipping the drum channel.
fn melodic_channel(index: usize) -> u8 {
    let channel = (index % 15) as u8;
    if channel >= PERCUSSION_CHANNEL {
        channel + 1
    } else {
        channel
    }
}

fn percussion_notes(track: &StepTrack, step_seconds: f64, config: &MidiConfig) -> Vec<TimedNote> {
    let key = drum_key(&track.name);
    track
        .steps
        .chars()
        .enumerate()
        .filter_map(|(i, symbol)| {
            let velocity = match symbol {
                'X' => config.accent_velocity,
                'x' => config.ghost_velocity,
                _ => return None,
            };
            Some(TimedNote {
                key,
                velocity: velocity_to_byte(velocity),
                start_seconds: i as f64 * step_seconds,
                duration_seconds: config.drum_hit_seconds,
            })
        })
        .collect()
}

fn pitched_notes(
    doc: &Document,
    track: &StepTrack,
    step_seconds: f64,
    config: &MidiConfig,
) -> Vec<TimedNote> {
    let sound = doc.sound(&track.name);
    let velocity = velocity_to_byte(config.pitched_velocity);
    let mut notes = Vec::new();

    for position in 0..track.len() {
        let Some(token) = resolve_step_token(&track.steps, position, sound).token else {
            continue;
        };
        for member in chord_members(token) {
            let Some(key) = note_to_midi(member) else {
                debug!(track = %track.name, member, "unresolved note dropped");
                continue;
            };
            notes.push(TimedNote {
                key,
                velocity,
                start_seconds: position as f64 * step_seconds,
                duration_seconds: step_seconds,
            });
        }
    }
    notes
}

fn tempo_track(tempo: f64) -> Track<'static> {
    let micros = (60_000_000.0 / tempo).round().clamp(1.0, f64::from(0xFF_FFFF_u32)) as u32;
    vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(micros))),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ]
}

fn note_track<'a>(
    name: &'a str,
    channel: u8,
    notes: &[TimedNote],
    to_ticks: &impl Fn(f64) -> u32,
) -> Track<'a> {
    let channel = u4::new(channel);

    // (tick, order, message): offs sort before ons on the same tick
    let mut timeline: Vec<(u32, u8, MidiMessage)> = Vec::with_capacity(notes.len() * 2);
    for note in notes {
        let start = to_ticks(note.start_seconds);
        let end = to_ticks(note.start_seconds + note.duration_seconds).max(start + 1);
        let key = u7::new(note.key.min(127));
        timeline.push((
            start,
            1,
            MidiMessage::NoteOn {
                key,
                vel: u7::new(note.velocity.min(127)),
            },
        ));
        timeline.push((end, 0, MidiMessage::NoteOff { key, vel: u7::new(0) }));
    }
    timeline.sort_by_key(|(tick, order, _)| (*tick, *order));

    let mut track = vec![TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes())),
    }];
    let mut last_tick = 0;
    for (tick, _, message) in timeline {
        track.push(TrackEvent {
            delta: u28::new((tick - last_tick).min(0x0FFF_FFFF)),
            kind: TrackEventKind::Midi { channel, message },
        });
        last_tick = tick;
    }
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    track
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::Compiler;

    fn note_events(bytes: &[u8], track: usize) -> Vec<(u32, u8, MidiMessage)> {
        let smf = Smf::parse(bytes).unwrap();
        let mut tick = 0;
        let mut out = Vec::new();
        for event in &smf.tracks[track] {
            tick += event.delta.as_int();
            if let TrackEventKind::Midi { channel, message } = event.kind {
                out.push((tick, channel.as_int(), message));
            }
        }
        out
    }

    #[test]
    fn empty_document_is_an_error() {
        let doc = Compiler::compile("---\ntempo: 100\n---\n");
        assert_eq!(encode(&doc), Err(MidiError::EmptyDocument));
    }

    #[test]
    fn kick_maps_to_gm_key_on_drum_channel() {
        let doc = Compiler::compile("# P\nKick: X...\n");
        let bytes = encode(&doc).unwrap();
        let events = note_events(&bytes, 1);
        assert_eq!(
            events,
            vec![
                (
                    0,
                    9,
                    MidiMessage::NoteOn {
                        key: u7::new(36),
                        vel: u7::new(127)
                    }
                ),
                (
                    96,
                    9,
                    MidiMessage::NoteOff {
                        key: u7::new(36),
                        vel: u7::new(0)
                    }
                ),
            ]
        );
    }

    #[test]
    fn header_is_format_one_with_tempo_track() {
        let doc = Compiler::compile("---\ntempo: 100\n---\n# P\nKick: X\nSnare: .x\n");
        let bytes = encode(&doc).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.header.format, Format::Parallel);
        assert_eq!(smf.header.timing, Timing::Metrical(u15::new(480)));
        assert_eq!(smf.tracks.len(), 3);
        assert!(smf.tracks[0]
            .iter()
            .any(|e| e.kind == TrackEventKind::Meta(MetaMessage::Tempo(u24::new(600_000)))));
    }

    #[test]
    fn ghost_hits_use_lower_velocity() {
        let doc = Compiler::compile("# P\nSnare: .x\n");
        let events = note_events(&encode(&doc).unwrap(), 1);
        assert_eq!(
            events[0],
            (
                120,
                9,
                MidiMessage::NoteOn {
                    key: u7::new(38),
                    vel: u7::new(76)
                }
            )
        );
    }

    #[test]
    fn chords_emit_one_note_per_member() {
        let src = "# P\nKeys: 1\n# Sounds\nKeys:\n  notes:\n    1: c2-e2-g2\n";
        let events = note_events(&encode(&Compiler::compile(src)).unwrap(), 1);
        let ons: Vec<u8> = events
            .iter()
            .filter_map(|(_, _, m)| match m {
                MidiMessage::NoteOn { key, .. } => Some(key.as_int()),
                _ => None,
            })
            .collect();
        assert_eq!(ons, vec![36, 40, 43]);
        // full step at 120 BPM = 0.125 s = 120 ticks
        assert!(events
            .iter()
            .all(|(tick, ch, m)| *ch == 0
                && match m {
                    MidiMessage::NoteOff { .. } => *tick == 120,
                    _ => *tick == 0,
                }));
    }

    #[test]
    fn unresolved_chord_members_are_dropped() {
        let src = "# P\nKeys: 1\n# Sounds\nKeys:\n  notes:\n    1: c4-zz-e4\n";
        let events = note_events(&encode(&Compiler::compile(src)).unwrap(), 1);
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn out_of_range_octave_exports_without_notes() {
        let src = "# P\nLead: c999999999\n# Sounds\nLead:\n  type: synth\n";
        let events = note_events(&encode(&Compiler::compile(src)).unwrap(), 1);
        assert!(events.is_empty());
    }

    #[test]
    fn pitched_channels_skip_drum_channel() {
        let channels: Vec<u8> = (0..16).map(melodic_channel).collect();
        assert!(!channels.contains(&PERCUSSION_CHANNEL));
        assert_eq!(channels[9], 10);
    }

    #[test]
    fn invalid_tempo_falls_back_to_default() {
        let doc = Compiler::compile("---\ntempo: fast\n---\n# P\nKick: X\n");
        let smf_bytes = encode(&doc).unwrap();
        let smf = Smf::parse(&smf_bytes).unwrap();
        assert!(smf.tracks[0]
            .iter()
            .any(|e| e.kind == TrackEventKind::Meta(MetaMessage::Tempo(u24::new(500_000)))));
    }

    #[test]
    fn ticks_scale_with_tempo() {
        assert_eq!(seconds_to_ticks(0.5, 120.0, 480), 480);
        assert_eq!(seconds_to_ticks(0.1, 120.0, 480), 96);
        assert_eq!(seconds_to_ticks(1.0, 60.0, 96), 96);
    }
}
