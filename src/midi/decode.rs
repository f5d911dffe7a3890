//! Standard MIDI File → Document.
//!
//! Notes are quantized to the sixteenth-note grid at the file's first tempo.
//! Drum-channel tracks split into one step track per key; other tracks keep
//! their name and write lower-case note names into their steps.

use std::collections::{BTreeMap, HashMap, VecDeque};

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use tracing::{debug, warn};

use crate::dsl::document::{Document, MetaValue, Pattern, Track, DEFAULT_TEMPO};
use crate::dsl::note::midi_to_note_name;
use crate::dsl::serialize::to_text;

use super::config::MidiConfig;
use super::gm::{drum_track_name, PERCUSSION_CHANNEL};
use super::MidiError;

/// Title given to every imported document.
pub const IMPORTED_TITLE: &str = "Imported MIDI";

/// Name of the single pattern an import produces.
pub const IMPORTED_PATTERN: &str = "Pattern";

const BAR_STEPS: usize = 16;

/// Longest pattern an import produces; notes starting later are dropped.
pub const MAX_IMPORT_BARS: usize = 256;

/// One note as read from a track, in ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RawNote {
    key: u8,
    velocity: u8,
    start: u64,
    end: u64,
}

#[derive(Debug, Default)]
struct RawTrack {
    name: Option<String>,
    channel: Option<u8>,
    notes: Vec<RawNote>,
}

/// Decode with the default configuration.
pub fn decode(bytes: &[u8]) -> Result<Document, MidiError> {
    decode_with(bytes, &MidiConfig::default())
}

/// Decode straight to pattern text.
pub fn decode_to_text(bytes: &[u8]) -> Result<String, MidiError> {
    decode(bytes).map(|doc| to_text(&doc))
}

/// Decode a Standard MIDI File into a single-pattern document.
///
/// Only bytes that are not a MIDI file at all are an error. A missing tempo
/// falls back to 120 BPM; a file without notes yields a document with no
/// patterns.
pub fn decode_with(bytes: &[u8], config: &MidiConfig) -> Result<Document, MidiError> {
    let smf = Smf::parse(bytes).map_err(|err| MidiError::Parse(err.to_string()))?;

    let file_tempo = first_tempo(&smf.tracks).unwrap_or(DEFAULT_TEMPO);
    let tempo = file_tempo.round().max(1.0);
    let ticks_per_second = ticks_per_second(smf.header.timing, file_tempo);
    let step_seconds = Document::step_seconds(tempo);

    let tracks: Vec<RawTrack> = smf.tracks.iter().map(|t| read_track(t)).collect();

    let max_seconds = tracks
        .iter()
        .flat_map(|t| &t.notes)
        .map(|n| n.end as f64 / ticks_per_second)
        .fold(0.0_f64, f64::max);
    let num_steps = (max_seconds / step_seconds - 1e-9).ceil().max(0.0) as usize;
    let bars = num_steps.div_ceil(BAR_STEPS);
    if bars > MAX_IMPORT_BARS {
        warn!(
            bars,
            max = MAX_IMPORT_BARS,
            "midi file longer than the import limit; truncating"
        );
    }
    let length = bars.clamp(1, MAX_IMPORT_BARS) * BAR_STEPS;

    let step_of = |tick: u64| -> Option<usize> {
        let step = (tick as f64 / ticks_per_second / step_seconds).round() as usize;
        (step < length).then_some(step)
    };

    let mut pattern = Pattern::new(IMPORTED_PATTERN);
    for (index, track) in tracks.iter().enumerate() {
        if track.notes.is_empty() {
            continue;
        }
        if track.channel == Some(PERCUSSION_CHANNEL) {
            pattern
                .tracks
                .extend(drum_tracks(track, length, config, &step_of));
        } else {
            pattern
                .tracks
                .push(pitched_track(track, index, length, &step_of));
        }
    }

    let mut doc = Document::default();
    doc.metadata
        .insert("title", MetaValue::Text(IMPORTED_TITLE.to_string()));
    doc.metadata.insert("tempo", MetaValue::Number(tempo));
    debug!(
        tempo,
        tracks = pattern.tracks.len(),
        steps = length,
        "midi file decoded"
    );
    if !pattern.tracks.is_empty() {
        doc.patterns.push(pattern);
    }
    Ok(doc)
}

/// BPM of the earliest tempo event across all tracks.
fn first_tempo(tracks: &[Vec<TrackEvent<'_>>]) -> Option<f64> {
    let mut first: Option<(u64, u32)> = None;
    for track in tracks {
        let mut tick = 0u64;
        for event in track {
            tick += u64::from(event.delta.as_int());
            if let TrackEventKind::Meta(MetaMessage::Tempo(micros)) = event.kind {
                if first.map_or(true, |(at, _)| tick < at) {
                    first = Some((tick, micros.as_int()));
                }
                break;
            }
        }
    }
    first
        .map(|(_, micros)| micros)
        .filter(|micros| *micros > 0)
        .map(|micros| 60_000_000.0 / f64::from(micros))
}

fn ticks_per_second(timing: Timing, bpm: f64) -> f64 {
    match timing {
        Timing::Metrical(ppq) => f64::from(ppq.as_int().max(1)) * bpm / 60.0,
        Timing::Timecode(fps, subframes) => {
            f64::from(fps.as_f32()) * f64::from(subframes.max(1))
        }
    }
}

fn read_track(events: &[TrackEvent<'_>]) -> RawTrack {
    let mut track = RawTrack::default();
    let mut open: HashMap<u8, VecDeque<(u64, u8)>> = HashMap::new();
    let mut tick = 0u64;

    for event in events {
        tick += u64::from(event.delta.as_int());
        match event.kind {
            TrackEventKind::Meta(MetaMessage::TrackName(raw)) if track.name.is_none() => {
                let name = String::from_utf8_lossy(raw).trim().to_string();
                if !name.is_empty() {
                    track.name = Some(name);
                }
            }
            TrackEventKind::Midi { channel, message } => {
                track.channel.get_or_insert(channel.as_int());
                match message {
                    MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                        open.entry(key.as_int())
                            .or_default()
                            .push_back((tick, vel.as_int()));
                    }
                    MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                        let key = key.as_int();
                        if let Some((start, velocity)) =
                            open.get_mut(&key).and_then(VecDeque::pop_front)
                        {
                            track.notes.push(RawNote {
                                key,
                                velocity,
                                start,
                                end: tick,
                            });
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    // notes still sounding end with the track
    for (key, starts) in open {
        for (start, velocity) in starts {
            track.notes.push(RawNote {
                key,
                velocity,
                start,
                end: tick,
            });
        }
    }
    track.notes.sort_by_key(|n| (n.start, n.key));
    track
}

fn drum_tracks(
    track: &RawTrack,
    length: usize,
    config: &MidiConfig,
    step_of: &impl Fn(u64) -> Option<usize>,
) -> Vec<Track> {
    let mut by_key: BTreeMap<u8, Vec<char>> = BTreeMap::new();
    for note in &track.notes {
        let slots = by_key
            .entry(note.key)
            .or_insert_with(|| vec!['.'; length]);
        if let Some(step) = step_of(note.start) {
            let accent = f64::from(note.velocity) / 127.0 > config.accent_threshold;
            slots[step] = if accent { 'X' } else { 'x' };
        }
    }
    by_key
        .into_iter()
        .map(|(key, slots)| Track::new(drum_track_name(key), slots.into_iter().collect::<String>()))
        .collect()
}

fn pitched_track(
    track: &RawTrack,
    index: usize,
    length: usize,
    step_of: &impl Fn(u64) -> Option<usize>,
) -> Track {
    let name = track
        .name
        .clone()
        .filter(|name| !name.contains(':'))
        .unwrap_or_else(|| format!("Track{}", index + 1));

    let mut slots: Vec<String> = vec![".".to_string(); length];
    for note in &track.notes {
        if let Some(step) = step_of(note.start) {
            slots[step] = midi_to_note_name(note.key);
        }
    }
    Track::new(name, slots.concat())
}
