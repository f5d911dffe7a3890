//! Note name resolution: converts "c2", "Eb4", "f#3" to frequencies and MIDI
//! note numbers, and reads step tokens out of a track's step string.

use super::sound::SoundDefinition;

/// Concert pitch reference: A4.
pub const A4_HZ: f64 = 440.0;

/// Absolute semitone index of A4 (`4 * 12 + 9`).
const A4_SEMITONE: i32 = 57;

const SHARP_NAMES: [&str; 12] = [
    "c", "c#", "d", "d#", "e", "f", "f#", "g", "g#", "a", "a#", "b",
];

/// A note token split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NoteParts {
    semitone: i32,
    octave: i32,
}

impl NoteParts {
    /// Semitones above C0.
    fn absolute(self) -> Option<i32> {
        self.octave.checked_mul(12)?.checked_add(self.semitone)
    }
}

/// Length in bytes of the note token at the start of `text`, if any.
///
/// Format: `<letter a-g><optional # or b><one or more digits>`, letter
/// case-insensitive.
fn note_prefix_len(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let letter = bytes.first()?.to_ascii_lowercase();
    if !(b'a'..=b'g').contains(&letter) {
        return None;
    }

    let mut i = 1;
    if let Some(&b) = bytes.get(i) {
        if b == b'#' || b.to_ascii_lowercase() == b'b' {
            i += 1;
        }
    }

    let digits = bytes[i..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    Some(i + digits)
}

fn parse_parts(token: &str) -> Option<NoteParts> {
    let len = note_prefix_len(token)?;
    if len != token.len() {
        return None;
    }

    let bytes = token.as_bytes();
    let base = match bytes[0].to_ascii_lowercase() {
        b'c' => 0,
        b'd' => 2,
        b'e' => 4,
        b'f' => 5,
        b'g' => 7,
        b'a' => 9,
        b'b' => 11,
        _ => return None,
    };

    let (accidental, digits_start) = match bytes[1] {
        b'#' => (1, 2),
        b if b.to_ascii_lowercase() == b'b' => (-1, 2),
        _ => (0, 1),
    };

    let octave: i32 = token[digits_start..].parse().ok()?;
    Some(NoteParts {
        semitone: base + accidental,
        octave,
    })
}

/// Convert a note token to its frequency in Hz.
///
/// `freq = 440 * 2^((octave * 12 + semitone - 57) / 12)`. Returns `None` for
/// anything that is not exactly a note token, and for octaves so high the
/// frequency is not a finite number.
pub fn note_to_frequency(token: &str) -> Option<f64> {
    let diff = parse_parts(token)?.absolute()?.checked_sub(A4_SEMITONE)?;
    let freq = A4_HZ * 2f64.powf(f64::from(diff) / 12.0);
    freq.is_finite().then_some(freq)
}

/// Convert a note token to a MIDI note number (C4 = 60, A4 = 69).
pub fn note_to_midi(token: &str) -> Option<u8> {
    let midi = parse_parts(token)?.absolute()?.checked_add(12)?;
    if (0..=127).contains(&midi) {
        Some(midi as u8)
    } else {
        None
    }
}

/// Lower-case sharp-spelled name for a MIDI note number, e.g. 61 → "c#4".
pub fn midi_to_note_name(midi: u8) -> String {
    let octave = midi as i32 / 12 - 1;
    format!("{}{}", SHARP_NAMES[midi as usize % 12], octave)
}

/// The token found at one position of a step string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepToken<'a> {
    /// Resolved note or chord token, `None` for rests and unknown symbols.
    pub token: Option<&'a str>,
    /// Number of step characters the token occupies.
    pub len: usize,
}

impl<'a> StepToken<'a> {
    fn rest() -> Self {
        Self {
            token: None,
            len: 1,
        }
    }
}

/// Resolve the step token at character `position` of `steps`.
///
/// - `.` / space / past-the-end → rest
/// - digit `1`–`9` → looked up in the sound's `notes` map
/// - otherwise an inline note like `c#3`, whose `len` covers every character
///   it spans
pub fn resolve_step_token<'a>(
    steps: &'a str,
    position: usize,
    sound: Option<&'a SoundDefinition>,
) -> StepToken<'a> {
    let Some((offset, ch)) = steps.char_indices().nth(position) else {
        return StepToken::rest();
    };

    match ch {
        '.' | ' ' => StepToken::rest(),
        '1'..='9' => {
            let mapped = sound
                .and_then(SoundDefinition::notes)
                .and_then(|notes| notes.get(ch.to_string().as_str()))
                .map(String::as_str);
            StepToken {
                token: mapped,
                len: 1,
            }
        }
        _ => {
            let rest = &steps[offset..];
            match note_prefix_len(rest) {
                Some(len) => StepToken {
                    token: Some(&rest[..len]),
                    len,
                },
                None => StepToken::rest(),
            }
        }
    }
}

/// Split a chord token (`c2-e2-g2`) into its trimmed member tokens.
pub fn chord_members(token: &str) -> impl Iterator<Item = &str> {
    token.split('-').map(str::trim).filter(|m| !m.is_empty())
}

/// Frequencies of every chord member that resolves; the rest are dropped.
pub fn chord_frequencies(token: &str) -> Vec<f64> {
    chord_members(token).filter_map(note_to_frequency).collect()
}
