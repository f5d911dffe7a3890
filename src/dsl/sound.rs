//! Sound definitions: the two instrument shapes a `# Sounds` block can
//! describe, with their recognised properties and defaults.

use std::collections::BTreeMap;

use serde::Serialize;

/// Percussion parameter defaults.
pub mod percussion_defaults {
    use super::FilterType;

    pub const PITCH: f64 = 150.0;
    pub const PITCH_DECAY: f64 = 0.5;
    pub const TONE: f64 = 200.0;
    pub const TONE_DECAY: f64 = 0.1;
    pub const FILTER_TYPE: FilterType = FilterType::Highpass;
    pub const FILTER_CUTOFF: f64 = 1000.0;
    pub const FILTER_Q: f64 = 1.0;
    pub const DECAY: f64 = 0.2;
    pub const NOISE_MIX: f64 = 0.5;
    pub const BURST_COUNT: f64 = 3.0;
    pub const BURST_SPACING: f64 = 0.01;
    pub const VOLUME: f64 = 0.8;
}

/// Synth parameter defaults.
pub mod synth_defaults {
    use super::{FilterType, Waveform};

    pub const WAVEFORM: Waveform = Waveform::Sawtooth;
    pub const FILTER: FilterType = FilterType::Lowpass;
    pub const CUTOFF: f64 = 1000.0;
    pub const RESONANCE: f64 = 1.0;
    pub const ATTACK: f64 = 0.01;
    pub const DECAY: f64 = 0.1;
    pub const SUSTAIN: f64 = 0.7;
    pub const RELEASE: f64 = 0.1;
    pub const VOLUME: f64 = 0.3;
    pub const DELAY: f64 = 0.0;
    pub const DELAY_FEEDBACK: f64 = 0.3;
    pub const DELAY_MIX: f64 = 0.5;
}

/// Filter response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Lowpass,
    Highpass,
    Bandpass,
}

impl FilterType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "lowpass" => Some(Self::Lowpass),
            "highpass" => Some(Self::Highpass),
            "bandpass" => Some(Self::Bandpass),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lowpass => "lowpass",
            Self::Highpass => "highpass",
            Self::Bandpass => "bandpass",
        }
    }
}

/// Oscillator waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sine" => Some(Self::Sine),
            "square" => Some(Self::Square),
            "sawtooth" => Some(Self::Sawtooth),
            "triangle" => Some(Self::Triangle),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sine => "sine",
            Self::Square => "square",
            Self::Sawtooth => "sawtooth",
            Self::Triangle => "triangle",
        }
    }
}

/// The built-in drum set, looked up by track name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrumKind {
    Kick,
    Snare,
    HiHat,
    OpenHH,
    Clap,
}

impl DrumKind {
    pub const ALL: [DrumKind; 5] = [
        DrumKind::Kick,
        DrumKind::Snare,
        DrumKind::HiHat,
        DrumKind::OpenHH,
        DrumKind::Clap,
    ];

    /// Exact, case-sensitive match on the track name.
    pub fn from_track_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Kick => "Kick",
            Self::Snare => "Snare",
            Self::HiHat => "HiHat",
            Self::OpenHH => "OpenHH",
            Self::Clap => "Clap",
        }
    }
}

/// Which shape a sound was declared as via its `type:` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundKind {
    Percussion,
    Synth,
}

impl SoundKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "drum" | "percussion" => Some(Self::Percussion),
            "synth" => Some(Self::Synth),
            _ => None,
        }
    }
}

/// A raw property value as written in the source: a clean float, else text.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Number(f64),
    Text(String),
}

impl PropertyValue {
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Number(n),
            _ => Self::Text(raw.to_string()),
        }
    }

    fn number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    fn text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }
}

/// Parameters for a synthesised drum voice. Unset fields fall back to
/// [`percussion_defaults`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PercussionSound {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch_decay: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone_decay: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_type: Option<FilterType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_cutoff: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_q: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decay: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise_mix: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burst_count: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burst_spacing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl PercussionSound {
    /// Apply one property line. Returns `false` when the key is not a
    /// percussion property or the value has the wrong kind.
    pub fn set(&mut self, key: &str, value: &PropertyValue) -> bool {
        if key == "filterType" {
            return match value.text().and_then(FilterType::parse) {
                Some(f) => {
                    self.filter_type = Some(f);
                    true
                }
                None => false,
            };
        }

        let slot = match key {
            "pitch" => &mut self.pitch,
            "pitchDecay" => &mut self.pitch_decay,
            "tone" => &mut self.tone,
            "toneDecay" => &mut self.tone_decay,
            "filterCutoff" => &mut self.filter_cutoff,
            "filterQ" => &mut self.filter_q,
            "decay" => &mut self.decay,
            "noiseMix" => &mut self.noise_mix,
            "burstCount" => &mut self.burst_count,
            "burstSpacing" => &mut self.burst_spacing,
            "volume" => &mut self.volume,
            _ => return false,
        };
        match value.number() {
            Some(n) => {
                *slot = Some(n);
                true
            }
            None => false,
        }
    }

    /// Explicitly set properties in source notation, in canonical order.
    pub fn properties(&self) -> Vec<(&'static str, String)> {
        let numbers = [
            ("pitch", self.pitch),
            ("pitchDecay", self.pitch_decay),
            ("tone", self.tone),
            ("toneDecay", self.tone_decay),
        ];
        let rest = [
            ("filterCutoff", self.filter_cutoff),
            ("filterQ", self.filter_q),
            ("decay", self.decay),
            ("noiseMix", self.noise_mix),
            ("burstCount", self.burst_count),
            ("burstSpacing", self.burst_spacing),
            ("volume", self.volume),
        ];

        let mut out: Vec<_> = numbers
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k, v.to_string())))
            .collect();
        if let Some(f) = self.filter_type {
            out.push(("filterType", f.as_str().to_string()));
        }
        out.extend(
            rest.into_iter()
                .filter_map(|(k, v)| v.map(|v| (k, v.to_string()))),
        );
        out
    }

    pub fn pitch(&self) -> f64 {
        self.pitch.unwrap_or(percussion_defaults::PITCH)
    }

    pub fn pitch_decay(&self) -> f64 {
        self.pitch_decay.unwrap_or(percussion_defaults::PITCH_DECAY)
    }

    pub fn tone(&self) -> f64 {
        self.tone.unwrap_or(percussion_defaults::TONE)
    }

    pub fn tone_decay(&self) -> f64 {
        self.tone_decay.unwrap_or(percussion_defaults::TONE_DECAY)
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type.unwrap_or(percussion_defaults::FILTER_TYPE)
    }

    pub fn filter_cutoff(&self) -> f64 {
        self.filter_cutoff
            .unwrap_or(percussion_defaults::FILTER_CUTOFF)
    }

    pub fn filter_q(&self) -> f64 {
        self.filter_q.unwrap_or(percussion_defaults::FILTER_Q)
    }

    pub fn decay(&self) -> f64 {
        self.decay.unwrap_or(percussion_defaults::DECAY)
    }

    /// Noise/tone balance, clamped to 0–1.
    pub fn noise_mix(&self) -> f64 {
        self.noise_mix
            .unwrap_or(percussion_defaults::NOISE_MIX)
            .clamp(0.0, 1.0)
    }

    pub fn burst_count(&self) -> u32 {
        self.burst_count
            .unwrap_or(percussion_defaults::BURST_COUNT)
            .max(0.0)
            .round() as u32
    }

    pub fn burst_spacing(&self) -> f64 {
        self.burst_spacing
            .unwrap_or(percussion_defaults::BURST_SPACING)
    }

    /// Output level, clamped to 0–1.
    pub fn volume(&self) -> f64 {
        self.volume
            .unwrap_or(percussion_defaults::VOLUME)
            .clamp(0.0, 1.0)
    }
}

/// Parameters for a subtractive synth voice. Unset fields fall back to
/// [`synth_defaults`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthSound {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waveform: Option<Waveform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cutoff: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resonance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attack: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decay: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sustain: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_feedback: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_mix: Option<f64>,
    /// Digit key ("1".."9") → note or chord token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<BTreeMap<String, String>>,
}

impl SynthSound {
    /// Apply one property line. Returns `false` when the key is not a synth
    /// property or the value has the wrong kind.
    pub fn set(&mut self, key: &str, value: &PropertyValue) -> bool {
        match key {
            "waveform" => {
                return match value.text().and_then(Waveform::parse) {
                    Some(w) => {
                        self.waveform = Some(w);
                        true
                    }
                    None => false,
                };
            }
            "filter" => {
                return match value.text().and_then(FilterType::parse) {
                    Some(f) => {
                        self.filter = Some(f);
                        true
                    }
                    None => false,
                };
            }
            _ => {}
        }

        let slot = match key {
            "cutoff" => &mut self.cutoff,
            "resonance" => &mut self.resonance,
            "attack" => &mut self.attack,
            "decay" => &mut self.decay,
            "sustain" => &mut self.sustain,
            "release" => &mut self.release,
            "volume" => &mut self.volume,
            "delay" => &mut self.delay,
            "delayFeedback" => &mut self.delay_feedback,
            "delayMix" => &mut self.delay_mix,
            _ => return false,
        };
        match value.number() {
            Some(n) => {
                *slot = Some(n);
                true
            }
            None => false,
        }
    }

    /// Explicitly set properties (excluding `notes`) in source notation.
    pub fn properties(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        if let Some(w) = self.waveform {
            out.push(("waveform", w.as_str().to_string()));
        }
        if let Some(f) = self.filter {
            out.push(("filter", f.as_str().to_string()));
        }
        let numbers = [
            ("cutoff", self.cutoff),
            ("resonance", self.resonance),
            ("attack", self.attack),
            ("decay", self.decay),
            ("sustain", self.sustain),
            ("release", self.release),
            ("volume", self.volume),
            ("delay", self.delay),
            ("delayFeedback", self.delay_feedback),
            ("delayMix", self.delay_mix),
        ];
        out.extend(
            numbers
                .into_iter()
                .filter_map(|(k, v)| v.map(|v| (k, v.to_string()))),
        );
        out
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform.unwrap_or(synth_defaults::WAVEFORM)
    }

    pub fn filter(&self) -> FilterType {
        self.filter.unwrap_or(synth_defaults::FILTER)
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff.unwrap_or(synth_defaults::CUTOFF)
    }

    pub fn resonance(&self) -> f64 {
        self.resonance.unwrap_or(synth_defaults::RESONANCE)
    }

    pub fn attack(&self) -> f64 {
        self.attack.unwrap_or(synth_defaults::ATTACK)
    }

    pub fn decay(&self) -> f64 {
        self.decay.unwrap_or(synth_defaults::DECAY)
    }

    /// Sustain level, clamped to 0–1.
    pub fn sustain(&self) -> f64 {
        self.sustain
            .unwrap_or(synth_defaults::SUSTAIN)
            .clamp(0.0, 1.0)
    }

    pub fn release(&self) -> f64 {
        self.release.unwrap_or(synth_defaults::RELEASE)
    }

    pub fn volume(&self) -> f64 {
        self.volume
            .unwrap_or(synth_defaults::VOLUME)
            .clamp(0.0, 1.0)
    }

    pub fn delay(&self) -> f64 {
        self.delay.unwrap_or(synth_defaults::DELAY)
    }

    pub fn delay_feedback(&self) -> f64 {
        self.delay_feedback
            .unwrap_or(synth_defaults::DELAY_FEEDBACK)
    }

    pub fn delay_mix(&self) -> f64 {
        self.delay_mix.unwrap_or(synth_defaults::DELAY_MIX)
    }
}

/// A named instrument from the `# Sounds` block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SoundDefinition {
    Percussion(PercussionSound),
    Synth(SynthSound),
}

impl SoundDefinition {
    pub fn kind(&self) -> SoundKind {
        match self {
            Self::Percussion(_) => SoundKind::Percussion,
            Self::Synth(_) => SoundKind::Synth,
        }
    }

    pub fn is_percussion(&self) -> bool {
        matches!(self, Self::Percussion(_))
    }

    /// The note map of a synth sound.
    pub fn notes(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Synth(s) => s.notes.as_ref(),
            Self::Percussion(_) => None,
        }
    }

    pub fn as_synth(&self) -> Option<&SynthSound> {
        match self {
            Self::Synth(s) => Some(s),
            Self::Percussion(_) => None,
        }
    }

    pub fn as_percussion(&self) -> Option<&PercussionSound> {
        match self {
            Self::Percussion(p) => Some(p),
            Self::Synth(_) => None,
        }
    }
}

/// Property lines collected for one sound before its shape is known.
///
/// The shape can only be decided once the whole block has been read: a
/// `type:` line or a `notes:` section may appear anywhere in it.
#[derive(Debug, Clone, Default)]
pub struct SoundBuilder {
    kind: Option<SoundKind>,
    properties: Vec<(String, PropertyValue, usize)>,
    notes: Option<BTreeMap<String, String>>,
}

impl SoundBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a `key: value` property seen on `line`.
    pub fn property(&mut self, key: &str, raw: &str, line: usize) {
        if key == "type" {
            self.kind = SoundKind::parse(raw);
            return;
        }
        self.properties
            .push((key.to_string(), PropertyValue::parse(raw), line));
    }

    /// Open (or reopen) the note map.
    pub fn open_notes(&mut self) {
        self.notes.get_or_insert_with(BTreeMap::new);
    }

    pub fn has_notes(&self) -> bool {
        self.notes.is_some()
    }

    /// Record `key → token` in the note map. Ignored before `notes:`.
    pub fn note(&mut self, key: &str, token: &str) {
        if let Some(notes) = self.notes.as_mut() {
            notes.insert(key.to_string(), token.to_string());
        }
    }

    /// Decide the shape and apply every property to it.
    ///
    /// Returns the definition plus `(line, key)` for each property the shape
    /// did not accept.
    pub fn build(self) -> (SoundDefinition, Vec<(usize, String)>) {
        let kind = match (self.kind, self.notes.is_some()) {
            (_, true) => SoundKind::Synth,
            (Some(kind), false) => kind,
            (None, false) => SoundKind::Percussion,
        };

        let mut rejected = Vec::new();
        let definition = match kind {
            SoundKind::Percussion => {
                let mut sound = PercussionSound::default();
                for (key, value, line) in self.properties {
                    if !sound.set(&key, &value) {
                        rejected.push((line, key));
                    }
                }
                SoundDefinition::Percussion(sound)
            }
            SoundKind::Synth => {
                let mut sound = SynthSound {
                    notes: self.notes,
                    ..SynthSound::default()
                };
                for (key, value, line) in self.properties {
                    if !sound.set(&key, &value) {
                        rejected.push((line, key));
                    }
                }
                SoundDefinition::Synth(sound)
            }
        };
        (definition, rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_value_parsing() {
        assert_eq!(PropertyValue::parse("0.5"), PropertyValue::Number(0.5));
        assert_eq!(PropertyValue::parse("800"), PropertyValue::Number(800.0));
        assert_eq!(
            PropertyValue::parse("sawtooth"),
            PropertyValue::Text("sawtooth".into())
        );
        assert_eq!(
            PropertyValue::parse("0.5s"),
            PropertyValue::Text("0.5s".into())
        );
    }

    #[test]
    fn no_marker_no_notes_is_percussion() {
        let mut b = SoundBuilder::new();
        b.property("pitch", "80", 1);
        let (def, rejected) = b.build();
        assert!(def.is_percussion());
        assert!(rejected.is_empty());
        assert_eq!(def.as_percussion().unwrap().pitch(), 80.0);
    }

    #[test]
    fn notes_force_synth() {
        let mut b = SoundBuilder::new();
        b.property("type", "drum", 1);
        b.open_notes();
        b.note("1", "c2");
        let (def, _) = b.build();
        assert_eq!(def.kind(), SoundKind::Synth);
        assert_eq!(def.notes().unwrap().get("1").map(String::as_str), Some("c2"));
    }

    #[test]
    fn type_marker_selects_synth() {
        let mut b = SoundBuilder::new();
        b.property("type", "synth", 1);
        b.property("waveform", "square", 2);
        let (def, rejected) = b.build();
        assert!(rejected.is_empty());
        assert_eq!(def.as_synth().unwrap().waveform(), Waveform::Square);
    }

    #[test]
    fn unknown_and_mistyped_properties_are_rejected() {
        let mut b = SoundBuilder::new();
        b.property("type", "synth", 1);
        b.property("wobble", "3", 2);
        b.property("cutoff", "high", 3);
        b.property("waveform", "noise", 4);
        let (def, rejected) = b.build();
        let synth = def.as_synth().unwrap();
        assert_eq!(synth.cutoff(), synth_defaults::CUTOFF);
        assert_eq!(synth.waveform(), synth_defaults::WAVEFORM);
        let lines: Vec<usize> = rejected.iter().map(|(l, _)| *l).collect();
        assert_eq!(lines, vec![2, 3, 4]);
    }

    #[test]
    fn percussion_defaults_apply() {
        let p = PercussionSound::default();
        assert_eq!(p.pitch(), 150.0);
        assert_eq!(p.filter_type(), FilterType::Highpass);
        assert_eq!(p.burst_count(), 3);
        assert!((p.volume() - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn synth_defaults_apply() {
        let s = SynthSound::default();
        assert_eq!(s.waveform(), Waveform::Sawtooth);
        assert_eq!(s.filter(), FilterType::Lowpass);
        assert!((s.sustain() - 0.7).abs() < f64::EPSILON);
        assert!((s.delay_mix() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn ranges_are_clamped() {
        let p = PercussionSound {
            noise_mix: Some(1.5),
            volume: Some(-0.2),
            ..Default::default()
        };
        assert_eq!(p.noise_mix(), 1.0);
        assert_eq!(p.volume(), 0.0);
    }

    #[test]
    fn properties_list_only_set_values() {
        let mut p = PercussionSound::default();
        assert!(p.set("filterType", &PropertyValue::parse("bandpass")));
        assert!(p.set("decay", &PropertyValue::parse("0.06")));
        assert_eq!(
            p.properties(),
            vec![("filterType", "bandpass".into()), ("decay", "0.06".into())]
        );
    }

    #[test]
    fn drum_kind_lookup_is_exact() {
        assert_eq!(DrumKind::from_track_name("HiHat"), Some(DrumKind::HiHat));
        assert_eq!(DrumKind::from_track_name("hihat"), None);
        assert_eq!(DrumKind::from_track_name("Bass"), None);
    }
}
