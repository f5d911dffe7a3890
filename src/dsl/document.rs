//! The compiled document model: metadata, sound definitions, and patterns.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::sound::SoundDefinition;

/// Default tempo when the front matter does not set one.
pub const DEFAULT_TEMPO: f64 = 120.0;

/// Default bar count when the front matter does not set one.
pub const DEFAULT_BARS: f64 = 1.0;

/// Steps per beat: the step grid is sixteenth notes.
pub const STEPS_PER_BEAT: f64 = 4.0;

/// A front-matter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Number(f64),
    Text(String),
}

impl MetaValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

/// Ordered front-matter mapping. Keys keep their first-seen position.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    entries: Vec<(String, MetaValue)>,
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            entries: vec![
                ("tempo".to_string(), MetaValue::Number(DEFAULT_TEMPO)),
                ("bars".to_string(), MetaValue::Number(DEFAULT_BARS)),
            ],
        }
    }
}

impl Metadata {
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Set `key`, replacing in place if it already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: MetaValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One instrument line of a pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub name: String,
    pub steps: String,
}

impl Track {
    pub fn new(name: impl Into<String>, steps: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: steps.into(),
        }
    }

    /// Length of the step string in characters.
    pub fn len(&self) -> usize {
        self.steps.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step character at `position`, wrapping modulo the track length.
    pub fn step_at(&self, position: usize) -> Option<char> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        self.steps.chars().nth(position % len)
    }
}

/// A named section of parallel tracks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pattern {
    pub name: String,
    pub tracks: Vec<Track>,
}

impl Pattern {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tracks: Vec::new(),
        }
    }

    /// Length of the longest track, the pattern's loop length.
    pub fn max_steps(&self) -> usize {
        self.tracks.iter().map(Track::len).max().unwrap_or(0)
    }
}

/// A compiled source text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub metadata: Metadata,
    pub sounds: BTreeMap<String, SoundDefinition>,
    pub patterns: Vec<Pattern>,
}

impl Document {
    /// The tempo in BPM, or `None` if the metadata holds a non-numeric or
    /// non-positive value.
    pub fn tempo(&self) -> Option<f64> {
        match self.metadata.get("tempo") {
            None => Some(DEFAULT_TEMPO),
            Some(value) => value.as_number().filter(|t| t.is_finite() && *t > 0.0),
        }
    }

    /// Duration of one sixteenth-note step in seconds at the given tempo.
    pub fn step_seconds(tempo: f64) -> f64 {
        (60.0 / tempo) / STEPS_PER_BEAT
    }

    /// The sound definition a track name refers to.
    pub fn sound(&self, track_name: &str) -> Option<&SoundDefinition> {
        self.sounds.get(track_name)
    }

    /// A track is pitched when it names a synth-shaped sound definition.
    pub fn is_pitched(&self, track_name: &str) -> bool {
        self.sound(track_name)
            .is_some_and(|def| !def.is_percussion())
    }

    pub fn first_pattern(&self) -> Option<&Pattern> {
        self.patterns.first()
    }
}
