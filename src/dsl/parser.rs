//! Line-oriented parser for pattern text.
//!
//! Single pass, one line of state: front matter between `---` lines, a
//! `# Sounds` block of indented sound properties, and `# Name` pattern
//! headings followed by `Name: steps` track lines. Anything that does not fit
//! is dropped and recorded as a [`ParseAnomaly`].

use tracing::debug;

use super::document::{Document, MetaValue, Pattern, Track};
use super::error::{AnomalyKind, ParseAnomaly};
use super::sound::SoundBuilder;

const FRONT_MATTER_FENCE: &str = "---";
const SOUNDS_HEADING: &str = "# Sounds";
const HEADING_PREFIX: &str = "# ";
const PROPERTY_INDENT: &str = "  ";

pub struct Parser<'a> {
    source: &'a str,
    doc: Document,
    anomalies: Vec<ParseAnomaly>,
    in_front_matter: bool,
    in_sounds: bool,
    sound: Option<(String, SoundBuilder)>,
    pattern: Option<(Pattern, usize)>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            doc: Document::default(),
            anomalies: Vec::new(),
            in_front_matter: false,
            in_sounds: false,
            sound: None,
            pattern: None,
        }
    }

    pub fn parse(mut self) -> (Document, Vec<ParseAnomaly>) {
        for (idx, line) in self.source.lines().enumerate() {
            self.line(line, idx + 1);
        }
        self.finish_sound();
        self.finish_pattern();
        (self.doc, self.anomalies)
    }

    fn line(&mut self, line: &str, number: usize) {
        if line == FRONT_MATTER_FENCE {
            self.in_front_matter = !self.in_front_matter;
            return;
        }

        if self.in_front_matter {
            self.metadata_line(line, number);
        } else if line.starts_with(SOUNDS_HEADING) {
            self.finish_sound();
            self.in_sounds = true;
        } else if let Some(name) = line.strip_prefix(HEADING_PREFIX) {
            self.finish_sound();
            self.in_sounds = false;
            self.finish_pattern();
            self.pattern = Some((Pattern::new(name.trim()), number));
        } else if self.in_sounds {
            self.sound_line(line, number);
        } else if self.pattern.is_some() {
            self.track_line(line, number);
        } else if !line.trim().is_empty() {
            self.anomaly(AnomalyKind::Stray, "text outside any section", number);
        }
    }

    fn metadata_line(&mut self, line: &str, number: usize) {
        if line.trim().is_empty() {
            return;
        }
        let Some((key, value)) = split_pair(line) else {
            self.anomaly(AnomalyKind::Metadata, "expected `key: value`", number);
            return;
        };

        // integers only: decimals truncate toward zero
        let value = value.replace('"', "");
        let parsed = match value.parse::<i64>() {
            Ok(n) => MetaValue::Number(n as f64),
            Err(_) => match value.parse::<f64>() {
                Ok(n) if n.is_finite() => MetaValue::Number(n.trunc()),
                _ => MetaValue::Text(value),
            },
        };
        self.doc.metadata.insert(key, parsed);
    }

    fn sound_line(&mut self, line: &str, number: usize) {
        if let Some(name) = sound_header(line) {
            self.finish_sound();
            self.sound = Some((name.to_string(), SoundBuilder::new()));
            return;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }

        let Some((_, builder)) = self.sound.as_mut() else {
            self.anomaly(AnomalyKind::SoundLine, "property outside a sound", number);
            return;
        };
        if !line.starts_with(PROPERTY_INDENT) {
            self.anomaly(AnomalyKind::SoundLine, "expected `Name:` or an indented property", number);
            return;
        }

        if trimmed == "notes:" {
            builder.open_notes();
            return;
        }

        match split_pair(trimmed) {
            Some((key, token)) if builder.has_notes() && is_note_key(key) => {
                builder.note(key, token);
            }
            Some((key, value)) => builder.property(key, value, number),
            None => self.anomaly(AnomalyKind::SoundLine, "expected `key: value`", number),
        }
    }

    fn track_line(&mut self, line: &str, number: usize) {
        if line.trim().is_empty() {
            return;
        }
        let Some((name, steps)) = split_pair(line) else {
            self.anomaly(AnomalyKind::TrackLine, "expected `Name: steps`", number);
            return;
        };
        if let Some((pattern, _)) = self.pattern.as_mut() {
            pattern.tracks.push(Track::new(name, steps));
        }
    }

    fn finish_sound(&mut self) {
        let Some((name, builder)) = self.sound.take() else {
            return;
        };
        let (definition, rejected) = builder.build();
        for (line, key) in rejected {
            self.anomaly(
                AnomalyKind::SoundProperty,
                format!("`{key}` ignored for {name}"),
                line,
            );
        }
        self.doc.sounds.insert(name, definition);
    }

    fn finish_pattern(&mut self) {
        let Some((pattern, line)) = self.pattern.take() else {
            return;
        };
        if pattern.tracks.is_empty() {
            self.anomaly(
                AnomalyKind::EmptyPattern,
                format!("pattern `{}` has no tracks", pattern.name),
                line,
            );
        } else {
            self.doc.patterns.push(pattern);
        }
    }

    fn anomaly(&mut self, kind: AnomalyKind, message: impl Into<String>, line: usize) {
        let anomaly = ParseAnomaly::new(kind, message, line);
        debug!(%anomaly, "line dropped");
        self.anomalies.push(anomaly);
    }
}

/// Split on the first `:` and trim both halves; `None` if either is empty.
fn split_pair(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        None
    } else {
        Some((key, value))
    }
}

/// `Name:` at column 0 with a word-character name.
fn sound_header(line: &str) -> Option<&str> {
    let name = line.strip_suffix(':')?;
    let is_word = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    is_word.then_some(name)
}

fn is_note_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_digit())
}
