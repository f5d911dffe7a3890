//! Document → pattern text.
//!
//! Writes front matter, every pattern, then a `# Sounds` block. Compiling the
//! output yields a structurally equal document.

use std::fmt::Write;

use super::document::{Document, MetaValue};
use super::sound::SoundDefinition;

/// Render a document in source notation.
pub fn to_text(doc: &Document) -> String {
    let mut out = String::new();

    out.push_str("---\n");
    for (key, value) in doc.metadata.iter() {
        match value {
            MetaValue::Number(n) => {
                let _ = writeln!(out, "{key}: {n}");
            }
            MetaValue::Text(s) => {
                let _ = writeln!(out, "{key}: \"{s}\"");
            }
        }
    }
    out.push_str("---\n");

    for pattern in &doc.patterns {
        // `# Sounds…` would reopen the sounds block; the heading name is trimmed
        let pad = if pattern.name.starts_with("Sounds") { "  " } else { " " };
        let _ = writeln!(out, "\n#{pad}{}", pattern.name);
        for track in &pattern.tracks {
            let _ = writeln!(out, "{}: {}", track.name, track.steps);
        }
    }

    if !doc.sounds.is_empty() {
        out.push_str("\n# Sounds\n");
        for (name, sound) in &doc.sounds {
            let _ = writeln!(out, "{name}:");
            write_sound(&mut out, sound);
        }
    }

    out
}

fn write_sound(out: &mut String, sound: &SoundDefinition) {
    match sound {
        SoundDefinition::Percussion(p) => {
            out.push_str("  type: drum\n");
            for (key, value) in p.properties() {
                let _ = writeln!(out, "  {key}: {value}");
            }
        }
        SoundDefinition::Synth(s) => {
            out.push_str("  type: synth\n");
            for (key, value) in s.properties() {
                let _ = writeln!(out, "  {key}: {value}");
            }
            if let Some(notes) = &s.notes {
                out.push_str("  notes:\n");
                for (key, token) in notes {
                    let _ = writeln!(out, "    {key}: {token}");
                }
            }
        }
    }
}
