//! Beatmark CLI: play, convert, inspect and generate step patterns.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use beatmark::dsl::document::DEFAULT_TEMPO;
use beatmark::dsl::{presets, serialize, Compiler, Document, ParseAnomaly};
use beatmark::event::{AudioBackend, Event, FileText, Hit, Player};
use beatmark::generate::{self, CommandGenerator, PatternGenerator};
use beatmark::midi::{self, MidiConfig};

#[derive(Parser)]
#[command(name = "beatmark")]
#[command(about = "Markdown step sequencer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a pattern file, re-reading it on every step
    Play {
        /// Pattern file
        file: PathBuf,

        /// Stop after this many steps (default: until Ctrl-C)
        #[arg(short, long)]
        steps: Option<u32>,
    },

    /// Export the first pattern to a MIDI file
    Export {
        /// Pattern file
        file: PathBuf,

        /// Output MIDI file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Convert a MIDI file to pattern text
    Import {
        /// MIDI file
        file: PathBuf,

        /// Output pattern file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the compiled document as YAML
    Inspect {
        /// Pattern file
        file: PathBuf,
    },

    /// Print a starter pattern
    New {
        /// Preset name
        #[arg(short, long, default_value = "rock")]
        preset: String,

        /// List preset names instead
        #[arg(short, long)]
        list: bool,
    },

    /// Ask the configured generator for a pattern
    Generate {
        /// What to generate
        prompt: String,

        /// Current pattern file passed along as context
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Logs every event instead of rendering audio.
struct LogBackend;

impl AudioBackend for LogBackend {
    fn render(&mut self, event: &Event, start: Duration) {
        match &event.hit {
            Hit::Drum { accent } => info!(
                at = ?start,
                track = %event.track_name,
                accent,
                velocity = event.velocity(),
                "drum"
            ),
            Hit::Pitched {
                frequencies_hz,
                duration_seconds,
            } => info!(
                at = ?start,
                track = %event.track_name,
                ?frequencies_hz,
                duration_seconds,
                velocity = event.velocity(),
                "note"
            ),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Play { file, steps } => play(&file, steps),
        Commands::Export { file, output } => export(&file, &output),
        Commands::Import { file, output } => import(&file, output.as_deref()),
        Commands::Inspect { file } => inspect(&file),
        Commands::New { preset, list } => new_pattern(&preset, list),
        Commands::Generate { prompt, file } => generate_pattern(&prompt, file.as_deref()),
    }
}

fn compile_file(path: &Path) -> Result<Document, Box<dyn Error>> {
    let source = fs::read_to_string(path)?;
    let (doc, anomalies) = Compiler::compile_with_diagnostics(&source);
    report(&anomalies);
    Ok(doc)
}

fn report(anomalies: &[ParseAnomaly]) {
    for anomaly in anomalies {
        warn!(line = anomaly.line, "{}", anomaly);
    }
}

fn play(path: &Path, steps: Option<u32>) -> Result<(), Box<dyn Error>> {
    let doc = compile_file(path)?;
    if doc.patterns.is_empty() {
        warn!(file = %path.display(), "no pattern yet; playing silence until one appears");
    }

    let (stop_tx, stop_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })?;

    let mut player = Player::new(FileText::new(path), LogBackend);
    player.start()?;
    info!(file = %path.display(), "playing; Ctrl-C to stop");

    match steps {
        Some(n) => {
            let step = Document::step_seconds(doc.tempo().unwrap_or(DEFAULT_TEMPO));
            let total = Duration::try_from_secs_f64(step * f64::from(n)).unwrap_or(Duration::MAX);
            let _ = stop_rx.recv_timeout(total);
        }
        None => {
            let _ = stop_rx.recv();
        }
    }

    player.stop();
    Ok(())
}

fn export(path: &Path, output: &Path) -> Result<(), Box<dyn Error>> {
    let doc = compile_file(path)?;
    let config = MidiConfig::load().unwrap_or_default();
    let bytes = midi::encode_with(&doc, &config)?;
    fs::write(output, &bytes)?;
    info!(output = %output.display(), bytes = bytes.len(), "exported");
    Ok(())
}

fn import(path: &Path, output: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let bytes = fs::read(path)?;
    let config = MidiConfig::load().unwrap_or_default();
    let doc = midi::decode_with(&bytes, &config)?;
    let text = serialize::to_text(&doc);
    match output {
        Some(out) => {
            fs::write(out, text)?;
            info!(output = %out.display(), "imported");
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn inspect(path: &Path) -> Result<(), Box<dyn Error>> {
    let source = fs::read_to_string(path)?;
    let (doc, anomalies) = Compiler::compile_with_diagnostics(&source);
    print!("{}", serde_yaml::to_string(&doc)?);
    for anomaly in &anomalies {
        println!("# {anomaly}");
    }
    Ok(())
}

fn new_pattern(preset: &str, list: bool) -> Result<(), Box<dyn Error>> {
    if list {
        for name in presets::names() {
            println!("{name}");
        }
        return Ok(());
    }
    let text = presets::get(preset).ok_or_else(|| format!("unknown preset: {preset}"))?;
    print!("{text}");
    Ok(())
}

fn generate_pattern(prompt: &str, file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let current = match file {
        Some(path) => fs::read_to_string(path)?,
        None => String::new(),
    };
    let config = generate::load_config().unwrap_or_default();
    let generator = CommandGenerator::from_config(&config)?;
    let text = generator.generate(prompt, &current)?;

    let (doc, anomalies) = Compiler::compile_with_diagnostics(&text);
    report(&anomalies);
    if doc.patterns.is_empty() {
        warn!("generated text has no pattern");
    }
    println!("{text}");
    Ok(())
}
