//! Pattern generation: hands a prompt and the current text to an external
//! generator and returns pattern text.
//!
//! The generator itself lives outside this crate. [`CommandGenerator`] runs a
//! configured program; anything else can implement [`PatternGenerator`].

pub mod config;

use std::fmt;
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

use tracing::{debug, info};

pub use config::{load_config, GeneratorConfig};

/// Environment variable carrying the user's prompt to the generator program.
pub const PROMPT_ENV: &str = "BEATMARK_PROMPT";

/// Generation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    /// No generator is configured or it is disabled.
    NotConfigured,
    /// The generator failed or could not be reached.
    Service(String),
    /// The generator returned no pattern text.
    EmptyResponse,
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(
                f,
                "no pattern generator configured (set `enabled` and `command` in ~/.beatmark/ai.yaml)"
            ),
            Self::Service(msg) => write!(f, "pattern generator failed: {msg}"),
            Self::EmptyResponse => write!(f, "pattern generator returned nothing"),
        }
    }
}

impl std::error::Error for GenerateError {}

/// Something that writes pattern text from a prompt.
pub trait PatternGenerator {
    /// Produce new pattern text. `current_text` may be empty.
    ///
    /// The result has any surrounding code fence removed.
    fn generate(&self, prompt: &str, current_text: &str) -> Result<String, GenerateError>;
}

/// Strip a surrounding code fence from generator output.
///
/// A ```` ```markdown ```` block wins over a bare ```` ``` ```` block; with
/// neither, the whole text is returned trimmed.
pub fn extract_pattern_text(text: &str) -> String {
    fenced(text, "```markdown\n")
        .or_else(|| fenced(text, "```\n"))
        .unwrap_or(text)
        .trim()
        .to_string()
}

fn fenced<'a>(text: &'a str, open: &str) -> Option<&'a str> {
    let start = text.find(open)? + open.len();
    let len = text[start..].find("\n```")?;
    Some(&text[start..start + len])
}

/// Runs an external program per request.
///
/// The prompt goes in [`PROMPT_ENV`], the current text on stdin; the
/// program's stdout is the response.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from config, failing with [`GenerateError::NotConfigured`] when
    /// generation is disabled or no program is named.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, GenerateError> {
        if !config.is_usable() {
            return Err(GenerateError::NotConfigured);
        }
        Ok(Self::new(config.command.trim(), config.args.clone()))
    }
}

impl PatternGenerator for CommandGenerator {
    fn generate(&self, prompt: &str, current_text: &str) -> Result<String, GenerateError> {
        info!(program = %self.program, "requesting pattern");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env(PROMPT_ENV, prompt)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| GenerateError::Service(format!("cannot run {}: {err}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(current_text.as_bytes()) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::BrokenPipe => {
                    debug!("generator did not read the current text");
                }
                Err(err) => return Err(GenerateError::Service(err.to_string())),
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|err| GenerateError::Service(err.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = match stderr.trim() {
                "" => output.status.to_string(),
                msg => msg.to_string(),
            };
            return Err(GenerateError::Service(detail));
        }

        let text = extract_pattern_text(&String::from_utf8_lossy(&output.stdout));
        if text.is_empty() {
            return Err(GenerateError::EmptyResponse);
        }
        debug!(bytes = text.len(), "pattern received");
        Ok(text)
    }
}
