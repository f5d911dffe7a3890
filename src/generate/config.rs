//! Generator configuration: loads optional ~/.beatmark/ai.yaml.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Generator configuration loaded from ~/.beatmark/ai.yaml.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GeneratorConfig {
    /// Whether generation is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Program to run for each request.
    #[serde(default)]
    pub command: String,
    /// Arguments passed to the program.
    #[serde(default)]
    pub args: Vec<String>,
}

impl GeneratorConfig {
    /// Enabled and naming a program.
    pub fn is_usable(&self) -> bool {
        self.enabled && !self.command.trim().is_empty()
    }
}

/// Get the generator config file path.
fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".beatmark").join("ai.yaml"))
}

/// Load generator configuration from ~/.beatmark/ai.yaml.
/// Returns None if the file doesn't exist.
pub fn load_config() -> Option<GeneratorConfig> {
    let path = config_path()?;
    let content = std::fs::read_to_string(&path).ok()?;
    serde_yaml::from_str(&content).ok()
}
