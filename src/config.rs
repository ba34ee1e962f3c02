use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Per-editor configuration. Built once, passed into [`crate::Editor::new`]
/// by value, and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Maximum number of lines a single background highlight pass colours
    /// before yielding back to the event loop.
    #[serde(default = "default_lines_per_pass")]
    pub lines_per_pass: usize,

    /// Delay in milliseconds between an edit and the background pass it
    /// schedules. Bursts of typing collapse into one pass.
    #[serde(default = "default_pass_delay_ms")]
    pub pass_delay_ms: u64,

    /// Name of the language module to highlight with.
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_lines_per_pass() -> usize {
    10
}

fn default_pass_delay_ms() -> u64 {
    300
}

fn default_language() -> String {
    "javascript".to_string()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            lines_per_pass: default_lines_per_pass(),
            pass_delay_ms: default_pass_delay_ms(),
            language: default_language(),
        }
    }
}

impl EditorConfig {
    /// Parse a configuration from a JSON string, filling missing fields
    /// with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.lines_per_pass, 10);
        assert_eq!(config.pass_delay_ms, 300);
        assert_eq!(config.language, "javascript");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = EditorConfig::from_json(r#"{"language": "xml"}"#).unwrap();
        assert_eq!(config.language, "xml");
        assert_eq!(config.lines_per_pass, 10);
        assert_eq!(config.pass_delay_ms, 300);
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = EditorConfig::default();
        config.lines_per_pass = 25;
        let json = config.to_json().unwrap();
        let back = EditorConfig::from_json(&json).unwrap();
        assert_eq!(back, config);
    }
}
