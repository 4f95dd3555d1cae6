//! Configuration file support for chatview
//!
//! Reads from .chatview/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    /// Viewer page settings
    #[serde(default)]
    pub viewer: ViewerConfig,

    /// Local server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Diagnostic logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the generated viewer page
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ViewerConfig {
    /// Browser tab and sidebar heading
    /// Default: "Chat Archive"
    #[serde(default = "default_page_title")]
    pub page_title: String,

    /// Shown for conversations whose title is empty
    #[serde(default = "default_untitled")]
    pub untitled_placeholder: String,

    /// Render message content as Markdown instead of preformatted text
    /// Default: false
    #[serde(default)]
    pub markdown: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServeConfig {
    /// Default: 3000
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is unset
    /// Default: "warn"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_page_title() -> String {
    "Chat Archive".to_string()
}

fn default_untitled() -> String {
    crate::archive::UNTITLED.to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            page_title: default_page_title(),
            untitled_placeholder: default_untitled(),
            markdown: false,
        }
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load config from .chatview/config.toml
    /// Returns default config if file doesn't exist
    pub fn load() -> Self {
        if let Some(path) = Self::find_config_path() {
            if let Ok(contents) = std::fs::read_to_string(&path) {
                if let Ok(config) = toml::from_str(&contents) {
                    return config;
                }
            }
        }
        Self::default()
    }

    /// Find config.toml by walking up directory tree
    fn find_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut dir = current_dir.as_path();

        loop {
            let config_path = dir.join(".chatview").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }

    /// Whether diagnostics should be emitted as JSON lines
    pub fn json_logs(&self) -> bool {
        self.logging.format.eq_ignore_ascii_case("json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.viewer.page_title, "Chat Archive");
        assert_eq!(config.viewer.untitled_placeholder, "Untitled conversation");
        assert!(!config.viewer.markdown);
        assert_eq!(config.serve.port, 3000);
        assert_eq!(config.logging.level, "warn");
        assert!(!config.json_logs());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[viewer]
page_title = "DeepSeek history"
markdown = true

[serve]
port = 8123

[logging]
format = "JSON"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.viewer.page_title, "DeepSeek history");
        assert!(config.viewer.markdown);
        assert_eq!(config.viewer.untitled_placeholder, "Untitled conversation");
        assert_eq!(config.serve.port, 8123);
        assert_eq!(config.logging.level, "warn");
        assert!(config.json_logs());
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.serve.port, 3000);
        assert_eq!(config.viewer.page_title, "Chat Archive");
    }
}
