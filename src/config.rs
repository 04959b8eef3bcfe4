//! Configuration file parser for ~/.config/feedtree/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde, though we log a warning for each one
//! since they are usually typos.
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::domain::SidebarItemId;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds the maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Start with the read filter on.
    pub hide_read_feeds: bool,

    /// Items that stay visible while the read filter is on.
    /// Written as tables, e.g. `{ type = "feed", accountId = "local", feedId = "1" }`.
    pub filter_exceptions: Vec<SidebarItemId>,

    /// Expand every section and folder when printing the outline.
    pub expanded_sections: bool,

    /// Snapshot polling interval for `feedtree watch`, in seconds.
    pub watch_interval_secs: u64,

    /// Truncate printed names to this many columns. 0 = unlimited.
    pub max_name_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hide_read_feeds: false,
            filter_exceptions: Vec::new(),
            expanded_sections: true,
            watch_interval_secs: 2,
            max_name_width: 48,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 5] = [
        "hide_read_feeds",
        "filter_exceptions",
        "expanded_sections",
        "watch_interval_secs",
        "max_name_width",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::parse(&content)
    }

    /// Parse config TOML. Blank input yields the defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!("Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(
            hide_read_feeds = config.hide_read_feeds,
            exceptions = config.filter_exceptions.len(),
            "Loaded configuration"
        );
        Ok(config)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(test: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("feedtree_config_test_{}", test));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.hide_read_feeds);
        assert!(config.filter_exceptions.is_empty());
        assert!(config.expanded_sections);
        assert_eq!(config.watch_interval_secs, 2);
        assert_eq!(config.max_name_width, 48);
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/feedtree_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let path = temp_config("whitespace", "   \n  \n  ");
        let config = Config::load(&path).unwrap();
        assert_eq!(config, Config::default());
        cleanup(&path);
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let path = temp_config("partial", "hide_read_feeds = true\n");
        let config = Config::load(&path).unwrap();
        assert!(config.hide_read_feeds);
        assert_eq!(config.watch_interval_secs, 2); // default
        assert!(config.expanded_sections); // default
        cleanup(&path);
    }

    #[test]
    fn test_full_config() {
        let content = r#"
hide_read_feeds = true
expanded_sections = false
watch_interval_secs = 10
max_name_width = 0

[[filter_exceptions]]
type = "feed"
accountId = "local"
feedId = "42"

[[filter_exceptions]]
type = "folder"
accountId = "local"
folderName = "News"
"#;
        let path = temp_config("full", content);
        let config = Config::load(&path).unwrap();

        assert!(config.hide_read_feeds);
        assert!(!config.expanded_sections);
        assert_eq!(config.watch_interval_secs, 10);
        assert_eq!(config.max_name_width, 0);
        assert_eq!(
            config.filter_exceptions,
            vec![
                SidebarItemId::feed("local", "42"),
                SidebarItemId::folder("local", "News"),
            ]
        );
        cleanup(&path);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let path = temp_config("invalid", "this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
        cleanup(&path);
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let content = r#"
hide_read_feeds = true
theme = "dark"
another_unknown = 42
"#;
        let config = Config::parse(content).unwrap();
        assert!(config.hide_read_feeds);
    }

    #[test]
    fn test_wrong_type_returns_error() {
        // watch_interval_secs should be an integer
        let result = Config::parse("watch_interval_secs = \"fast\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_malformed_filter_exception_returns_error() {
        let content = "[[filter_exceptions]]\ntype = \"playlist\"\nid = \"x\"\n";
        assert!(matches!(Config::parse(content), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_too_large_file_rejected() {
        let path = temp_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
        cleanup(&path);
    }

    #[test]
    fn test_file_at_size_limit_accepted() {
        let mut content = "hide_read_feeds = false\n".to_string();
        while content.len() < 1_048_576 - 20 {
            content.push_str("# padding comment\n");
        }
        content.truncate(1_048_576);
        let path = temp_config("at_limit", &content);

        assert!(Config::load(&path).is_ok());
        cleanup(&path);
    }
}
