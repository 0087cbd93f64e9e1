//! Editor configuration with layered TOML overrides
//!
//! Configuration is resolved from, in order:
//! 1. Built-in defaults
//! 2. The user config (`<config_dir>/nvram-tweak/config.toml`)
//! 3. An explicit file passed by the caller
//!
//! Later layers override earlier ones field by field. Missing files are
//! skipped; a file that exists but does not parse is an error.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::document::ParseOptions;
use crate::editor::{DEFAULT_RISK_KEYWORDS, ValueEditor};
use crate::error::{Error, Result};
use crate::writer::DEFAULT_BACKUP_SUFFIX;

/// Directory name under the platform config dir.
pub const CONFIG_DIR_NAME: &str = "nvram-tweak";

/// Effective settings of an edit session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Name or help substrings that mark a block as risky
    pub risk_keywords: Vec<String>,
    /// Appended to the dump path for the pre-write backup
    pub backup_suffix: String,
    /// Accept files mixing CRLF and LF terminators
    pub allow_mixed_line_endings: bool,
    /// Refuse to save over a file changed on disk since load
    pub detect_external_changes: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            risk_keywords: DEFAULT_RISK_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            allow_mixed_line_endings: false,
            detect_external_changes: true,
        }
    }
}

impl EditorConfig {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            allow_mixed_line_endings: self.allow_mixed_line_endings,
        }
    }

    pub fn editor(&self) -> ValueEditor {
        ValueEditor::new(self.risk_keywords.iter().cloned())
    }

    /// Apply one layer on top of this configuration.
    pub fn merge(&mut self, layer: ConfigLayer) {
        if let Some(risk_keywords) = layer.risk_keywords {
            self.risk_keywords = risk_keywords;
        }
        if let Some(backup_suffix) = layer.backup_suffix {
            self.backup_suffix = backup_suffix;
        }
        if let Some(allow) = layer.allow_mixed_line_endings {
            self.allow_mixed_line_endings = allow;
        }
        if let Some(detect) = layer.detect_external_changes {
            self.detect_external_changes = detect;
        }
    }
}

/// One TOML file's worth of overrides; absent keys leave the value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub risk_keywords: Option<Vec<String>>,
    pub backup_suffix: Option<String>,
    pub allow_mixed_line_endings: Option<bool>,
    pub detect_external_changes: Option<bool>,
}

impl ConfigLayer {
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let layer: Self = toml::from_str(content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })?;
        if layer.backup_suffix.as_deref() == Some("") {
            return Err(Error::Config {
                path: path.to_path_buf(),
                message: "backup_suffix must not be empty".to_string(),
            });
        }
        Ok(layer)
    }

    /// Read a layer from disk; `Ok(None)` when the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            tracing::debug!(?path, "No config file, skipping");
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!(?path, "Loading config layer");
        Self::parse(&content, path).map(Some)
    }
}

/// Resolves [`EditorConfig`] from its layers.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    /// Replaces the platform config dir; used by tests.
    user_config_dir_override: Option<PathBuf>,
    explicit: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_config_dir_override = Some(dir.into());
        self
    }

    /// Add an explicit config file layered on top of the user config.
    ///
    /// Unlike the user config, an explicit file must exist.
    pub fn with_explicit(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    fn user_config_path(&self) -> Option<PathBuf> {
        let dir = match &self.user_config_dir_override {
            Some(dir) => dir.clone(),
            None => dirs::config_dir()?.join(CONFIG_DIR_NAME),
        };
        Some(dir.join("config.toml"))
    }

    pub fn resolve(&self) -> Result<EditorConfig> {
        let mut config = EditorConfig::default();

        if let Some(path) = self.user_config_path()
            && let Some(layer) = ConfigLayer::load(&path)?
        {
            config.merge(layer);
        }

        if let Some(path) = &self.explicit {
            let layer = ConfigLayer::load(path)?.ok_or_else(|| Error::Config {
                path: path.clone(),
                message: "file not found".to_string(),
            })?;
            config.merge(layer);
        }

        Ok(config)
    }
}
