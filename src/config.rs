//! Project configuration file
//!
//! A project can keep its compiler settings in `htmlp.toml` next to its
//! sources. Every key is optional and command line flags take precedence.
//!
//! ```toml
//! include_dir = "components"
//! output = "dist/index.html"
//! minify = true
//! watch = "src"
//! styles_output = "dist/bundle.css"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Name of the config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "htmlp.toml";

/// Errors that can occur when loading or parsing the config file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Settings read from `htmlp.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Directory import paths are relative to
    pub include_dir: Option<PathBuf>,
    /// Output file; stdout when absent
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub minify: bool,
    /// Directory to watch for changes
    pub watch: Option<PathBuf>,
    /// Where to write the bundled component stylesheets
    pub styles_output: Option<PathBuf>,
}

impl ProjectConfig {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load config from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load `htmlp.toml` from `dir` if it exists, defaults otherwise
    pub fn load_default(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(DEFAULT_CONFIG_FILE);
        if path.is_file() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }
}
