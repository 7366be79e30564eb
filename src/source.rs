//! A parsed document together with the file it came from

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ErrorKind, Result};
use crate::parser::{parse, Document};

/// A markup tree and its originating file
#[derive(Debug, Clone)]
pub struct Source {
    pub path: PathBuf,
    pub document: Document,
}

impl Source {
    /// Read and parse a file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ErrorKind::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_str(path, &text))
    }

    /// Parse markup that claims to come from `path`
    pub fn from_str(path: impl Into<PathBuf>, text: &str) -> Self {
        Self {
            path: path.into(),
            document: parse(text),
        }
    }
}
