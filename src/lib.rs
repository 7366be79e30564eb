//! htmlp - an HTML component compiler
//!
//! This library compiles HTML extended with `<import>`, component templates,
//! `$name` arguments, `!name` unique tokens and a `$children` slot into plain
//! HTML.
//!
//! # Example
//!
//! ```rust,no_run
//! use htmlp::{compile_with_config, CompileConfig};
//!
//! let config = CompileConfig::new()
//!     .with_include_dir("components")
//!     .with_minify(true);
//! let html = compile_with_config("index.htmlp", config).unwrap();
//! println!("{}", html);
//! ```

pub mod component;
pub mod config;
pub mod error;
pub mod parser;
pub mod renderer;
pub mod source;
pub mod watch;

pub use component::{ComponentDefinition, ComponentRegistry, UniqueCounter};
pub use config::{ConfigError, ProjectConfig};
pub use error::{CompileError, ErrorKind, Result};
pub use parser::{parse, Document};
pub use renderer::{render_html, HtmlConfig};
pub use source::Source;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use component::{expand_components, ImportResolver};
use error::display_path;

/// Configuration for a compilation session
#[derive(Debug, Clone)]
pub struct CompileConfig {
    /// Directory import paths are relative to
    pub include_dir: PathBuf,
    /// HTML output configuration
    pub html: HtmlConfig,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            include_dir: PathBuf::from("./"),
            html: HtmlConfig::default(),
        }
    }
}

impl CompileConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the include directory
    pub fn with_include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dir = dir.into();
        self
    }

    /// Enable or disable minified output
    pub fn with_minify(mut self, minify: bool) -> Self {
        self.html = self.html.with_minify(minify);
        self
    }
}

/// State shared by every file compiled in one run
///
/// The session owns the component cache and the unique-token counter. Both
/// survive across [`compile_file`](Session::compile_file) calls, so a
/// component imported by several inputs is parsed once and generated
/// identifiers never repeat within a run. Call [`reset`](Session::reset)
/// before recompiling from scratch.
#[derive(Debug)]
pub struct Session {
    config: CompileConfig,
    registry: ComponentRegistry,
    counter: UniqueCounter,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(CompileConfig::default())
    }
}

impl Session {
    pub fn new(config: CompileConfig) -> Self {
        Self {
            registry: ComponentRegistry::with_include_dir(&config.include_dir),
            counter: UniqueCounter::new(),
            config,
        }
    }

    /// Forget every cached component and restart the unique counter
    pub fn reset(&mut self) {
        self.registry.clear();
        self.counter.reset();
    }

    /// Compile a file to HTML
    pub fn compile_file(&mut self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let canonical = fs::canonicalize(path).map_err(|source| ErrorKind::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(file = %display_path(&canonical), "Compiling");

        let source = Source::load(&canonical)?;
        let document = self.compile_source(source)?;
        Ok(render_html(&document, &self.config.html))
    }

    /// Resolve imports and expand every component usage in a parsed source
    pub fn compile_source(&mut self, mut source: Source) -> Result<Document> {
        let imports = ImportResolver::new(&mut self.registry, &source.path).resolve(&mut source)?;
        let nodes = std::mem::take(&mut source.document.nodes);
        let nodes = expand_components(nodes, &imports, &source.path, &mut self.counter)?;
        Ok(Document::new(nodes))
    }

    /// Components loaded so far, in load order
    pub fn components(&self) -> impl Iterator<Item = &ComponentDefinition> {
        self.registry.definitions()
    }

    /// Concatenate the stylesheets of all loaded components
    ///
    /// Each non-empty stylesheet is preceded by a comment naming its file.
    pub fn bundle_stylesheets(&self) -> String {
        let mut bundle = String::new();
        for def in self.components() {
            let css = def.stylesheet.trim();
            if css.is_empty() {
                continue;
            }
            bundle.push_str(&format!("/* {} */\n{}\n", display_path(&def.path), css));
        }
        bundle
    }
}

/// Compile a file with default configuration
///
/// This is the main entry point for the library.
pub fn compile(path: impl AsRef<Path>) -> Result<String> {
    compile_with_config(path, CompileConfig::default())
}

/// Compile a file with custom configuration in a fresh session
pub fn compile_with_config(path: impl AsRef<Path>, config: CompileConfig) -> Result<String> {
    Session::new(config).compile_file(path)
}
