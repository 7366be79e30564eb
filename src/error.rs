//! Error types for component compilation
//!
//! Every fatal condition is a [`CompileError`]: an [`ErrorKind`] plus a
//! [`Location`]. Errors raised deep inside an expansion often know nothing
//! about where they happened; enclosing frames fill the location in with
//! [`CompileError::with_location`] as the error travels outward.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::parser::lexer::LineIndex;

pub type Result<T, E = CompileError> = std::result::Result<T, E>;

/// The kinds of fatal conditions
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A tag lacks an attribute it cannot work without
    #[error("Can't find '{attr}' attribute of <{tag}/>")]
    MissingAttribute { tag: String, attr: String },

    /// Two imports in one file share an alias
    #[error("Can't use same alias {alias} on different imports in the same file")]
    DuplicateAlias { alias: String },

    /// A file imports itself, directly or through other files
    #[error("Import recursion. Route:\n\t{}", format_route(.route))]
    ImportCycle { route: Vec<PathBuf> },

    #[error("Cannot import component from non-existent file {}", display_path(.path))]
    ImportedFileNotFound { path: PathBuf },

    #[error("Can't read file {}. {source}", display_path(.path))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A component file holds something other than template, style, script or import
    #[error("Tag <{tag}> is not allowed at top-level")]
    DisallowedTopLevelTag { tag: String },

    #[error(
        "Multiple <{tag}> tags are not allowed within single component. Lines: {}",
        format_lines(.lines)
    )]
    MultipleTopLevelTags { tag: String, lines: Vec<usize> },

    #[error("'children' can't be used as an argument of component. It's reserved for inner children")]
    ReservedArgument,

    /// A usage site passes attributes the component does not declare
    #[error("{}", format_extra_args(.args))]
    ExtraArguments { args: BTreeSet<String> },

    #[error("Can't find required argument '{arg}' of <{tag}/>")]
    MissingArgument { tag: String, arg: String },
}

impl ErrorKind {
    /// Attach a location, producing a full error
    pub fn at(self, file: &Path, line: Option<usize>) -> CompileError {
        CompileError::new(self).with_location(file, line)
    }
}

/// Where an error happened
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub file: Option<PathBuf>,
    pub line: Option<usize>,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (None, _) => write!(f, "Error"),
            (Some(file), Some(line)) => {
                write!(f, "Error in file {}, on line {}", display_path(file), line)
            }
            (Some(file), None) => write!(f, "Error in file {}, on line Unknown", display_path(file)),
        }
    }
}

/// A fatal compilation error
#[derive(Debug, Error)]
#[error("{location}:\n{kind}.")]
pub struct CompileError {
    pub kind: ErrorKind,
    pub location: Location,
}

impl From<ErrorKind> for CompileError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl CompileError {
    /// Create an error with no location yet
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            location: Location::default(),
        }
    }

    /// Fill in a missing location
    ///
    /// A location that is already present is kept. A missing line is only
    /// taken from `file` when the error happened in that same file.
    pub fn with_location(mut self, file: &Path, line: Option<usize>) -> Self {
        match &self.location.file {
            None => {
                self.location.file = Some(file.to_path_buf());
                self.location.line = self.location.line.or(line);
            }
            Some(known) if known == file => {
                self.location.line = self.location.line.or(line);
            }
            Some(_) => {}
        }
        self
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str) -> String {
        let filename = self
            .location
            .file
            .as_deref()
            .map(display_path)
            .unwrap_or_default();
        let filename = filename.as_str();
        let span = self
            .location
            .line
            .and_then(|line| LineIndex::new(source).line_span(line));

        let offset = span.as_ref().map_or(0, |s| s.start);
        let mut report = Report::build(ReportKind::Error, filename, offset)
            .with_message(self.kind.to_string());
        if let Some(span) = span {
            report.add_label(
                Label::new((filename, span))
                    .with_message("while compiling this")
                    .with_color(Color::Red),
            );
        }

        let mut buf = Vec::new();
        match report
            .finish()
            .write((filename, Source::from(source)), &mut buf)
        {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }

    /// Format the error for a terminal, with source context when the file can be read
    pub fn report(&self) -> String {
        let source = self
            .location
            .file
            .as_deref()
            .and_then(|file| std::fs::read_to_string(file).ok());
        match source {
            Some(source) => self.format(&source),
            None => self.to_string(),
        }
    }
}

/// Display a path relative to the working directory when possible
pub fn display_path(path: &Path) -> String {
    let relative = std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf));
    relative.as_deref().unwrap_or(path).display().to_string()
}

fn format_route(route: &[PathBuf]) -> String {
    route
        .iter()
        .map(|p| display_path(p))
        .collect::<Vec<_>>()
        .join(" -> \n\t")
}

fn format_lines(lines: &[usize]) -> String {
    lines
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn format_extra_args(args: &BTreeSet<String>) -> String {
    let quoted = args
        .iter()
        .map(|a| format!("'{}'", a))
        .collect::<Vec<_>>()
        .join(",");
    if args.len() == 1 {
        format!("Extra argument {}", quoted)
    } else {
        format!("Extra arguments: [{}]", quoted)
    }
}
