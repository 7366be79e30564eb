//! Import resolution - turns `<import>` tags into an alias table

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{ErrorKind, Result};
use crate::parser::take_elements;
use crate::source::Source;

use super::registry::{check_top_level_tags, ComponentDefinition, ComponentRegistry};

/// Alias (lower-cased tag name) to component, in declaration order
pub type Imports = IndexMap<String, Rc<ComponentDefinition>>;

/// Chain of files currently being resolved
#[derive(Debug, Clone, Default)]
pub struct Route {
    paths: Vec<PathBuf>,
}

impl Route {
    /// Start a route at the file being compiled
    pub fn new(origin: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![origin.into()],
        }
    }

    /// Push a file, failing if it is already in flight
    pub fn enter(&mut self, path: &Path) -> Result<()> {
        if self.paths.iter().any(|p| p == path) {
            let mut route = self.paths.clone();
            route.push(path.to_path_buf());
            return Err(ErrorKind::ImportCycle { route }.into());
        }
        self.paths.push(path.to_path_buf());
        Ok(())
    }

    /// Pop the most recently entered file
    pub fn leave(&mut self) {
        self.paths.pop();
    }

    pub fn depth(&self) -> usize {
        self.paths.len()
    }
}

/// Resolves imports recursively, sharing one registry and one route
pub struct ImportResolver<'r> {
    registry: &'r mut ComponentRegistry,
    route: Route,
}

impl<'r> ImportResolver<'r> {
    /// Create a resolver for a compile rooted at `origin` (a canonical path)
    pub fn new(registry: &'r mut ComponentRegistry, origin: &Path) -> Self {
        Self {
            registry,
            route: Route::new(origin),
        }
    }

    /// Remove every `<import>` from the source and resolve it
    pub fn resolve(&mut self, source: &mut Source) -> Result<Imports> {
        let tags = take_elements(&mut source.document.nodes, "import");
        let mut imports = Imports::new();

        for tag in tags {
            let relative = tag.attr("path").ok_or_else(|| {
                ErrorKind::MissingAttribute {
                    tag: "import".to_string(),
                    attr: "path".to_string(),
                }
                .at(&source.path, Some(tag.line))
            })?;
            let path = self.registry.resolve_path(relative);

            let alias = match tag.attr("alias") {
                Some(alias) => alias.to_lowercase(),
                None => default_alias(&path),
            };
            if imports.contains_key(&alias) {
                return Err(ErrorKind::DuplicateAlias { alias }.at(&source.path, Some(tag.line)));
            }

            let definition = self.load(&path, &source.path, tag.line)?;
            debug!(alias = %alias, path = %definition.path.display(), "Imported component");
            imports.insert(alias, definition);
        }

        Ok(imports)
    }

    /// Load one imported file, failing on cycles
    fn load(
        &mut self,
        path: &Path,
        importer: &Path,
        line: usize,
    ) -> Result<Rc<ComponentDefinition>> {
        let canonical = fs::canonicalize(path).map_err(|source| {
            let kind = match source.kind() {
                io::ErrorKind::NotFound => ErrorKind::ImportedFileNotFound {
                    path: path.to_path_buf(),
                },
                _ => ErrorKind::Io {
                    path: path.to_path_buf(),
                    source,
                },
            };
            kind.at(importer, Some(line))
        })?;

        self.route
            .enter(&canonical)
            .map_err(|e| e.with_location(importer, Some(line)))?;
        let result = self.load_definition(&canonical);
        self.route.leave();

        result.map_err(|e| e.with_location(importer, Some(line)))
    }

    fn load_definition(&mut self, path: &Path) -> Result<Rc<ComponentDefinition>> {
        if let Some(definition) = self.registry.get(path) {
            debug!(path = %path.display(), "Component cache hit");
            return Ok(definition);
        }

        debug!(path = %path.display(), depth = self.route.depth(), "Loading component");
        let mut source = Source::load(path)?;
        // A malformed component fails before any of its imports are read
        check_top_level_tags(&source)?;
        let imports = self.resolve(&mut source)?;
        let definition = ComponentDefinition::from_source(source, imports)?;
        Ok(self.registry.insert(definition))
    }
}

/// Lower-cased file stem of an import path
fn default_alias(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
