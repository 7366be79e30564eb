//! Component definitions and the per-session definition cache

use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{ErrorKind, Result};
use crate::parser::Element;
use crate::renderer::{render_nodes, HtmlConfig};
use crate::source::Source;

use super::imports::Imports;

/// Tags a component file may hold at top level
pub const ALLOWED_TOP_LEVEL: &[&str] = &["template", "style", "script", "scripts", "import"];

/// Argument name reserved for the children slot
pub const CHILDREN: &str = "children";

/// Marks an optional argument in a declaration
const OPTIONAL_SIGIL: char = '?';

/// A declared component argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgDefinition {
    pub name: String,
    pub optional: bool,
    /// Value used when a usage omits the argument
    pub default: Option<String>,
}

impl ArgDefinition {
    /// Parse a declaration token like `title` or `?subtitle`
    pub fn parse(declaration: &str) -> Self {
        match declaration.strip_prefix(OPTIONAL_SIGIL) {
            Some(name) => Self {
                name: name.to_string(),
                optional: true,
                default: None,
            },
            None => Self {
                name: declaration.to_string(),
                optional: false,
                default: None,
            },
        }
    }

    /// The `$name` token that stands for this argument in a template
    pub fn placeholder(&self) -> String {
        format!("${}", self.name)
    }
}

/// The parsed contents of one component file
#[derive(Debug, Clone)]
pub struct ComponentDefinition {
    /// Canonical path of the component file
    pub path: PathBuf,
    /// The component's own imports, used for usages inside its template
    pub imports: Imports,
    pub style_prefix: String,
    /// `None` renders every usage as nothing
    pub template: Option<Element>,
    pub args: Vec<ArgDefinition>,
    pub script: String,
    pub stylesheet: String,
}

impl ComponentDefinition {
    /// Build a definition from a component file whose imports are already resolved
    pub fn from_source(source: Source, imports: Imports) -> Result<Self> {
        check_top_level_tags(&source)?;

        let template = pick_single(&source, &["template"])?.cloned();
        let args = match &template {
            Some(template) => parse_args(template, &source.path)?,
            None => Vec::new(),
        };
        let script = pick_single(&source, &["script", "scripts"])?
            .map(|el| inner_text(el))
            .unwrap_or_default();
        let stylesheet = pick_single(&source, &["style"])?
            .map(|el| inner_text(el))
            .unwrap_or_default();

        Ok(Self {
            style_prefix: style_prefix(&source.path),
            path: source.path,
            imports,
            template,
            args,
            script,
            stylesheet,
        })
    }

    /// Global CSS class name for a class local to this component
    pub fn global_css_class_name(&self, local: &str) -> String {
        format!("{}{}", self.style_prefix, local)
    }

    /// Check if this component declares an argument
    pub fn has_argument(&self, name: &str) -> bool {
        self.args.iter().any(|a| a.name == name)
    }

    /// Get all argument names
    pub fn argument_names(&self) -> Vec<&str> {
        self.args.iter().map(|a| a.name.as_str()).collect()
    }
}

/// Reject any top-level tag other than the allowed ones
pub fn check_top_level_tags(source: &Source) -> Result<()> {
    match source
        .document
        .elements()
        .find(|el| !ALLOWED_TOP_LEVEL.contains(&el.name.as_str()))
    {
        Some(el) => Err(ErrorKind::DisallowedTopLevelTag {
            tag: el.name.clone(),
        }
        .at(&source.path, Some(el.line))),
        None => Ok(()),
    }
}

/// The single top-level element with one of the given names, if any
fn pick_single<'s>(source: &'s Source, names: &[&str]) -> Result<Option<&'s Element>> {
    let found: Vec<&Element> = source
        .document
        .elements()
        .filter(|el| names.contains(&el.name.as_str()))
        .collect();
    match found.as_slice() {
        [] => Ok(None),
        [single] => Ok(Some(*single)),
        [first, ..] => Err(ErrorKind::MultipleTopLevelTags {
            tag: first.name.clone(),
            lines: found.iter().map(|el| el.line).collect(),
        }
        .at(&source.path, None)),
    }
}

/// Parse the `args` attribute of a template
fn parse_args(template: &Element, path: &Path) -> Result<Vec<ArgDefinition>> {
    let mut args: Vec<ArgDefinition> = Vec::new();
    for declaration in template.attr("args").unwrap_or_default().split_whitespace() {
        let arg = ArgDefinition::parse(declaration);
        if arg.name == CHILDREN {
            return Err(ErrorKind::ReservedArgument.at(path, Some(template.line)));
        }
        if !args.iter().any(|a| a.name == arg.name) {
            args.push(arg);
        }
    }
    Ok(args)
}

fn inner_text(el: &Element) -> String {
    render_nodes(&el.children, &HtmlConfig::default())
}

fn style_prefix(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Cache of component definitions keyed by canonical path
///
/// Definitions are stored in load order and shared; once stored they are
/// never mutated.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    definitions: IndexMap<PathBuf, Rc<ComponentDefinition>>,
    /// Directory import paths are relative to
    include_dir: PathBuf,
}

impl ComponentRegistry {
    /// Create a new registry with an include directory for import paths
    pub fn with_include_dir(include_dir: impl Into<PathBuf>) -> Self {
        Self {
            definitions: IndexMap::new(),
            include_dir: include_dir.into(),
        }
    }

    /// Get a definition by canonical path
    pub fn get(&self, path: &Path) -> Option<Rc<ComponentDefinition>> {
        self.definitions.get(path).cloned()
    }

    /// Check if a definition is cached
    pub fn contains(&self, path: &Path) -> bool {
        self.definitions.contains_key(path)
    }

    /// Store a definition, returning the shared handle
    pub fn insert(&mut self, def: ComponentDefinition) -> Rc<ComponentDefinition> {
        let def = Rc::new(def);
        self.definitions.insert(def.path.clone(), Rc::clone(&def));
        def
    }

    /// All cached definitions in load order
    pub fn definitions(&self) -> impl Iterator<Item = &ComponentDefinition> {
        self.definitions.values().map(|d| d.as_ref())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Drop every cached definition
    pub fn clear(&mut self) {
        self.definitions.clear();
    }

    /// Resolve an import path against the include directory
    pub fn resolve_path(&self, relative: &str) -> PathBuf {
        self.include_dir.join(relative)
    }
}
