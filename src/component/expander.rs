//! Component expansion - replaces usage sites with their component's markup

use std::collections::BTreeSet;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace};

use crate::error::{ErrorKind, Result};
use crate::parser::{walk_elements_mut, walk_text_mut, Attribute, Element, Node};

use super::imports::Imports;
use super::registry::{ArgDefinition, ComponentDefinition};
use super::uniques::{UniqueCounter, UniquesPerComponent};

/// Text of the children slot
pub const CHILDREN_SLOT: &str = "$children";

lazy_static! {
    /// `!` and a letter, then letters, `_` or `-`
    static ref UNIQUE_TOKEN: Regex = Regex::new(r"![A-Za-z][A-Za-z_-]*").unwrap();
}

/// An argument definition bound to the value given at one usage site
#[derive(Debug, Clone)]
pub struct BoundArg<'d> {
    pub def: &'d ArgDefinition,
    pub value: Option<String>,
}

impl<'d> BoundArg<'d> {
    /// Bind a definition against the usage's attributes
    ///
    /// An attribute written without a value binds the empty string.
    pub fn bind(tag: &str, def: &'d ArgDefinition, attrs: &[Attribute]) -> Result<Self> {
        let value = attrs
            .iter()
            .find(|a| a.name == def.name)
            .map(|a| a.value().to_string())
            .or_else(|| def.default.clone());
        if value.is_none() && !def.optional {
            return Err(ErrorKind::MissingArgument {
                tag: tag.to_string(),
                arg: def.name.clone(),
            }
            .into());
        }
        Ok(Self { def, value })
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Replace this argument's tokens in `text`
    ///
    /// A bound value replaces both `$name` and `!name`; an unbound argument
    /// removes `$name` only.
    pub fn substitute_in(&self, text: &str) -> String {
        let placeholder = self.def.placeholder();
        match &self.value {
            Some(value) => {
                let text = replace_token(text, &placeholder, value);
                replace_token(&text, &format!("!{}", self.def.name), value)
            }
            None => replace_token(text, &placeholder, ""),
        }
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Replace `token` where it is not followed by an identifier character
fn replace_token(text: &str, token: &str, value: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find(token) {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + token.len()..];
        if after.starts_with(is_identifier_char) {
            out.push_str(token);
        } else {
            out.push_str(value);
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

/// Expand every component usage in `nodes`
///
/// Tag names are looked up in `imports`; `file` is the file the nodes
/// belong to and is attached to errors raised at these usage sites.
pub fn expand_components(
    nodes: Vec<Node>,
    imports: &Imports,
    file: &Path,
    counter: &mut UniqueCounter,
) -> Result<Vec<Node>> {
    let mut expanded = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Element(el) => match imports.get(&el.name) {
                Some(def) => {
                    let line = el.line;
                    let output = expand_usage(el, def, imports, file, counter)
                        .map_err(|e| e.with_location(file, Some(line)))?;
                    expanded.extend(output);
                }
                None => {
                    let mut el = el;
                    el.children =
                        expand_components(std::mem::take(&mut el.children), imports, file, counter)?;
                    expanded.push(Node::Element(el));
                }
            },
            other => expanded.push(other),
        }
    }
    Ok(expanded)
}

/// Expand one usage site into the nodes that replace it
fn expand_usage(
    usage: Element,
    def: &ComponentDefinition,
    caller_imports: &Imports,
    file: &Path,
    counter: &mut UniqueCounter,
) -> Result<Vec<Node>> {
    let Element {
        name,
        attrs,
        children,
        line,
    } = usage;

    // The usage's children are the caller's markup
    let children = expand_components(children, caller_imports, file, counter)?;

    let Some(template) = &def.template else {
        debug!(tag = %name, "Component has no template, dropping usage");
        return Ok(Vec::new());
    };
    debug!(tag = %name, line, component = %def.path.display(), "Expanding component");

    // Attribute names are case-insensitive; the parser keeps their case
    let attrs: Vec<Attribute> = attrs
        .into_iter()
        .map(|mut attr| {
            attr.name.make_ascii_lowercase();
            attr
        })
        .collect();
    let args = bind_args(&name, &attrs, def)?;

    let mut body = template.children.clone();
    apply_args(&mut body, &args);
    apply_uniques(&mut body, &mut UniquesPerComponent::new(), counter);

    let body = expand_components(body, &def.imports, &def.path, counter)?;
    Ok(insert_children(body, &children))
}

/// Check the usage's attributes against the declared arguments and bind them
fn bind_args<'d>(
    tag: &str,
    attrs: &[Attribute],
    def: &'d ComponentDefinition,
) -> Result<Vec<BoundArg<'d>>> {
    let extra: BTreeSet<String> = attrs
        .iter()
        .filter(|a| !def.has_argument(&a.name))
        .map(|a| a.name.clone())
        .collect();
    if !extra.is_empty() {
        return Err(ErrorKind::ExtraArguments { args: extra }.into());
    }

    def.args
        .iter()
        .map(|arg| BoundArg::bind(tag, arg, attrs))
        .collect()
}

/// Substitute argument placeholders in attributes and text
fn apply_args(nodes: &mut [Node], args: &[BoundArg<'_>]) {
    if args.is_empty() {
        return;
    }
    walk_elements_mut(nodes, &mut |el| {
        let attrs = std::mem::take(&mut el.attrs);
        el.attrs = attrs
            .into_iter()
            .filter_map(|attr| substitute_attribute(attr, args))
            .collect();
    });
    walk_text_mut(nodes, &mut |text| {
        for arg in args {
            *text = replace_token(text, &arg.def.placeholder(), arg.value.as_deref().unwrap_or(""));
        }
    });
}

/// Substitute one attribute, returning `None` when it should be dropped
fn substitute_attribute(attr: Attribute, args: &[BoundArg<'_>]) -> Option<Attribute> {
    if let Some(arg) = args.iter().find(|arg| attr.name == arg.def.placeholder()) {
        return arg.value.as_ref().map(|value| {
            if value.is_empty() {
                Attribute::bare(arg.name())
            } else {
                Attribute::new(arg.name(), value.clone())
            }
        });
    }

    if attr.value.is_none() {
        return Some(attr);
    }
    let value = args
        .iter()
        .fold(attr.value().to_string(), |value, arg| arg.substitute_in(&value));
    if value.trim().is_empty() {
        trace!(attr = %attr.name, "Dropping blank attribute");
        return None;
    }
    Some(Attribute::new(attr.name, value))
}

/// Replace `!name` tokens in attribute values with per-usage identifiers
fn apply_uniques(nodes: &mut [Node], uniques: &mut UniquesPerComponent, counter: &mut UniqueCounter) {
    walk_elements_mut(nodes, &mut |el| {
        for value in el.attrs.iter_mut().filter_map(|attr| attr.value.as_mut()) {
            if value.contains('!') {
                *value = replace_uniques(value, uniques, counter);
            }
        }
    });
}

fn replace_uniques(
    value: &str,
    uniques: &mut UniquesPerComponent,
    counter: &mut UniqueCounter,
) -> String {
    let mut out = String::with_capacity(value.len());
    let mut last = 0;
    for token in UNIQUE_TOKEN.find_iter(value) {
        let terminated = value[token.end()..]
            .chars()
            .next()
            .map_or(true, char::is_whitespace);
        if !terminated {
            continue;
        }
        out.push_str(&value[last..token.start()]);
        out.push_str(&uniques.get_by_id(token.as_str(), counter));
        last = token.end();
    }
    out.push_str(&value[last..]);
    out
}

/// Replace every `$children` text node with a copy of the usage's children
fn insert_children(nodes: Vec<Node>, children: &[Node]) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Text(text) if text.trim() == CHILDREN_SLOT => {
                out.extend(children.iter().cloned());
            }
            Node::Element(mut el) => {
                el.children = insert_children(std::mem::take(&mut el.children), children);
                out.push(Node::Element(el));
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::renderer::{render_nodes, HtmlConfig};
    use crate::source::Source;
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    fn component(path: &str, text: &str, imports: Imports) -> Rc<ComponentDefinition> {
        let source = Source::from_str(path, text);
        Rc::new(ComponentDefinition::from_source(source, imports).unwrap())
    }

    fn card() -> Rc<ComponentDefinition> {
        component(
            "/c/card.htmlp",
            r#"<template args="title ?subtitle"><div class="card"><h1>$title</h1><p>$subtitle</p>$children</div></template>"#,
            Imports::new(),
        )
    }

    fn expand(markup: &str, imports: &Imports, counter: &mut UniqueCounter) -> Result<String> {
        let nodes = parse(markup).nodes;
        let nodes = expand_components(nodes, imports, Path::new("/main.htmlp"), counter)?;
        Ok(render_nodes(&nodes, &HtmlConfig::default()))
    }

    fn imports(entries: &[(&str, Rc<ComponentDefinition>)]) -> Imports {
        entries
            .iter()
            .map(|(alias, def)| (alias.to_string(), Rc::clone(def)))
            .collect()
    }

    #[test]
    fn test_card_example() {
        let imports = imports(&[("card", card())]);
        let html = expand(r#"<card title="Hi">body</card>"#, &imports, &mut UniqueCounter::new())
            .unwrap();
        assert_eq!(html, r#"<div class="card"><h1>Hi</h1><p></p>body</div>"#);
    }

    #[test]
    fn test_replace_token_boundary() {
        assert_eq!(replace_token("$a $ab $a-b $a.", "$a", "X"), "X $ab $a-b X.");
        assert_eq!(replace_token("$a$a", "$a", "X"), "XX");
    }

    #[test]
    fn test_missing_required_argument() {
        let imports = imports(&[("card", card())]);
        let err = expand("\n<card></card>", &imports, &mut UniqueCounter::new()).unwrap_err();
        match &err.kind {
            ErrorKind::MissingArgument { tag, arg } => {
                assert_eq!(tag, "card");
                assert_eq!(arg, "title");
            }
            other => panic!("Expected MissingArgument, got {:?}", other),
        }
        assert_eq!(err.location.line, Some(2));
        assert_eq!(err.location.file.as_deref(), Some(Path::new("/main.htmlp")));
    }

    #[test]
    fn test_extra_arguments() {
        let imports = imports(&[("card", card())]);
        let err = expand(
            r#"<card title="a" b="1" a="2"></card>"#,
            &imports,
            &mut UniqueCounter::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::ExtraArguments { ref args } if args.len() == 2
        ));
    }

    #[test]
    fn test_attribute_placeholders() {
        let button = component(
            "/c/button.htmlp",
            r#"<template args="?disabled label ?kind"><button $disabled class="btn $kind" title="$kind">$label</button></template>"#,
            Imports::new(),
        );
        let imports = imports(&[("btn", button)]);
        let mut counter = UniqueCounter::new();

        let html = expand(r#"<btn label="Go"></btn>"#, &imports, &mut counter).unwrap();
        assert_eq!(html, r#"<button class="btn ">Go</button>"#);

        let html = expand(r#"<btn label="Go" disabled kind="big"></btn>"#, &imports, &mut counter)
            .unwrap();
        assert_eq!(
            html,
            r#"<button disabled class="btn big" title="big">Go</button>"#
        );
    }

    #[test]
    fn test_blank_attributes_dropped() {
        let c = component(
            "/c/c.htmlp",
            r#"<template args="?x"><div hidden class="" data-a="$x" title=" "></div></template>"#,
            Imports::new(),
        );
        let imports = imports(&[("c", c)]);
        let html = expand("<c></c>", &imports, &mut UniqueCounter::new()).unwrap();
        assert_eq!(html, "<div hidden></div>");
    }

    #[test]
    fn test_blank_attributes_kept_without_arguments() {
        let c = component(
            "/c/c.htmlp",
            r#"<template><div class=""></div></template>"#,
            Imports::new(),
        );
        let imports = imports(&[("c", c)]);
        let html = expand("<c></c>", &imports, &mut UniqueCounter::new()).unwrap();
        assert_eq!(html, r#"<div class=""></div>"#);
    }

    #[test]
    fn test_usage_attribute_names_ignore_case() {
        let imports = imports(&[("card", card())]);
        let mut counter = UniqueCounter::new();
        let html = expand(r#"<card TITLE="Hi" SubTitle="s"></card>"#, &imports, &mut counter)
            .unwrap();
        assert_eq!(html, r#"<div class="card"><h1>Hi</h1><p>s</p></div>"#);

        let err = expand(r#"<card Title="Hi" COLOR="red"></card>"#, &imports, &mut counter)
            .unwrap_err();
        assert_eq!(err.kind.to_string(), "Extra argument 'color'");
    }

    #[test]
    fn test_unique_scoping() {
        let field = component(
            "/c/field.htmlp",
            r#"<template><label for="!x"></label><input id="!x"></template>"#,
            Imports::new(),
        );
        let imports = imports(&[("field", field)]);
        let mut counter = UniqueCounter::new();
        let html = expand("<field></field><field></field>", &imports, &mut counter).unwrap();
        assert_eq!(
            html,
            r#"<label for="A"></label><input id="A"><label for="B"></label><input id="B">"#
        );
    }

    #[test]
    fn test_unique_requires_terminator() {
        let mut counter = UniqueCounter::new();
        let mut uniques = UniquesPerComponent::new();
        assert_eq!(replace_uniques("!a !b.c !a", &mut uniques, &mut counter), "A !b.c A");
    }

    #[test]
    fn test_bound_value_replaces_unique_form() {
        let def = ArgDefinition::parse("name");
        let arg = BoundArg {
            def: &def,
            value: Some("x".into()),
        };
        assert_eq!(arg.substitute_in("$name !name !names"), "x x !names");
    }

    #[test]
    fn test_no_template_vanishes() {
        let empty = component("/c/empty.htmlp", "<style>p{}</style>", Imports::new());
        let imports = imports(&[("empty", empty)]);
        let html = expand("<p>a<empty>b</empty>c</p>", &imports, &mut UniqueCounter::new())
            .unwrap();
        assert_eq!(html, "<p>ac</p>");
    }

    #[test]
    fn test_nested_components_resolve_lexically() {
        let inner = component("/c/inner.htmlp", "<template><b>inner</b></template>", Imports::new());
        let outer = component(
            "/c/outer.htmlp",
            "<template><i><widget></widget></i></template>",
            imports(&[("widget", inner)]),
        );
        // The caller's own `widget` must not leak into the outer component
        let caller_widget = component("/c/other.htmlp", "<template><u></u></template>", Imports::new());
        let imports = imports(&[("outer", outer), ("widget", caller_widget)]);
        let html = expand("<outer></outer><widget></widget>", &imports, &mut UniqueCounter::new())
            .unwrap();
        assert_eq!(html, "<i><b>inner</b></i><u></u>");
    }

    #[test]
    fn test_children_expanded_with_caller_imports() {
        let wrap = component(
            "/c/wrap.htmlp",
            "<template><section>$children</section></template>",
            Imports::new(),
        );
        let imports = imports(&[("wrap", wrap), ("card", card())]);
        let html = expand(
            r#"<wrap><card title="T"></card></wrap>"#,
            &imports,
            &mut UniqueCounter::new(),
        )
        .unwrap();
        assert_eq!(
            html,
            r#"<section><div class="card"><h1>T</h1><p></p></div></section>"#
        );
    }

    #[test]
    fn test_children_slot_may_repeat() {
        let twice = component(
            "/c/twice.htmlp",
            "<template><a> $children </a><b>$children</b></template>",
            Imports::new(),
        );
        let imports = imports(&[("twice", twice)]);
        let html = expand("<twice><i>x</i></twice>", &imports, &mut UniqueCounter::new()).unwrap();
        assert_eq!(html, "<a><i>x</i></a><b><i>x</i></b>");
    }

    #[test]
    fn test_cached_template_not_mutated() {
        let def = card();
        let before = def.template.clone();
        let imports = imports(&[("card", Rc::clone(&def))]);
        expand(r#"<card title="A">x</card>"#, &imports, &mut UniqueCounter::new()).unwrap();
        assert_eq!(def.template, before);
    }

    #[test]
    fn test_error_in_nested_component_names_its_file() {
        let inner = card();
        let outer = component(
            "/c/outer.htmlp",
            "<template>\n\n<card></card></template>",
            imports(&[("card", inner)]),
        );
        let imports = imports(&[("outer", outer)]);
        let err = expand("<outer></outer>", &imports, &mut UniqueCounter::new()).unwrap_err();
        assert_eq!(err.location.file.as_deref(), Some(Path::new("/c/outer.htmlp")));
        assert_eq!(err.location.line, Some(3));
    }
}
