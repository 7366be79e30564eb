//! HTML serialization of markup trees

use crate::parser::{is_void, Document, Element, Node};

use super::HtmlConfig;

/// Elements whose text is written exactly as parsed when minifying
const PRESERVE_WHITESPACE: &[&str] = &["pre", "textarea", "script", "style"];

/// Elements whose whitespace-only text children carry no meaning
const STRUCTURAL: &[&str] = &["html", "head"];

/// Serialize a document to a string
pub fn render_html(doc: &Document, config: &HtmlConfig) -> String {
    render_nodes(&doc.nodes, config)
}

/// Serialize a list of sibling nodes at document level
pub fn render_nodes(nodes: &[Node], config: &HtmlConfig) -> String {
    let mut writer = HtmlWriter::new(config);
    writer.write_nodes(nodes, None);
    writer.finish()
}

struct HtmlWriter<'c> {
    config: &'c HtmlConfig,
    out: String,
    /// Depth of open whitespace-preserving elements
    preserve: usize,
}

impl<'c> HtmlWriter<'c> {
    fn new(config: &'c HtmlConfig) -> Self {
        Self {
            config,
            out: String::new(),
            preserve: 0,
        }
    }

    fn finish(self) -> String {
        self.out
    }

    fn write_nodes(&mut self, nodes: &[Node], parent: Option<&str>) {
        for node in nodes {
            match node {
                Node::Element(el) => self.write_element(el),
                Node::Text(text) => self.write_text(text, parent),
                Node::Comment(body) => {
                    if !self.config.minify {
                        self.out.push_str("<!--");
                        self.out.push_str(body);
                        self.out.push_str("-->");
                    }
                }
                Node::Doctype(body) => {
                    self.out.push_str("<!");
                    self.out.push_str(body);
                    self.out.push('>');
                }
            }
        }
    }

    fn write_element(&mut self, el: &Element) {
        self.out.push('<');
        self.out.push_str(&el.name);
        for attr in &el.attrs {
            self.out.push(' ');
            self.out.push_str(&attr.name);
            if let Some(value) = &attr.value {
                self.out.push_str("=\"");
                self.out.push_str(&value.replace('"', "&quot;"));
                self.out.push('"');
            }
        }
        self.out.push('>');

        if is_void(&el.name) {
            return;
        }

        let preserve = PRESERVE_WHITESPACE.contains(&el.name.as_str());
        if preserve {
            self.preserve += 1;
        }
        self.write_nodes(&el.children, Some(&el.name));
        if preserve {
            self.preserve -= 1;
        }

        self.out.push_str("</");
        self.out.push_str(&el.name);
        self.out.push('>');
    }

    fn write_text(&mut self, text: &str, parent: Option<&str>) {
        if !self.config.minify || self.preserve > 0 {
            self.out.push_str(text);
            return;
        }
        if text.trim().is_empty() {
            let structural = parent.map_or(true, |p| STRUCTURAL.contains(&p));
            if structural || text.is_empty() {
                return;
            }
        }
        collapse_whitespace(text, &mut self.out);
    }
}

/// Push text with every run of whitespace replaced by one space
fn collapse_whitespace(text: &str, out: &mut String) {
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
}
