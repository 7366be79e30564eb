//! Owned markup tree
//!
//! Every node owns its children, so `Clone` is a deep copy with no aliasing
//! back to the original tree.

/// Elements that never have children or a close tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr", "import",
];

/// Elements whose content is raw text up to the matching close tag
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Check if a tag name is a void element
pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Check if a tag name holds raw text
pub fn is_raw_text(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&name)
}

/// A parsed document: the list of top-level nodes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub nodes: Vec<Node>,
}

impl Document {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Top-level elements, skipping text, comments and doctypes
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.nodes.iter().filter_map(Node::as_element)
    }

    /// All elements with the given tag name, at any depth, in document order
    pub fn find_all(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        collect_named(&self.nodes, name, &mut found);
        found
    }
}

/// A node in the markup tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Raw text, entities kept verbatim
    Text(String),
    Comment(String),
    /// Doctype body without the surrounding `<!` and `>`
    Doctype(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

/// An element attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// `None` for attributes written without a value, as in `<input disabled>`
    pub value: Option<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// An attribute written without a value
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// The value, empty for a bare attribute
    pub fn value(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }
}

/// An element with its attributes and children
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Lower-cased tag name
    pub name: String,
    pub attrs: Vec<Attribute>,
    pub children: Vec<Node>,
    /// 1-based source line of the open tag
    pub line: usize,
}

impl Element {
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            line,
        }
    }

    /// Add an attribute (builder style)
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Add a child node (builder style)
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(Attribute::value)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name == name)
    }

    /// Set an attribute, replacing an existing value in place
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let attr = Attribute::new(name, value);
        match self.attrs.iter_mut().find(|a| a.name == attr.name) {
            Some(existing) => *existing = attr,
            None => self.attrs.push(attr),
        }
    }

    /// Remove an attribute, returning its value if it had one
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attrs.iter().position(|a| a.name == name)?;
        self.attrs.remove(idx).value
    }

    /// Child elements, skipping other node kinds
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        push_text(&self.children, &mut out);
        out
    }
}

fn push_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => push_text(&el.children, out),
            _ => {}
        }
    }
}

fn collect_named<'a>(nodes: &'a [Node], name: &str, found: &mut Vec<&'a Element>) {
    for node in nodes {
        if let Node::Element(el) = node {
            if el.name == name {
                found.push(el);
            }
            collect_named(&el.children, name, found);
        }
    }
}

/// Remove every element with the given name from the tree, at any depth
///
/// Removed elements are returned in document order. Matching elements are
/// taken whole; their subtrees are not searched.
pub fn take_elements(nodes: &mut Vec<Node>, name: &str) -> Vec<Element> {
    let mut taken = Vec::new();
    take_into(nodes, name, &mut taken);
    taken
}

fn take_into(nodes: &mut Vec<Node>, name: &str, taken: &mut Vec<Element>) {
    let old = std::mem::take(nodes);
    for node in old {
        match node {
            Node::Element(el) if el.name == name => taken.push(el),
            Node::Element(mut el) => {
                take_into(&mut el.children, name, taken);
                nodes.push(Node::Element(el));
            }
            other => nodes.push(other),
        }
    }
}

/// Visit every element in the tree, parents before children
pub fn walk_elements_mut(nodes: &mut [Node], visit: &mut impl FnMut(&mut Element)) {
    for node in nodes {
        if let Node::Element(el) = node {
            visit(el);
            walk_elements_mut(&mut el.children, visit);
        }
    }
}

/// Visit every text node in the tree
pub fn walk_text_mut(nodes: &mut [Node], visit: &mut impl FnMut(&mut String)) {
    for node in nodes {
        match node {
            Node::Text(text) => visit(text),
            Node::Element(el) => walk_text_mut(&mut el.children, visit),
            _ => {}
        }
    }
}
