//! Tree builder: turns the token stream into a [`Document`]
//!
//! The builder is lenient in the way browsers are. It never fails: stray
//! close tags are dropped, unclosed elements are closed at end of input.

use logos::{Lexer, Logos};
use tracing::{trace, warn};

use super::dom::{is_raw_text, is_void, Attribute, Document, Element, Node};
use super::lexer::{LineIndex, TagToken, Token};

/// Parse markup into a document tree
pub fn parse(source: &str) -> Document {
    TreeBuilder::new(source).build()
}

struct TreeBuilder<'s> {
    source: &'s str,
    lines: LineIndex,
    /// Open elements, innermost last
    stack: Vec<Element>,
    root: Vec<Node>,
}

impl<'s> TreeBuilder<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            lines: LineIndex::new(source),
            stack: Vec::new(),
            root: Vec::new(),
        }
    }

    fn build(mut self) -> Document {
        let mut lex = Token::lexer(self.source);

        while let Some(token) = lex.next() {
            match token {
                Ok(Token::TagOpen(name)) => {
                    let line = self.lines.line_of(lex.span().start);
                    let mut tag_lex = lex.morph::<TagToken>();
                    let (attrs, self_closing) = read_attributes(&mut tag_lex);
                    lex = tag_lex.morph::<Token>();

                    let element = Element {
                        name,
                        attrs,
                        children: Vec::new(),
                        line,
                    };
                    if self_closing || is_void(&element.name) {
                        self.push(Node::Element(element));
                    } else if is_raw_text(&element.name) {
                        self.push_raw_text_element(element, &mut lex);
                    } else {
                        self.stack.push(element);
                    }
                }
                Ok(Token::TagClose(name)) => self.close(&name, lex.span().start),
                Ok(Token::Comment(body)) => self.push(Node::Comment(body)),
                Ok(Token::Doctype(body)) => self.push(Node::Doctype(body)),
                Ok(Token::Text) | Err(()) => self.push_text(lex.slice()),
            }
        }

        while let Some(open) = self.stack.pop() {
            trace!(tag = %open.name, line = open.line, "closing element at end of input");
            self.push(Node::Element(open));
        }
        Document::new(self.root)
    }

    /// Read raw text up to `</name`, leaving the close tag for the lexer
    fn push_raw_text_element(&mut self, mut element: Element, lex: &mut Lexer<'s, Token>) {
        let rest = lex.remainder();
        let needle = format!("</{}", element.name);
        let end = rest
            .to_ascii_lowercase()
            .find(&needle)
            .unwrap_or(rest.len());
        if end > 0 {
            element.children.push(Node::Text(rest[..end].to_string()));
        }
        lex.bump(end);
        self.stack.push(element);
    }

    fn children_mut(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(open) => &mut open.children,
            None => &mut self.root,
        }
    }

    fn push(&mut self, node: Node) {
        self.children_mut().push(node);
    }

    /// Append text, merging with a preceding text node
    fn push_text(&mut self, text: &str) {
        let children = self.children_mut();
        if let Some(Node::Text(prev)) = children.last_mut() {
            prev.push_str(text);
        } else {
            children.push(Node::Text(text.to_string()));
        }
    }

    fn close(&mut self, name: &str, offset: usize) {
        let Some(depth) = self.stack.iter().rposition(|open| open.name == name) else {
            if !is_void(name) {
                warn!(
                    tag = name,
                    line = self.lines.line_of(offset),
                    "ignoring close tag without a matching open tag"
                );
            }
            return;
        };
        while self.stack.len() > depth {
            if let Some(open) = self.stack.pop() {
                self.push(Node::Element(open));
            }
        }
    }
}

/// Read attributes up to the end of the open tag
///
/// Returns the attributes and whether the tag was self-closing. The first
/// occurrence of a repeated attribute wins.
fn read_attributes(lex: &mut Lexer<'_, TagToken>) -> (Vec<Attribute>, bool) {
    let mut attrs: Vec<Attribute> = Vec::new();
    let mut pending: Option<String> = None;
    let mut expect_quoted = false;

    while let Some(token) = lex.next() {
        match token {
            Ok(TagToken::End) => {
                finish(&mut attrs, pending.take(), None);
                return (attrs, false);
            }
            Ok(TagToken::SelfClose) => {
                finish(&mut attrs, pending.take(), None);
                return (attrs, true);
            }
            Ok(TagToken::Equals) if pending.is_some() => match unquoted_value(lex) {
                Some(value) => finish(&mut attrs, pending.take(), Some(value)),
                None => expect_quoted = true,
            },
            Ok(TagToken::Quoted(value)) if expect_quoted => {
                finish(&mut attrs, pending.take(), Some(value));
                expect_quoted = false;
            }
            Ok(TagToken::Name(name)) => {
                finish(&mut attrs, pending.take(), None);
                pending = Some(name);
            }
            // Stray slashes and equals signs, quotes without a name,
            // unterminated quotes
            Ok(TagToken::Equals) | Ok(TagToken::Slash) | Ok(TagToken::Quoted(_)) | Err(()) => {}
        }
    }

    finish(&mut attrs, pending.take(), None);
    (attrs, false)
}

/// Read the value after `=` when it is unquoted
///
/// An unquoted value runs to whitespace or `>` and may contain `/` and `=`.
/// Returns `None` when a quoted value follows; the lexer reads that one.
fn unquoted_value(lex: &mut Lexer<'_, TagToken>) -> Option<String> {
    let rest = lex.remainder();
    let value_start = rest.len() - rest.trim_start_matches(is_space).len();
    let value_rest = &rest[value_start..];
    if value_rest.starts_with(['"', '\'']) {
        return None;
    }
    let len = value_rest
        .find(|c: char| is_space(c) || c == '>')
        .unwrap_or(value_rest.len());
    let value = value_rest[..len].to_string();
    lex.bump(value_start + len);
    Some(value)
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | '\x0c')
}

fn finish(attrs: &mut Vec<Attribute>, name: Option<String>, value: Option<String>) {
    if let Some(name) = name {
        if !attrs.iter().any(|a| a.name == name) {
            attrs.push(Attribute { name, value });
        }
    }
}
