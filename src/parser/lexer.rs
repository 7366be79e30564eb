//! Lexer for htmlp markup using logos
//!
//! Markup needs two lexing modes: [`Token`] for content between tags and
//! [`TagToken`] for the inside of an open tag. The tree builder switches
//! between them with [`logos::Lexer::morph`].

use logos::{Lexer, Logos};

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Tokens outside of tags
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    /// `<!-- ... -->`, payload is the comment body
    #[token("<!--", comment)]
    Comment(String),

    #[regex(r"<![dD][oO][cC][tT][yY][pP][eE][^>]*>", |lex| {
        let s = lex.slice();
        s[2..s.len() - 1].to_string()
    })]
    Doctype(String),

    /// `<name`, the attributes follow in tag mode
    #[regex(r"<[a-zA-Z][^ \t\r\n\f/<>]*", |lex| lex.slice()[1..].to_ascii_lowercase())]
    TagOpen(String),

    #[regex(r"</[a-zA-Z][^ \t\r\n\f/<>]*[ \t\r\n\f]*>", close_tag_name)]
    TagClose(String),

    /// Character data; a `<` that starts no tag is text too
    #[regex(r"[^<]+")]
    #[token("<")]
    Text,
}

/// Tokens inside an open tag
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TagToken {
    #[token(">")]
    End,

    #[token("/>")]
    SelfClose,

    #[token("/")]
    Slash,

    #[token("=")]
    Equals,

    #[regex(r#""[^"]*""#, unquote)]
    #[regex(r"'[^']*'", unquote)]
    Quoted(String),

    /// Attribute name. Unquoted values are read by the tree builder, since
    /// they may contain `/` and `=`
    #[regex(r#"[^ \t\r\n\f"'<>/=]+"#, |lex| lex.slice().to_string())]
    Name(String),
}

fn comment(lex: &mut Lexer<Token>) -> String {
    let rest = lex.remainder();
    // An unterminated comment runs to the end of input
    let (body_len, consumed) = match rest.find("-->") {
        Some(end) => (end, end + 3),
        None => (rest.len(), rest.len()),
    };
    let body = rest[..body_len].to_string();
    lex.bump(consumed);
    body
}

fn close_tag_name(lex: &mut Lexer<Token>) -> String {
    let s = lex.slice();
    s[2..s.len() - 1].trim_end().to_ascii_lowercase()
}

fn unquote(lex: &mut Lexer<TagToken>) -> String {
    let s = lex.slice();
    s[1..s.len() - 1].to_string()
}

/// Maps byte offsets to 1-based line numbers
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            starts,
            len: source.len(),
        }
    }

    /// 1-based line containing the byte offset
    pub fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(i) => i + 1,
            Err(i) => i,
        }
    }

    /// Byte range of a 1-based line, without its newline
    pub fn line_span(&self, line: usize) -> Option<Span> {
        let start = *self.starts.get(line.checked_sub(1)?)?;
        let end = self
            .starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(self.len);
        Some(start..end)
    }
}
