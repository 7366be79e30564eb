//! Markup parser for htmlp sources

pub mod dom;
pub mod lexer;
mod tree;

pub use dom::*;
pub use tree::parse;
