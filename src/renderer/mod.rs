//! HTML renderer for compiled documents
//!
//! This module turns a markup tree back into text, optionally minified.

pub mod config;
pub mod html;

pub use config::HtmlConfig;
pub use html::{render_html, render_nodes};
