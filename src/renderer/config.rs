//! Configuration for HTML output

/// Configuration options for HTML output
#[derive(Debug, Clone, Default)]
pub struct HtmlConfig {
    /// Drop comments and collapse insignificant whitespace
    pub minify: bool,
}

impl HtmlConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to minify output
    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }
}
