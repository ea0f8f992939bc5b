//! Printer and converter configuration.

/// Layout options for printing Nix source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatConfig {
    /// Number of spaces per indentation level.
    /// Default: 2
    pub indent_width: usize,

    /// Use tabs instead of spaces for indentation.
    /// Default: false
    pub use_tabs: bool,

    /// Newline style.
    /// Default: NewlineStyle::Lf
    pub newline: NewlineStyle,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            indent_width: 2,
            use_tabs: false,
            newline: NewlineStyle::Lf,
        }
    }
}

impl FormatConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set indent width.
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    /// Set tab usage.
    pub fn with_tabs(mut self, use_tabs: bool) -> Self {
        self.use_tabs = use_tabs;
        self
    }

    /// Set newline style.
    pub fn with_newline(mut self, style: NewlineStyle) -> Self {
        self.newline = style;
        self
    }

    /// Whitespace that starts a line at the given nesting level.
    pub fn indent_string(&self, level: usize) -> String {
        if self.use_tabs {
            "\t".repeat(level)
        } else {
            " ".repeat(level * self.indent_width)
        }
    }
}

/// Newline style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewlineStyle {
    /// Unix-style line endings (LF).
    #[default]
    Lf,
    /// Windows-style line endings (CRLF).
    Crlf,
}

impl NewlineStyle {
    /// Get the newline string.
    pub fn as_str(self) -> &'static str {
        match self {
            NewlineStyle::Lf => "\n",
            NewlineStyle::Crlf => "\r\n",
        }
    }
}

/// Configuration for converting native values into nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Deepest array/object nesting accepted before the input is treated as
    /// cyclic.
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { max_depth: 128 }
    }
}

impl Config {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
