/// Options for writing the text format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeOptions {
    /// String written once per nesting level (default: two spaces)
    pub indent: &'static str,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self { indent: "  " }
    }
}

impl SerializeOptions {
    /// Create new default options (two-space indent).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom indentation string (e.g. `"\t"` or `"    "`).
    pub const fn indent(mut self, indent: &'static str) -> Self {
        self.indent = indent;
        self
    }
}

/// Options for reading the text format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeserializeOptions {
    /// Reject unknown properties and input that ends before the closing `}`.
    ///
    /// When unset (the default), unknown properties are skipped along with
    /// their value, and a missing `}` at the end of the input is accepted.
    pub strict: bool,
}

impl DeserializeOptions {
    /// Create new default (lenient) options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict options.
    pub const fn strict() -> Self {
        Self { strict: true }
    }

    /// Set whether reading is strict.
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}
