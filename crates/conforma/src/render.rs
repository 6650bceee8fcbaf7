//! Renderer seam.
//!
//! Pretty-printing is not implemented here; [`RenderOptions`] defines the
//! knobs a [`ConfigRenderer`] implementation is expected to honor.

use crate::error::Result;
use crate::value::ConfigValue;
use std::rc::Rc;

/// Options a renderer should honor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    origin_comments: bool,
    comments: bool,
    formatted: bool,
    json: bool,
}

impl RenderOptions {
    /// Human-oriented output: indented, with comments from the source and a
    /// generated comment per value naming its origin.
    pub fn defaults() -> Self {
        Self {
            origin_comments: true,
            comments: true,
            formatted: true,
            json: false,
        }
    }

    /// Machine-oriented output: valid JSON, no whitespace, no comments.
    /// Requires a resolved tree, since substitutions have no JSON form.
    pub fn concise() -> Self {
        Self {
            origin_comments: false,
            comments: false,
            formatted: false,
            json: true,
        }
    }

    /// Whether to emit a generated comment per value naming its origin.
    pub fn with_origin_comments(mut self, value: bool) -> Self {
        self.origin_comments = value;
        self
    }

    /// Whether to carry comments from the source through to the output.
    pub fn with_comments(mut self, value: bool) -> Self {
        self.comments = value;
        self
    }

    /// Whether to indent and line-break.
    pub fn with_formatted(mut self, value: bool) -> Self {
        self.formatted = value;
        self
    }

    /// Whether to restrict output to strict JSON rather than the extended
    /// syntax.
    pub fn with_json(mut self, value: bool) -> Self {
        self.json = value;
        self
    }

    pub fn origin_comments(&self) -> bool {
        self.origin_comments
    }

    pub fn comments(&self) -> bool {
        self.comments
    }

    pub fn formatted(&self) -> bool {
        self.formatted
    }

    pub fn json(&self) -> bool {
        self.json
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Renders a value tree to text.
pub trait ConfigRenderer {
    fn render(&self, value: &Rc<ConfigValue>, options: &RenderOptions) -> Result<String>;
}
