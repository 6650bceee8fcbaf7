//! Parser seam.
//!
//! The engine does not tokenize any concrete syntax; it consumes unresolved
//! value trees from a [`ConfigParser`] implementation. [`Syntax`] and
//! [`ParseOptions`] exist so parsers and includers agree on what is being
//! parsed and how strictly.

use crate::error::Result;
use crate::value::ConfigValue;
use conforma_origin::Origin;
use std::fmt;
use std::rc::Rc;

/// The concrete syntax of a configuration source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    /// Plain JSON.
    Json,
    /// The JSON superset with substitutions, includes, and unquoted strings.
    Hocon,
    /// Java-style `key=value` properties.
    Properties,
}

impl Syntax {
    /// Guess the syntax from a filename extension.
    pub fn from_filename(filename: &str) -> Option<Syntax> {
        let extension = filename.rsplit_once('.')?.1;
        match extension {
            "json" => Some(Syntax::Json),
            "conf" => Some(Syntax::Hocon),
            "properties" => Some(Syntax::Properties),
            _ => None,
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Syntax::Json => "JSON",
            Syntax::Hocon => "HOCON",
            Syntax::Properties => "properties",
        };
        write!(f, "{}", name)
    }
}

/// Options passed to a parser or includer.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    syntax: Option<Syntax>,
    origin_description: Option<String>,
    allow_missing: bool,
}

impl ParseOptions {
    /// Syntax guessed from the source name, default origin description,
    /// missing sources tolerated.
    pub fn defaults() -> Self {
        Self {
            syntax: None,
            origin_description: None,
            allow_missing: true,
        }
    }

    /// Force a syntax instead of guessing from the source name.
    pub fn with_syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = Some(syntax);
        self
    }

    /// Replace the origin description the parser would generate.
    pub fn with_origin_description(mut self, description: impl Into<String>) -> Self {
        self.origin_description = Some(description.into());
        self
    }

    /// Whether a source that does not exist parses as an empty object
    /// instead of failing.
    pub fn with_allow_missing(mut self, value: bool) -> Self {
        self.allow_missing = value;
        self
    }

    pub fn syntax(&self) -> Option<Syntax> {
        self.syntax
    }

    pub fn origin_description(&self) -> Option<&str> {
        self.origin_description.as_deref()
    }

    pub fn allow_missing(&self) -> bool {
        self.allow_missing
    }
}

/// Parses source text into an unresolved value tree whose nodes carry
/// origins. The returned root must be object-kind.
pub trait ConfigParser {
    fn parse(&self, text: &str, origin: &Origin, options: &ParseOptions) -> Result<Rc<ConfigValue>>;
}

/// Something that can be parsed: a file, a URL, an in-memory string. Pairs a
/// source of text with the origin to stamp on the values.
pub trait Parseable {
    /// Origin describing this source, usable before parsing (e.g. for error
    /// messages about the source itself).
    fn origin(&self) -> Origin;

    /// Parse the source into an unresolved object-kind tree.
    fn parse(&self, options: &ParseOptions) -> Result<Rc<ConfigValue>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_from_filename() {
        assert_eq!(Syntax::from_filename("app.json"), Some(Syntax::Json));
        assert_eq!(Syntax::from_filename("app.conf"), Some(Syntax::Hocon));
        assert_eq!(
            Syntax::from_filename("app.properties"),
            Some(Syntax::Properties)
        );
        assert_eq!(Syntax::from_filename("app.yaml"), None);
        assert_eq!(Syntax::from_filename("no-extension"), None);
    }

    #[test]
    fn test_parse_options_defaults() {
        let options = ParseOptions::defaults();
        assert_eq!(options.syntax(), None);
        assert_eq!(options.origin_description(), None);
        assert!(options.allow_missing());
    }

    #[test]
    fn test_parse_options_withers() {
        let options = ParseOptions::defaults()
            .with_syntax(Syntax::Json)
            .with_origin_description("test config")
            .with_allow_missing(false);
        assert_eq!(options.syntax(), Some(Syntax::Json));
        assert_eq!(options.origin_description(), Some("test config"));
        assert!(!options.allow_missing());
    }
}
