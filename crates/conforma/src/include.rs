//! Include seam.
//!
//! How an include directive turns a name into configuration is up to the
//! host: the engine only defines the contract. An includer produces an
//! object-kind tree to merge at the include point; "nothing" is expressed by
//! an empty object when missing sources are tolerated, or by a
//! [`ConfigError::Include`](crate::ConfigError::Include) when they are not,
//! never by an absent value.

use crate::error::Result;
use crate::parse::{ParseOptions, Parseable};
use crate::value::ConfigValue;
use std::rc::Rc;

/// What an includer may ask of the file (or URL, or resource) it was invoked
/// from.
pub trait IncludeContext {
    /// Interpret `name` relative to the including source, if that makes
    /// sense for the source kind. `None` when there is no sensible relative
    /// interpretation; the includer then falls back to its own search rules.
    fn relative_to(&self, name: &str) -> Option<Box<dyn Parseable>>;

    /// The parse options in effect at the include point.
    fn parse_options(&self) -> ParseOptions;
}

/// Satisfies include directives.
pub trait Includer {
    /// Produce the object-kind tree for `include "name"`. Implementations
    /// should honor [`ParseOptions::allow_missing`] from the context when
    /// deciding between an empty object and an error.
    fn include(&self, context: &dyn IncludeContext, name: &str) -> Result<Rc<ConfigValue>>;
}
