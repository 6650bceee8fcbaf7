//! Error types for configuration operations.
//!
//! All user-visible failures are variants of [`ConfigError`]. Errors carry an
//! [`Origin`] wherever one is available so the message points at the
//! offending file and line. Internal invariant violations are not represented
//! here; those panic, since they indicate a bug in the engine rather than a
//! problem with the configuration.

use crate::value::ConfigValueType;
use conforma_origin::Origin;
use thiserror::Error;

/// Result type alias for conforma operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while building, merging, resolving, or reading
/// configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Malformed path expression or malformed source text.
    #[error("{origin}: {message}")]
    Syntax {
        /// Where the malformed text came from.
        origin: Origin,
        /// What was wrong with it.
        message: String,
    },

    /// A non-optional `${path}` whose target does not exist anywhere in the
    /// merged tree.
    #[error("{origin}: could not resolve substitution to a value: {expression}")]
    UnresolvedSubstitution {
        /// Origin of the substitution itself.
        origin: Origin,
        /// The rendered `${path}` expression.
        expression: String,
    },

    /// A non-optional substitution that transitively depends on itself.
    ///
    /// `trace` is the ordered chain of in-flight substitution expressions
    /// that formed the cycle, not just the first offending path.
    #[error("{origin}: {expression} was part of a cycle of substitutions involving: {trace}")]
    SubstitutionCycle {
        /// Origin of the substitution that closed the cycle.
        origin: Origin,
        /// The rendered expression that closed the cycle.
        expression: String,
        /// Comma-separated chain of expressions forming the cycle.
        trace: String,
    },

    /// A concrete value was requested through a node that still contains
    /// unresolved substitutions.
    #[error("configuration value was not resolved: {detail}; resolve the config before reading it")]
    NotResolved {
        /// What was being read (a rendered expression or path).
        detail: String,
    },

    /// No setting exists at the requested path.
    #[error("no configuration setting found for key '{path}'")]
    Missing {
        /// The rendered path that was requested.
        path: String,
    },

    /// The setting exists but is explicitly null.
    ///
    /// Null is distinct from missing: an explicit null shadows fallback
    /// values, so reads that need a concrete type report it separately.
    #[error("{origin}: configuration key '{path}' is null; expected {expected}")]
    Null {
        /// Origin of the null value.
        origin: Origin,
        /// The rendered path that was requested.
        path: String,
        /// The type the caller asked for.
        expected: &'static str,
    },

    /// The setting exists but has the wrong type.
    #[error("{origin}: configuration key '{path}' has type {actual}, expected {expected}")]
    WrongType {
        /// Origin of the offending value.
        origin: Origin,
        /// The rendered path that was requested.
        path: String,
        /// The type actually found.
        actual: ConfigValueType,
        /// The type the caller asked for.
        expected: &'static str,
    },

    /// An include directive could not be satisfied.
    #[error("{origin}: error including '{name}': {message}")]
    Include {
        /// Origin of the include directive.
        origin: Origin,
        /// The include argument.
        name: String,
        /// Why it failed.
        message: String,
    },
}

impl ConfigError {
    /// The origin associated with this error, if it has one.
    pub fn origin(&self) -> Option<&Origin> {
        match self {
            ConfigError::Syntax { origin, .. }
            | ConfigError::UnresolvedSubstitution { origin, .. }
            | ConfigError::SubstitutionCycle { origin, .. }
            | ConfigError::Null { origin, .. }
            | ConfigError::WrongType { origin, .. }
            | ConfigError::Include { origin, .. } => Some(origin),
            ConfigError::NotResolved { .. } | ConfigError::Missing { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_origin() {
        let err = ConfigError::UnresolvedSubstitution {
            origin: Origin::new_file("app.conf").with_line(4),
            expression: "${foo.bar}".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "app.conf: 4: could not resolve substitution to a value: ${foo.bar}"
        );
        assert!(err.origin().is_some());
    }

    #[test]
    fn test_missing_has_no_origin() {
        let err = ConfigError::Missing {
            path: "a.b".to_string(),
        };
        assert_eq!(err.origin(), None);
        assert_eq!(
            err.to_string(),
            "no configuration setting found for key 'a.b'"
        );
    }

    #[test]
    fn test_wrong_type_message() {
        let err = ConfigError::WrongType {
            origin: Origin::new_simple("test"),
            path: "port".to_string(),
            actual: ConfigValueType::String,
            expected: "number",
        };
        assert_eq!(
            err.to_string(),
            "test: configuration key 'port' has type string, expected number"
        );
    }
}
