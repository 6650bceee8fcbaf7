//! Parsed form of a `${path}` / `${?path}` substitution.

use crate::path::Path;
use std::fmt;

/// A substitution expression: a target path plus an "optional" flag.
///
/// Optional substitutions (`${?path}`) quietly vanish when the target path
/// has no value; required ones (`${path}`) fail resolution instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubstitutionExpression {
    path: Path,
    optional: bool,
}

impl SubstitutionExpression {
    pub fn new(path: Path, optional: bool) -> Self {
        Self { path, optional }
    }

    /// The path this expression points at, relative to the tree root.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True for the `${?path}` form.
    pub fn optional(&self) -> bool {
        self.optional
    }

    /// The same expression pointing at a different path. Used when a subtree
    /// is grafted under a prefix; the prefix length is tracked separately by
    /// the reference node so environment lookups are not re-rooted.
    pub fn change_path(&self, new_path: Path) -> Self {
        if new_path == self.path {
            self.clone()
        } else {
            Self {
                path: new_path,
                optional: self.optional,
            }
        }
    }
}

impl fmt::Display for SubstitutionExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.optional {
            write!(f, "${{?{}}}", self.path.render())
        } else {
            write!(f, "${{{}}}", self.path.render())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(path: &str, optional: bool) -> SubstitutionExpression {
        SubstitutionExpression::new(Path::parse(path).unwrap(), optional)
    }

    #[test]
    fn test_render() {
        insta::assert_snapshot!(expr("foo.bar", false), @"${foo.bar}");
        insta::assert_snapshot!(expr("foo.bar", true), @"${?foo.bar}");
    }

    #[test]
    fn test_render_quotes_path_elements() {
        let e = SubstitutionExpression::new(Path::new_key("a.b"), false);
        assert_eq!(e.to_string(), "${\"a.b\"}");
    }

    #[test]
    fn test_equality_covers_both_fields() {
        assert_eq!(expr("a.b", false), expr("a.b", false));
        assert_ne!(expr("a.b", false), expr("a.b", true));
        assert_ne!(expr("a.b", false), expr("a.c", false));
    }

    #[test]
    fn test_change_path() {
        let e = expr("b", false);
        let prefixed = e.change_path(e.path().prepend(&Path::new_key("a")));
        assert_eq!(prefixed, expr("a.b", false));
        assert!(!prefixed.optional());
    }
}
