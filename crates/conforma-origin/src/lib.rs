//! # conforma-origin
//!
//! Provenance metadata for configuration values.
//!
//! Every node in a conforma value tree carries an [`Origin`] describing where
//! the value came from: a human-readable description, an optional filename,
//! URL, or bundled-resource name, a line number, and any comments that
//! appeared to "go with" the value in the source file.
//!
//! Origins exist purely for diagnostics. They are deliberately excluded from
//! value equality and hashing, so two structurally identical trees parsed
//! from different files compare equal. Accuracy is best effort; nothing in
//! the engine depends on an origin being precise.
//!
//! This crate is a leaf so that external parsers can construct origins
//! without depending on the engine itself.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Provenance of a configuration value, for use in error messages.
///
/// Construct one with [`Origin::new_simple`], [`Origin::new_file`], or
/// [`Origin::new_resource`], then refine it with the wither-style setters:
///
/// ```rust
/// use conforma_origin::Origin;
///
/// let origin = Origin::new_file("app.conf").with_line(12);
/// assert_eq!(origin.to_string(), "app.conf: 12");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Origin {
    description: String,
    filename: Option<String>,
    url: Option<String>,
    resource: Option<String>,
    line: Option<usize>,
    comments: Vec<String>,
}

impl Origin {
    /// Create an origin with only a description (e.g. `"hardcoded value"`,
    /// `"env variable PATH"`).
    pub fn new_simple(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            filename: None,
            url: None,
            resource: None,
            line: None,
            comments: Vec::new(),
        }
    }

    /// Create an origin for a file. The description is the filename.
    pub fn new_file(filename: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            description: filename.clone(),
            filename: Some(filename),
            url: None,
            resource: None,
            line: None,
            comments: Vec::new(),
        }
    }

    /// Create an origin for a bundled resource (the analog of a classpath
    /// resource: something looked up by name rather than by path).
    pub fn new_resource(resource: impl Into<String>) -> Self {
        let resource = resource.into();
        Self {
            description: resource.clone(),
            filename: None,
            url: None,
            resource: Some(resource),
            line: None,
            comments: Vec::new(),
        }
    }

    /// Describe the combination of two origins, for values produced by
    /// merging. Keeps the left origin's location fields.
    pub fn merged(left: &Origin, right: &Origin) -> Origin {
        if left == right {
            return left.clone();
        }
        let mut merged = left.clone();
        merged.description = format!("merge of {} and {}", left.description, right.description);
        merged.comments = Vec::new();
        merged
    }

    /// Set the line number (1-based).
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Set the URL this value was loaded from.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Attach the comments that immediately preceded this value in the
    /// source, with comment markers stripped.
    pub fn with_comments(mut self, comments: Vec<String>) -> Self {
        self.comments = comments;
        self
    }

    /// A string describing the origin, never empty.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The filename, if the origin was a file.
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// The URL, if the origin has a meaningful one.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// The resource name, if the origin was a bundled resource.
    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    /// The line number (1-based) where the value originated, if known.
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    /// Comments that appeared to go with this value. Often empty.
    pub fn comments(&self) -> &[String] {
        &self.comments
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}: {}", self.description, line),
            None => write!(f, "{}", self.description),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_origin() {
        let origin = Origin::new_simple("hardcoded value");
        assert_eq!(origin.description(), "hardcoded value");
        assert_eq!(origin.filename(), None);
        assert_eq!(origin.line(), None);
        assert!(origin.comments().is_empty());
        assert_eq!(origin.to_string(), "hardcoded value");
    }

    #[test]
    fn test_file_origin_display_includes_line() {
        let origin = Origin::new_file("app.conf").with_line(42);
        assert_eq!(origin.filename(), Some("app.conf"));
        assert_eq!(origin.to_string(), "app.conf: 42");
    }

    #[test]
    fn test_resource_origin() {
        let origin = Origin::new_resource("reference.conf");
        assert_eq!(origin.resource(), Some("reference.conf"));
        assert_eq!(origin.description(), "reference.conf");
    }

    #[test]
    fn test_merged_identical_origins_collapse() {
        let a = Origin::new_file("a.conf").with_line(1);
        let merged = Origin::merged(&a, &a.clone());
        assert_eq!(merged, a);
    }

    #[test]
    fn test_merged_distinct_origins_describe_both() {
        let a = Origin::new_file("a.conf");
        let b = Origin::new_file("b.conf");
        let merged = Origin::merged(&a, &b);
        assert_eq!(merged.description(), "merge of a.conf and b.conf");
        assert_eq!(merged.filename(), Some("a.conf"));
    }

    #[test]
    fn test_comments_are_not_part_of_display() {
        let origin = Origin::new_file("a.conf")
            .with_line(3)
            .with_comments(vec!["explains the value".to_string()]);
        assert_eq!(origin.comments(), ["explains the value"]);
        assert_eq!(origin.to_string(), "a.conf: 3");
    }

    #[test]
    fn test_serde_round_trip() {
        let origin = Origin::new_file("a.conf").with_line(7).with_url("file:///a.conf");
        let json = serde_json::to_string(&origin).unwrap();
        let back: Origin = serde_json::from_str(&json).unwrap();
        assert_eq!(back, origin);
    }
}
