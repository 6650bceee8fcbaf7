//! Dot-separated key paths into a configuration tree.
//!
//! A [`Path`] is an immutable, singly-linked sequence of string keys. Paths
//! always have at least one key; "no path" is `Option<Path>`, never an empty
//! path. The linked representation shares tails cheaply when paths are
//! prepended during grafting.
//!
//! Path expressions are the rendered form: keys joined with `.`, with
//! JSON-style quoting for keys containing special characters. For any path,
//! `Path::parse(path.render())` reproduces the path exactly.

use crate::error::{ConfigError, Result};
use crate::util;
use conforma_origin::Origin;
use std::fmt;
use std::iter::Peekable;
use std::rc::Rc;
use std::str::Chars;
use std::str::FromStr;

/// An immutable key sequence addressing a value in a configuration tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    first: String,
    remainder: Option<Rc<Path>>,
}

impl Path {
    /// A single-key path.
    pub fn new_key(key: impl Into<String>) -> Path {
        Path {
            first: key.into(),
            remainder: None,
        }
    }

    /// Build a path from a key sequence. Returns `None` if the sequence is
    /// empty, since a path must have at least one key.
    pub fn from_keys(keys: impl IntoIterator<Item = String>) -> Option<Path> {
        let mut builder = PathBuilder::new();
        for key in keys {
            builder.append_key(key);
        }
        builder.result()
    }

    /// The first key.
    pub fn first(&self) -> &str {
        &self.first
    }

    /// The path after the first key, or `None` if this is the last key.
    pub fn remainder(&self) -> Option<&Path> {
        self.remainder.as_deref()
    }

    /// Number of keys in the path. Always at least 1.
    pub fn length(&self) -> usize {
        let mut count = 1;
        let mut current = self.remainder.as_deref();
        while let Some(p) = current {
            count += 1;
            current = p.remainder.as_deref();
        }
        count
    }

    /// Iterate over the keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        let mut next = Some(self);
        std::iter::from_fn(move || {
            let current = next?;
            next = current.remainder();
            Some(current.first())
        })
    }

    /// A new path with `prefix`'s keys before this path's keys.
    pub fn prepend(&self, prefix: &Path) -> Path {
        let mut builder = PathBuilder::new();
        builder.append_path(prefix);
        builder.append_path(self);
        match builder.result() {
            Some(path) => path,
            None => unreachable!("prepending two non-empty paths yields a non-empty path"),
        }
    }

    /// The path with the first `remove_from_front` keys dropped, or `None`
    /// if that would remove every key.
    pub fn sub_path(&self, remove_from_front: usize) -> Option<Path> {
        let mut count = remove_from_front;
        let mut current = self;
        while count > 0 {
            current = current.remainder()?;
            count -= 1;
        }
        Some(current.clone())
    }

    /// Render as a path expression, quoting keys that need it.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, key) in self.keys().enumerate() {
            if i > 0 {
                out.push('.');
            }
            if util::is_unquoted_element(key) {
                out.push_str(key);
            } else {
                out.push_str(&util::render_json_string(key));
            }
        }
        out
    }

    /// Parse a path expression.
    ///
    /// Splits on unescaped `.`, unquoting JSON-style quoted elements. Fails
    /// with a syntax error naming the offending character on malformed
    /// quoting, a disallowed unquoted character, or an empty path.
    pub fn parse(expression: &str) -> Result<Path> {
        let origin = Origin::new_simple(format!("path expression '{}'", expression));

        if expression.is_empty() {
            return Err(ConfigError::Syntax {
                origin,
                message: "expected a path expression, got an empty string".to_string(),
            });
        }

        let mut builder = PathBuilder::new();
        let mut element = String::new();
        // an explicitly quoted "" is a valid (empty) key
        let mut element_had_quotes = false;
        let mut chars = expression.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if element.is_empty() && !element_had_quotes {
                        return Err(ConfigError::Syntax {
                            origin,
                            message:
                                "path has a leading, trailing, or two adjacent period characters '.'"
                                    .to_string(),
                        });
                    }
                    builder.append_key(std::mem::take(&mut element));
                    element_had_quotes = false;
                }
                '"' => {
                    element.push_str(&parse_quoted_element(&mut chars, &origin)?);
                    element_had_quotes = true;
                }
                c if c.is_alphanumeric() || c == '_' || c == '-' => element.push(c),
                other => {
                    return Err(ConfigError::Syntax {
                        origin,
                        message: format!(
                            "character '{}' is not allowed in an unquoted path element (surround the element with double quotes to include it)",
                            other
                        ),
                    });
                }
            }
        }

        if element.is_empty() && !element_had_quotes {
            return Err(ConfigError::Syntax {
                origin,
                message: "path has a leading, trailing, or two adjacent period characters '.'"
                    .to_string(),
            });
        }
        builder.append_key(element);

        match builder.result() {
            Some(path) => Ok(path),
            None => unreachable!("at least one element was appended"),
        }
    }
}

/// Unquote the rest of a `"..."` element; the opening quote has been consumed.
fn parse_quoted_element(chars: &mut Peekable<Chars<'_>>, origin: &Origin) -> Result<String> {
    let mut out = String::new();
    loop {
        match chars.next() {
            None => {
                return Err(ConfigError::Syntax {
                    origin: origin.clone(),
                    message: "unterminated double-quoted path element".to_string(),
                });
            }
            Some('"') => return Ok(out),
            Some('\\') => match chars.next() {
                None => {
                    return Err(ConfigError::Syntax {
                        origin: origin.clone(),
                        message: "backslash at end of quoted path element".to_string(),
                    });
                }
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some('/') => out.push('/'),
                Some('b') => out.push('\u{0008}'),
                Some('f') => out.push('\u{000C}'),
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('u') => {
                    let mut code = 0u32;
                    for _ in 0..4 {
                        let digit = chars.next().and_then(|c| c.to_digit(16));
                        match digit {
                            Some(d) => code = code * 16 + d,
                            None => {
                                return Err(ConfigError::Syntax {
                                    origin: origin.clone(),
                                    message: "\\u escape must be followed by four hex digits"
                                        .to_string(),
                                });
                            }
                        }
                    }
                    match char::from_u32(code) {
                        Some(c) => out.push(c),
                        None => {
                            return Err(ConfigError::Syntax {
                                origin: origin.clone(),
                                message: format!(
                                    "\\u{:04x} is not a valid character escape",
                                    code
                                ),
                            });
                        }
                    }
                }
                Some(other) => {
                    return Err(ConfigError::Syntax {
                        origin: origin.clone(),
                        message: format!("backslash followed by '{}' is not a valid escape", other),
                    });
                }
            },
            Some(ch) => out.push(ch),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

impl FromStr for Path {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Path> {
        Path::parse(s)
    }
}

/// Incrementally accumulates keys, materializing the linked [`Path`] once.
///
/// After [`PathBuilder::result`] has been taken, appending is a programming
/// error and panics.
#[derive(Debug, Default)]
pub struct PathBuilder {
    keys: Vec<String>,
    built: bool,
}

impl PathBuilder {
    pub fn new() -> PathBuilder {
        PathBuilder::default()
    }

    fn check_can_append(&self) {
        if self.built {
            panic!("appended to a PathBuilder after result() was taken");
        }
    }

    /// Append one key.
    pub fn append_key(&mut self, key: impl Into<String>) {
        self.check_can_append();
        self.keys.push(key.into());
    }

    /// Append every key of an existing path.
    pub fn append_path(&mut self, path: &Path) {
        self.check_can_append();
        for key in path.keys() {
            self.keys.push(key.to_string());
        }
    }

    /// Materialize the path. `None` if no keys were appended.
    pub fn result(&mut self) -> Option<Path> {
        self.built = true;
        let mut tail: Option<Path> = None;
        for key in self.keys.drain(..).rev() {
            tail = Some(Path {
                first: key,
                remainder: tail.map(Rc::new),
            });
        }
        tail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(keys: &[&str]) -> Path {
        Path::from_keys(keys.iter().map(|k| k.to_string())).unwrap()
    }

    #[test]
    fn test_single_key() {
        let p = Path::new_key("foo");
        assert_eq!(p.first(), "foo");
        assert!(p.remainder().is_none());
        assert_eq!(p.length(), 1);
        assert_eq!(p.render(), "foo");
    }

    #[test]
    fn test_keys_in_order() {
        let p = path(&["a", "b", "c"]);
        assert_eq!(p.keys().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(p.length(), 3);
        assert_eq!(p.remainder().unwrap().first(), "b");
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(path(&["a", "b"]), path(&["a", "b"]));
        assert_ne!(path(&["a", "b"]), path(&["b", "a"]));
        assert_ne!(path(&["a"]), path(&["a", "b"]));
    }

    #[test]
    fn test_prepend() {
        let p = path(&["c", "d"]).prepend(&path(&["a", "b"]));
        assert_eq!(p, path(&["a", "b", "c", "d"]));
    }

    #[test]
    fn test_sub_path() {
        let p = path(&["a", "b", "c"]);
        assert_eq!(p.sub_path(0).unwrap(), p);
        assert_eq!(p.sub_path(1).unwrap(), path(&["b", "c"]));
        assert_eq!(p.sub_path(2).unwrap(), path(&["c"]));
        assert_eq!(p.sub_path(3), None);
    }

    #[test]
    fn test_parse_simple() {
        assert_eq!(Path::parse("a.b.c").unwrap(), path(&["a", "b", "c"]));
        assert_eq!(Path::parse("a-b_c1").unwrap(), path(&["a-b_c1"]));
    }

    #[test]
    fn test_parse_quoted_elements() {
        assert_eq!(
            Path::parse("a.\"b.c\".d").unwrap(),
            path(&["a", "b.c", "d"])
        );
        assert_eq!(Path::parse("\"\"").unwrap(), path(&[""]));
        assert_eq!(Path::parse("\"a\\\"b\"").unwrap(), path(&["a\"b"]));
        assert_eq!(Path::parse("\"\\u00e9\"").unwrap(), path(&["é"]));
    }

    #[test]
    fn test_parse_mixed_quoted_and_unquoted_in_one_element() {
        assert_eq!(Path::parse("a\"b.c\"d").unwrap(), path(&["ab.cd"]));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Path::parse(""),
            Err(ConfigError::Syntax { .. })
        ));
        assert!(matches!(Path::parse("."), Err(ConfigError::Syntax { .. })));
        assert!(matches!(Path::parse("a."), Err(ConfigError::Syntax { .. })));
        assert!(matches!(Path::parse(".a"), Err(ConfigError::Syntax { .. })));
        assert!(matches!(Path::parse("a..b"), Err(ConfigError::Syntax { .. })));
        assert!(matches!(
            Path::parse("\"unterminated"),
            Err(ConfigError::Syntax { .. })
        ));
        assert!(matches!(
            Path::parse("\"bad\\q\""),
            Err(ConfigError::Syntax { .. })
        ));
    }

    #[test]
    fn test_parse_error_names_offending_character() {
        let err = Path::parse("a$b").unwrap_err();
        match err {
            ConfigError::Syntax { message, .. } => assert!(message.contains("'$'")),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_render_quotes_when_needed() {
        assert_eq!(path(&["a", "b"]).render(), "a.b");
        assert_eq!(path(&["a.b"]).render(), "\"a.b\"");
        assert_eq!(path(&["has\"quote"]).render(), "\"has\\\"quote\"");
        assert_eq!(path(&[""]).render(), "\"\"");
    }

    #[test]
    fn test_round_trip() {
        for keys in [
            vec!["a"],
            vec!["a", "b", "c"],
            vec!["dotted.key", "plain"],
            vec!["with\"quote", "with\\backslash"],
            vec!["ünïcödé", "日本語"],
            vec!["", "empty-first"],
            vec!["tab\there"],
        ] {
            let p = path(&keys);
            let rendered = p.render();
            assert_eq!(Path::parse(&rendered).unwrap(), p, "expression: {rendered}");
        }
    }

    #[test]
    fn test_builder_empty_result_is_none() {
        let mut builder = PathBuilder::new();
        assert_eq!(builder.result(), None);
    }

    #[test]
    #[should_panic(expected = "after result()")]
    fn test_builder_append_after_result_panics() {
        let mut builder = PathBuilder::new();
        builder.append_key("a");
        let _ = builder.result();
        builder.append_key("b");
    }

    #[test]
    fn test_from_str() {
        let p: Path = "a.b".parse().unwrap();
        assert_eq!(p, path(&["a", "b"]));
    }
}
