//! String utilities shared by path rendering and diagnostics.

use crate::error::Result;
use crate::path::Path;

/// Quote and escape a string as in the JSON specification.
///
/// Used when rendering path elements that contain characters not allowed in
/// unquoted elements.
pub fn render_json_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// True if the string can appear in a path expression without quoting.
pub(crate) fn is_unquoted_element(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Join keys into a path expression, quoting elements as needed.
///
/// The inverse of [`split_path`]. Returns `None` for an empty key list,
/// since a path must have at least one key.
pub fn join_path<S: AsRef<str>>(elements: &[S]) -> Option<String> {
    let path = Path::from_keys(elements.iter().map(|e| e.as_ref().to_string()))?;
    Some(path.render())
}

/// Split a path expression into its keys, unquoting each element.
///
/// Fails with a syntax error on malformed quoting or an empty path.
pub fn split_path(path_expression: &str) -> Result<Vec<String>> {
    let path = Path::parse(path_expression)?;
    Ok(path.keys().map(|k| k.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_json_string_plain() {
        assert_eq!(render_json_string("abc"), "\"abc\"");
    }

    #[test]
    fn test_render_json_string_escapes() {
        assert_eq!(render_json_string("a\"b\\c"), "\"a\\\"b\\\\c\"");
        assert_eq!(render_json_string("line\nbreak"), "\"line\\nbreak\"");
        assert_eq!(render_json_string("\u{0001}"), "\"\\u0001\"");
    }

    #[test]
    fn test_join_and_split_round_trip() {
        let keys = ["a", "key.with.dots", "b-c"];
        let joined = join_path(&keys).unwrap();
        assert_eq!(joined, "a.\"key.with.dots\".b-c");
        assert_eq!(split_path(&joined).unwrap(), keys);
    }

    #[test]
    fn test_join_path_empty_is_none() {
        assert_eq!(join_path::<&str>(&[]), None);
    }
}
