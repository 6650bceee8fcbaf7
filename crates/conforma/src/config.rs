//! The root-level configuration handle.
//!
//! [`Config`] wraps an object-kind [`ConfigValue`] and is the surface most
//! callers touch: merge with [`Config::with_fallback`], resolve with
//! [`Config::resolve`], then read with the typed accessors. Accessor paths
//! are dotted path expressions (`"server.port"`), parsed with the same rules
//! as substitution paths.

use crate::env::{EnvLookup, SystemEnvironment};
use crate::error::{ConfigError, Result};
use crate::merge;
use crate::options::ResolveOptions;
use crate::path::Path;
use crate::resolve::resolve_root;
use crate::value::{peek_path, ConfigValue, ConfigValueKind, ResolveStatus};
use conforma_origin::Origin;
use indexmap::IndexMap;
use std::rc::Rc;

/// An immutable configuration: an object-kind root plus the operations on
/// it. Cheap to clone; all clones share the same tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    root: Rc<ConfigValue>,
}

impl Config {
    /// Wrap an object-kind root. Anything else is refused, since path
    /// lookups only make sense against an object.
    pub fn from_root(root: Rc<ConfigValue>) -> Result<Config> {
        if root.is_object() {
            Ok(Config { root })
        } else {
            Err(ConfigError::WrongType {
                origin: root.origin.clone(),
                path: String::new(),
                actual: root.value_type()?,
                expected: "object at the root",
            })
        }
    }

    /// An empty configuration.
    pub fn empty(origin_description: &str) -> Config {
        Config {
            root: ConfigValue::new_object(IndexMap::new(), Origin::new_simple(origin_description)),
        }
    }

    /// Build a configuration from plain JSON data, which must be an object.
    pub fn from_plain(plain: &serde_json::Value, origin: &Origin) -> Result<Config> {
        Config::from_root(ConfigValue::from_plain(plain, origin))
    }

    /// The underlying root value.
    pub fn root(&self) -> &Rc<ConfigValue> {
        &self.root
    }

    pub fn origin(&self) -> &Origin {
        &self.root.origin
    }

    pub fn is_empty(&self) -> bool {
        match &self.root.kind {
            ConfigValueKind::Object(o) => o.is_empty(),
            _ => unreachable!("config root is always an object"),
        }
    }

    /// Whether every substitution in the tree has been resolved.
    pub fn is_resolved(&self) -> bool {
        self.root.resolve_status() == ResolveStatus::Resolved
    }

    /// This configuration layered over `fallback`.
    pub fn with_fallback(&self, fallback: &Config) -> Config {
        Config {
            root: merge::with_fallback(&self.root, &fallback.root),
        }
    }

    /// Resolve all substitutions, with environment fallback served by the
    /// real process environment.
    pub fn resolve(&self, options: ResolveOptions) -> Result<Config> {
        self.resolve_with_env(options, &SystemEnvironment)
    }

    /// [`Config::resolve`] with an explicit environment source.
    pub fn resolve_with_env(
        &self,
        options: ResolveOptions,
        env: &dyn EnvLookup,
    ) -> Result<Config> {
        let resolved = resolve_root(&self.root, options, env)?;
        Ok(Config { root: resolved })
    }

    /// Whether a concrete, non-null value exists at the path. Fails with
    /// `NotResolved` if answering would require resolving a substitution.
    pub fn has_path(&self, path_expression: &str) -> Result<bool> {
        let path = Path::parse(path_expression)?;
        match peek_path(&self.root, &path)? {
            Some(value) => Ok(!matches!(value.kind, ConfigValueKind::Null)),
            None => Ok(false),
        }
    }

    /// The value at the path, of whatever kind, including explicit null.
    /// Fails with `Missing` when there is nothing there at all.
    pub fn get_value(&self, path_expression: &str) -> Result<Rc<ConfigValue>> {
        let path = Path::parse(path_expression)?;
        peek_path(&self.root, &path)?.ok_or_else(|| ConfigError::Missing {
            path: path.render(),
        })
    }

    pub fn get_bool(&self, path_expression: &str) -> Result<bool> {
        let value = self.find(path_expression, "boolean")?;
        match &value.kind {
            ConfigValueKind::Boolean(b) => Ok(*b),
            _ => Err(self.wrong_type(&value, path_expression, "boolean")),
        }
    }

    /// The number at the path as an integer. A whole-valued float counts;
    /// a fractional one is a type error.
    pub fn get_int(&self, path_expression: &str) -> Result<i64> {
        let value = self.find(path_expression, "number")?;
        match &value.kind {
            ConfigValueKind::Number(n) if n.is_whole() => Ok(n.as_i64()),
            ConfigValueKind::Number(_) => Err(ConfigError::WrongType {
                origin: value.origin.clone(),
                path: path_expression.to_string(),
                actual: crate::value::ConfigValueType::Number,
                expected: "integer (whole number)",
            }),
            _ => Err(self.wrong_type(&value, path_expression, "number")),
        }
    }

    pub fn get_float(&self, path_expression: &str) -> Result<f64> {
        let value = self.find(path_expression, "number")?;
        match &value.kind {
            ConfigValueKind::Number(n) => Ok(n.as_f64()),
            _ => Err(self.wrong_type(&value, path_expression, "number")),
        }
    }

    pub fn get_string(&self, path_expression: &str) -> Result<String> {
        let value = self.find(path_expression, "string")?;
        match &value.kind {
            ConfigValueKind::String(s) => Ok(s.clone()),
            _ => Err(self.wrong_type(&value, path_expression, "string")),
        }
    }

    pub fn get_list(&self, path_expression: &str) -> Result<Vec<Rc<ConfigValue>>> {
        let value = self.find(path_expression, "list")?;
        match &value.kind {
            ConfigValueKind::List(l) => Ok(l.elements().to_vec()),
            _ => Err(self.wrong_type(&value, path_expression, "list")),
        }
    }

    /// The object at the path, as a nested `Config`.
    pub fn get_object(&self, path_expression: &str) -> Result<Config> {
        let value = self.find(path_expression, "object")?;
        if value.is_object() {
            Ok(Config { root: value })
        } else {
            Err(self.wrong_type(&value, path_expression, "object"))
        }
    }

    /// Recursively convert the whole tree to plain JSON data, preserving
    /// key order. Fails with `NotResolved` if anything is still unresolved.
    pub fn unwrapped(&self) -> Result<serde_json::Value> {
        self.root.unwrapped()
    }

    /// A configuration with this one's root grafted under `path_expression`,
    /// relativizing contained substitutions so they keep pointing at the
    /// same values.
    pub fn at_path(&self, path_expression: &str) -> Result<Config> {
        let path = Path::parse(path_expression)?;
        let origin = Origin::new_simple(format!("{} at {}", self.origin().description(), path.render()));
        Ok(Config {
            root: self.root.at_path(&path, &origin),
        })
    }

    /// [`Config::at_path`] for a single literal key (not parsed, so the key
    /// may contain dots).
    pub fn at_key(&self, key: &str) -> Config {
        let origin = Origin::new_simple(format!("{} at {}", self.origin().description(), key));
        Config {
            root: self.root.at_key(key, &origin),
        }
    }

    /// Shared lookup for the typed accessors: missing is `Missing`, explicit
    /// null is `Null` naming the expected type, anything else is returned
    /// for the caller to type-check.
    fn find(&self, path_expression: &str, expected: &'static str) -> Result<Rc<ConfigValue>> {
        let path = Path::parse(path_expression)?;
        let value = peek_path(&self.root, &path)?.ok_or_else(|| ConfigError::Missing {
            path: path.render(),
        })?;
        if matches!(value.kind, ConfigValueKind::Null) {
            Err(ConfigError::Null {
                origin: value.origin.clone(),
                path: path.render(),
                expected,
            })
        } else {
            Ok(value)
        }
    }

    fn wrong_type(
        &self,
        value: &Rc<ConfigValue>,
        path_expression: &str,
        expected: &'static str,
    ) -> ConfigError {
        match value.value_type() {
            Ok(actual) => ConfigError::WrongType {
                origin: value.origin.clone(),
                path: path_expression.to_string(),
                actual,
                expected,
            },
            // still a substitution: the real problem is the missing resolve
            Err(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnvironment;
    use crate::expr::SubstitutionExpression;

    fn origin() -> Origin {
        Origin::new_simple("test")
    }

    fn config(plain: serde_json::Value) -> Config {
        Config::from_plain(&plain, &origin()).unwrap()
    }

    #[test]
    fn test_from_root_rejects_non_object() {
        let result = Config::from_root(ConfigValue::new_int(1, origin()));
        assert!(matches!(result, Err(ConfigError::WrongType { .. })));
    }

    #[test]
    fn test_typed_accessors() {
        let config = config(serde_json::json!({
            "server": {"port": 8080, "host": "localhost", "tls": false},
            "timeout": 2.5,
            "tags": ["a", "b"],
        }));
        assert_eq!(config.get_int("server.port").unwrap(), 8080);
        assert_eq!(config.get_string("server.host").unwrap(), "localhost");
        assert!(!config.get_bool("server.tls").unwrap());
        assert_eq!(config.get_float("timeout").unwrap(), 2.5);
        assert_eq!(config.get_list("tags").unwrap().len(), 2);
        assert_eq!(
            config.get_object("server").unwrap().get_int("port").unwrap(),
            8080
        );
    }

    #[test]
    fn test_get_int_accepts_whole_float_rejects_fractional() {
        let config = config(serde_json::json!({"whole": 3.0, "frac": 3.5}));
        assert_eq!(config.get_int("whole").unwrap(), 3);
        assert!(matches!(
            config.get_int("frac"),
            Err(ConfigError::WrongType { .. })
        ));
    }

    #[test]
    fn test_get_float_accepts_int() {
        let config = config(serde_json::json!({"n": 3}));
        assert_eq!(config.get_float("n").unwrap(), 3.0);
    }

    #[test]
    fn test_missing_path() {
        let config = config(serde_json::json!({"a": 1}));
        match config.get_int("b.c") {
            Err(ConfigError::Missing { path }) => assert_eq!(path, "b.c"),
            other => panic!("expected missing, got {:?}", other),
        }
        assert!(!config.has_path("b.c").unwrap());
    }

    #[test]
    fn test_null_is_distinct_from_missing() {
        let config = config(serde_json::json!({"a": null}));
        assert!(matches!(
            config.get_int("a"),
            Err(ConfigError::Null { .. })
        ));
        // get_value still hands back the null node
        let value = config.get_value("a").unwrap();
        assert!(matches!(value.kind, ConfigValueKind::Null));
        // has_path treats explicit null as absent
        assert!(!config.has_path("a").unwrap());
    }

    #[test]
    fn test_wrong_type_names_both_types() {
        let config = config(serde_json::json!({"port": "8080"}));
        match config.get_int("port") {
            Err(ConfigError::WrongType { actual, expected, .. }) => {
                assert_eq!(actual.to_string(), "string");
                assert_eq!(expected, "number");
            }
            other => panic!("expected wrong type, got {:?}", other),
        }
    }

    #[test]
    fn test_with_fallback_layers() {
        let overrides = config(serde_json::json!({"server": {"port": 9090}}));
        let base = config(serde_json::json!({"server": {"port": 8080, "host": "localhost"}}));
        let layered = overrides.with_fallback(&base);
        assert_eq!(layered.get_int("server.port").unwrap(), 9090);
        assert_eq!(layered.get_string("server.host").unwrap(), "localhost");
    }

    #[test]
    fn test_resolve_through_config() {
        let reference = ConfigValue::new_reference(
            SubstitutionExpression::new(Path::parse("base.port").unwrap(), false),
            origin(),
        );
        let base = config(serde_json::json!({"base": {"port": 4000}}));
        let mut entries = IndexMap::new();
        entries.insert("port".to_string(), reference);
        let overlay = Config::from_root(ConfigValue::new_object(entries, origin()))
            .unwrap()
            .at_key("web");
        let merged = overlay.with_fallback(&base);
        assert!(!merged.is_resolved());
        let resolved = merged
            .resolve_with_env(ResolveOptions::no_system(), &MapEnvironment::new())
            .unwrap();
        assert!(resolved.is_resolved());
        assert_eq!(resolved.get_int("web.port").unwrap(), 4000);
    }

    #[test]
    fn test_reading_through_unresolved_reference_fails() {
        let reference = ConfigValue::new_reference(
            SubstitutionExpression::new(Path::parse("missing").unwrap(), false),
            origin(),
        );
        let config = Config::from_root(reference.at_key("a", &origin())).unwrap();
        assert!(matches!(
            config.get_int("a"),
            Err(ConfigError::NotResolved { .. })
        ));
        assert!(matches!(
            config.get_int("a.b"),
            Err(ConfigError::NotResolved { .. })
        ));
        assert!(matches!(
            config.unwrapped(),
            Err(ConfigError::NotResolved { .. })
        ));
    }

    #[test]
    fn test_unwrapped_round_trip() {
        let plain = serde_json::json!({"a": {"b": [1, true, "x"]}, "c": null});
        assert_eq!(config(plain.clone()).unwrapped().unwrap(), plain);
    }

    #[test]
    fn test_at_path_and_back() {
        let inner = config(serde_json::json!({"x": 1}));
        let nested = inner.at_path("a.b").unwrap();
        assert_eq!(nested.get_int("a.b.x").unwrap(), 1);
    }

    #[test]
    fn test_at_key_does_not_parse_the_key() {
        let inner = config(serde_json::json!({"x": 1}));
        let nested = inner.at_key("dotted.key");
        assert_eq!(nested.get_int("\"dotted.key\".x").unwrap(), 1);
    }

    #[test]
    fn test_empty() {
        let config = Config::empty("empty config");
        assert!(config.is_empty());
        assert!(config.is_resolved());
        assert_eq!(config.origin().description(), "empty config");
    }
}
