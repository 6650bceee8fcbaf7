//! The immutable configuration value tree.
//!
//! [`ConfigValue`] is a closed tagged union: `Null`, `Boolean`, `Number`,
//! `String`, `List`, `Object`, plus two pre-resolution forms: `Reference`
//! (an unresolved `${path}` placeholder) and `DelayedMerge` (a merge whose
//! outcome cannot be known until references resolve). Every node carries an
//! [`Origin`] for diagnostics.
//!
//! Trees are never mutated. Merging, resolving, and grafting all produce new
//! trees that share unchanged substructure through `Rc`, so nodes are built
//! and passed around as `Rc<ConfigValue>`. The resolution engine additionally
//! relies on `Rc` pointer identity to memoize per-node work.
//!
//! Equality and hashing are structural and deliberately exclude origins and
//! the original literal text of numbers.

use crate::error::{ConfigError, Result};
use crate::expr::SubstitutionExpression;
use crate::path::Path;
use conforma_origin::Origin;
use indexmap::IndexMap;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::rc::Rc;

/// Whether a subtree still contains unresolved references anywhere.
///
/// Derivable by structural scan; objects and lists compute it once at
/// construction and cache it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStatus {
    /// No `Reference` (or `DelayedMerge`) appears anywhere beneath the node.
    Resolved,
    /// At least one reference remains.
    Unresolved,
}

impl ResolveStatus {
    pub(crate) fn from_children<'a>(
        children: impl IntoIterator<Item = &'a Rc<ConfigValue>>,
    ) -> ResolveStatus {
        for child in children {
            if child.resolve_status() == ResolveStatus::Unresolved {
                return ResolveStatus::Unresolved;
            }
        }
        ResolveStatus::Resolved
    }
}

/// The concrete type of a resolved value, for type-mismatch diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigValueType {
    Null,
    Boolean,
    Number,
    String,
    List,
    Object,
}

impl fmt::Display for ConfigValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfigValueType::Null => "null",
            ConfigValueType::Boolean => "boolean",
            ConfigValueType::Number => "number",
            ConfigValueType::String => "string",
            ConfigValueType::List => "list",
            ConfigValueType::Object => "object",
        };
        write!(f, "{}", name)
    }
}

/// A numeric value, integral or floating, retaining the original source
/// literal for display. The literal is excluded from equality and hashing;
/// two numbers compare by 64-bit integer value when both are whole, by
/// floating comparison otherwise.
#[derive(Debug, Clone)]
pub struct ConfigNumber {
    repr: NumberRepr,
    original_text: String,
}

#[derive(Debug, Clone, Copy)]
enum NumberRepr {
    Int(i64),
    Float(f64),
}

impl ConfigNumber {
    pub fn new_int(value: i64) -> Self {
        Self::int_with_text(value, value.to_string())
    }

    pub fn int_with_text(value: i64, original_text: impl Into<String>) -> Self {
        Self {
            repr: NumberRepr::Int(value),
            original_text: original_text.into(),
        }
    }

    /// Whole-valued floats are stored integrally; this is a representation
    /// detail with no semantic effect.
    pub fn new_float(value: f64) -> Self {
        Self::float_with_text(value, value.to_string())
    }

    pub fn float_with_text(value: f64, original_text: impl Into<String>) -> Self {
        let as_int = value as i64;
        let repr = if as_int as f64 == value {
            NumberRepr::Int(as_int)
        } else {
            NumberRepr::Float(value)
        };
        Self {
            repr,
            original_text: original_text.into(),
        }
    }

    /// The value as a 64-bit integer, truncating a fractional part.
    pub fn as_i64(&self) -> i64 {
        match self.repr {
            NumberRepr::Int(v) => v,
            NumberRepr::Float(v) => v as i64,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self.repr {
            NumberRepr::Int(v) => v as f64,
            NumberRepr::Float(v) => v,
        }
    }

    /// True if the value is integral (no fractional part), regardless of
    /// representation.
    pub fn is_whole(&self) -> bool {
        match self.repr {
            NumberRepr::Int(_) => true,
            NumberRepr::Float(v) => v as i64 as f64 == v,
        }
    }

    /// The literal exactly as it appeared in the source, for rendering.
    pub fn original_text(&self) -> &str {
        &self.original_text
    }
}

impl PartialEq for ConfigNumber {
    fn eq(&self, other: &Self) -> bool {
        if self.is_whole() {
            other.is_whole() && self.as_i64() == other.as_i64()
        } else {
            !other.is_whole() && self.as_f64() == other.as_f64()
        }
    }
}

impl Hash for ConfigNumber {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if self.is_whole() {
            self.as_i64().hash(state);
        } else {
            self.as_f64().to_bits().hash(state);
        }
    }
}

impl fmt::Display for ConfigNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original_text)
    }
}

/// An ordered sequence of values.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigList {
    elements: Vec<Rc<ConfigValue>>,
    status: ResolveStatus,
}

impl ConfigList {
    pub fn new(elements: Vec<Rc<ConfigValue>>) -> Self {
        let status = ResolveStatus::from_children(&elements);
        Self { elements, status }
    }

    pub fn elements(&self) -> &[Rc<ConfigValue>] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn status(&self) -> ResolveStatus {
        self.status
    }
}

/// An ordered-insertion mapping from key to value.
///
/// Once a resolved object has absorbed a non-object fallback, it stops
/// participating in merges: the `ignores_fallbacks` flag records that the
/// chain terminated there, so later fallbacks are discarded and chained
/// merging stays associative.
#[derive(Debug, Clone)]
pub struct ConfigObject {
    entries: IndexMap<String, Rc<ConfigValue>>,
    status: ResolveStatus,
    ignores_fallbacks: bool,
}

impl ConfigObject {
    pub fn new(entries: IndexMap<String, Rc<ConfigValue>>) -> Self {
        let status = ResolveStatus::from_children(entries.values());
        Self {
            entries,
            status,
            ignores_fallbacks: false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Rc<ConfigValue>> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rc<ConfigValue>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn status(&self) -> ResolveStatus {
        self.status
    }

    /// Whether this object already absorbed a terminating non-object
    /// fallback, ending its merge chain.
    pub(crate) fn ignores_fallbacks(&self) -> bool {
        self.ignores_fallbacks
    }
}

impl PartialEq for ConfigObject {
    fn eq(&self, other: &Self) -> bool {
        // the fallbacks-ignored flag is merge bookkeeping, not value identity
        self.entries == other.entries
    }
}

/// An unresolved `${path}` placeholder.
///
/// `prefix_length` records how many leading path segments were added when
/// this node was grafted into a larger tree, so that environment lookups
/// (which are not relative to the tree) can strip the graft prefix back off.
#[derive(Debug, Clone)]
pub struct ConfigReference {
    expr: SubstitutionExpression,
    prefix_length: usize,
}

impl ConfigReference {
    pub fn expression(&self) -> &SubstitutionExpression {
        &self.expr
    }

    pub fn prefix_length(&self) -> usize {
        self.prefix_length
    }
}

impl PartialEq for ConfigReference {
    fn eq(&self, other: &Self) -> bool {
        // prefix_length is bookkeeping, not identity
        self.expr == other.expr
    }
}

/// A merge whose result cannot be computed until references resolve: the
/// ordered alternatives (highest priority first) are carried forward and
/// collapsed by the resolution engine.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayedMerge {
    pub(crate) stack: Vec<Rc<ConfigValue>>,
}

impl DelayedMerge {
    /// The not-yet-collapsed alternatives, highest priority first.
    pub fn alternatives(&self) -> &[Rc<ConfigValue>] {
        &self.stack
    }
}

/// One node of a configuration tree.
#[derive(Debug, Clone)]
pub struct ConfigValue {
    /// Which kind of value this is, and its payload.
    pub kind: ConfigValueKind,
    /// Where the value came from. Excluded from equality.
    pub origin: Origin,
}

/// The payload of a [`ConfigValue`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValueKind {
    /// Explicit null: distinct from "missing", it shadows fallback values.
    Null,
    Boolean(bool),
    Number(ConfigNumber),
    String(String),
    List(ConfigList),
    Object(ConfigObject),
    /// Unresolved `${path}` placeholder.
    Reference(ConfigReference),
    /// Deferred merge awaiting resolution.
    DelayedMerge(DelayedMerge),
}

impl ConfigValue {
    pub fn new_null(origin: Origin) -> Rc<ConfigValue> {
        Rc::new(ConfigValue {
            kind: ConfigValueKind::Null,
            origin,
        })
    }

    pub fn new_bool(value: bool, origin: Origin) -> Rc<ConfigValue> {
        Rc::new(ConfigValue {
            kind: ConfigValueKind::Boolean(value),
            origin,
        })
    }

    pub fn new_int(value: i64, origin: Origin) -> Rc<ConfigValue> {
        Self::new_number(ConfigNumber::new_int(value), origin)
    }

    pub fn new_float(value: f64, origin: Origin) -> Rc<ConfigValue> {
        Self::new_number(ConfigNumber::new_float(value), origin)
    }

    pub fn new_number(number: ConfigNumber, origin: Origin) -> Rc<ConfigValue> {
        Rc::new(ConfigValue {
            kind: ConfigValueKind::Number(number),
            origin,
        })
    }

    pub fn new_string(value: impl Into<String>, origin: Origin) -> Rc<ConfigValue> {
        Rc::new(ConfigValue {
            kind: ConfigValueKind::String(value.into()),
            origin,
        })
    }

    pub fn new_list(elements: Vec<Rc<ConfigValue>>, origin: Origin) -> Rc<ConfigValue> {
        Rc::new(ConfigValue {
            kind: ConfigValueKind::List(ConfigList::new(elements)),
            origin,
        })
    }

    pub fn new_object(
        entries: IndexMap<String, Rc<ConfigValue>>,
        origin: Origin,
    ) -> Rc<ConfigValue> {
        Rc::new(ConfigValue {
            kind: ConfigValueKind::Object(ConfigObject::new(entries)),
            origin,
        })
    }

    /// A copy of a resolved object that discards any further fallbacks.
    pub(crate) fn with_fallbacks_ignored(self: &Rc<Self>) -> Rc<ConfigValue> {
        match &self.kind {
            ConfigValueKind::Object(o) => {
                if o.ignores_fallbacks {
                    return self.clone();
                }
                debug_assert!(
                    o.status == ResolveStatus::Resolved,
                    "only a resolved object can ignore fallbacks"
                );
                let mut copy = o.clone();
                copy.ignores_fallbacks = true;
                Rc::new(ConfigValue {
                    kind: ConfigValueKind::Object(copy),
                    origin: self.origin.clone(),
                })
            }
            _ => unreachable!("with_fallbacks_ignored on a non-object"),
        }
    }

    pub fn new_reference(expr: SubstitutionExpression, origin: Origin) -> Rc<ConfigValue> {
        Self::new_reference_with_prefix(expr, 0, origin)
    }

    pub(crate) fn new_reference_with_prefix(
        expr: SubstitutionExpression,
        prefix_length: usize,
        origin: Origin,
    ) -> Rc<ConfigValue> {
        Rc::new(ConfigValue {
            kind: ConfigValueKind::Reference(ConfigReference {
                expr,
                prefix_length,
            }),
            origin,
        })
    }

    pub(crate) fn new_delayed_merge(
        stack: Vec<Rc<ConfigValue>>,
        origin: Origin,
    ) -> Rc<ConfigValue> {
        debug_assert!(stack.len() >= 2, "a delayed merge needs two alternatives");
        Rc::new(ConfigValue {
            kind: ConfigValueKind::DelayedMerge(DelayedMerge { stack }),
            origin,
        })
    }

    /// Build a raw (reference-free) tree from plain JSON data.
    pub fn from_plain(plain: &serde_json::Value, origin: &Origin) -> Rc<ConfigValue> {
        match plain {
            serde_json::Value::Null => Self::new_null(origin.clone()),
            serde_json::Value::Bool(b) => Self::new_bool(*b, origin.clone()),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::new_int(i, origin.clone())
                } else {
                    Self::new_float(n.as_f64().unwrap_or(0.0), origin.clone())
                }
            }
            serde_json::Value::String(s) => Self::new_string(s.clone(), origin.clone()),
            serde_json::Value::Array(items) => Self::new_list(
                items.iter().map(|v| Self::from_plain(v, origin)).collect(),
                origin.clone(),
            ),
            serde_json::Value::Object(map) => {
                let entries = map
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::from_plain(v, origin)))
                    .collect();
                Self::new_object(entries, origin.clone())
            }
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// The concrete type of this value. Fails with `NotResolved` for
    /// references and delayed merges, which have no type until resolved.
    pub fn value_type(&self) -> Result<ConfigValueType> {
        match &self.kind {
            ConfigValueKind::Null => Ok(ConfigValueType::Null),
            ConfigValueKind::Boolean(_) => Ok(ConfigValueType::Boolean),
            ConfigValueKind::Number(_) => Ok(ConfigValueType::Number),
            ConfigValueKind::String(_) => Ok(ConfigValueType::String),
            ConfigValueKind::List(_) => Ok(ConfigValueType::List),
            ConfigValueKind::Object(_) => Ok(ConfigValueType::Object),
            ConfigValueKind::Reference(r) => Err(ConfigError::NotResolved {
                detail: r.expression().to_string(),
            }),
            ConfigValueKind::DelayedMerge(_) => Err(ConfigError::NotResolved {
                detail: "unmerged value (delayed merge)".to_string(),
            }),
        }
    }

    /// A short name for the kind, usable even on unresolved nodes.
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            ConfigValueKind::Null => "null",
            ConfigValueKind::Boolean(_) => "boolean",
            ConfigValueKind::Number(_) => "number",
            ConfigValueKind::String(_) => "string",
            ConfigValueKind::List(_) => "list",
            ConfigValueKind::Object(_) => "object",
            ConfigValueKind::Reference(_) => "substitution",
            ConfigValueKind::DelayedMerge(_) => "delayed merge",
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, ConfigValueKind::Object(_))
    }

    pub fn as_object(&self) -> Option<&ConfigObject> {
        match &self.kind {
            ConfigValueKind::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ConfigList> {
        match &self.kind {
            ConfigValueKind::List(l) => Some(l),
            _ => None,
        }
    }

    /// Resolution status of the subtree rooted here.
    pub fn resolve_status(&self) -> ResolveStatus {
        match &self.kind {
            ConfigValueKind::Null
            | ConfigValueKind::Boolean(_)
            | ConfigValueKind::Number(_)
            | ConfigValueKind::String(_) => ResolveStatus::Resolved,
            ConfigValueKind::List(l) => l.status(),
            ConfigValueKind::Object(o) => o.status(),
            ConfigValueKind::Reference(_) | ConfigValueKind::DelayedMerge(_) => {
                ResolveStatus::Unresolved
            }
        }
    }

    /// Recursively convert to plain JSON data, preserving object key order.
    /// Fails with `NotResolved` if any reference or delayed merge remains.
    pub fn unwrapped(&self) -> Result<serde_json::Value> {
        match &self.kind {
            ConfigValueKind::Null => Ok(serde_json::Value::Null),
            ConfigValueKind::Boolean(b) => Ok(serde_json::Value::Bool(*b)),
            ConfigValueKind::Number(n) => {
                if n.is_whole() {
                    Ok(serde_json::Value::Number(n.as_i64().into()))
                } else {
                    // config numbers come from parsed literals, never NaN/inf
                    Ok(serde_json::Number::from_f64(n.as_f64())
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null))
                }
            }
            ConfigValueKind::String(s) => Ok(serde_json::Value::String(s.clone())),
            ConfigValueKind::List(l) => {
                let mut items = Vec::with_capacity(l.len());
                for element in l.elements() {
                    items.push(element.unwrapped()?);
                }
                Ok(serde_json::Value::Array(items))
            }
            ConfigValueKind::Object(o) => {
                let mut map = serde_json::Map::with_capacity(o.len());
                for (key, value) in o.iter() {
                    map.insert(key.to_string(), value.unwrapped()?);
                }
                Ok(serde_json::Value::Object(map))
            }
            ConfigValueKind::Reference(r) => Err(ConfigError::NotResolved {
                detail: r.expression().to_string(),
            }),
            ConfigValueKind::DelayedMerge(_) => Err(ConfigError::NotResolved {
                detail: "unmerged value (delayed merge)".to_string(),
            }),
        }
    }

    /// Rewrite this subtree for grafting under `prefix`: substitution paths
    /// get the prefix prepended, and each reference's prefix length is bumped
    /// so environment lookups can recover the original path.
    pub fn relativized(self: &Rc<Self>, prefix: &Path) -> Rc<ConfigValue> {
        match &self.kind {
            ConfigValueKind::Reference(r) => {
                let new_expr = r
                    .expr
                    .change_path(r.expr.path().prepend(prefix));
                ConfigValue::new_reference_with_prefix(
                    new_expr,
                    r.prefix_length + prefix.length(),
                    self.origin.clone(),
                )
            }
            ConfigValueKind::Object(o) => {
                if o.status() == ResolveStatus::Resolved {
                    return self.clone();
                }
                let entries = o
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.relativized(prefix)))
                    .collect();
                ConfigValue::new_object(entries, self.origin.clone())
            }
            ConfigValueKind::List(l) => {
                if l.status() == ResolveStatus::Resolved {
                    return self.clone();
                }
                let elements = l.elements().iter().map(|v| v.relativized(prefix)).collect();
                ConfigValue::new_list(elements, self.origin.clone())
            }
            ConfigValueKind::DelayedMerge(d) => {
                let stack = d.stack.iter().map(|v| v.relativized(prefix)).collect();
                ConfigValue::new_delayed_merge(stack, self.origin.clone())
            }
            _ => self.clone(),
        }
    }

    /// Wrap this value in nested object shells so it sits at `path`,
    /// relativizing contained references.
    pub fn at_path(self: &Rc<Self>, path: &Path, origin: &Origin) -> Rc<ConfigValue> {
        let keys: Vec<&str> = path.keys().collect();
        let mut value = self.relativized(path);
        for key in keys.iter().rev() {
            let mut entries = IndexMap::with_capacity(1);
            entries.insert(key.to_string(), value);
            value = ConfigValue::new_object(entries, origin.clone());
        }
        value
    }

    /// [`ConfigValue::at_path`] for a single key.
    pub fn at_key(self: &Rc<Self>, key: &str, origin: &Origin) -> Rc<ConfigValue> {
        self.at_path(&Path::new_key(key), origin)
    }
}

/// Walk `path` through nested objects starting at `root`, without resolving
/// anything. `Ok(None)` if the path leads through or to a missing key or a
/// non-object intermediate; `NotResolved` if an intermediate node is still a
/// reference or delayed merge (the leaf may be returned unresolved).
pub(crate) fn peek_path(root: &Rc<ConfigValue>, path: &Path) -> Result<Option<Rc<ConfigValue>>> {
    let mut current = root.clone();
    let mut remaining = Some(path.clone());
    while let Some(p) = remaining {
        let object = match &current.kind {
            ConfigValueKind::Object(o) => o,
            ConfigValueKind::Reference(r) => {
                return Err(ConfigError::NotResolved {
                    detail: r.expression().to_string(),
                });
            }
            ConfigValueKind::DelayedMerge(_) => {
                return Err(ConfigError::NotResolved {
                    detail: format!("unmerged value while looking up '{}'", path.render()),
                });
            }
            _ => return Ok(None),
        };
        let child = match object.get(p.first()) {
            Some(child) => child.clone(),
            None => return Ok(None),
        };
        current = child;
        remaining = p.remainder().cloned();
    }
    Ok(Some(current))
}

impl PartialEq for ConfigValue {
    fn eq(&self, other: &Self) -> bool {
        // origin is deliberately NOT part of equality
        self.kind == other.kind
    }
}

impl Hash for ConfigValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
    }
}

impl Hash for ConfigValueKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ConfigValueKind::Null => {}
            ConfigValueKind::Boolean(b) => b.hash(state),
            ConfigValueKind::Number(n) => n.hash(state),
            ConfigValueKind::String(s) => s.hash(state),
            ConfigValueKind::List(l) => {
                for element in l.elements() {
                    element.hash(state);
                }
            }
            ConfigValueKind::Object(o) => {
                // order-insensitive, to match map equality
                let mut combined: u64 = 0;
                for (key, value) in o.iter() {
                    let mut entry_hasher = DefaultHasher::new();
                    key.hash(&mut entry_hasher);
                    value.hash(&mut entry_hasher);
                    combined = combined.wrapping_add(entry_hasher.finish());
                }
                combined.hash(state);
            }
            ConfigValueKind::Reference(r) => r.expr.hash(state),
            ConfigValueKind::DelayedMerge(d) => {
                for alternative in &d.stack {
                    alternative.hash(state);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Origin {
        Origin::new_simple("test")
    }

    fn object(entries: Vec<(&str, Rc<ConfigValue>)>) -> Rc<ConfigValue> {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        ConfigValue::new_object(map, origin())
    }

    fn reference(path: &str) -> Rc<ConfigValue> {
        ConfigValue::new_reference(
            SubstitutionExpression::new(Path::parse(path).unwrap(), false),
            origin(),
        )
    }

    #[test]
    fn test_number_equality_across_representations() {
        assert_eq!(ConfigNumber::new_int(3), ConfigNumber::new_float(3.0));
        assert_ne!(ConfigNumber::new_int(3), ConfigNumber::new_float(3.5));
        assert_eq!(ConfigNumber::new_float(2.5), ConfigNumber::new_float(2.5));
    }

    #[test]
    fn test_number_original_text_excluded_from_equality() {
        let a = ConfigNumber::int_with_text(10, "10");
        let b = ConfigNumber::float_with_text(10.0, "1e1");
        assert_eq!(a, b);
        assert_eq!(b.original_text(), "1e1");
    }

    #[test]
    fn test_origin_excluded_from_equality() {
        let a = ConfigValue::new_string("x", Origin::new_file("a.conf"));
        let b = ConfigValue::new_string("x", Origin::new_file("b.conf"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_object_equality_ignores_key_order() {
        let a = object(vec![
            ("x", ConfigValue::new_int(1, origin())),
            ("y", ConfigValue::new_int(2, origin())),
        ]);
        let b = object(vec![
            ("y", ConfigValue::new_int(2, origin())),
            ("x", ConfigValue::new_int(1, origin())),
        ]);
        assert_eq!(a, b);

        let mut hasher_a = DefaultHasher::new();
        let mut hasher_b = DefaultHasher::new();
        a.hash(&mut hasher_a);
        b.hash(&mut hasher_b);
        assert_eq!(hasher_a.finish(), hasher_b.finish());
    }

    #[test]
    fn test_resolve_status_propagates() {
        let plain = object(vec![("a", ConfigValue::new_int(1, origin()))]);
        assert_eq!(plain.resolve_status(), ResolveStatus::Resolved);

        let with_ref = object(vec![("outer", object(vec![("r", reference("a.b"))]))]);
        assert_eq!(with_ref.resolve_status(), ResolveStatus::Unresolved);
    }

    #[test]
    fn test_unwrapped_plain_tree() {
        let tree = object(vec![
            ("s", ConfigValue::new_string("hi", origin())),
            ("n", ConfigValue::new_float(1.5, origin())),
            (
                "l",
                ConfigValue::new_list(
                    vec![ConfigValue::new_bool(true, origin()), ConfigValue::new_null(origin())],
                    origin(),
                ),
            ),
        ]);
        assert_eq!(
            tree.unwrapped().unwrap(),
            serde_json::json!({"s": "hi", "n": 1.5, "l": [true, null]})
        );
    }

    #[test]
    fn test_unwrapped_fails_on_reference() {
        let tree = object(vec![("r", reference("some.path"))]);
        assert!(matches!(
            tree.unwrapped(),
            Err(ConfigError::NotResolved { .. })
        ));
    }

    #[test]
    fn test_from_plain_round_trips_through_unwrapped() {
        let plain = serde_json::json!({"a": 1, "b": [true, "x"], "c": {"d": null}});
        let tree = ConfigValue::from_plain(&plain, &origin());
        assert_eq!(tree.unwrapped().unwrap(), plain);
    }

    #[test]
    fn test_value_type_of_reference_is_not_resolved_error() {
        let r = reference("a");
        assert!(matches!(
            r.value_type(),
            Err(ConfigError::NotResolved { .. })
        ));
        assert_eq!(r.type_name(), "substitution");
    }

    #[test]
    fn test_relativized_prepends_reference_paths() {
        let tree = object(vec![("r", reference("target"))]);
        let grafted = tree.relativized(&Path::parse("pre.fix").unwrap());
        let inner = grafted.as_object().unwrap().get("r").unwrap();
        match &inner.kind {
            ConfigValueKind::Reference(r) => {
                assert_eq!(r.expression().path().render(), "pre.fix.target");
                assert_eq!(r.prefix_length(), 2);
            }
            other => panic!("expected reference, got {:?}", other),
        }
    }

    #[test]
    fn test_relativized_resolved_subtree_is_shared() {
        let tree = object(vec![("a", ConfigValue::new_int(1, origin()))]);
        let grafted = tree.relativized(&Path::new_key("p"));
        assert!(Rc::ptr_eq(&tree, &grafted));
    }

    #[test]
    fn test_at_path_builds_shells() {
        let value = ConfigValue::new_int(42, origin());
        let wrapped = value.at_path(&Path::parse("a.b").unwrap(), &origin());
        let found = peek_path(&wrapped, &Path::parse("a.b").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(found, value.clone());
    }

    #[test]
    fn test_peek_path() {
        let tree = object(vec![(
            "a",
            object(vec![("b", ConfigValue::new_int(7, origin()))]),
        )]);
        let found = peek_path(&tree, &Path::parse("a.b").unwrap()).unwrap();
        assert_eq!(found.unwrap(), ConfigValue::new_int(7, origin()));
        assert_eq!(peek_path(&tree, &Path::parse("a.missing").unwrap()).unwrap(), None);
        assert_eq!(peek_path(&tree, &Path::parse("a.b.c").unwrap()).unwrap(), None);
    }

    #[test]
    fn test_peek_path_through_reference_is_not_resolved() {
        let tree = object(vec![("a", reference("x"))]);
        assert!(matches!(
            peek_path(&tree, &Path::parse("a.b").unwrap()),
            Err(ConfigError::NotResolved { .. })
        ));
    }
}
