//! The `with_fallback` merge algebra.
//!
//! `with_fallback(a, b)` layers `a` over `b`: `a` wins wherever both define a
//! value, except that two objects merge key-by-key recursively. Explicit null
//! counts as "defined" and shadows the fallback. The operation is associative,
//! so a stack of layers can be folded in either direction with the same
//! result.
//!
//! When either side is an unresolved reference or an already-delayed merge,
//! the outcome cannot be computed yet (a reference may resolve to an object,
//! which merges, or to a scalar, which shadows). Those merges are deferred as
//! a [`DelayedMerge`](crate::value::DelayedMerge) carrying the ordered
//! alternatives; the resolution engine collapses them later.

use crate::value::{ConfigValue, ConfigValueKind, ResolveStatus};
use conforma_origin::Origin;
use indexmap::IndexMap;
use std::rc::Rc;

/// Merge `value` over `fallback`, returning the combined tree.
pub fn with_fallback(value: &Rc<ConfigValue>, fallback: &Rc<ConfigValue>) -> Rc<ConfigValue> {
    if ignores_fallbacks(value) {
        return value.clone();
    }
    match (&value.kind, &fallback.kind) {
        // a delayed merge whose lowest-priority layer already shadows
        // everything below it absorbs further fallbacks unchanged
        (ConfigValueKind::DelayedMerge(d), _) => {
            if ignores_fallbacks(d.alternatives().last().expect("non-empty merge stack")) {
                value.clone()
            } else {
                delay(value, fallback)
            }
        }
        (ConfigValueKind::Reference(_), _) => delay(value, fallback),
        (_, ConfigValueKind::Reference(_)) | (_, ConfigValueKind::DelayedMerge(_)) => {
            delay(value, fallback)
        }
        (ConfigValueKind::Object(_), ConfigValueKind::Object(_)) => {
            merge_objects(value, fallback)
        }
        // object over a non-object: nothing merges, and the non-object also
        // shadows anything the chain falls back to after it. A resolved
        // object records that by switching to ignores-fallbacks mode; an
        // unresolved one may still need the non-object's own fallbacks, so
        // the merge is deferred.
        (ConfigValueKind::Object(o), _) => {
            if o.status() == ResolveStatus::Resolved {
                value.with_fallbacks_ignored()
            } else {
                delay(value, fallback)
            }
        }
        _ => value.clone(),
    }
}

/// True if merging a fallback underneath `value` can never change it:
/// resolved non-objects (including explicit null) shadow completely, as do
/// objects whose merge chain a non-object already terminated.
pub(crate) fn ignores_fallbacks(value: &ConfigValue) -> bool {
    match &value.kind {
        ConfigValueKind::Object(o) => o.ignores_fallbacks(),
        ConfigValueKind::Reference(_) | ConfigValueKind::DelayedMerge(_) => false,
        ConfigValueKind::List(l) => l.status() == ResolveStatus::Resolved,
        _ => true,
    }
}

/// The layers a value contributes to a delayed-merge stack: a delayed merge
/// contributes its alternatives in order, anything else contributes itself.
fn unmerged_values(value: &Rc<ConfigValue>) -> Vec<Rc<ConfigValue>> {
    match &value.kind {
        ConfigValueKind::DelayedMerge(d) => d.alternatives().to_vec(),
        _ => vec![value.clone()],
    }
}

/// Defer the merge: concatenate both sides' layer stacks into one
/// `DelayedMerge`, folding the origins for diagnostics.
fn delay(value: &Rc<ConfigValue>, fallback: &Rc<ConfigValue>) -> Rc<ConfigValue> {
    let mut stack = unmerged_values(value);
    stack.extend(unmerged_values(fallback));
    let origin = merged_origin(&stack);
    ConfigValue::new_delayed_merge(stack, origin)
}

fn merged_origin(stack: &[Rc<ConfigValue>]) -> Origin {
    let mut iter = stack.iter();
    let first = iter.next().expect("non-empty merge stack");
    let mut origin = first.origin.clone();
    for next in iter {
        origin = Origin::merged(&origin, &next.origin);
    }
    origin
}

/// Key-union merge of two objects: shared keys merge recursively, keys unique
/// to either side are kept. Key order is the winner's keys first, then the
/// fallback's extras in their own order.
fn merge_objects(value: &Rc<ConfigValue>, fallback: &Rc<ConfigValue>) -> Rc<ConfigValue> {
    let left = value.as_object().expect("object operand");
    let right = fallback.as_object().expect("object operand");

    let mut changed = false;
    let mut entries: IndexMap<String, Rc<ConfigValue>> =
        IndexMap::with_capacity(left.len() + right.len());
    for (key, child) in left.iter() {
        match right.get(key) {
            Some(below) => {
                let merged = with_fallback(child, below);
                if !Rc::ptr_eq(&merged, child) {
                    changed = true;
                }
                entries.insert(key.to_string(), merged);
            }
            None => {
                entries.insert(key.to_string(), child.clone());
            }
        }
    }
    for (key, below) in right.iter() {
        if !left.contains_key(key) {
            changed = true;
            entries.insert(key.to_string(), below.clone());
        }
    }

    if !changed {
        return value.clone();
    }
    let origin = Origin::merged(&value.origin, &fallback.origin);
    ConfigValue::new_object(entries, origin)
}
