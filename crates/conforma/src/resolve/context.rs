//! The per-traversal resolution state machine.
//!
//! One [`ResolveContext`] is created for each top-level resolve and threaded
//! mutably through the whole traversal. It owns:
//!
//! - the memo table (per-node-identity results, see
//!   [`memo`](crate::resolve::memo)),
//! - the replacement map: while a reference (or a layer of a delayed merge)
//!   is being resolved, the node is mapped to what a lookup re-entering it
//!   should see instead: a cycle signal, or the merge of the layers below
//!   the one in flight,
//! - the current restrict-to-child path: lookups resolve the root restricted
//!   to the target path only, so a cycle in a sibling key cannot poison an
//!   unrelated lookup,
//! - the expression trace stack, recording in-flight substitutions for cycle
//!   error messages.
//!
//! The cycle signal ([`ResolveFault::NotPossible`]) is internal control flow.
//! It is raised when a lookup reaches a node marked in-flight, propagates up
//! through the lookup, and is converted at the reference that started the
//! lookup: into silent absence for `${?path}`, into a
//! [`SubstitutionCycle`](crate::ConfigError::SubstitutionCycle) error
//! otherwise. It never crosses the public API.

use crate::error::ConfigError;
use crate::expr::SubstitutionExpression;
use crate::merge::with_fallback;
use crate::options::ResolveOptions;
use crate::path::Path;
use crate::resolve::memo::{MemoKey, ResolveMemos};
use crate::resolve::{ResolveFault, ResolveOutcome};
use crate::value::{peek_path, ConfigValue, ConfigValueKind, ResolveStatus};
use crate::EnvLookup;
use conforma_origin::Origin;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::rc::Rc;

/// What a lookup should see in place of a node that is currently being
/// resolved further up the stack.
#[derive(Debug, Clone)]
enum Replacer {
    /// Reaching the node again is a cycle.
    Cycle,
    /// Stand-in value: the merge of the delayed-merge layers below the one
    /// in flight, so self-referential merges resolve against their own
    /// fallbacks.
    Value(Rc<ConfigValue>),
}

pub(crate) struct ResolveContext<'a> {
    root: Rc<ConfigValue>,
    memos: ResolveMemos,
    options: ResolveOptions,
    env: &'a dyn EnvLookup,
    restrict_to_child: Option<Path>,
    expression_trace: Vec<SubstitutionExpression>,
    replacements: HashMap<*const ConfigValue, Replacer>,
}

impl<'a> ResolveContext<'a> {
    pub(crate) fn new(
        root: Rc<ConfigValue>,
        options: ResolveOptions,
        env: &'a dyn EnvLookup,
    ) -> Self {
        Self {
            root,
            memos: ResolveMemos::new(),
            options,
            env,
            restrict_to_child: None,
            expression_trace: Vec::new(),
            replacements: HashMap::new(),
        }
    }

    /// Resolve one node, memo-first.
    ///
    /// A fully-resolved result satisfies any later request for the same node,
    /// restricted or not, so the unrestricted key is always checked first and
    /// preferred for writes.
    pub(crate) fn resolve(&mut self, original: &Rc<ConfigValue>) -> ResolveOutcome {
        let full_key = MemoKey::new(original.clone(), None);
        let mut restricted_key = None;

        let mut cached = self.memos.get(&full_key);
        if cached.is_none() && self.restrict_to_child.is_some() {
            let key = MemoKey::new(original.clone(), self.restrict_to_child.clone());
            cached = self.memos.get(&key);
            restricted_key = Some(key);
        }
        if let Some(hit) = cached {
            return Ok(hit.clone());
        }

        let resolved = self.resolve_checking_replacement(original)?;

        let fully_resolved = match &resolved {
            None => true,
            Some(v) => v.resolve_status() == ResolveStatus::Resolved,
        };
        if fully_resolved {
            // even under a restriction: the restricted child turned out to
            // be the only unresolved thing, so the result is good for the
            // unrestricted case too
            self.memos.put(full_key, resolved.clone());
        } else if let Some(key) = restricted_key {
            self.memos.put(key, resolved.clone());
        } else if self.options.allow_unresolved() {
            self.memos.put(full_key, resolved.clone());
        } else {
            panic!("resolution left an unresolved value without a restriction in effect; this is a bug");
        }
        Ok(resolved)
    }

    fn resolve_checking_replacement(&mut self, original: &Rc<ConfigValue>) -> ResolveOutcome {
        match self.replacements.get(&Rc::as_ptr(original)) {
            Some(Replacer::Cycle) => {
                tracing::debug!(trace = %self.trace_string(), "substitution cycle detected");
                Err(ResolveFault::NotPossible {
                    trace: self.trace_string(),
                })
            }
            Some(Replacer::Value(replacement)) => {
                let replacement = replacement.clone();
                self.resolve(&replacement)
            }
            None => self.resolve_substitutions(original),
        }
    }

    fn resolve_substitutions(&mut self, original: &Rc<ConfigValue>) -> ResolveOutcome {
        match &original.kind {
            ConfigValueKind::Null
            | ConfigValueKind::Boolean(_)
            | ConfigValueKind::Number(_)
            | ConfigValueKind::String(_) => Ok(Some(original.clone())),
            ConfigValueKind::Object(_) => self.resolve_object(original),
            ConfigValueKind::List(_) => self.resolve_list(original),
            ConfigValueKind::Reference(_) => self.resolve_reference(original),
            ConfigValueKind::DelayedMerge(_) => self.resolve_delayed_merge(original),
        }
    }

    /// Resolve an object's children. Under a restriction only the restricted
    /// chain is descended, and the final child named by the restriction is
    /// left as-is (the caller peeks it and resolves it separately).
    fn resolve_object(&mut self, original: &Rc<ConfigValue>) -> ResolveOutcome {
        let object = original.as_object().expect("object node");
        if object.status() == ResolveStatus::Resolved {
            return Ok(Some(original.clone()));
        }

        let restriction = self.restrict_to_child.clone();
        let mut changed = false;
        let mut entries: IndexMap<String, Rc<ConfigValue>> = IndexMap::with_capacity(object.len());
        for (key, child) in object.iter() {
            let new_child = match &restriction {
                Some(path) if path.first() == key => match path.remainder() {
                    Some(remainder) => {
                        self.resolve_restricted(child, Some(remainder.clone()))?
                    }
                    None => Some(child.clone()),
                },
                Some(_) => Some(child.clone()),
                None => self.resolve_restricted(child, None)?,
            };
            match new_child {
                Some(v) => {
                    if !Rc::ptr_eq(&v, child) {
                        changed = true;
                    }
                    entries.insert(key.to_string(), v);
                }
                None => {
                    // optional substitution vanished; the key goes with it
                    changed = true;
                }
            }
        }

        if changed {
            Ok(Some(ConfigValue::new_object(entries, original.origin.clone())))
        } else {
            Ok(Some(original.clone()))
        }
    }

    /// Lists resolve all elements unconditionally; restrictions are about
    /// object keys and do not apply inside lists.
    fn resolve_list(&mut self, original: &Rc<ConfigValue>) -> ResolveOutcome {
        let list = original.as_list().expect("list node");
        if list.status() == ResolveStatus::Resolved {
            return Ok(Some(original.clone()));
        }

        let mut changed = false;
        let mut elements = Vec::with_capacity(list.len());
        for element in list.elements() {
            match self.resolve_restricted(element, None)? {
                Some(v) => {
                    if !Rc::ptr_eq(&v, element) {
                        changed = true;
                    }
                    elements.push(v);
                }
                None => {
                    changed = true;
                }
            }
        }

        if changed {
            Ok(Some(ConfigValue::new_list(elements, original.origin.clone())))
        } else {
            Ok(Some(original.clone()))
        }
    }

    /// Resolve a `${path}` reference. This is the firewall for the cycle
    /// signal: any lookup failure-to-make-progress starts at a reference, so
    /// converting the signal here guarantees it cannot escape further.
    fn resolve_reference(&mut self, original: &Rc<ConfigValue>) -> ResolveOutcome {
        let (expr, prefix_length) = match &original.kind {
            ConfigValueKind::Reference(r) => (r.expression().clone(), r.prefix_length()),
            _ => unreachable!("resolve_reference on a non-reference"),
        };

        self.replacements
            .insert(Rc::as_ptr(original), Replacer::Cycle);
        let outcome = self.resolve_reference_inner(original, &expr, prefix_length);
        self.replacements.remove(&Rc::as_ptr(original));
        outcome
    }

    fn resolve_reference_inner(
        &mut self,
        original: &Rc<ConfigValue>,
        expr: &SubstitutionExpression,
        prefix_length: usize,
    ) -> ResolveOutcome {
        let looked_up = match self.lookup_subst(expr, prefix_length) {
            Ok(v) => v,
            Err(ResolveFault::NotPossible { trace }) => {
                if expr.optional() {
                    None
                } else {
                    return Err(ResolveFault::Fatal(ConfigError::SubstitutionCycle {
                        origin: original.origin.clone(),
                        expression: expr.to_string(),
                        trace,
                    }));
                }
            }
            Err(fatal) => return Err(fatal),
        };

        if looked_up.is_none() && !expr.optional() {
            if self.options.allow_unresolved() {
                Ok(Some(original.clone()))
            } else {
                Err(ResolveFault::Fatal(ConfigError::UnresolvedSubstitution {
                    origin: original.origin.clone(),
                    expression: expr.to_string(),
                }))
            }
        } else {
            Ok(looked_up)
        }
    }

    /// Collapse a delayed merge by resolving each layer and folding with
    /// `with_fallback`. While a reference layer is in flight, the merge node
    /// is mapped to the merge of the layers below it, so `a` defined as a
    /// merge involving `${a}` resolves against its own fallback layers
    /// instead of cycling.
    fn resolve_delayed_merge(&mut self, original: &Rc<ConfigValue>) -> ResolveOutcome {
        let stack = match &original.kind {
            ConfigValueKind::DelayedMerge(d) => d.alternatives().to_vec(),
            _ => unreachable!("resolve_delayed_merge on a non-merge"),
        };

        let mut merged: Option<Rc<ConfigValue>> = None;
        for (index, layer) in stack.iter().enumerate() {
            if matches!(layer.kind, ConfigValueKind::DelayedMerge(_)) {
                panic!("a delayed merge should not contain another one; this is a bug");
            }

            let guarded = matches!(layer.kind, ConfigValueKind::Reference(_));
            if guarded {
                let replacer = Self::make_replacer(&stack, index + 1);
                self.replacements.insert(Rc::as_ptr(original), replacer);
            }
            let resolved_layer = self.resolve(layer);
            if guarded {
                self.replacements.remove(&Rc::as_ptr(original));
            }

            if let Some(v) = resolved_layer? {
                merged = Some(match merged {
                    None => v,
                    Some(m) => with_fallback(&m, &v),
                });
            }
        }
        Ok(merged)
    }

    /// What a re-entrant lookup of a delayed merge should see while the layer
    /// at `skipping - 1` resolves: everything below it, or a cycle if there
    /// is nothing below.
    fn make_replacer(stack: &[Rc<ConfigValue>], skipping: usize) -> Replacer {
        let below = &stack[skipping.min(stack.len())..];
        match below.split_first() {
            None => Replacer::Cycle,
            Some((first, rest)) => {
                let mut merged = first.clone();
                for layer in rest {
                    merged = with_fallback(&merged, layer);
                }
                Replacer::Value(merged)
            }
        }
    }

    /// Look up a substitution target: first the full (possibly grafted)
    /// path in the tree, then the path with the graft prefix stripped, then
    /// the environment. A found value is itself resolved before returning.
    fn lookup_subst(
        &mut self,
        expr: &SubstitutionExpression,
        prefix_length: usize,
    ) -> ResolveOutcome {
        tracing::trace!(expression = %expr, "looking up substitution");
        self.expression_trace.push(expr.clone());
        let outcome = self.lookup_subst_traced(expr, prefix_length);
        self.expression_trace.pop();
        outcome
    }

    fn lookup_subst_traced(
        &mut self,
        expr: &SubstitutionExpression,
        prefix_length: usize,
    ) -> ResolveOutcome {
        let root = self.root.clone();
        let mut result = self.find_in_object(&root, expr.path())?;

        if result.is_none() {
            // a grafted subtree looks up relative to the graft point first;
            // falling back to the original path covers references into the
            // surrounding tree and keeps env lookups un-rerooted
            let unprefixed = if prefix_length > 0 {
                let path = expr.path().sub_path(prefix_length).unwrap_or_else(|| {
                    panic!("reference prefix length exceeds its path; this is a bug")
                });
                self.expression_trace.pop();
                self.expression_trace.push(expr.change_path(path.clone()));
                result = self.find_in_object(&root, &path)?;
                path
            } else {
                expr.path().clone()
            };

            if result.is_none() && self.options.use_system_environment() {
                result = self.lookup_env(&unprefixed);
            }
        }

        match result {
            Some(v) => self.resolve(&v),
            None => Ok(None),
        }
    }

    /// Walk `path` through `obj`, resolving just enough of the tree to
    /// traverse it: the object is resolved restricted to `path`, then peeked.
    fn find_in_object(&mut self, obj: &Rc<ConfigValue>, path: &Path) -> ResolveOutcome {
        let partially_resolved = self.resolve_restricted(obj, Some(path.clone()))?;
        match partially_resolved {
            Some(v) if v.is_object() => {
                peek_path(&v, path).map_err(ResolveFault::Fatal)
            }
            other => panic!(
                "restricted resolve of an object produced {}; this is a bug",
                other.map(|v| v.type_name()).unwrap_or("nothing")
            ),
        }
    }

    /// Environment variables form a flat namespace, so only single-key paths
    /// can match one.
    fn lookup_env(&self, path: &Path) -> Option<Rc<ConfigValue>> {
        if path.length() != 1 {
            return None;
        }
        let name = path.first();
        self.env.var(name).map(|value| {
            tracing::debug!(name, "substitution satisfied from environment");
            ConfigValue::new_string(value, Origin::new_simple(format!("env variable {}", name)))
        })
    }

    fn resolve_restricted(
        &mut self,
        value: &Rc<ConfigValue>,
        restrict_to_child: Option<Path>,
    ) -> ResolveOutcome {
        let saved = std::mem::replace(&mut self.restrict_to_child, restrict_to_child);
        let outcome = self.resolve(value);
        self.restrict_to_child = saved;
        outcome
    }

    fn trace_string(&self) -> String {
        self.expression_trace
            .iter()
            .map(|expr| expr.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
