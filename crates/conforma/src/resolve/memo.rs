//! Memoization table for the resolution traversal.
//!
//! Resolution is memoized per *node identity*, not per structural value: the
//! same `Rc` node reached through different routes resolves once. A key also
//! records the restriction path in effect, since a partial resolve restricted
//! to one child produces a different (less resolved) result than a full
//! resolve of the same node.

use crate::path::Path;
use crate::value::ConfigValue;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Identity of one resolve request: a specific tree node plus the
/// restrict-to-child path in effect (`None` for a full resolve).
///
/// Holding the `Rc` keeps the node alive for the lifetime of the memo table,
/// so the pointer identity cannot be recycled mid-traversal.
#[derive(Debug, Clone)]
pub(crate) struct MemoKey {
    value: Rc<ConfigValue>,
    restrict_to_child: Option<Path>,
}

impl MemoKey {
    pub(crate) fn new(value: Rc<ConfigValue>, restrict_to_child: Option<Path>) -> Self {
        Self {
            value,
            restrict_to_child,
        }
    }
}

impl PartialEq for MemoKey {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.value, &other.value)
            && self.restrict_to_child == other.restrict_to_child
    }
}

impl Eq for MemoKey {}

impl Hash for MemoKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.value) as usize).hash(state);
        self.restrict_to_child.hash(state);
    }
}

/// The memo table. A memoized result of `None` means the node resolved to
/// nothing (an optional substitution that vanished).
#[derive(Debug, Default)]
pub(crate) struct ResolveMemos {
    memos: HashMap<MemoKey, Option<Rc<ConfigValue>>>,
}

impl ResolveMemos {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, key: &MemoKey) -> Option<&Option<Rc<ConfigValue>>> {
        self.memos.get(key)
    }

    pub(crate) fn put(&mut self, key: MemoKey, value: Option<Rc<ConfigValue>>) {
        self.memos.insert(key, value);
    }
}
