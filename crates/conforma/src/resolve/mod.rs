//! Substitution resolution.
//!
//! Entry point is [`resolve_root`]; the traversal itself lives in
//! [`context`]. See the module docs there for how memoization, restriction,
//! and cycle detection fit together.

mod context;
mod memo;

use crate::error::{ConfigError, Result};
use crate::options::ResolveOptions;
use crate::value::{ConfigValue, ResolveStatus};
use crate::EnvLookup;
use context::ResolveContext;
use std::rc::Rc;

/// Internal failure modes of one resolve step.
#[derive(Debug)]
pub(crate) enum ResolveFault {
    /// The in-flight-node marker was hit: resolving this would require its
    /// own result. Control flow, not an error; converted at the reference
    /// that started the lookup.
    NotPossible {
        /// Rendered chain of in-flight expressions, for the cycle message.
        trace: String,
    },
    /// A real error to surface to the caller.
    Fatal(ConfigError),
}

/// `Ok(None)` means the value resolved to nothing: an optional substitution
/// whose target is absent. Containers drop such children.
pub(crate) type ResolveOutcome = std::result::Result<Option<Rc<ConfigValue>>, ResolveFault>;

/// Resolve every substitution in the tree rooted at `root`, looking up
/// target paths against that same root.
pub(crate) fn resolve_root(
    root: &Rc<ConfigValue>,
    options: ResolveOptions,
    env: &dyn EnvLookup,
) -> Result<Rc<ConfigValue>> {
    if root.resolve_status() == ResolveStatus::Resolved {
        return Ok(root.clone());
    }
    tracing::debug!(
        allow_unresolved = options.allow_unresolved(),
        use_system_environment = options.use_system_environment(),
        "resolving configuration"
    );

    let mut context = ResolveContext::new(root.clone(), options, env);
    match context.resolve(root) {
        Ok(Some(resolved)) => Ok(resolved),
        Ok(None) => panic!("the root object vanished during resolution; this is a bug"),
        Err(ResolveFault::Fatal(e)) => Err(e),
        Err(ResolveFault::NotPossible { .. }) => {
            // every lookup starts at a reference, which converts the signal
            panic!("cycle signal escaped the outermost resolve; this is a bug")
        }
    }
}

impl From<ConfigError> for ResolveFault {
    fn from(e: ConfigError) -> Self {
        ResolveFault::Fatal(e)
    }
}
