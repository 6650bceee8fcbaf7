//! Options controlling substitution resolution.

/// Immutable options for [`Config::resolve`](crate::Config::resolve).
///
/// Build from a preset and refine with the wither-style setters:
///
/// ```rust
/// use conforma::ResolveOptions;
///
/// let options = ResolveOptions::defaults().with_allow_unresolved(true);
/// assert!(options.use_system_environment());
/// assert!(options.allow_unresolved());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    use_system_environment: bool,
    allow_unresolved: bool,
}

impl ResolveOptions {
    /// The default options: environment fallback on, unresolved
    /// substitutions fatal.
    pub fn defaults() -> Self {
        Self {
            use_system_environment: true,
            allow_unresolved: false,
        }
    }

    /// Like [`ResolveOptions::defaults`] but with environment fallback off,
    /// for fully self-contained resolution.
    pub fn no_system() -> Self {
        Self::defaults().with_use_system_environment(false)
    }

    /// Whether substitution paths not found in the tree fall back to
    /// environment variables.
    pub fn with_use_system_environment(mut self, value: bool) -> Self {
        self.use_system_environment = value;
        self
    }

    /// Whether resolution tolerates substitutions with no value, leaving
    /// them in the tree verbatim instead of failing. Cycles are fatal
    /// regardless.
    pub fn with_allow_unresolved(mut self, value: bool) -> Self {
        self.allow_unresolved = value;
        self
    }

    pub fn use_system_environment(&self) -> bool {
        self.use_system_environment
    }

    pub fn allow_unresolved(&self) -> bool {
        self.allow_unresolved
    }
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ResolveOptions::defaults();
        assert!(options.use_system_environment());
        assert!(!options.allow_unresolved());
        assert_eq!(options, ResolveOptions::default());
    }

    #[test]
    fn test_no_system() {
        assert!(!ResolveOptions::no_system().use_system_environment());
    }

    #[test]
    fn test_withers_do_not_touch_other_fields() {
        let options = ResolveOptions::no_system().with_allow_unresolved(true);
        assert!(!options.use_system_environment());
        assert!(options.allow_unresolved());
    }
}
