//! Environment-variable lookup seam.
//!
//! The resolver consults an [`EnvLookup`] only after a substitution path was
//! not found anywhere in the tree (and only when
//! [`ResolveOptions::use_system_environment`](crate::ResolveOptions::use_system_environment)
//! is on). [`SystemEnvironment`] reads the real process environment;
//! [`MapEnvironment`] serves a fixed table, for tests and hermetic builds.

use std::collections::HashMap;

/// Source of environment variables for substitution fallback.
pub trait EnvLookup {
    /// The value of the variable `name`, if set.
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl EnvLookup for SystemEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        // non-unicode values are treated as unset
        std::env::var(name).ok()
    }
}

/// A fixed in-memory environment.
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment {
    vars: HashMap<String, String>,
}

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvLookup for MapEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnvironment {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_environment() {
        let env = MapEnvironment::new().set("HOME", "/home/me");
        assert_eq!(env.var("HOME").as_deref(), Some("/home/me"));
        assert_eq!(env.var("MISSING"), None);
    }

    #[test]
    fn test_map_environment_from_iter() {
        let env: MapEnvironment = [("A", "1"), ("B", "2")].into_iter().collect();
        assert_eq!(env.var("B").as_deref(), Some("2"));
    }
}
