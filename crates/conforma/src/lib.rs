//! Configuration-document engine: immutable value trees, fallback merging,
//! and cycle-safe `${path}` substitution resolution.
//!
//! # Key Features
//!
//! - **Provenance preservation**: every value carries an [`Origin`] used in
//!   error messages
//! - **Associative merging**: `a.with_fallback(b)` layers configurations,
//!   with `(a <> b) <> c == a <> (b <> c)` even across unresolved
//!   substitutions
//! - **Memoized resolution**: substitutions resolve once per node, lookups
//!   are scoped so unrelated cycles cannot interfere, and genuine cycles
//!   fail with the full chain of expressions involved
//! - **Immutability**: merging and resolving produce new trees sharing
//!   unchanged substructure; inputs are never mutated
//!
//! # Architecture
//!
//! The crate is organized around these core concepts:
//!
//! - [`ConfigValue`] / [`ConfigValueKind`]: the tagged-union value tree,
//!   including the pre-resolution `Reference` and `DelayedMerge` forms
//! - [`Config`]: an object-kind root with typed path accessors
//! - [`Path`] / [`SubstitutionExpression`]: dotted key sequences and the
//!   `${path}` / `${?path}` expressions that point with them
//! - [`ResolveOptions`] / [`EnvLookup`]: how resolution treats missing
//!   substitutions and the environment
//! - trait seams for the pieces this crate deliberately does not implement:
//!   parsing ([`ConfigParser`]), includes ([`Includer`]), rendering
//!   ([`ConfigRenderer`])
//!
//! # Example
//!
//! ```rust
//! use conforma::{Config, Origin, ResolveOptions};
//!
//! let overrides = Config::from_plain(
//!     &serde_json::json!({"server": {"port": 9090}}),
//!     &Origin::new_simple("overrides"),
//! )?;
//! let defaults = Config::from_plain(
//!     &serde_json::json!({"server": {"port": 8080, "host": "localhost"}}),
//!     &Origin::new_simple("defaults"),
//! )?;
//!
//! let config = overrides.with_fallback(&defaults).resolve(ResolveOptions::defaults())?;
//! assert_eq!(config.get_int("server.port")?, 9090);
//! assert_eq!(config.get_string("server.host")?, "localhost");
//! # Ok::<(), conforma::ConfigError>(())
//! ```

mod config;
mod env;
mod error;
mod expr;
mod include;
mod merge;
mod options;
mod parse;
mod path;
mod render;
mod resolve;
mod util;
mod value;

pub use config::Config;

pub use env::{EnvLookup, MapEnvironment, SystemEnvironment};

pub use error::{ConfigError, Result};

pub use expr::SubstitutionExpression;

pub use include::{IncludeContext, Includer};

pub use merge::with_fallback;

pub use options::ResolveOptions;

pub use parse::{ConfigParser, ParseOptions, Parseable, Syntax};

pub use path::{Path, PathBuilder};

pub use render::{ConfigRenderer, RenderOptions};

pub use util::{join_path, render_json_string, split_path};

pub use value::{
    ConfigList,
    ConfigNumber,
    ConfigObject,
    ConfigReference,
    ConfigValue,
    ConfigValueKind,
    ConfigValueType,
    DelayedMerge,
    ResolveStatus,
};

// Re-export for convenience
pub use conforma_origin::Origin;
