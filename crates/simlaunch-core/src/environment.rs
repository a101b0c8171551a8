//! Child-process environment propagation.
//!
//! The host process marks variables intended for the launched process with the
//! [`CHILD_ENV_PREFIX`] marker. This module selects those variables, strips the
//! marker, and merges the resulting overlay into a configuration's environment.
//!
//! # Example
//!
//! ```
//! use simlaunch_core::environment::{derive_overlay, Environment, CHILD_ENV_PREFIX};
//!
//! let raw: Environment = [
//!     ("FBSIMCTL_CHILD_FOO".to_string(), "BAR".to_string()),
//!     ("PATH".to_string(), "/usr/bin".to_string()),
//! ]
//! .into_iter()
//! .collect();
//!
//! let overlay = derive_overlay(&raw, CHILD_ENV_PREFIX);
//! assert_eq!(overlay.get("FOO").map(String::as_str), Some("BAR"));
//! assert!(!overlay.contains_key("PATH"));
//! ```

use std::collections::BTreeMap;
use std::ffi::OsString;

use thiserror::Error;
use tracing::debug;

/// Marker prefix identifying host variables that belong to the child process.
pub const CHILD_ENV_PREFIX: &str = "FBSIMCTL_CHILD_";

/// Name to value mapping. Ordered so rendered output is reproducible.
pub type Environment = BTreeMap<String, String>;

/// Errors raised while reading the host environment.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EnvironmentError {
    /// A child-prefixed variable carried a value that is not valid UTF-8.
    #[error("Environment variable {name} has a non-UTF-8 value")]
    NotUnicode {
        /// Name of the offending variable.
        name: String,
    },
}

/// Capability of configuration values that carry a child environment.
///
/// Implementors return a new value with `overlay` merged into their
/// environment; the receiver is left untouched.
pub trait EnvironmentAdditions: Sized {
    /// Returns a copy with `overlay` merged in. Overlay entries win on collision.
    fn with_environment_additions(&self, overlay: &Environment) -> Self;
}

/// Derives the child overlay from a raw environment.
///
/// Every entry whose key starts with `prefix` is kept with the prefix removed;
/// everything else is dropped. A key equal to `prefix` yields the empty key.
pub fn derive_overlay<'a, I>(raw: I, prefix: &str) -> Environment
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    raw.into_iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(prefix)
                .map(|stripped| (stripped.to_string(), value.clone()))
        })
        .collect()
}

/// Returns the union of `base` and `overlay`, with `overlay` taking precedence.
pub fn merge_environment(base: &Environment, overlay: &Environment) -> Environment {
    let mut merged = base.clone();
    for (key, value) in overlay {
        if let Some(previous) = merged.insert(key.clone(), value.clone()) {
            debug!(key = %key, previous = %previous, "Overlay replaced existing variable");
        }
    }
    merged
}

/// Reads host environment entries relevant to the child process.
///
/// Accepts the pairs produced by [`std::env::vars_os`]. Entries with a
/// non-UTF-8 name, or whose name lacks `prefix`, are skipped. A prefixed entry
/// whose value is not UTF-8 is rejected. The returned keys still carry the
/// prefix; pass the result to [`derive_overlay`] to strip it.
///
/// # Errors
///
/// - [`EnvironmentError::NotUnicode`] if a prefixed variable has a non-UTF-8 value
pub fn read_environment<I>(vars: I, prefix: &str) -> Result<Environment, EnvironmentError>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut environment = Environment::new();
    for (name, value) in vars {
        let name = match name.into_string() {
            Ok(name) => name,
            Err(raw) => {
                debug!(name = ?raw, "Skipping variable with non-UTF-8 name");
                continue;
            }
        };
        if !name.starts_with(prefix) {
            continue;
        }
        let value = value
            .into_string()
            .map_err(|_| EnvironmentError::NotUnicode { name: name.clone() })?;
        environment.insert(name, value);
    }
    debug!(count = environment.len(), "Captured child environment");
    Ok(environment)
}
