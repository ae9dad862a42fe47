//! Generator configuration snapshots and the named lookups they are read from.

use std::{
    collections::{BTreeMap, HashMap},
    env,
    hash::BuildHasher,
};

use crate::{
    error::{ConfigError, Result, ValidationError},
    generator::Mode,
    node::parse_node,
    uuid::Uuid,
};

/// Lookup key selecting the generation mode.
pub const KEY_VERSION: &str = "generator.version";

/// Lookup key holding an explicit node as 12 hexadecimal digits.
pub const KEY_NODE: &str = "generator.node";

/// Lookup key holding the namespace root of name-based modes.
pub const KEY_NAMESPACE_ROOT: &str = "generator.namespaceRoot";

const MAX_NODE: u64 = (1 << 48) - 1;

/// An immutable configuration snapshot of a [`Generator`](crate::Generator).
///
/// # Examples
///
/// ```rust
/// use rfcuuid::{GeneratorConfig, Mode, Uuid};
/// use std::collections::HashMap;
///
/// let lookup = HashMap::from([
///     ("generator.version".to_owned(), "sha1".to_owned()),
///     (
///         "generator.namespaceRoot".to_owned(),
///         "6ba7b810-9dad-11d1-80b4-00c04fd430c8".to_owned(),
///     ),
/// ]);
/// let config = GeneratorConfig::from_lookup(&lookup)?;
/// assert_eq!(config.mode, Mode::NameSha1);
/// assert_eq!(config.namespace_root, Some(Uuid::NAMESPACE_DNS));
/// # Ok::<(), rfcuuid::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct GeneratorConfig {
    /// Generation algorithm.
    pub mode: Mode,
    /// Explicit 48-bit node for the time-based mode; resolved from the host when `None`.
    pub node: Option<u64>,
    /// Namespace hashed before names in name-based modes.
    pub namespace_root: Option<Uuid>,
}

impl GeneratorConfig {
    /// Checks field ranges and cross-field consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfRange`] if the node exceeds 48 bits, or
    /// [`ConfigError::Conflict`] if a namespace root is set for a mode that does not use names.
    pub fn validate(&self) -> Result<()> {
        if let Some(node) = self.node {
            if node > MAX_NODE {
                return Err(ValidationError::OutOfRange {
                    field: "node",
                    value: node,
                    bits: 48,
                }
                .into());
            }
        }
        if self.namespace_root.is_some() && !self.mode.is_name_based() {
            return Err(ConfigError::Conflict(
                "a namespace root requires a name-based mode",
            )
            .into());
        }
        Ok(())
    }

    /// Reads a configuration from a named lookup. Absent keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedVersion`] for an unknown `generator.version`,
    /// [`ConfigError::InvalidValue`] for a malformed `generator.node` or
    /// `generator.namespaceRoot`, or any error of [`validate()`](Self::validate).
    pub fn from_lookup<L: ConfigLookup + ?Sized>(lookup: &L) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup.lookup(KEY_VERSION) {
            config.mode = value.parse()?;
        }
        if let Some(value) = lookup.lookup(KEY_NODE) {
            config.node = Some(parse_node(value.trim()).ok_or_else(|| {
                ConfigError::InvalidValue {
                    key: KEY_NODE,
                    reason: format!("expected 12 hexadecimal digits, got `{value}`"),
                }
            })?);
        }
        if let Some(value) = lookup.lookup(KEY_NAMESPACE_ROOT) {
            let root = Uuid::parse_str(value.trim()).map_err(|e| ConfigError::InvalidValue {
                key: KEY_NAMESPACE_ROOT,
                reason: e.to_string(),
            })?;
            config.namespace_root = Some(root);
        }

        config.validate()?;
        Ok(config)
    }
}

/// A source of named configuration values.
pub trait ConfigLookup {
    /// Returns the value stored under `key`, if any.
    fn lookup(&self, key: &str) -> Option<String>;
}

impl<S: BuildHasher> ConfigLookup for HashMap<String, String, S> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl ConfigLookup for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<T: ConfigLookup + ?Sized> ConfigLookup for &T {
    fn lookup(&self, key: &str) -> Option<String> {
        (**self).lookup(key)
    }
}

/// Reads configuration from environment variables.
///
/// A key maps to a variable by upper-casing it, splitting camel case with underscores, and
/// replacing dots with underscores: `generator.namespaceRoot` reads `GENERATOR_NAMESPACE_ROOT`.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct EnvLookup;

impl EnvLookup {
    /// Returns the variable name read for `key`.
    pub fn variable_name(key: &str) -> String {
        let mut name = String::with_capacity(key.len() + 4);
        for c in key.chars() {
            match c {
                '.' | '-' => name.push('_'),
                c if c.is_ascii_uppercase() => {
                    name.push('_');
                    name.push(c);
                }
                c => name.push(c.to_ascii_uppercase()),
            }
        }
        name
    }
}

impl ConfigLookup for EnvLookup {
    fn lookup(&self, key: &str) -> Option<String> {
        env::var(Self::variable_name(key)).ok()
    }
}

/// A lookup backed by a closure; see [`from_fn()`].
#[derive(Clone, Debug)]
pub struct FromFn<F>(F);

/// Creates a lookup that calls `f` for each key.
///
/// ```rust
/// use rfcuuid::{config, GeneratorConfig, Mode};
///
/// let lookup = config::from_fn(|key| (key == "generator.version").then(|| "4".to_owned()));
/// assert_eq!(GeneratorConfig::from_lookup(&lookup)?.mode, Mode::Random);
/// # Ok::<(), rfcuuid::Error>(())
/// ```
pub fn from_fn<F: Fn(&str) -> Option<String>>(f: F) -> FromFn<F> {
    FromFn(f)
}

impl<F: Fn(&str) -> Option<String>> ConfigLookup for FromFn<F> {
    fn lookup(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }
}
