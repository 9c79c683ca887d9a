//! Mapping document model.
//!
//! A mapping document associates compound filters with variable bindings,
//! and every binding points at a [`Location`] in the secrets store:
//!
//! ```yaml
//! "G@role:web":
//!   db_password: "secret/db?password"   # one key
//!   app: "secret/app"                   # every key under the path
//!   tls:                                # nested
//!     cert: "secret/tls?cert"
//!     key: "secret/tls?key"
//! ```
//!
//! Entries keep document order so that filter precedence is well defined.

use serde_yaml::Value as Yaml;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::core::constants::KEY_SEPARATOR;
use crate::core::types::{FilterExpr, VariableName};
use crate::error::{ConfigError, Result};

/// Where a pillar value lives in the secrets store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A single key under a store path (`path?key`).
    Scalar { path: String, key: String },
    /// Every key under a store path (`path`).
    List { path: String },
    /// A mapping of return keys to further locations.
    Nested(BTreeMap<String, Location>),
    /// A node of any other type; carries its type name for diagnostics.
    Invalid(&'static str),
}

impl Location {
    /// Parse a location string, splitting on the first `?`.
    pub fn parse(s: &str) -> Self {
        match s.split_once(KEY_SEPARATOR) {
            Some((path, key)) => Location::Scalar {
                path: path.to_string(),
                key: key.to_string(),
            },
            None => Location::List {
                path: s.to_string(),
            },
        }
    }

    /// Build a location tree from a YAML node.
    pub fn from_yaml(node: &Yaml) -> Self {
        match node {
            Yaml::String(s) => Location::parse(s),
            Yaml::Mapping(map) => {
                let mut nested = BTreeMap::new();
                for (k, v) in map {
                    match key_string(k) {
                        Some(key) => {
                            nested.insert(key, Location::from_yaml(v));
                        }
                        None => debug!(kind = yaml_kind(k), "skipping non-scalar location key"),
                    }
                }
                Location::Nested(nested)
            }
            Yaml::Tagged(tagged) => Location::from_yaml(&tagged.value),
            other => Location::Invalid(yaml_kind(other)),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Scalar { path, key } => write!(f, "{}{}{}", path, KEY_SEPARATOR, key),
            Location::List { path } => write!(f, "{}", path),
            Location::Nested(map) => write!(f, "{{{} keys}}", map.len()),
            Location::Invalid(kind) => write!(f, "<{}>", kind),
        }
    }
}

/// Variable bindings of one filter, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings(pub Vec<(VariableName, Location)>);

impl Bindings {
    pub fn iter(&self) -> impl Iterator<Item = &(VariableName, Location)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A parsed mapping document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigMap {
    entries: Vec<(FilterExpr, Bindings)>,
}

impl ConfigMap {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML mapping document.
    ///
    /// An empty or `null` document is an empty mapping. Filters whose value
    /// is not a mapping are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Yaml` if the text is not YAML, or
    /// `ConfigError::Document` if the top level is not a mapping.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let doc: Yaml = serde_yaml::from_str(text).map_err(ConfigError::Yaml)?;
        Self::from_yaml(&doc)
    }

    /// Build a mapping from a parsed YAML node.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Document` if `doc` is neither a mapping nor null.
    pub fn from_yaml(doc: &Yaml) -> Result<Self> {
        let map = match doc {
            Yaml::Null => return Ok(Self::new()),
            Yaml::Mapping(map) => map,
            Yaml::Tagged(tagged) => return Self::from_yaml(&tagged.value),
            other => {
                return Err(ConfigError::Document(format!(
                    "expected a mapping of filters, found {}",
                    yaml_kind(other)
                ))
                .into())
            }
        };

        let mut config = Self::new();
        for (filter, bindings) in map {
            let Some(filter) = key_string(filter) else {
                warn!(kind = yaml_kind(filter), "skipping non-scalar filter");
                continue;
            };
            match bindings_from_yaml(bindings) {
                Some(bindings) => config.insert(filter, bindings),
                None => warn!(
                    filter = %filter,
                    kind = yaml_kind(bindings),
                    "skipping filter whose bindings are not a mapping"
                ),
            }
        }
        Ok(config)
    }

    /// Build a mapping from a JSON document (the dynamic fragment).
    ///
    /// Filters keep the order they have in the stored JSON text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Document` if `doc` is not a JSON object.
    pub fn from_json(doc: &serde_json::Value) -> Result<Self> {
        if !doc.is_object() {
            return Err(ConfigError::Document(
                "dynamic configuration must be a JSON object".to_string(),
            )
            .into());
        }
        let yaml = serde_yaml::to_value(doc).map_err(ConfigError::Yaml)?;
        Self::from_yaml(&yaml)
    }

    /// Insert or replace a filter.
    ///
    /// A filter that already exists keeps its position.
    pub fn insert(&mut self, filter: FilterExpr, bindings: Bindings) {
        match self.entries.iter_mut().find(|(f, _)| *f == filter) {
            Some(entry) => entry.1 = bindings,
            None => self.entries.push((filter, bindings)),
        }
    }

    /// Shallow-merge `other` over `self`.
    ///
    /// Filters present in both take `other`'s bindings wholesale; new
    /// filters are appended in `other`'s document order, which decides
    /// precedence among them.
    pub fn merge(mut self, other: ConfigMap) -> ConfigMap {
        for (filter, bindings) in other.entries {
            self.insert(filter, bindings);
        }
        self
    }

    /// Filters and their bindings in document order.
    pub fn iter(&self) -> impl Iterator<Item = &(FilterExpr, Bindings)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn bindings_from_yaml(node: &Yaml) -> Option<Bindings> {
    match node {
        Yaml::Mapping(map) => Some(Bindings(
            map.iter()
                .filter_map(|(k, v)| key_string(k).map(|k| (k, Location::from_yaml(v))))
                .collect(),
        )),
        // `filter:` with nothing under it
        Yaml::Null => Some(Bindings::default()),
        Yaml::Tagged(tagged) => bindings_from_yaml(&tagged.value),
        _ => None,
    }
}

/// Stringify a scalar mapping key.
fn key_string(key: &Yaml) -> Option<String> {
    match key {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Number(n) => Some(n.to_string()),
        Yaml::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn yaml_kind(node: &Yaml) -> &'static str {
    match node {
        Yaml::Null => "null",
        Yaml::Bool(_) => "bool",
        Yaml::Number(n) if n.is_f64() => "float",
        Yaml::Number(_) => "int",
        Yaml::String(_) => "string",
        Yaml::Sequence(_) => "sequence",
        Yaml::Mapping(_) => "mapping",
        Yaml::Tagged(_) => "tagged",
    }
}
