//! Location resolution.
//!
//! [`Resolver::couple`] turns one [`Location`] into a pillar value and
//! [`Resolver::resolve_pillar`] assembles the pillar of a minion from every
//! filter it matches.
//!
//! Resolution never fails. A broken leaf is logged and degrades to `null`,
//! or disappears entirely when `unset_if_missing` is on; its siblings are
//! resolved regardless.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::core::location::{ConfigMap, Location};
use crate::core::matcher::HostMatcher;
use crate::core::store::SecretsClient;
use crate::core::types::Pillar;
use crate::error::StoreError;

/// Resolves locations against a secrets store.
#[derive(Debug, Clone)]
pub struct Resolver<C> {
    client: C,
    unset_if_missing: bool,
}

impl<C: SecretsClient> Resolver<C> {
    /// Create a resolver that keeps missing values as `null`.
    pub fn new(client: C) -> Self {
        Self {
            client,
            unset_if_missing: false,
        }
    }

    /// Drop missing or empty values instead of keeping them.
    pub fn unset_if_missing(mut self, unset: bool) -> Self {
        self.unset_if_missing = unset;
        self
    }

    /// The underlying store.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Resolve one location.
    ///
    /// Returns `None` when the value is absent under `unset_if_missing`.
    /// Absent children of a mapping or key list are kept as `null`; only a
    /// mapping or key list with no entries at all is itself absent.
    pub fn couple(&self, location: &Location) -> Option<Value> {
        match location {
            Location::Scalar { path, key } => self.couple_scalar(path, key),
            Location::List { path } => self.couple_list(path),
            Location::Nested(map) => {
                let mut out = Map::new();
                for (return_key, sub) in map {
                    let value = self.couple(sub).unwrap_or(Value::Null);
                    out.insert(return_key.clone(), value);
                }
                self.finish_object(out)
            }
            Location::Invalid(kind) => {
                debug!(kind, "unsupported location type");
                self.finish_object(Map::new())
            }
        }
    }

    fn couple_scalar(&self, path: &str, key: &str) -> Option<Value> {
        let value = self
            .client
            .get(path, key)
            .map(decode_value)
            .unwrap_or_else(|e| degrade(path, key, &e));
        self.keep(value)
    }

    fn couple_list(&self, path: &str) -> Option<Value> {
        let keys = match self.client.list_keys(path) {
            Ok(keys) => keys,
            Err(e) => {
                debug!(path, store = self.client.name(), error = %e, "failed to list keys");
                Vec::new()
            }
        };
        debug!(path, count = keys.len(), "expanding key list");

        let mut out = Map::new();
        for key in keys {
            let value = self.couple_scalar(path, &key).unwrap_or(Value::Null);
            out.insert(key, value);
        }
        self.finish_object(out)
    }

    fn keep(&self, value: Value) -> Option<Value> {
        if is_truthy(&value) || !self.unset_if_missing {
            Some(value)
        } else {
            None
        }
    }

    fn finish_object(&self, map: Map<String, Value>) -> Option<Value> {
        if map.is_empty() && self.unset_if_missing {
            None
        } else {
            Some(Value::Object(map))
        }
    }

    /// Compile the pillar of `minion_id`.
    ///
    /// Filters are tested in document order; when several matching filters
    /// bind the same variable, the last one wins, even when its result is
    /// absent: the variable is then removed. Filters the matcher can't
    /// evaluate are skipped.
    pub fn resolve_pillar<M>(&self, minion_id: &str, config: &ConfigMap, matcher: &M) -> Pillar
    where
        M: HostMatcher + ?Sized,
    {
        let mut pillar = Pillar::new();
        for (filter, bindings) in config.iter() {
            match matcher.is_member(minion_id, filter) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    warn!(filter = %filter, error = %e, "skipping filter");
                    continue;
                }
            }
            debug!(minion = minion_id, filter = %filter, vars = bindings.len(), "filter matched");

            for (variable, location) in bindings.iter() {
                match self.couple(location) {
                    Some(value) => {
                        pillar.insert(variable.clone(), value);
                    }
                    None => {
                        debug!(variable = %variable, location = %location, "unset");
                        pillar.remove(variable);
                    }
                }
            }
        }
        pillar
    }
}

/// Decode a stored value as JSON, falling back to the raw text.
pub fn decode_value(raw: String) -> Value {
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(_) => {
            debug!(len = raw.len(), "stored value is not JSON, keeping raw text");
            Value::String(raw)
        }
    }
}

/// Whether a value counts as present.
///
/// `null`, `false`, zero, and empty strings, arrays and objects don't.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn degrade(path: &str, key: &str, error: &StoreError) -> Value {
    match error {
        StoreError::NotFound { .. } => debug!(path, key, "secret not found"),
        other => debug!(path, key, error = %other, "failed to read secret"),
    }
    Value::Null
}
