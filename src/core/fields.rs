//! Field sets attached to log records
//!
//! `Fields` is an insertion-ordered map from key to [`Value`]. Deferred values stay
//! deferred until [`Fields::resolve`] runs, which happens when a record is emitted.

use super::error::{LoggerError, Result};
use super::value::{FieldValue, KeyValues, Value};
use std::fmt;

/// Ordered key → value mapping with unique keys
#[derive(Debug, Clone, Default)]
pub struct Fields {
    entries: Vec<(String, Value)>,
}

impl Fields {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build from key/value pairs; a later duplicate key overwrites the earlier value
    pub fn from_keyvals(keyvals: KeyValues) -> Self {
        let mut fields = Fields::new();
        for (key, value) in keyvals.into_pairs() {
            fields.insert(key, value);
        }
        fields
    }

    /// Build from an untyped, flat `key, value, key, value, ...` list
    ///
    /// An odd-length list gets [`FieldValue::Missing`] appended. Every key position must hold
    /// a static string.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidFieldKey`] with the position of the first key that is
    /// not a string
    pub fn try_from_flat(mut args: Vec<Value>) -> Result<Self> {
        if args.len() % 2 != 0 {
            args.push(Value::missing());
        }

        let mut fields = Fields::new();
        let mut iter = args.into_iter().enumerate();
        while let (Some((index, key)), Some((_, value))) = (iter.next(), iter.next()) {
            match key {
                Value::Static(FieldValue::String(key)) => fields.insert(key, value),
                _ => return Err(LoggerError::invalid_field_key(index)),
            }
        }
        Ok(fields)
    }

    /// Insert or overwrite `key`, keeping its original position when it already exists
    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    #[must_use]
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.insert(key, value);
        self
    }

    /// Union of `self` and `other`; `other` wins on key collisions
    #[must_use]
    pub fn merged(&self, other: &Fields) -> Fields {
        let mut merged = self.clone();
        for (key, value) in &other.entries {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Evaluate deferred values and return concrete pairs in insertion order
    ///
    /// `self` is not modified, so deferred values are evaluated again on the next call.
    pub fn resolve(&self) -> Vec<(String, FieldValue)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.clone(), value.resolve()))
            .collect()
    }

    /// Format fields as key=value pairs, without evaluating deferred values
    pub fn format_fields(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| match v {
                Value::Static(value) => format!("{}={}", k, value),
                Value::Deferred(_) => format!("{}=<deferred>", k),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<KeyValues> for Fields {
    fn from(keyvals: KeyValues) -> Self {
        Fields::from_keyvals(keyvals)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

impl fmt::Display for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_fields())
    }
}
