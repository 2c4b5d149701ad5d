//! Field values and late binding
//!
//! This module provides:
//! - `FieldValue`: a concrete value that can be written into a record
//! - `Valuer`: a deferred value, computed each time it is resolved
//! - `Value`: either of the two, as stored in key/value sequences
//! - `KeyValues` and [`bind_values`]: ordered key/value pairs and their resolution pass

use serde::{Serialize, Serializer};
use std::cell::Cell;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Text written in place of a value missing from an odd-length key/value list
pub const MISSING_VALUE: &str = "(MISSING)";

/// Value type for structured logging fields
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    /// Sentinel for a key with no matching value
    Missing,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Null => write!(f, "null"),
            FieldValue::Missing => write!(f, "{}", MISSING_VALUE),
        }
    }
}

impl FieldValue {
    /// Convert to serde_json::Value for JSON serialization
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Int(i) => serde_json::Value::Number((*i).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Missing => serde_json::Value::String(MISSING_VALUE.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json_value().serialize(serializer)
    }
}

macro_rules! field_value_from {
    ($($ty:ty => |$v:ident| $conv:expr),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from($v: $ty) -> Self {
                    $conv
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Static(FieldValue::from(v))
                }
            }
        )*
    };
}

field_value_from! {
    String => |s| FieldValue::String(s),
    &str => |s| FieldValue::String(s.to_string()),
    &String => |s| FieldValue::String(s.clone()),
    i64 => |i| FieldValue::Int(i),
    i32 => |i| FieldValue::Int(i64::from(i)),
    u32 => |i| FieldValue::Int(i64::from(i)),
    u64 => |i| i64::try_from(i).map(FieldValue::Int).unwrap_or(FieldValue::Float(i as f64)),
    usize => |i| i64::try_from(i).map(FieldValue::Int).unwrap_or(FieldValue::Float(i as f64)),
    f64 => |f| FieldValue::Float(f),
    bool => |b| FieldValue::Bool(b),
}

/// A value computed when a record is emitted rather than when it is built
///
/// The closure runs on every resolution pass it takes part in; results are never cached.
#[derive(Clone)]
pub struct Valuer(Arc<dyn Fn() -> FieldValue + Send + Sync>);

impl Valuer {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> FieldValue + Send + Sync + 'static,
    {
        Valuer(Arc::new(f))
    }

    /// Invoke the underlying closure
    pub fn value(&self) -> FieldValue {
        (self.0)()
    }

    /// Valuer reporting `file:line` of the emission currently being resolved
    ///
    /// Emission methods are `#[track_caller]`, so the location is the line that called
    /// `info`, `warn`, etc. on a facade, entry or logger. Outside of an emission this
    /// resolves to [`FieldValue::Null`].
    pub fn caller() -> Self {
        Valuer::new(|| match CallSite::current() {
            Some(site) => FieldValue::String(site.to_string()),
            None => FieldValue::Null,
        })
    }
}

/// Valuer meant for base fields: reports the call site of each emission
pub fn default_caller() -> Valuer {
    Valuer::caller()
}

impl fmt::Debug for Valuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Valuer(..)")
    }
}

/// A field value, either known now or computed at emission
#[derive(Debug, Clone)]
pub enum Value {
    Static(FieldValue),
    Deferred(Valuer),
}

impl Value {
    pub fn missing() -> Self {
        Value::Static(FieldValue::Missing)
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Value::Deferred(_))
    }

    /// The static value, if this has been resolved
    pub fn as_static(&self) -> Option<&FieldValue> {
        match self {
            Value::Static(v) => Some(v),
            Value::Deferred(_) => None,
        }
    }

    /// Evaluate without mutating
    pub fn resolve(&self) -> FieldValue {
        match self {
            Value::Static(v) => v.clone(),
            Value::Deferred(valuer) => valuer.value(),
        }
    }
}

impl From<FieldValue> for Value {
    fn from(v: FieldValue) -> Self {
        Value::Static(v)
    }
}

impl From<Valuer> for Value {
    fn from(v: Valuer) -> Self {
        Value::Deferred(v)
    }
}

/// Ordered sequence of key/value pairs
///
/// A trailing key without a value is stored with [`FieldValue::Missing`], so the sequence
/// is always complete pairs.
#[derive(Debug, Clone, Default)]
pub struct KeyValues {
    pairs: Vec<(String, Value)>,
}

impl KeyValues {
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    pub fn push<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.pairs.push((key.into(), value.into()));
    }

    /// Push a key that has no value
    pub fn push_key<K: Into<String>>(&mut self, key: K) {
        self.pairs.push((key.into(), Value::missing()));
    }

    #[must_use]
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.push(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub(crate) fn into_pairs(self) -> Vec<(String, Value)> {
        self.pairs
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for KeyValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut kv = KeyValues::new();
        for (k, v) in iter {
            kv.push(k, v);
        }
        kv
    }
}

/// Replace every deferred value in `keyvals` with the value it produces now.
///
/// Static values are left untouched. Each call invokes every deferred value once.
pub fn bind_values(keyvals: &mut KeyValues) {
    for (_, value) in keyvals.pairs.iter_mut() {
        if let Value::Deferred(valuer) = value {
            *value = Value::Static(valuer.value());
        }
    }
}

thread_local! {
    static CURRENT_CALL_SITE: Cell<Option<&'static Location<'static>>> = const { Cell::new(None) };
}

/// Source location of the emission being resolved on this thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
}

impl CallSite {
    pub fn current() -> Option<CallSite> {
        CURRENT_CALL_SITE.with(|cell| cell.get()).map(|loc| CallSite {
            file: loc.file(),
            line: loc.line(),
        })
    }

    /// Mark `location` as the active emission site until the guard drops
    pub(crate) fn enter(location: &'static Location<'static>) -> CallSiteGuard {
        let previous = CURRENT_CALL_SITE.with(|cell| cell.replace(Some(location)));
        CallSiteGuard { previous }
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Restores the previous call site on drop
pub(crate) struct CallSiteGuard {
    previous: Option<&'static Location<'static>>,
}

impl Drop for CallSiteGuard {
    fn drop(&mut self) {
        CURRENT_CALL_SITE.with(|cell| cell.set(self.previous));
    }
}
