//! Key-unique request mappings: merged request parameters and the parsed query.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::collections::hash_map::{Entry, Iter};

/// Request parameters shared by every stage of a request.
///
/// Route parameters are usually seeded here first; the query and body stages then
/// merge their values in under an override policy, see [`Params::merge`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    inner: HashMap<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: impl AsRef<str>) -> Option<&Value> {
        self.inner.get(key.as_ref())
    }

    /// Gets a parameter holding a single string value.
    pub fn get_str(&self, key: impl AsRef<str>) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.inner.contains_key(key.as_ref())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.inner.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: impl AsRef<str>) -> Option<Value> {
        self.inner.remove(key.as_ref())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.inner.iter()
    }

    /// Stores `value` under `key` unless the key is already present and
    /// `override_existing` is false, in which case the existing value wins.
    ///
    /// Returns whether the value was stored.
    pub fn merge(&mut self, key: impl Into<String>, value: impl Into<Value>, override_existing: bool) -> bool {
        match self.inner.entry(key.into()) {
            Entry::Occupied(_) if !override_existing => false,
            Entry::Occupied(mut occupied) => {
                occupied.insert(value.into());
                true
            }
            Entry::Vacant(vacant) => {
                vacant.insert(value.into());
                true
            }
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { inner: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a String, &'a Value);
    type IntoIter = Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

/// A value parsed from a query string or an url-encoded form.
///
/// A key seen once holds [`QueryValue::Single`]; every further occurrence of the same
/// key turns it into [`QueryValue::Multiple`], keeping the order of appearance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    Single(String),
    Multiple(Vec<String>),
}

impl QueryValue {
    /// Returns the value if the key appeared exactly once.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            QueryValue::Single(value) => Some(value),
            QueryValue::Multiple(_) => None,
        }
    }

    /// All values of the key in order of appearance.
    pub fn values(&self) -> &[String] {
        match self {
            QueryValue::Single(value) => std::slice::from_ref(value),
            QueryValue::Multiple(values) => values,
        }
    }

    fn push(&mut self, value: String) {
        match self {
            QueryValue::Single(first) => {
                let first = std::mem::take(first);
                *self = QueryValue::Multiple(vec![first, value]);
            }
            QueryValue::Multiple(values) => values.push(value),
        }
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Single(value)
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Single(value.to_owned())
    }
}

impl From<QueryValue> for Value {
    fn from(value: QueryValue) -> Self {
        match value {
            QueryValue::Single(value) => Value::String(value),
            QueryValue::Multiple(values) => Value::Array(values.into_iter().map(Value::String).collect()),
        }
    }
}

impl PartialEq<&str> for QueryValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

/// The parsed query string of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    inner: HashMap<String, QueryValue>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: impl AsRef<str>) -> Option<&QueryValue> {
        self.inner.get(key.as_ref())
    }

    /// Gets a key that appeared exactly once.
    pub fn get_str(&self, key: impl AsRef<str>) -> Option<&str> {
        self.get(key).and_then(QueryValue::as_str)
    }

    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.inner.contains_key(key.as_ref())
    }

    /// Adds one occurrence of `key`, aggregating repeated keys into
    /// [`QueryValue::Multiple`].
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        match self.inner.entry(key.into()) {
            Entry::Occupied(mut occupied) => occupied.get_mut().push(value.into()),
            Entry::Vacant(vacant) => {
                vacant.insert(QueryValue::Single(value.into()));
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, String, QueryValue> {
        self.inner.iter()
    }

    /// Converts the query into a JSON object, the shape used for parsed bodies.
    pub fn into_value(self) -> Value {
        Value::Object(self.inner.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Query {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut query = Query::new();
        for (key, value) in iter {
            query.append(key, value);
        }
        query
    }
}

impl<'a> IntoIterator for &'a Query {
    type Item = (&'a String, &'a QueryValue);
    type IntoIter = Iter<'a, String, QueryValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}
