//! Scoped mapping from argument keys to values.
//!
//! An environment lives for one resolution attempt. Chain attempts work on
//! their own copy (values are `Arc`-shared, so copying is cheap) and nothing a
//! converter produces is visible outside the chain that produced it.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use crate::key::{ArgKey, TypeDescriptor};
use crate::value::Value;

/// A value was inserted under a key whose type does not match the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMismatch {
    pub key: ArgKey,
    pub got: TypeDescriptor,
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "value of type {} cannot be stored under key `{}`",
            self.got, self.key
        )
    }
}

impl std::error::Error for TypeMismatch {}

/// Mapping from [`ArgKey`] to [`Value`]. Keys are unique.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: BTreeMap<ArgKey, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value under `key`, replacing any previous value.
    ///
    /// Fails if the value's type is not the key's type.
    pub fn insert(&mut self, key: ArgKey, value: Value) -> Result<Option<Value>, TypeMismatch> {
        if key.type_descriptor() != value.type_descriptor() {
            return Err(TypeMismatch {
                key,
                got: value.type_descriptor(),
            });
        }
        Ok(self.values.insert(key, value))
    }

    /// Insert a typed value under `name`.
    pub fn set<T: std::any::Any + Send + Sync>(
        &mut self,
        name: impl Into<std::borrow::Cow<'static, str>>,
        value: T,
    ) -> Option<Value> {
        self.values.insert(ArgKey::of::<T>(name), Value::new(value))
    }

    /// Builder form of [`Environment::set`].
    ///
    /// ```
    /// use argmapper_types::Environment;
    ///
    /// let env = Environment::new()
    ///     .with("FullName", String::from("Alice Smith"))
    ///     .with("Port", 8080u16);
    /// assert_eq!(env.len(), 2);
    /// assert_eq!(env.get_as::<u16>("Port"), Some(8080));
    /// ```
    pub fn with<T: std::any::Any + Send + Sync>(
        mut self,
        name: impl Into<std::borrow::Cow<'static, str>>,
        value: T,
    ) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, key: &ArgKey) -> Option<&Value> {
        self.values.get(key)
    }

    /// Fetch a clone of the value stored under `name` with type `T`.
    pub fn get_as<T: std::any::Any + Clone>(&self, name: &str) -> Option<T> {
        let key = ArgKey::of::<T>(name.to_string());
        self.values.get(&key).and_then(Value::get::<T>)
    }

    pub fn contains(&self, key: &ArgKey) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &ArgKey) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ArgKey> {
        self.values.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, ArgKey, Value> {
        self.values.iter()
    }

    /// True if every key in `keys` has a value.
    pub fn satisfies<'a>(&self, keys: impl IntoIterator<Item = &'a ArgKey>) -> bool {
        keys.into_iter().all(|k| self.values.contains_key(k))
    }

    /// Keys from `keys` that have no value here, in iteration order of `keys`.
    pub fn missing<'a>(&self, keys: impl IntoIterator<Item = &'a ArgKey>) -> Vec<ArgKey> {
        keys.into_iter()
            .filter(|k| !self.values.contains_key(*k))
            .cloned()
            .collect()
    }

    /// Copy out exactly the values for `keys`.
    ///
    /// Returns `None` if any key is missing.
    pub fn subset<'a>(&self, keys: impl IntoIterator<Item = &'a ArgKey>) -> Option<Environment> {
        let mut values = BTreeMap::new();
        for key in keys {
            let value = self.values.get(key)?;
            values.insert(key.clone(), value.clone());
        }
        Some(Environment { values })
    }

    /// Merge every entry of `other` into `self`, overwriting on conflict.
    pub fn extend(&mut self, other: Environment) {
        self.values.extend(other.values);
    }
}

impl IntoIterator for Environment {
    type Item = (ArgKey, Value);
    type IntoIter = btree_map::IntoIter<ArgKey, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Environment {
    type Item = (&'a ArgKey, &'a Value);
    type IntoIter = btree_map::Iter<'a, ArgKey, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, key) in self.values.keys().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", key)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_rejects_type_mismatch() {
        let mut env = Environment::new();
        let err = env
            .insert(ArgKey::of::<u16>("Port"), Value::new("8080".to_string()))
            .unwrap_err();
        assert_eq!(err.key, ArgKey::of::<u16>("Port"));
        assert!(err.to_string().contains("Port"));
        assert!(env.is_empty());
    }

    #[test]
    fn test_set_replaces_existing_key() {
        let mut env = Environment::new();
        assert!(env.set("Port", 1u16).is_none());
        assert!(env.set("Port", 2u16).is_some());
        assert_eq!(env.len(), 1);
        assert_eq!(env.get_as::<u16>("Port"), Some(2));
    }

    #[test]
    fn test_subset_and_missing() {
        let env = Environment::new()
            .with("FullName", "Alice Smith".to_string())
            .with("Port", 8080u16);
        let name = ArgKey::of::<String>("FullName");
        let db = ArgKey::of::<String>("DB");

        let sub = env.subset([&name]).unwrap();
        assert_eq!(sub.len(), 1);
        assert!(env.subset([&name, &db]).is_none());
        assert_eq!(env.missing([&name, &db]), vec![db.clone()]);
        assert!(env.satisfies([&name]));
        assert!(!env.satisfies([&name, &db]));
    }

    #[test]
    fn test_copies_share_values() {
        let env = Environment::new().with("Name", "Alice".to_string());
        let copy = env.clone();
        let key = ArgKey::of::<String>("Name");
        assert!(env.get(&key).unwrap().ptr_eq(copy.get(&key).unwrap()));
    }
}
