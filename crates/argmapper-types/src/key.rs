//! Argument identity: a name plus a type.
//!
//! Two keys are the same key only when both the name and the type match. Two
//! values of one type can therefore live side by side in an [`Environment`]
//! as long as they are registered under different names.
//!
//! [`Environment`]: crate::Environment

use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

/// Runtime description of a Rust type.
///
/// Equality and hashing go through the `TypeId`. Ordering compares the type
/// name first so that iteration order is stable across builds, falling back
/// to the `TypeId` for distinct types that happen to share a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TypeDescriptor {
    name: &'static str,
    #[serde(skip)]
    id: TypeId,
}

impl TypeDescriptor {
    /// Describe `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    /// Fully qualified type name, as reported by `std::any::type_name`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name with module paths stripped (`alloc::string::String` -> `String`).
    pub fn short_name(&self) -> String {
        shorten_type_name(self.name)
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Check whether this descriptor describes `T`.
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

/// Strip module paths from every path segment of a type name, keeping generic
/// structure intact (`core::option::Option<alloc::string::String>` ->
/// `Option<String>`).
fn shorten_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for ch in full.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            segment.push(ch);
        } else {
            out.push_str(segment.rsplit("::").next().unwrap_or(&segment));
            segment.clear();
            out.push(ch);
        }
    }
    out.push_str(segment.rsplit("::").next().unwrap_or(&segment));
    out
}

/// Identity of a single named, typed value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ArgKey {
    name: Cow<'static, str>,
    #[serde(rename = "type")]
    ty: TypeDescriptor,
}

impl ArgKey {
    pub fn new(name: impl Into<Cow<'static, str>>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// Key for a value of type `T` registered under `name`.
    ///
    /// ```
    /// use argmapper_types::ArgKey;
    ///
    /// let a = ArgKey::of::<String>("FullName");
    /// let b = ArgKey::of::<String>("Name");
    /// assert_ne!(a, b);
    /// assert_eq!(a, ArgKey::of::<String>("FullName"));
    /// ```
    pub fn of<T: 'static>(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, TypeDescriptor::of::<T>())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_descriptor(&self) -> TypeDescriptor {
        self.ty
    }
}

impl fmt::Display for ArgKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_type_different_names_are_distinct() {
        let a = ArgKey::of::<u16>("Port");
        let b = ArgKey::of::<u16>("AdminPort");
        assert_ne!(a, b);
    }

    #[test]
    fn test_same_name_different_types_are_distinct() {
        let a = ArgKey::of::<u16>("Port");
        let b = ArgKey::of::<String>("Port");
        assert_ne!(a, b);
    }

    #[test]
    fn test_ordering_is_by_name_first() {
        let mut keys = vec![
            ArgKey::of::<u16>("b"),
            ArgKey::of::<String>("a"),
            ArgKey::of::<u8>("c"),
        ];
        keys.sort();
        let names: Vec<_> = keys.iter().map(|k| k.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_display_uses_short_type_names() {
        assert_eq!(ArgKey::of::<String>("Name").to_string(), "Name: String");
        assert_eq!(
            ArgKey::of::<Option<Vec<String>>>("Tags").to_string(),
            "Tags: Option<Vec<String>>"
        );
    }
}
