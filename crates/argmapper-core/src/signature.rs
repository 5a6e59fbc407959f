//! Declared shapes of converter and target callables.
//!
//! A [`Signature`] is what the struct-introspection collaborator hands the
//! engine: whether the value is a function at all, its parameter shapes and
//! its result shapes. Validation turns it into the flat key lists the planner
//! works with, or rejects it with a [`ConstructionError`].

use std::collections::BTreeSet;

use argmapper_types::{ArgKey, ArgStruct, TypeDescriptor};

use crate::error::ConstructionError;

/// What kind of value was offered as a callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallableKind {
    Function,
    /// Anything else, described for the error message (e.g. "u16", "struct Config").
    Other(String),
}

/// Shape of one parameter or result slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// A struct-shaped bundle with the given keys, in field order.
    Struct(Vec<ArgKey>),
    /// A struct-shaped bundle that may be absent. Absence signals a failed conversion.
    OptionalStruct(Vec<ArgKey>),
    /// An explicit error slot.
    Error,
    /// Anything else.
    Other(TypeDescriptor),
}

impl Shape {
    pub fn of<T: ArgStruct>() -> Self {
        Shape::Struct(T::arg_keys())
    }

    pub fn optional<T: ArgStruct>() -> Self {
        Shape::OptionalStruct(T::arg_keys())
    }

    fn describe(&self) -> String {
        match self {
            Shape::Struct(_) => "struct".to_string(),
            Shape::OptionalStruct(_) => "optional struct".to_string(),
            Shape::Error => "error".to_string(),
            Shape::Other(ty) => ty.to_string(),
        }
    }
}

/// Declared signature of a callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub kind: CallableKind,
    pub params: Vec<Shape>,
    pub results: Vec<Shape>,
}

/// A validated converter signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterShape {
    pub inputs: Vec<ArgKey>,
    pub outputs: Vec<ArgKey>,
    pub fallible: bool,
}

impl Signature {
    pub fn function(params: Vec<Shape>, results: Vec<Shape>) -> Self {
        Self {
            kind: CallableKind::Function,
            params,
            results,
        }
    }

    /// A non-function value, e.g. a constant passed where a converter was expected.
    pub fn not_a_function(kind: impl Into<String>) -> Self {
        Self {
            kind: CallableKind::Other(kind.into()),
            params: Vec::new(),
            results: Vec::new(),
        }
    }

    /// Validate as a converter: at most one struct parameter, one struct (or
    /// optional struct) result, and an optional trailing error result.
    pub fn validate_converter(&self, name: &str) -> Result<ConverterShape, ConstructionError> {
        let inputs = self.validate_params(name)?;

        if self.results.is_empty() || self.results.len() > 2 {
            return Err(ConstructionError::WrongResultCount {
                name: name.to_string(),
                count: self.results.len(),
            });
        }

        let (outputs, mut fallible) = match &self.results[0] {
            Shape::Struct(keys) => (keys.clone(), false),
            Shape::OptionalStruct(keys) => (keys.clone(), true),
            other => {
                return Err(ConstructionError::ResultNotStruct {
                    name: name.to_string(),
                    got: other.describe(),
                })
            }
        };

        if let Some(second) = self.results.get(1) {
            if *second != Shape::Error {
                return Err(ConstructionError::SecondResultNotError {
                    name: name.to_string(),
                    got: second.describe(),
                });
            }
            fallible = true;
        }

        Ok(ConverterShape {
            inputs,
            outputs: unique_keys(name, outputs)?,
            fallible,
        })
    }

    /// Validate as a target function and return its required keys. Results
    /// are unconstrained; the target's return value is the caller's business.
    pub fn validate_target(&self, name: &str) -> Result<Vec<ArgKey>, ConstructionError> {
        self.validate_params(name)
    }

    fn validate_params(&self, name: &str) -> Result<Vec<ArgKey>, ConstructionError> {
        if let CallableKind::Other(kind) = &self.kind {
            return Err(ConstructionError::NotAFunction {
                name: name.to_string(),
                kind: kind.clone(),
            });
        }

        if self.params.len() > 1 {
            return Err(ConstructionError::TooManyArguments {
                name: name.to_string(),
                count: self.params.len(),
            });
        }

        match self.params.first() {
            None => Ok(Vec::new()),
            Some(Shape::Struct(keys)) => unique_keys(name, keys.clone()),
            Some(other) => Err(ConstructionError::ArgumentNotStruct {
                name: name.to_string(),
                got: other.describe(),
            }),
        }
    }
}

fn unique_keys(name: &str, keys: Vec<ArgKey>) -> Result<Vec<ArgKey>, ConstructionError> {
    let mut seen = BTreeSet::new();
    for key in &keys {
        if !seen.insert(key) {
            return Err(ConstructionError::DuplicateKey {
                name: name.to_string(),
                key: key.clone(),
            });
        }
    }
    Ok(keys)
}
