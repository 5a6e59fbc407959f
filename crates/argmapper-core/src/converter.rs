//! Converters: capabilities that map a set of input keys to a set of output keys.
//!
//! A converter is built either from a declared [`Signature`] plus an opaque
//! [`Invoke`] handle (the native-invoker collaborator), or from a typed Rust
//! closure over [`ArgStruct`] bundles, in which case the signature is derived
//! from the bundle types. Both paths go through the same validation.

use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;
use argmapper_types::{ArgKey, ArgStruct, Environment};

use crate::error::ConstructionError;
use crate::signature::{Shape, Signature};

/// Position of a converter in its resolver's registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConverterId(pub usize);

impl fmt::Display for ConverterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of invoking a converter.
#[derive(Debug)]
pub enum Invocation {
    /// The converter produced a partial environment.
    Produced(Environment),
    /// The converter explicitly returned no value.
    Absent,
    /// The converter returned an error.
    Failed(anyhow::Error),
}

impl Invocation {
    /// Map an `Option` result: `None` is an absent value.
    pub fn from_option(output: Option<Environment>) -> Self {
        match output {
            Some(env) => Invocation::Produced(env),
            None => Invocation::Absent,
        }
    }

    /// Map a `Result<Option<_>, _>` result, the most general converter return.
    pub fn from_result<E>(output: Result<Option<Environment>, E>) -> Self
    where
        E: Into<anyhow::Error>,
    {
        match output {
            Ok(output) => Invocation::from_option(output),
            Err(e) => Invocation::Failed(e.into()),
        }
    }
}

/// Native invoker: calls the underlying function with the input subset of an
/// environment and reports what it produced.
pub trait Invoke: Send + Sync {
    fn invoke(&self, input: Environment) -> Invocation;
}

impl<F> Invoke for F
where
    F: Fn(Environment) -> Invocation + Send + Sync,
{
    fn invoke(&self, input: Environment) -> Invocation {
        self(input)
    }
}

/// A registered conversion step.
#[derive(Clone)]
pub struct Converter {
    name: String,
    inputs: Vec<ArgKey>,
    outputs: Vec<ArgKey>,
    fallible: bool,
    invoker: Arc<dyn Invoke>,
}

impl Converter {
    /// Build a converter from a declared signature and an invoker.
    pub fn from_signature(
        name: impl Into<String>,
        signature: &Signature,
        invoker: impl Invoke + 'static,
    ) -> Result<Self, ConstructionError> {
        let name = name.into();
        let shape = signature.validate_converter(&name)?;
        Ok(Self {
            name,
            inputs: shape.inputs,
            outputs: shape.outputs,
            fallible: shape.fallible,
            invoker: Arc::new(invoker),
        })
    }

    /// A converter that always produces its output.
    ///
    /// ```
    /// use argmapper_core::Converter;
    /// use argmapper_types::arg_struct;
    ///
    /// arg_struct! { struct FullName { full_name: String => "FullName" } }
    /// arg_struct! { struct Name { name: String => "Name" } }
    ///
    /// let conv = Converter::infallible("first_token", |i: FullName| Name {
    ///     name: i.full_name.split_whitespace().next().unwrap_or_default().to_string(),
    /// })
    /// .unwrap();
    /// assert!(!conv.is_fallible());
    /// assert_eq!(conv.outputs()[0].name(), "Name");
    /// ```
    pub fn infallible<I, O, F>(name: impl Into<String>, f: F) -> Result<Self, ConstructionError>
    where
        I: ArgStruct,
        O: ArgStruct,
        F: Fn(I) -> O + Send + Sync + 'static,
    {
        let signature = Signature::function(vec![Shape::of::<I>()], vec![Shape::of::<O>()]);
        Self::typed::<I, _>(name, &signature, move |input| {
            Invocation::Produced(f(input).into_env())
        })
    }

    /// A converter that may return no value, which fails the current chain.
    pub fn optional<I, O, F>(name: impl Into<String>, f: F) -> Result<Self, ConstructionError>
    where
        I: ArgStruct,
        O: ArgStruct,
        F: Fn(I) -> Option<O> + Send + Sync + 'static,
    {
        let signature =
            Signature::function(vec![Shape::of::<I>()], vec![Shape::optional::<O>()]);
        Self::typed::<I, _>(name, &signature, move |input| {
            Invocation::from_option(f(input).map(O::into_env))
        })
    }

    /// A converter that may return an error, which fails the current chain
    /// and is kept verbatim in the attempt trail.
    pub fn fallible<I, O, E, F>(name: impl Into<String>, f: F) -> Result<Self, ConstructionError>
    where
        I: ArgStruct,
        O: ArgStruct,
        E: Into<anyhow::Error>,
        F: Fn(I) -> Result<O, E> + Send + Sync + 'static,
    {
        let signature = Signature::function(
            vec![Shape::of::<I>()],
            vec![Shape::of::<O>(), Shape::Error],
        );
        Self::typed::<I, _>(name, &signature, move |input| {
            Invocation::from_result(f(input).map(|o| Some(o.into_env())))
        })
    }

    /// A converter that may return either no value or an error.
    pub fn fallible_optional<I, O, E, F>(
        name: impl Into<String>,
        f: F,
    ) -> Result<Self, ConstructionError>
    where
        I: ArgStruct,
        O: ArgStruct,
        E: Into<anyhow::Error>,
        F: Fn(I) -> Result<Option<O>, E> + Send + Sync + 'static,
    {
        let signature = Signature::function(
            vec![Shape::of::<I>()],
            vec![Shape::optional::<O>(), Shape::Error],
        );
        Self::typed::<I, _>(name, &signature, move |input| {
            Invocation::from_result(f(input).map(|o| o.map(O::into_env)))
        })
    }

    fn typed<I, F>(
        name: impl Into<String>,
        signature: &Signature,
        call: F,
    ) -> Result<Self, ConstructionError>
    where
        I: ArgStruct,
        F: Fn(I) -> Invocation + Send + Sync + 'static,
    {
        Self::from_signature(name, signature, move |env: Environment| {
            match I::from_env(&env) {
                Some(input) => call(input),
                None => Invocation::Failed(anyhow!(
                    "input bundle could not be built from {}",
                    env
                )),
            }
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[ArgKey] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[ArgKey] {
        &self.outputs
    }

    pub fn is_fallible(&self) -> bool {
        self.fallible
    }

    pub fn produces(&self, key: &ArgKey) -> bool {
        self.outputs.contains(key)
    }

    /// Invoke the converter on `input`, which must hold exactly the input keys.
    pub fn invoke(&self, input: Environment) -> Invocation {
        self.invoker.invoke(input)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("fallible", &self.fallible)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |keys: &[ArgKey]| {
            keys.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(
            f,
            "{}({}) -> ({})",
            self.name,
            join(&self.inputs),
            join(&self.outputs)
        )?;
        if self.fallible {
            write!(f, " [fallible]")?;
        }
        Ok(())
    }
}
