//! Targets: the argument keys a caller's function requires.

use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;

use argmapper_types::{ArgKey, ArgStruct, Environment};

use crate::error::ConstructionError;
use crate::signature::{Shape, Signature};

/// The set of keys a resolution must produce.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    required: BTreeSet<ArgKey>,
}

impl Target {
    pub fn new(required: impl IntoIterator<Item = ArgKey>) -> Self {
        Self {
            required: required.into_iter().collect(),
        }
    }

    /// Target requiring every field of `I`.
    pub fn of<I: ArgStruct>() -> Self {
        Self::new(I::arg_keys())
    }

    /// Target for a declared function signature.
    pub fn from_signature(name: &str, signature: &Signature) -> Result<Self, ConstructionError> {
        Ok(Self::new(signature.validate_target(name)?))
    }

    pub fn required(&self) -> &BTreeSet<ArgKey> {
        &self.required
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }

    pub fn is_satisfied_by(&self, env: &Environment) -> bool {
        env.satisfies(&self.required)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.required.iter().map(ToString::to_string).collect();
        write!(f, "{{{}}}", keys.join(", "))
    }
}

/// A target function: called with a struct-shaped argument bundle built from
/// whatever values resolution can supply.
///
/// ```
/// use argmapper_core::{Func, Resolver};
/// use argmapper_types::{arg_struct, Environment};
///
/// arg_struct! { struct Greet { name: String => "Name" } }
///
/// let greet = Func::new("greet", |g: Greet| format!("hello {}", g.name)).unwrap();
/// let env = Environment::new().with("Name", "Alice".to_string());
/// let out = Resolver::new().call(&greet, &env).unwrap();
/// assert_eq!(out, "hello Alice");
/// ```
pub struct Func<I, O> {
    name: String,
    target: Target,
    f: Box<dyn Fn(I) -> O + Send + Sync>,
    _marker: PhantomData<fn(I) -> O>,
}

impl<I: ArgStruct, O> Func<I, O> {
    pub fn new<F>(name: impl Into<String>, f: F) -> Result<Self, ConstructionError>
    where
        F: Fn(I) -> O + Send + Sync + 'static,
    {
        let name = name.into();
        let signature = Signature::function(vec![Shape::of::<I>()], vec![]);
        let target = Target::from_signature(&name, &signature)?;
        Ok(Self {
            name,
            target,
            f: Box::new(f),
            _marker: PhantomData,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Build the argument bundle from `env` and call the function.
    ///
    /// Returns `None` if `env` lacks any required key.
    pub fn call_with(&self, env: &Environment) -> Option<O> {
        I::from_env(env).map(|input| (self.f)(input))
    }
}

impl<I, O> fmt::Debug for Func<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Func")
            .field("name", &self.name)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argmapper_types::arg_struct;

    arg_struct! {
        struct Serve {
            port: u16 => "Port",
            host: String => "Host",
        }
    }

    #[test]
    fn test_target_of_struct() {
        let target = Target::of::<Serve>();
        assert_eq!(target.required().len(), 2);
        assert!(target.required().contains(&ArgKey::of::<u16>("Port")));
        assert_eq!(target.to_string(), "{Host: String, Port: u16}");
    }

    #[test]
    fn test_target_satisfaction() {
        let target = Target::of::<Serve>();
        let env = Environment::new().with("Port", 80u16);
        assert!(!target.is_satisfied_by(&env));
        assert!(target.is_satisfied_by(&env.with("Host", "::1".to_string())));
        assert!(Target::default().is_satisfied_by(&Environment::new()));
    }

    #[test]
    fn test_func_call_with() {
        let func = Func::new("serve", |s: Serve| format!("{}:{}", s.host, s.port)).unwrap();
        assert_eq!(func.target(), &Target::of::<Serve>());
        let env = Environment::new()
            .with("Port", 80u16)
            .with("Host", "localhost".to_string());
        assert_eq!(func.call_with(&env).as_deref(), Some("localhost:80"));
        assert!(func.call_with(&Environment::new()).is_none());
    }

    #[test]
    fn test_target_from_bad_signature() {
        let err = Target::from_signature("run", &Signature::not_a_function("struct Config"))
            .unwrap_err();
        assert!(err.to_string().contains("not a function"));
    }
}
