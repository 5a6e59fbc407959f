//! Error types for converter construction and resolution.
//!
//! Construction errors reject a converter or target at setup time and are
//! never recovered. Individual converter failures during resolution are not
//! errors at all: they are recorded as attempt outcomes and trigger
//! backtracking. Only total exhaustion surfaces as a [`ResolveError`].

use std::fmt;

use argmapper_types::ArgKey;

use crate::result::Attempt;

/// A converter or target declaration is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    /// The declared callable is not a function.
    NotAFunction {
        /// Name the declaration was registered under
        name: String,
        /// What was supplied instead
        kind: String,
    },

    /// More than one parameter was declared.
    TooManyArguments { name: String, count: usize },

    /// The parameter is not a struct-shaped bundle.
    ArgumentNotStruct { name: String, got: String },

    /// Converters must return one or two results.
    WrongResultCount { name: String, count: usize },

    /// The first result is neither a struct nor an optional struct.
    ResultNotStruct { name: String, got: String },

    /// A second result was declared but it is not an error slot.
    SecondResultNotError { name: String, got: String },

    /// A bundle declares the same key twice.
    DuplicateKey { name: String, key: ArgKey },
}

impl ConstructionError {
    /// Name of the declaration that was rejected.
    pub fn declaration(&self) -> &str {
        match self {
            ConstructionError::NotAFunction { name, .. }
            | ConstructionError::TooManyArguments { name, .. }
            | ConstructionError::ArgumentNotStruct { name, .. }
            | ConstructionError::WrongResultCount { name, .. }
            | ConstructionError::ResultNotStruct { name, .. }
            | ConstructionError::SecondResultNotError { name, .. }
            | ConstructionError::DuplicateKey { name, .. } => name,
        }
    }
}

impl fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructionError::NotAFunction { name, kind } => {
                write!(f, "`{}` is not a function (got {})", name, kind)
            }
            ConstructionError::TooManyArguments { name, count } => write!(
                f,
                "`{}` has too many arguments: expected at most one struct argument, got {}",
                name, count
            ),
            ConstructionError::ArgumentNotStruct { name, got } => write!(
                f,
                "`{}` argument is not struct-shaped (got {})",
                name, got
            ),
            ConstructionError::WrongResultCount { name, count } => write!(
                f,
                "`{}` has the wrong result count: expected one or two results, got {}",
                name, count
            ),
            ConstructionError::ResultNotStruct { name, got } => write!(
                f,
                "`{}` first result is not struct-shaped (got {})",
                name, got
            ),
            ConstructionError::SecondResultNotError { name, got } => write!(
                f,
                "`{}` second result must be an error (got {})",
                name, got
            ),
            ConstructionError::DuplicateKey { name, key } => {
                write!(f, "`{}` declares key `{}` more than once", name, key)
            }
        }
    }
}

impl std::error::Error for ConstructionError {}

/// Resolution failed as a whole.
#[derive(Debug)]
pub enum ResolveError {
    /// Every candidate chain failed. Attempts are in the order they were tried.
    Exhausted { attempts: Vec<Attempt> },

    /// Resolution succeeded but the target's argument struct could not be
    /// built from the resolved values.
    TargetUnbuildable { target: String, missing: Vec<ArgKey> },
}

impl ResolveError {
    /// The diagnostic trail, if resolution was exhausted.
    pub fn attempts(&self) -> &[Attempt] {
        match self {
            ResolveError::Exhausted { attempts } => attempts,
            ResolveError::TargetUnbuildable { .. } => &[],
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Exhausted { attempts } => {
                write!(
                    f,
                    "argument resolution exhausted after {} attempt(s)",
                    attempts.len()
                )?;
                for attempt in attempts {
                    write!(f, "\n  {}", attempt)?;
                }
                Ok(())
            }
            ResolveError::TargetUnbuildable { target, missing } => {
                write!(f, "cannot build arguments for `{}`", target)?;
                if !missing.is_empty() {
                    let keys: Vec<String> = missing.iter().map(ToString::to_string).collect();
                    write!(f, ": missing {}", keys.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ResolveError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_error_messages() {
        let err = ConstructionError::NotAFunction {
            name: "port".into(),
            kind: "u16".into(),
        };
        assert!(err.to_string().contains("not a function"));
        assert_eq!(err.declaration(), "port");

        let err = ConstructionError::TooManyArguments {
            name: "port".into(),
            count: 2,
        };
        assert!(err.to_string().contains("too many arguments"));

        let err = ConstructionError::ArgumentNotStruct {
            name: "port".into(),
            got: "String".into(),
        };
        assert!(err.to_string().contains("argument is not struct-shaped"));

        let err = ConstructionError::WrongResultCount {
            name: "port".into(),
            count: 3,
        };
        assert!(err.to_string().contains("wrong result count"));
    }

    #[test]
    fn test_exhausted_without_attempts() {
        let err = ResolveError::Exhausted { attempts: vec![] };
        assert!(err.attempts().is_empty());
        assert_eq!(
            err.to_string(),
            "argument resolution exhausted after 0 attempt(s)"
        );
    }
}
