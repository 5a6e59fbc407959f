//! Argmapper Core
//!
//! Resolves a target function's inputs by composing chains of converters.
//!
//! Given a base [`Environment`](argmapper_types::Environment), a [`Target`]
//! and a set of registered [`Converter`]s, the [`Resolver`] plans every
//! ordered chain of converters that can produce the target's keys, then
//! attempts them in a deterministic order until one succeeds. Every attempt
//! is recorded so a failed resolution can explain itself.
//!
//! # Core Modules
//!
//! - [`signature`]: declared callable shapes and their validation
//! - [`converter`]: converters and the native [`Invoke`] seam
//! - [`target`]: targets and typed [`Func`] wrappers
//! - [`planner`]: AND/OR search over converters with cycle cutting
//! - [`executor`]: runs one chain against a copy of the base environment
//! - [`resolver`]: the orchestrator
//! - [`result`]: outcomes, the attempt trail and serializable reports
//!
//! # Example
//!
//! ```
//! use argmapper_core::{Converter, Resolver, Target};
//! use argmapper_types::{arg_struct, Environment};
//!
//! arg_struct! { struct FullName { full_name: String => "FullName" } }
//! arg_struct! { struct Name { name: String => "Name" } }
//!
//! let resolver = Resolver::new().with_converter(
//!     Converter::infallible("first_token", |i: FullName| Name {
//!         name: i.full_name.split_whitespace().next().unwrap_or_default().to_string(),
//!     })
//!     .unwrap(),
//! );
//!
//! let base = Environment::new().with("FullName", "Alice Smith".to_string());
//! let result = resolver.resolve(&Target::of::<Name>(), &base);
//! assert_eq!(
//!     result.value().unwrap().get_as::<String>("Name").as_deref(),
//!     Some("Alice")
//! );
//! ```

pub mod cache;
pub mod config;
pub mod converter;
pub mod error;
pub mod executor;
pub mod planner;
pub mod resolver;
pub mod result;
pub mod signature;
pub mod target;

pub use cache::InvocationCache;
pub use config::{ExecutionMode, ResolverConfig};
pub use converter::{Converter, ConverterId, Invocation, Invoke};
pub use error::{ConstructionError, ResolveError};
pub use executor::{ChainRun, Executor, StepOutput};
pub use planner::{Chain, Plan, Planner, Unsatisfiable};
pub use resolver::Resolver;
pub use result::{
    Attempt, AttemptReport, ConverterError, Outcome, OutcomeKind, ReportStatus,
    ResolutionReport, ResolveResult,
};
pub use signature::{CallableKind, ConverterShape, Shape, Signature};
pub use target::{Func, Target};
