//! Shared data model for the argmapper workspace.
//!
//! - [`ArgKey`] / [`TypeDescriptor`]: identity of one named, typed value
//! - [`Value`]: a shared, type-erased value
//! - [`Environment`]: a mapping from keys to values, scoped to one resolution
//! - [`ArgStruct`] and [`arg_struct!`]: struct-shaped argument bundles
//! - [`env_utils`]: environment-variable parsing for configuration

pub mod arg_struct;
pub mod env_utils;
pub mod environment;
pub mod key;
pub mod value;

pub use arg_struct::ArgStruct;
pub use environment::{Environment, TypeMismatch};
pub use key::{ArgKey, TypeDescriptor};
pub use value::Value;
