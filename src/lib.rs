//! argmapper: resolve a function's inputs by composing chains of converters.
//!
//! This crate re-exports the workspace crates under one name:
//!
//! - [`argmapper_types`]: keys, values, environments and argument bundles
//! - [`argmapper_core`]: converters, planning, execution and resolution
//!
//! plus a small set of runnable [`scenarios`] used by the `argmapper` CLI.
//!
//! # Example
//!
//! ```
//! use argmapper::{arg_struct, Converter, Environment, Func, Resolver};
//!
//! arg_struct! { struct ConfigFile { path: String => "ConfigFile" } }
//! arg_struct! { struct EnvVar { value: String => "EnvVar" } }
//! arg_struct! { struct Port { port: u16 => "Port" } }
//!
//! let resolver = Resolver::new()
//!     .with_converter(
//!         Converter::fallible("from_file", |_: ConfigFile| -> anyhow::Result<Port> {
//!             anyhow::bail!("file not found")
//!         })
//!         .unwrap(),
//!     )
//!     .with_converter(
//!         Converter::fallible("from_env", |e: EnvVar| -> anyhow::Result<Port> {
//!             Ok(Port { port: e.value.parse()? })
//!         })
//!         .unwrap(),
//!     );
//!
//! let serve = Func::new("serve", |p: Port| p.port).unwrap();
//! let base = Environment::new()
//!     .with("ConfigFile", "app.toml".to_string())
//!     .with("EnvVar", "8080".to_string());
//! assert_eq!(resolver.call(&serve, &base).unwrap(), 8080);
//! ```

pub mod scenarios;

pub use argmapper_core::*;
pub use argmapper_types::{
    arg_struct, env_utils, ArgKey, ArgStruct, Environment, TypeDescriptor, TypeMismatch, Value,
};
