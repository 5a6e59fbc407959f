//! Argument bundles, converters and resolvers shared by integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use argmapper::{arg_struct, Converter, Environment, Resolver, ResolverConfig};

arg_struct! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct ConfigFile { pub path: String => "ConfigFile" }
}

arg_struct! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct EnvVar { pub value: String => "EnvVar" }
}

arg_struct! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Port { pub port: u16 => "Port" }
}

arg_struct! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Host { pub host: String => "Host" }
}

arg_struct! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Db { pub handle: String => "DB" }
}

/// `from_file` (always errors) registered before `from_env` (parses `EnvVar`).
#[allow(dead_code)]
pub fn port_resolver(config: ResolverConfig) -> Resolver {
    Resolver::with_config(config)
        .with_converter(
            Converter::fallible("from_file", |c: ConfigFile| -> anyhow::Result<Port> {
                Err(anyhow!("{}: file not found", c.path))
            })
            .expect("valid converter"),
        )
        .with_converter(
            Converter::fallible("from_env", |e: EnvVar| -> anyhow::Result<Port> {
                Ok(Port {
                    port: e.value.parse()?,
                })
            })
            .expect("valid converter"),
        )
}

#[allow(dead_code)]
pub fn port_base() -> Environment {
    Environment::new()
        .with("ConfigFile", "app.toml".to_string())
        .with("EnvVar", "8080".to_string())
}

/// A `Host -> Port` converter that counts its invocations.
#[allow(dead_code)]
pub fn counting_converter(name: &str, port: u16) -> (Converter, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let converter = Converter::infallible(name, move |_: Host| {
        counter.fetch_add(1, Ordering::SeqCst);
        Port { port }
    })
    .expect("valid converter");
    (converter, calls)
}
