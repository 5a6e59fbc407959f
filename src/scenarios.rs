//! Built-in resolution scenarios.
//!
//! Each scenario is a small, self-contained resolver setup: a set of
//! converters, a target and a base environment. The CLI runs them by name.

use anyhow::{anyhow, bail, Result};
use argmapper_core::{Converter, ResolveResult, Resolver, ResolverConfig, Target};
use argmapper_types::{arg_struct, Environment};
use tracing::info;

arg_struct! { struct FullName { full_name: String => "FullName" } }
arg_struct! { struct Name { name: String => "Name" } }
arg_struct! { struct ConfigFile { path: String => "ConfigFile" } }
arg_struct! { struct EnvVar { value: String => "EnvVar" } }
arg_struct! { struct Port { port: u16 => "Port" } }
arg_struct! { struct Dsn { dsn: String => "DSN" } }
arg_struct! { struct Db { handle: String => "DB" } }
arg_struct! { struct Left { value: String => "Left" } }
arg_struct! { struct Right { value: String => "Right" } }

/// Converters, target and base environment for one scenario.
pub struct Setup {
    pub converters: Vec<Converter>,
    pub target: Target,
    pub base: Environment,
}

/// A named scenario.
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    setup: fn() -> Result<Setup>,
    render: fn(&Environment) -> Option<String>,
}

/// Output of running a scenario.
pub struct ScenarioRun {
    pub result: ResolveResult,
    /// Human-readable rendering of the resolved value, if any.
    pub value: Option<String>,
}

impl Scenario {
    pub fn setup(&self) -> Result<Setup> {
        (self.setup)()
    }

    /// Build a resolver for this scenario and resolve its target.
    pub fn run(&self, config: ResolverConfig) -> Result<ScenarioRun> {
        let Setup {
            converters,
            target,
            base,
        } = self.setup()?;

        let mut resolver = Resolver::with_config(config);
        for converter in converters {
            resolver.register(converter);
        }

        info!(scenario = self.name, target = %target, base = %base, "running scenario");
        let result = resolver.resolve(&target, &base);
        let value = result.value().and_then(self.render);
        Ok(ScenarioRun { result, value })
    }
}

static SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "first-token",
        description: "Derive Name from FullName with a single converter",
        setup: first_token,
        render: render_name,
    },
    Scenario {
        name: "port-fallback",
        description: "Fall back from a failing config-file converter to the environment",
        setup: port_fallback,
        render: render_port,
    },
    Scenario {
        name: "missing-db",
        description: "Report a missing input without invoking any converter",
        setup: missing_db,
        render: render_db,
    },
    Scenario {
        name: "cycle",
        description: "Two converters that only produce each other's input",
        setup: cycle,
        render: render_right,
    },
];

pub fn all() -> &'static [Scenario] {
    SCENARIOS
}

pub fn find(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.name == name)
}

/// Like [`find`], with an error listing the known names.
pub fn lookup(name: &str) -> Result<&'static Scenario> {
    find(name).ok_or_else(|| {
        let known: Vec<&str> = SCENARIOS.iter().map(|s| s.name).collect();
        anyhow!("unknown scenario '{}' (known: {})", name, known.join(", "))
    })
}

fn first_token() -> Result<Setup> {
    let converter = Converter::infallible("first_token", |i: FullName| Name {
        name: i
            .full_name
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string(),
    })?;
    Ok(Setup {
        converters: vec![converter],
        target: Target::of::<Name>(),
        base: Environment::new().with("FullName", "Alice Smith".to_string()),
    })
}

fn port_fallback() -> Result<Setup> {
    let from_file = Converter::fallible("from_file", |c: ConfigFile| -> Result<Port> {
        bail!("{}: file not found", c.path)
    })?;
    let from_env = Converter::fallible("from_env", |e: EnvVar| -> Result<Port> {
        Ok(Port {
            port: e.value.trim().parse()?,
        })
    })?;
    Ok(Setup {
        converters: vec![from_file, from_env],
        target: Target::of::<Port>(),
        base: Environment::new()
            .with("ConfigFile", "app.toml".to_string())
            .with("EnvVar", "8080".to_string()),
    })
}

fn missing_db() -> Result<Setup> {
    let connect = Converter::infallible("connect", |d: Dsn| Db {
        handle: format!("db({})", d.dsn),
    })?;
    Ok(Setup {
        converters: vec![connect],
        target: Target::of::<Db>(),
        base: Environment::new(),
    })
}

fn cycle() -> Result<Setup> {
    let left_to_right =
        Converter::infallible("left_to_right", |l: Left| Right { value: l.value })?;
    let right_to_left =
        Converter::infallible("right_to_left", |r: Right| Left { value: r.value })?;
    Ok(Setup {
        converters: vec![left_to_right, right_to_left],
        target: Target::of::<Right>(),
        base: Environment::new(),
    })
}

fn render_name(env: &Environment) -> Option<String> {
    env.get_as::<String>("Name").map(|v| format!("Name = {}", v))
}

fn render_port(env: &Environment) -> Option<String> {
    env.get_as::<u16>("Port").map(|v| format!("Port = {}", v))
}

fn render_db(env: &Environment) -> Option<String> {
    env.get_as::<String>("DB").map(|v| format!("DB = {}", v))
}

fn render_right(env: &Environment) -> Option<String> {
    env.get_as::<String>("Right").map(|v| format!("Right = {}", v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = all().iter().map(|s| s.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), all().len());
    }

    #[test]
    fn test_every_setup_builds() {
        for scenario in all() {
            assert!(scenario.setup().is_ok(), "{} failed to build", scenario.name);
        }
    }

    #[test]
    fn test_lookup_unknown() {
        let err = lookup("nope").err().expect("unknown scenario");
        assert!(err.to_string().contains("first-token"));
    }
}
