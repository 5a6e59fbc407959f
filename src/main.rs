//! argmapper: run built-in argument resolution scenarios.
//!
//! ## Example Usage
//!
//! ```bash
//! # List scenarios
//! argmapper list
//!
//! # Resolve one and print the attempt trail
//! argmapper scenario port-fallback
//!
//! # Same, as JSON, attempting chains in parallel
//! argmapper scenario port-fallback --json --parallel
//! ```
//!
//! Exits with status 2 when resolution is exhausted.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use argmapper::scenarios;
use argmapper::ResolverConfig;

/// Exit status when every candidate chain failed.
const EXIT_EXHAUSTED: i32 = 2;

#[derive(Parser)]
#[command(
    name = "argmapper",
    author,
    version,
    about = "Resolve function arguments by composing chains of converters"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in scenarios
    List,

    /// Resolve a built-in scenario and print the result
    Scenario(ScenarioCmd),
}

#[derive(Args)]
struct ScenarioCmd {
    /// Scenario name (see `argmapper list`)
    name: String,

    /// Output the resolution report as JSON
    #[arg(long)]
    json: bool,

    /// Attempt candidate chains in parallel
    #[arg(long)]
    parallel: bool,

    /// Reuse converter results within the resolution
    #[arg(long)]
    cache: bool,

    /// Maximum number of candidate chains to enumerate
    #[arg(long, value_name = "N")]
    max_chains: Option<usize>,

    /// Worker threads for parallel mode
    #[arg(long, value_name = "N")]
    threads: Option<usize>,
}

impl ScenarioCmd {
    fn config(&self) -> ResolverConfig {
        let mut config = ResolverConfig::from_env();
        if self.parallel {
            config = config.parallel();
        }
        if self.cache {
            config = config.with_cache(true);
        }
        if let Some(max_chains) = self.max_chains {
            config = config.with_max_chains(max_chains);
        }
        if self.threads.is_some() {
            config = config.with_threads(self.threads);
        }
        config
    }

    /// Returns whether resolution succeeded.
    fn execute(&self) -> Result<bool> {
        let scenario = scenarios::lookup(&self.name)?;
        let run = scenario
            .run(self.config())
            .with_context(|| format!("failed to set up scenario '{}'", scenario.name))?;
        let report = run.result.report();

        if self.json {
            let out = serde_json::json!({
                "scenario": scenario.name,
                "value": run.value,
                "report": report,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            println!("Scenario: {} ({})", scenario.name, scenario.description);
            if let Some(value) = &run.value {
                println!("  {}", value);
            }
            print!("{}", report);
        }
        Ok(run.result.is_success())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "argmapper=info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::List => {
            for scenario in scenarios::all() {
                println!("{:<16} {}", scenario.name, scenario.description);
            }
            Ok(())
        }
        Commands::Scenario(cmd) => {
            if !cmd.execute()? {
                std::process::exit(EXIT_EXHAUSTED);
            }
            Ok(())
        }
    }
}
