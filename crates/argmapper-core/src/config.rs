//! Resolver configuration.

use argmapper_types::env_utils::{env_bool_or, env_var, env_var_or};
use serde::{Deserialize, Serialize};

/// Default bound on the number of candidate chains enumerated per resolution.
pub const DEFAULT_MAX_CHAINS: usize = 64;

pub const ENV_MAX_CHAINS: &str = "ARGMAPPER_MAX_CHAINS";
pub const ENV_PARALLEL: &str = "ARGMAPPER_PARALLEL";
pub const ENV_CACHE: &str = "ARGMAPPER_CACHE";
pub const ENV_THREADS: &str = "ARGMAPPER_THREADS";

/// How candidate chains are attempted.
///
/// Both modes report the same winning chain and the same ordered trail.
/// Parallel mode only changes latency, and may invoke converters on chains
/// that end up discarded, so use it only with side-effect-free converters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Sequential,
    Parallel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Upper bound on candidate chains per resolution.
    pub max_chains: usize,
    pub execution: ExecutionMode,
    /// Replay converter invocations on identical input values within one resolution.
    pub cache_invocations: bool,
    /// Worker threads for parallel mode. `None` uses the global rayon pool.
    pub threads: Option<usize>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_chains: DEFAULT_MAX_CHAINS,
            execution: ExecutionMode::Sequential,
            cache_invocations: false,
            threads: None,
        }
    }
}

impl ResolverConfig {
    /// Defaults overridden by `ARGMAPPER_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let parallel = env_bool_or(
            ENV_PARALLEL,
            defaults.execution == ExecutionMode::Parallel,
        );
        Self {
            max_chains: env_var_or(ENV_MAX_CHAINS, defaults.max_chains).max(1),
            execution: if parallel {
                ExecutionMode::Parallel
            } else {
                ExecutionMode::Sequential
            },
            cache_invocations: env_bool_or(ENV_CACHE, defaults.cache_invocations),
            threads: env_var::<usize>(ENV_THREADS).filter(|n| *n > 0),
        }
    }

    pub fn with_max_chains(mut self, max_chains: usize) -> Self {
        self.max_chains = max_chains.max(1);
        self
    }

    pub fn with_execution(mut self, execution: ExecutionMode) -> Self {
        self.execution = execution;
        self
    }

    pub fn parallel(self) -> Self {
        self.with_execution(ExecutionMode::Parallel)
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_invocations = enabled;
        self
    }

    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }
}
