//! The orchestrator: plan, then attempt candidate chains until one succeeds.
//!
//! A resolution moves through `Planning`, then `Attempting(i)` for each
//! candidate in plan order, and ends in `Success(i)` or `Exhausted`. The
//! first chain to complete wins; every attempt up to it is recorded in the
//! trail, in order.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use argmapper_types::{ArgStruct, Environment};
use rayon::prelude::*;
use tracing::{debug, trace, warn};

use crate::cache::InvocationCache;
use crate::config::{ExecutionMode, ResolverConfig};
use crate::converter::{Converter, ConverterId};
use crate::error::ResolveError;
use crate::executor::{ChainRun, Executor};
use crate::planner::{Chain, Plan, Planner};
use crate::result::{Attempt, Outcome, ResolveResult};
use crate::target::{Func, Target};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolutionState {
    Planning,
    Attempting(usize),
    Success(usize),
    Exhausted,
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionState::Planning => write!(f, "planning"),
            ResolutionState::Attempting(i) => write!(f, "attempting #{}", i),
            ResolutionState::Success(i) => write!(f, "success #{}", i),
            ResolutionState::Exhausted => write!(f, "exhausted"),
        }
    }
}

fn transition(state: ResolutionState) {
    trace!(state = %state, "resolution state");
}

/// Owns the registered converters and resolves targets against them.
#[derive(Debug, Default)]
pub struct Resolver {
    converters: Vec<Converter>,
    config: ResolverConfig,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ResolverConfig) -> Self {
        Self {
            converters: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Register a converter. Registration order is the tie-break between
    /// alternative producers of the same key.
    pub fn register(&mut self, converter: Converter) -> ConverterId {
        let id = ConverterId(self.converters.len());
        debug!(converter = %converter, id = %id, "registered converter");
        self.converters.push(converter);
        id
    }

    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.register(converter);
        self
    }

    pub fn converters(&self) -> &[Converter] {
        &self.converters
    }

    /// Plan candidate chains without invoking anything.
    pub fn plan(&self, target: &Target, base: &Environment) -> Plan {
        Planner::new(&self.converters, base, self.config.max_chains).plan(target)
    }

    /// Resolve `target` from `base`.
    ///
    /// Never fails as a call: failures are reported through the returned
    /// result's trail. `base` is not modified.
    pub fn resolve(&self, target: &Target, base: &Environment) -> ResolveResult {
        transition(ResolutionState::Planning);
        let plan = self.plan(target, base);

        if !plan.unsatisfiable.is_empty() {
            let attempts: Vec<Attempt> = plan
                .unsatisfiable
                .into_iter()
                .enumerate()
                .map(|(index, u)| {
                    Attempt::planning_failure(
                        index,
                        Outcome::MissingInput {
                            key: u.key,
                            unresolved: u.unresolved,
                            cycles: u.cycles,
                        },
                    )
                })
                .collect();
            transition(ResolutionState::Exhausted);
            debug!(target = %target, attempts = attempts.len(), "target cannot be planned");
            return ResolveResult::new(None, attempts);
        }

        let cache = self.config.cache_invocations.then(InvocationCache::new);
        let executor = Executor::new(&self.converters).with_cache(cache.as_ref());

        let result = match self.config.execution {
            ExecutionMode::Sequential => self.attempt_sequential(&executor, &plan.chains, base, target),
            ExecutionMode::Parallel => self.attempt_parallel(&executor, &plan.chains, base, target),
        };

        let result = result.with_truncated(plan.truncated);

        if let Some(cache) = &cache {
            debug!(hits = cache.hits(), misses = cache.misses(), "invocation cache");
        }
        if result.truncated() && !result.is_success() {
            warn!(
                target = %target,
                max_chains = self.config.max_chains,
                "exhausted a truncated candidate list; a higher max_chains plans more chains"
            );
        }
        debug!(
            target = %target,
            success = result.is_success(),
            attempts = result.attempts().len(),
            "resolution finished"
        );
        result
    }

    /// Resolve `func`'s arguments from `base` and call it.
    pub fn call<I: ArgStruct, O>(
        &self,
        func: &Func<I, O>,
        base: &Environment,
    ) -> Result<O, ResolveError> {
        let env = self.resolve(func.target(), base).into_result()?;
        func.call_with(&env)
            .ok_or_else(|| ResolveError::TargetUnbuildable {
                target: func.name().to_string(),
                missing: env.missing(func.target().required()),
            })
    }

    fn attempt_sequential(
        &self,
        executor: &Executor<'_>,
        chains: &[Chain],
        base: &Environment,
        target: &Target,
    ) -> ResolveResult {
        let mut attempts = Vec::with_capacity(chains.len());
        for (index, chain) in chains.iter().enumerate() {
            transition(ResolutionState::Attempting(index));
            let run = executor.run(chain, base, target, &|| false);
            if let Some(value) = self.record(&mut attempts, index, chain, run) {
                transition(ResolutionState::Success(index));
                return ResolveResult::new(Some(value), attempts);
            }
        }
        transition(ResolutionState::Exhausted);
        ResolveResult::new(None, attempts)
    }

    /// Run every chain concurrently. A chain is cancelled between steps once
    /// an earlier chain has completed; the trail is then assembled in plan
    /// order and truncated at the lowest-index success.
    fn attempt_parallel(
        &self,
        executor: &Executor<'_>,
        chains: &[Chain],
        base: &Environment,
        target: &Target,
    ) -> ResolveResult {
        let winner = AtomicUsize::new(usize::MAX);
        let run_all = || -> Vec<ChainRun> {
            chains
                .par_iter()
                .enumerate()
                .map(|(index, chain)| {
                    trace!(state = %ResolutionState::Attempting(index), "resolution state");
                    let cancelled = || winner.load(Ordering::Acquire) < index;
                    let run = executor.run(chain, base, target, &cancelled);
                    if matches!(run, ChainRun::Completed(_)) {
                        winner.fetch_min(index, Ordering::AcqRel);
                    }
                    run
                })
                .collect()
        };

        let runs = match self.config.threads {
            Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(run_all),
                Err(e) => {
                    warn!(threads, error = %e, "failed to build thread pool, using global pool");
                    run_all()
                }
            },
            None => run_all(),
        };

        let mut attempts = Vec::with_capacity(runs.len());
        for ((index, chain), run) in chains.iter().enumerate().zip(runs) {
            if let Some(value) = self.record(&mut attempts, index, chain, run) {
                transition(ResolutionState::Success(index));
                return ResolveResult::new(Some(value), attempts);
            }
        }
        transition(ResolutionState::Exhausted);
        ResolveResult::new(None, attempts)
    }

    /// Append the attempt for `run` and return the value if it completed.
    fn record(
        &self,
        attempts: &mut Vec<Attempt>,
        index: usize,
        chain: &Chain,
        run: ChainRun,
    ) -> Option<Environment> {
        let (outcome, value) = match run {
            ChainRun::Completed(env) => (Outcome::Success, Some(env)),
            ChainRun::Failed(outcome) => (outcome, None),
            ChainRun::Cancelled => return None,
        };
        debug!(index, chain = %chain, outcome = %outcome, "chain attempted");
        attempts.push(Attempt {
            index,
            chain: chain.clone(),
            converters: chain.names(&self.converters),
            outcome,
        });
        value
    }
}
