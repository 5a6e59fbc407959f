//! Chain execution.
//!
//! The executor runs one candidate chain against a private copy of the base
//! environment. Each converter receives exactly the subset of the working
//! environment matching its inputs, and only its declared outputs are merged
//! back. The first failure stops the chain; it never aborts the resolution.

use anyhow::anyhow;
use argmapper_types::{ArgKey, Environment};
use tracing::{debug, trace};

use crate::cache::InvocationCache;
use crate::converter::{Converter, ConverterId, Invocation};
use crate::planner::Chain;
use crate::result::{ConverterError, Outcome};
use crate::target::Target;

/// Normalized converter output: produced values, an explicit absence, or an error.
pub type StepOutput = Result<Option<Environment>, ConverterError>;

impl From<Invocation> for StepOutput {
    fn from(invocation: Invocation) -> Self {
        match invocation {
            Invocation::Produced(env) => Ok(Some(env)),
            Invocation::Absent => Ok(None),
            Invocation::Failed(e) => Err(ConverterError::new(e)),
        }
    }
}

/// How one chain run ended.
#[derive(Debug)]
pub enum ChainRun {
    /// Every step ran; holds the target's required values.
    Completed(Environment),
    /// A step failed or an input was missing.
    Failed(Outcome),
    /// Stopped between steps because the run was no longer wanted.
    Cancelled,
}

pub struct Executor<'a> {
    converters: &'a [Converter],
    cache: Option<&'a InvocationCache>,
}

impl<'a> Executor<'a> {
    pub fn new(converters: &'a [Converter]) -> Self {
        Self {
            converters,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Option<&'a InvocationCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Run `chain` from `base`. `cancelled` is polled before each step.
    pub fn run(
        &self,
        chain: &Chain,
        base: &Environment,
        target: &Target,
        cancelled: &(dyn Fn() -> bool + Sync),
    ) -> ChainRun {
        let mut working = base.clone();

        for (step, id) in chain.steps().iter().enumerate() {
            if cancelled() {
                trace!(chain = %chain, step, "chain cancelled");
                return ChainRun::Cancelled;
            }

            let Some(converter) = self.converters.get(id.0) else {
                return ChainRun::Failed(Outcome::ConversionError {
                    step,
                    converter: id.to_string(),
                    error: ConverterError::new(anyhow!("unknown converter {}", id)),
                });
            };

            if let Some(outcome) = missing_input(&working, converter.inputs()) {
                return ChainRun::Failed(outcome);
            }
            let input = working
                .subset(converter.inputs())
                .unwrap_or_default();

            trace!(converter = converter.name(), step, "invoking converter");
            match self.invoke(*id, converter, input) {
                Ok(Some(produced)) => {
                    if let Err(error) = merge_outputs(&mut working, converter, produced) {
                        debug!(converter = converter.name(), step, error = %error, "bad converter output");
                        return ChainRun::Failed(Outcome::ConversionError {
                            step,
                            converter: converter.name().to_string(),
                            error,
                        });
                    }
                }
                Ok(None) => {
                    debug!(converter = converter.name(), step, "converter returned no value");
                    return ChainRun::Failed(Outcome::ConversionFailed {
                        step,
                        converter: converter.name().to_string(),
                    });
                }
                Err(error) => {
                    debug!(converter = converter.name(), step, error = %error, "converter failed");
                    return ChainRun::Failed(Outcome::ConversionError {
                        step,
                        converter: converter.name().to_string(),
                        error,
                    });
                }
            }
        }

        if let Some(outcome) = missing_input(&working, target.required()) {
            return ChainRun::Failed(outcome);
        }
        ChainRun::Completed(working.subset(target.required()).unwrap_or_default())
    }

    fn invoke(&self, id: ConverterId, converter: &Converter, input: Environment) -> StepOutput {
        let call = |input: Environment| StepOutput::from(converter.invoke(input));
        match self.cache {
            Some(cache) => cache.get_or_invoke(id, input, call),
            None => call(input),
        }
    }
}

fn missing_input<'k>(
    env: &Environment,
    keys: impl IntoIterator<Item = &'k ArgKey>,
) -> Option<Outcome> {
    let missing = env.missing(keys);
    let key = missing.first()?.clone();
    Some(Outcome::MissingInput {
        key,
        unresolved: missing,
        cycles: Vec::new(),
    })
}

/// Copy the converter's declared outputs from `produced` into `working`.
fn merge_outputs(
    working: &mut Environment,
    converter: &Converter,
    produced: Environment,
) -> Result<(), ConverterError> {
    for key in converter.outputs() {
        let value = produced.get(key).ok_or_else(|| {
            ConverterError::new(anyhow!("did not produce declared output `{}`", key))
        })?;
        working
            .insert(key.clone(), value.clone())
            .map_err(|e| ConverterError::new(e.into()))?;
    }
    Ok(())
}
