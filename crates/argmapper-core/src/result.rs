//! Resolution results and the diagnostic trail.
//!
//! Every chain that is actually attempted leaves an [`Attempt`] behind, in
//! the order it was tried. On success the trail ends with the successful
//! attempt; on exhaustion it holds every failure, so a caller can report why
//! each path failed rather than just that resolution failed.

use std::fmt;
use std::sync::Arc;

use argmapper_types::{ArgKey, Environment};
use serde::{Deserialize, Serialize};

use crate::error::ResolveError;
use crate::planner::Chain;

/// An error raised by a converter, kept verbatim.
///
/// Shared so that a cached failure can be reported by several attempts.
#[derive(Debug, Clone)]
pub struct ConverterError(Arc<anyhow::Error>);

impl ConverterError {
    pub fn new(error: anyhow::Error) -> Self {
        Self(Arc::new(error))
    }

    /// The error as the converter returned it.
    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }

    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.0.downcast_ref::<E>()
    }
}

impl fmt::Display for ConverterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.0)
    }
}

/// How one attempted chain ended.
#[derive(Debug, Clone)]
pub enum Outcome {
    Success,

    /// A converter explicitly returned no value.
    ConversionFailed {
        /// Zero-based position in the chain
        step: usize,
        converter: String,
    },

    /// A converter returned an error.
    ConversionError {
        step: usize,
        converter: String,
        error: ConverterError,
    },

    /// A required key has no value and nothing can produce it.
    MissingInput {
        key: ArgKey,
        /// Leaf keys with neither a base value nor a producer
        unresolved: Vec<ArgKey>,
        /// Keys whose derivation led back to itself
        cycles: Vec<ArgKey>,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// Short machine-readable kind.
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Success => OutcomeKind::Success,
            Outcome::ConversionFailed { .. } => OutcomeKind::ConversionFailed,
            Outcome::ConversionError { .. } => OutcomeKind::ConversionError,
            Outcome::MissingInput { .. } => OutcomeKind::MissingInput,
        }
    }

    /// Name of the converter the outcome is attributed to, if any.
    pub fn converter(&self) -> Option<&str> {
        match self {
            Outcome::ConversionFailed { converter, .. }
            | Outcome::ConversionError { converter, .. } => Some(converter.as_str()),
            Outcome::Success | Outcome::MissingInput { .. } => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::ConversionFailed { step, converter } => write!(
                f,
                "conversion failed: `{}` (step {}) returned no value",
                converter, step
            ),
            Outcome::ConversionError {
                step,
                converter,
                error,
            } => write!(
                f,
                "conversion error: `{}` (step {}): {}",
                converter, step, error
            ),
            Outcome::MissingInput {
                key,
                unresolved,
                cycles,
            } => {
                write!(f, "missing input: no value or converter for `{}`", key)?;
                if !unresolved.is_empty() {
                    let keys: Vec<String> = unresolved.iter().map(ToString::to_string).collect();
                    write!(f, " (unresolved: {})", keys.join(", "))?;
                }
                if !cycles.is_empty() {
                    let keys: Vec<String> = cycles.iter().map(ToString::to_string).collect();
                    write!(f, " (cyclic: {})", keys.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

/// Serializable outcome discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    ConversionFailed,
    ConversionError,
    MissingInput,
}

/// One attempted chain and how it ended.
#[derive(Debug, Clone)]
pub struct Attempt {
    /// Position of the chain in the planner's candidate order.
    pub index: usize,
    pub chain: Chain,
    /// Converter names, in chain order.
    pub converters: Vec<String>,
    pub outcome: Outcome,
}

impl Attempt {
    /// An attempt that failed at planning time; no converter was invoked.
    pub(crate) fn planning_failure(index: usize, outcome: Outcome) -> Self {
        Self {
            index,
            chain: Chain::default(),
            converters: Vec::new(),
            outcome,
        }
    }
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.converters.is_empty() {
            write!(f, "#{} []: {}", self.index, self.outcome)
        } else {
            write!(
                f,
                "#{} [{}]: {}",
                self.index,
                self.converters.join(" -> "),
                self.outcome
            )
        }
    }
}

/// Final environment (or failure) plus the full diagnostic trail.
#[derive(Debug, Clone)]
pub struct ResolveResult {
    value: Option<Environment>,
    attempts: Vec<Attempt>,
    truncated: bool,
}

impl ResolveResult {
    pub(crate) fn new(value: Option<Environment>, attempts: Vec<Attempt>) -> Self {
        Self {
            value,
            attempts,
            truncated: false,
        }
    }

    pub(crate) fn with_truncated(mut self, truncated: bool) -> Self {
        self.truncated = truncated;
        self
    }

    pub fn is_success(&self) -> bool {
        self.value.is_some()
    }

    /// The resolved values, restricted to the target's required keys.
    pub fn value(&self) -> Option<&Environment> {
        self.value.as_ref()
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    /// Whether `max_chains` kept some candidate chains from being planned.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// The attempt that succeeded, always the last one when present.
    pub fn successful_attempt(&self) -> Option<&Attempt> {
        self.attempts.last().filter(|a| a.outcome.is_success())
    }

    /// Failed attempts, in the order they were tried.
    pub fn failures(&self) -> impl Iterator<Item = &Attempt> {
        self.attempts.iter().filter(|a| !a.outcome.is_success())
    }

    pub fn into_result(self) -> Result<Environment, ResolveError> {
        match self.value {
            Some(env) => Ok(env),
            None => Err(ResolveError::Exhausted {
                attempts: self.attempts,
            }),
        }
    }

    pub fn report(&self) -> ResolutionReport {
        ResolutionReport {
            status: if self.is_success() {
                ReportStatus::Success
            } else {
                ReportStatus::Exhausted
            },
            chosen_chain: self.successful_attempt().map(|a| a.converters.clone()),
            resolved_keys: self
                .value
                .as_ref()
                .map(|env| env.keys().map(ToString::to_string).collect())
                .unwrap_or_default(),
            truncated: self.truncated,
            attempts: self
                .attempts
                .iter()
                .map(|a| AttemptReport {
                    index: a.index,
                    chain: a.converters.clone(),
                    outcome: a.outcome.kind(),
                    converter: a.outcome.converter().map(str::to_string),
                    message: (!a.outcome.is_success()).then(|| a.outcome.to_string()),
                })
                .collect(),
        }
    }
}

/// Terminal state of a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Success,
    Exhausted,
}

/// Serializable summary of one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptReport {
    pub index: usize,
    pub chain: Vec<String>,
    pub outcome: OutcomeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Serializable summary of a resolution, for logs and tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionReport {
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_chain: Option<Vec<String>>,
    #[serde(default)]
    pub resolved_keys: Vec<String>,
    /// Some candidate chains were never planned.
    #[serde(default)]
    pub truncated: bool,
    pub attempts: Vec<AttemptReport>,
}

impl ResolutionReport {
    pub fn to_json_pretty(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for ResolutionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            ReportStatus::Success => {
                let chain = self.chosen_chain.as_deref().unwrap_or_default();
                if chain.is_empty() {
                    writeln!(f, "Resolved from the base environment")?;
                } else {
                    writeln!(f, "Resolved via {}", chain.join(" -> "))?;
                }
                if !self.resolved_keys.is_empty() {
                    writeln!(f, "  Values: {}", self.resolved_keys.join(", "))?;
                }
            }
            ReportStatus::Exhausted => writeln!(f, "Resolution exhausted")?,
        }
        if self.truncated {
            writeln!(f, "  Candidate chains were truncated at max_chains")?;
        }
        if !self.attempts.is_empty() {
            writeln!(f, "  Attempts:")?;
            for attempt in &self.attempts {
                let chain = if attempt.chain.is_empty() {
                    "[]".to_string()
                } else {
                    attempt.chain.join(" -> ")
                };
                match &attempt.message {
                    Some(msg) => writeln!(f, "    #{} {}: {}", attempt.index, chain, msg)?,
                    None => writeln!(f, "    #{} {}: success", attempt.index, chain)?,
                }
            }
        }
        Ok(())
    }
}
