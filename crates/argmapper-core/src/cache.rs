//! Per-resolution memo of converter invocations.
//!
//! Different candidate chains often share upstream converters. With caching
//! enabled, a converter invoked on exactly the same input values (the same
//! shared value instances, compared by identity) is run once per resolution
//! and its output, absence or error is replayed for later chains.
//!
//! Entries pin their input values, so a recorded identity cannot be reused
//! by an unrelated value while the cache is alive.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use argmapper_types::{ArgKey, Environment};
use parking_lot::Mutex;
use tracing::trace;

use crate::converter::ConverterId;
use crate::executor::StepOutput;

type CacheKey = (ConverterId, Vec<(ArgKey, usize)>);

struct CacheEntry {
    _pinned: Environment,
    output: StepOutput,
}

/// Invocation cache shared by every chain attempt of one resolution.
#[derive(Default)]
pub struct InvocationCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl InvocationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the recorded output for `(id, input)`, or run `invoke` and record it.
    ///
    /// The lock is not held while `invoke` runs. If two threads race on the
    /// same key, the first recorded output wins and both callers get it.
    pub fn get_or_invoke<F>(&self, id: ConverterId, input: Environment, invoke: F) -> StepOutput
    where
        F: FnOnce(Environment) -> StepOutput,
    {
        let key: CacheKey = (
            id,
            input
                .iter()
                .map(|(k, v)| (k.clone(), v.identity()))
                .collect(),
        );

        if let Some(entry) = self.entries.lock().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(converter = %id, "invocation cache hit");
            return entry.output.clone();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let output = invoke(input.clone());
        let mut entries = self.entries.lock();
        let entry = entries.entry(key).or_insert(CacheEntry {
            _pinned: input,
            output,
        });
        entry.output.clone()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for InvocationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationCache")
            .field("entries", &self.len())
            .field("hits", &self.hits())
            .field("misses", &self.misses())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_same_values_hit() {
        let cache = InvocationCache::new();
        let input = Environment::new().with("ConfigFile", "app.toml".to_string());
        let calls = Cell::new(0);
        let run = |_: Environment| -> StepOutput {
            calls.set(calls.get() + 1);
            Ok(Some(Environment::new().with("Port", 8080u16)))
        };

        let first = cache.get_or_invoke(ConverterId(0), input.clone(), run);
        let second = cache.get_or_invoke(ConverterId(0), input.clone(), run);
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);

        let port = ArgKey::of::<u16>("Port");
        let a = first.unwrap().unwrap();
        let b = second.unwrap().unwrap();
        assert!(a.get(&port).unwrap().ptr_eq(b.get(&port).unwrap()));
    }

    #[test]
    fn test_equal_but_distinct_values_miss() {
        let cache = InvocationCache::new();
        let a = Environment::new().with("ConfigFile", "app.toml".to_string());
        let b = Environment::new().with("ConfigFile", "app.toml".to_string());
        let _ = cache.get_or_invoke(ConverterId(0), a, |_| Ok(None));
        let _ = cache.get_or_invoke(ConverterId(0), b, |_| Ok(None));
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_different_converters_miss() {
        let cache = InvocationCache::new();
        let input = Environment::new().with("EnvVar", "8080".to_string());
        let _ = cache.get_or_invoke(ConverterId(0), input.clone(), |_| Ok(None));
        let _ = cache.get_or_invoke(ConverterId(1), input, |_| Ok(None));
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.len(), 2);
    }
}
