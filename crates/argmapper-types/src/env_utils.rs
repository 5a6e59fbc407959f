//! Environment variable parsing for configuration.
//!
//! Type-safe helpers with defaults, replacing the usual
//! `std::env::var(..).ok().and_then(|v| v.parse().ok()).unwrap_or(..)` chain.
//!
//! ```
//! use argmapper_types::env_utils::{env_bool, env_var, env_var_or};
//!
//! let max_chains: usize = env_var_or("ARGMAPPER_DOC_MAX_CHAINS", 64);
//! let threads: Option<usize> = env_var("ARGMAPPER_DOC_THREADS");
//! let parallel = env_bool("ARGMAPPER_DOC_PARALLEL");
//! # let _ = (max_chains, threads, parallel);
//! ```

use std::str::FromStr;

/// Parse an environment variable into any `FromStr` type.
///
/// Returns `None` if the variable is not set or cannot be parsed.
pub fn env_var<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Parse an environment variable, falling back to `default`.
pub fn env_var_or<T: FromStr>(key: &str, default: T) -> T {
    env_var(key).unwrap_or(default)
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// True if the variable is set to "1", "true", "yes" or "on" (case-insensitive).
pub fn env_bool(key: &str) -> bool {
    env_bool_or(key, false)
}

/// Like [`env_bool`], but returns `default` when the variable is unset.
pub fn env_bool_or(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => is_truthy(&v),
        Err(_) => default,
    }
}
