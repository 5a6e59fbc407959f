#![allow(unused_imports)]
//! Shared test utilities for integration tests.
//!
//! # Modules
//!
//! - `fixtures`: argument bundles, converters and resolvers used across tests
//! - `assertions`: assertion helpers with descriptive failure messages

pub mod assertions;
pub mod fixtures;

pub use fixtures::{counting_converter, port_base, port_resolver};

pub use assertions::{
    assert_err, assert_error_contains, assert_error_contains_any, assert_ok, assert_outcomes,
};
