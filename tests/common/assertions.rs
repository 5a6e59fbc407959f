//! Custom assertion utilities for tests.

use argmapper::{OutcomeKind, ResolveResult};

/// Assert that a result is Ok and return the inner value.
///
/// # Panics
///
/// Panics with `context` and the error if the result is `Err`.
#[allow(dead_code)]
pub fn assert_ok<T, E: std::fmt::Debug>(result: Result<T, E>, context: &str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("{} failed: {:?}", context, e),
    }
}

/// Assert that a result is Err and return the error.
#[allow(dead_code)]
pub fn assert_err<T: std::fmt::Debug, E>(result: Result<T, E>, context: &str) -> E {
    match result {
        Ok(v) => panic!("{} should have failed but got: {:?}", context, v),
        Err(e) => e,
    }
}

/// Assert that an error message contains expected text, ignoring case.
#[allow(dead_code)]
pub fn assert_error_contains<E: std::fmt::Display>(error: E, expected_text: &str, context: &str) {
    let error_str = error.to_string().to_lowercase();
    let expected_lower = expected_text.to_lowercase();

    assert!(
        error_str.contains(&expected_lower),
        "{}: error message should contain '{}', got: {}",
        context,
        expected_text,
        error
    );
}

/// Assert that an error message contains any of the expected texts.
#[allow(dead_code)]
pub fn assert_error_contains_any<E: std::fmt::Display>(
    error: E,
    expected_texts: &[&str],
    context: &str,
) {
    let error_str = error.to_string().to_lowercase();

    let found = expected_texts
        .iter()
        .any(|text| error_str.contains(&text.to_lowercase()));

    assert!(
        found,
        "{}: error message should contain one of {:?}, got: {}",
        context, expected_texts, error
    );
}

/// Assert the exact sequence of outcome kinds in a resolution trail.
#[allow(dead_code)]
pub fn assert_outcomes(result: &ResolveResult, expected: &[OutcomeKind], context: &str) {
    let actual: Vec<OutcomeKind> = result.attempts().iter().map(|a| a.outcome.kind()).collect();
    if actual != expected {
        let trail: Vec<String> = result.attempts().iter().map(ToString::to_string).collect();
        panic!(
            "{}: outcome mismatch\n  expected: {:?}\n  actual: {:?}\n  trail:\n    {}",
            context,
            expected,
            actual,
            trail.join("\n    ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_ok() {
        let result: Result<i32, &str> = Ok(42);
        let value = assert_ok(result, "test operation");
        assert_eq!(value, 42);
    }

    #[test]
    #[should_panic(expected = "test operation failed")]
    fn test_assert_ok_fails() {
        let result: Result<i32, &str> = Err("error");
        assert_ok(result, "test operation");
    }

    #[test]
    fn test_assert_error_contains_any() {
        let error = "no value or converter for `DB: String`";
        assert_error_contains_any(error, &["missing", "no value"], "missing input");
    }
}
