//! Naming rules deciding which members are test-eligible.

/// Leading character of names that are never collected
pub const PRIVATE_MARKER: char = '_';

/// Per-test lifecycle hooks
pub const SETUP: &str = "setup";
pub const TEARDOWN: &str = "teardown";

/// Lifecycle callables that are never collected as tests
pub const RESERVED_NAMES: [&str; 2] = [SETUP, TEARDOWN];

/// Attribute pytest stores class-level marks under
pub const MARKER_ATTRIBUTE: &str = "pytestmark";

/// Whether a class name may form a test scope
pub fn is_test_class_name(name: &str) -> bool {
    !name.starts_with(PRIVATE_MARKER)
}

/// Whether a callable name may form a test
pub fn is_test_function_name(name: &str) -> bool {
    !(name.starts_with(PRIVATE_MARKER) || RESERVED_NAMES.contains(&name))
}

/// Whether a Python decorator marks the decorated object with a pytest mark.
///
/// Returns the mark name for `@pytest.mark.slow`, `@mark.slow` and the called
/// forms (`@pytest.mark.skipif(...)`).
pub fn mark_name(decorator: &str) -> Option<&str> {
    decorator
        .strip_prefix("pytest.mark.")
        .or_else(|| decorator.strip_prefix("mark."))
        .filter(|name| !name.is_empty() && !name.contains('.'))
}

/// Minimal glob matching for file name patterns (`test_*.py`, `*_test.py`)
pub fn matches(pattern: &str, name: &str) -> bool {
    glob::Pattern::new(pattern)
        .map(|compiled| compiled.matches(name))
        .unwrap_or(false)
}
