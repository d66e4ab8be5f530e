//! Attribute inheritance between nested class scopes.
//!
//! A class nested in another class sees the enclosing class's non-test
//! attributes as if they were its own. Tests, nested classes and the pytest
//! marker attribute stay where they are declared, and anything the nested
//! class declares itself wins.

use super::types::{BoundMethod, Members, ScopeId, Value};
use crate::python_discovery::pattern::{is_test_function_name, MARKER_ATTRIBUTE};
use log::trace;

/// Compute the effective members of a nested scope.
///
/// `parent` are the effective members of the enclosing class scope, `own` the
/// members declared in the nested class body and `receiver` the id the nested
/// scope will receive. Inherited callables are rebound to `receiver` so that
/// lifecycle methods and helpers act on the most derived instance.
pub fn merge_inherited(parent: &Members, own: &Members, receiver: ScopeId) -> Members {
    let mut effective = own.clone();

    for (name, value) in parent.iter() {
        if own.contains(name) {
            continue;
        }
        if name == MARKER_ATTRIBUTE || matches!(value, Value::Marker(_)) {
            continue;
        }
        let inherited = match value {
            // Only one copy of a nested class exists, at its declaration
            Value::Class(_) => continue,
            Value::Function(_) | Value::Method(_) if is_test_function_name(name) => continue,
            Value::Function(function) => Value::Method(BoundMethod {
                function: function.clone(),
                receiver,
            }),
            Value::Method(method) => Value::Method(BoundMethod {
                function: method.function.clone(),
                receiver,
            }),
            data => data.clone(),
        };
        trace!("inheriting {name} into scope {}", receiver.index());
        effective.insert(name, inherited);
    }

    effective
}
