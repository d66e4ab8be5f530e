//! Expecting a test body to fail with a particular error type.

use std::error::Error as StdError;
use thiserror::Error;

/// The wrapped callable returned normally
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Did not receive expected {expected}!")]
pub struct ExpectationFailed {
    pub expected: &'static str,
}

/// Wrap `f` so that it succeeds only when it fails with an `E`.
///
/// An `E` anywhere in the error's chain of causes counts, so errors wrapped
/// with context still match. Errors of any other type are returned untouched.
pub fn raises<E, T, F>(f: F) -> impl FnOnce() -> anyhow::Result<()>
where
    E: StdError + Send + Sync + 'static,
    F: FnOnce() -> anyhow::Result<T>,
{
    move || match f() {
        Ok(_) => Err(ExpectationFailed {
            expected: short_type_name::<E>(),
        }
        .into()),
        Err(err) if err.chain().any(|cause| cause.is::<E>()) => Ok(()),
        Err(err) => Err(err),
    }
}

/// Call `f` right away, expecting it to fail with an `E`
pub fn check_raises<E, T>(f: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<()>
where
    E: StdError + Send + Sync + 'static,
{
    raises::<E, T, _>(f)()
}

/// Type name without its module path, e.g. `Boom` for `crate::tests::Boom`
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    let start = base.rfind("::").map_or(0, |i| i + 2);
    &full[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Context};

    #[derive(Debug, Error)]
    #[error("boom")]
    struct Boom;

    #[derive(Debug, Error)]
    #[error("{0}")]
    struct OtherBoom(String);

    #[test]
    fn test_expected_error_is_swallowed() {
        let kaboom = raises::<Boom, (), _>(|| Err(Boom.into()));
        assert!(kaboom().is_ok());
    }

    #[test]
    fn test_missing_error_fails() {
        let kaboom = raises::<Boom, (), _>(|| Ok(()));
        let err = kaboom().unwrap_err();

        assert!(err.to_string().contains("Did not receive expected Boom!"));
        assert!(err.is::<ExpectationFailed>());
    }

    #[test]
    fn test_other_errors_are_untouched() {
        let kaboom = raises::<Boom, (), _>(|| Err(OtherBoom("sup".into()).into()));
        let err = kaboom().unwrap_err();

        assert_eq!(err.downcast_ref::<OtherBoom>().map(|e| e.0.as_str()), Some("sup"));
    }

    #[test]
    fn test_wrapped_errors_match() {
        let result = check_raises::<Boom, ()>(|| Err(Boom).context("while exploding"));
        assert!(result.is_ok());

        let result = check_raises::<Boom, ()>(|| Err(anyhow!("plain message")));
        assert!(result.is_err());
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<Boom>(), "Boom");
        assert_eq!(short_type_name::<std::io::Error>(), "Error");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec<alloc::string::String>");
    }
}
