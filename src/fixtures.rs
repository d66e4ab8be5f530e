//! Process environment snapshots for tests that modify it.

use std::collections::BTreeMap;
use std::env;
use std::ffi::{OsStr, OsString};

/// Snapshot of the process environment, restored wholesale on drop.
///
/// Restoring happens on every exit path, panics included. The process
/// environment is global, so tests holding an `Environ` should not run
/// concurrently with others reading the variables they change.
#[derive(Debug)]
pub struct Environ {
    snapshot: BTreeMap<OsString, OsString>,
}

/// Snapshot the current environment
pub fn environ() -> Environ {
    Environ {
        snapshot: env::vars_os().collect(),
    }
}

impl Environ {
    pub fn get(&self, key: impl AsRef<OsStr>) -> Option<String> {
        env::var(key).ok()
    }

    pub fn set(&mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) {
        env::set_var(key, value);
    }

    pub fn remove(&mut self, key: impl AsRef<OsStr>) {
        env::remove_var(key);
    }

    /// Value of `key` when the snapshot was taken
    pub fn original(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        self.snapshot.get(key.as_ref()).map(OsString::as_os_str)
    }
}

impl Drop for Environ {
    fn drop(&mut self) {
        for (key, _) in env::vars_os() {
            if !self.snapshot.contains_key(&key) {
                env::remove_var(&key);
            }
        }
        for (key, value) in &self.snapshot {
            if env::var_os(key).as_deref() != Some(value.as_os_str()) {
                env::set_var(key, value);
            }
        }
    }
}

/// Run `f` with an environment snapshot that is restored afterwards
pub fn with_environ<T>(f: impl FnOnce(&mut Environ) -> T) -> T {
    let mut environ = environ();
    f(&mut environ)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::Mutex;

    // Tests in this module share the process environment
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_changes_are_reverted() {
        let _lock = ENV_LOCK.lock().unwrap();
        env::set_var("RELAXED_EXISTING", "before");
        env::remove_var("RELAXED_ADDED");

        with_environ(|environ| {
            environ.set("RELAXED_EXISTING", "changed");
            environ.set("RELAXED_ADDED", "new");
            assert_eq!(environ.get("RELAXED_EXISTING").as_deref(), Some("changed"));
            assert_eq!(environ.original("RELAXED_EXISTING"), Some(OsStr::new("before")));
        });

        assert_eq!(env::var("RELAXED_EXISTING").as_deref(), Ok("before"));
        assert!(env::var_os("RELAXED_ADDED").is_none());
        env::remove_var("RELAXED_EXISTING");
    }

    #[test]
    fn test_removed_variables_come_back() {
        let _lock = ENV_LOCK.lock().unwrap();
        env::set_var("RELAXED_REMOVED", "keep me");

        {
            let mut environ = environ();
            environ.remove("RELAXED_REMOVED");
            assert_eq!(environ.get("RELAXED_REMOVED"), None);
        }

        assert_eq!(env::var("RELAXED_REMOVED").as_deref(), Ok("keep me"));
        env::remove_var("RELAXED_REMOVED");
    }

    #[test]
    fn test_restored_after_panic() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        env::remove_var("RELAXED_PANICKED");

        let result = catch_unwind(AssertUnwindSafe(|| {
            with_environ(|environ| {
                environ.set("RELAXED_PANICKED", "1");
                panic!("test body failed");
            })
        }));

        assert!(result.is_err());
        assert!(env::var_os("RELAXED_PANICKED").is_none());
    }
}
