//! Helpers shared by the unit tests in this crate.

use std::sync::{Mutex, MutexGuard, OnceLock};

static ENV_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();

/// Serialize tests that read or mutate process environment variables.
///
/// A poisoned mutex (a previous env test panicked) is recovered rather than
/// propagated so one failure does not cascade through the suite.
pub fn lock_env() -> MutexGuard<'static, ()> {
    ENV_MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
