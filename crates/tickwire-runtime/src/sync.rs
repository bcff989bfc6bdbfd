use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock without panicking. A poisoned lock means a listener panicked while
/// we held it; the guarded maps are still structurally valid, so keep going.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
