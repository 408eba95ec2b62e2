//! Shared handles for state that scripts and the player both touch

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A value shared between the player and script handles
pub type Shared<T> = Arc<Mutex<T>>;

pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// Lock a shared value. Poisoning is ignored.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
