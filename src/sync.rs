//! Synchronization primitives with conditional compilation.
//!
//! Provides unified mutex and read-write lock aliases that use
//! `parking_lot` when the `fast-lock` feature is enabled, falling back to
//! `std::sync` otherwise. The std variants recover poisoned guards instead
//! of propagating the poison.

/// Mutex type backed by `parking_lot` under the `fast-lock` feature.
#[cfg(feature = "fast-lock")]
pub type Mutex<T> = parking_lot::Mutex<T>;

/// Mutex type backed by `std::sync` by default.
#[cfg(not(feature = "fast-lock"))]
pub type Mutex<T> = std::sync::Mutex<T>;

/// Read-write lock backed by `parking_lot` under the `fast-lock` feature.
#[cfg(feature = "fast-lock")]
pub type RwLock<T> = parking_lot::RwLock<T>;

/// Read-write lock backed by `std::sync` by default.
#[cfg(not(feature = "fast-lock"))]
pub type RwLock<T> = std::sync::RwLock<T>;

/// Lock a mutex and return the guard.
#[cfg(feature = "fast-lock")]
pub fn lock<T>(mutex: &Mutex<T>) -> parking_lot::MutexGuard<'_, T> {
    mutex.lock()
}

/// Lock a mutex and return the guard, recovering from poisoning.
#[cfg(not(feature = "fast-lock"))]
pub fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Acquire a shared read guard.
#[cfg(feature = "fast-lock")]
pub fn read<T>(lock: &RwLock<T>) -> parking_lot::RwLockReadGuard<'_, T> {
    lock.read()
}

/// Acquire a shared read guard, recovering from poisoning.
#[cfg(not(feature = "fast-lock"))]
pub fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

/// Acquire an exclusive write guard.
#[cfg(feature = "fast-lock")]
pub fn write<T>(lock: &RwLock<T>) -> parking_lot::RwLockWriteGuard<'_, T> {
    lock.write()
}

/// Acquire an exclusive write guard, recovering from poisoning.
#[cfg(not(feature = "fast-lock"))]
pub fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_roundtrip() {
        let m = Mutex::new(41);
        *lock(&m) += 1;
        assert_eq!(*lock(&m), 42);
    }

    #[test]
    fn rwlock_roundtrip() {
        let l = RwLock::new(vec![1, 2]);
        write(&l).push(3);
        assert_eq!(read(&l).len(), 3);
    }
}
