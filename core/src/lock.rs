use parking_lot::lock_api;
use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct LockState {
    readers: usize,
    writer: bool,
}

/// Admission monitor behind [`ReadWriteLock`].
///
/// Readers are admitted whenever no writer currently holds the lock; a writer
/// waits for zero readers and zero writers. There is no writer preference, so a
/// steady stream of readers can starve a writer. Every release wakes all
/// waiters.
///
/// The lock is not reentrant: acquiring the write side while the same thread
/// holds a read guard deadlocks.
pub struct RawReadWriteLock {
    state: Mutex<LockState>,
    changed: Condvar,
}

// SAFETY: shared access is only granted while `!writer`, exclusive access only
// while `!writer && readers == 0`, and both checks happen under `state`.
unsafe impl lock_api::RawRwLock for RawReadWriteLock {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = Self { state: parking_lot::const_mutex(LockState { readers: 0, writer: false }), changed: Condvar::new() };

    type GuardMarker = lock_api::GuardSend;

    fn lock_shared(&self) {
        let mut state = self.state.lock();
        while state.writer {
            self.changed.wait(&mut state);
        }
        state.readers += 1;
    }

    fn try_lock_shared(&self) -> bool {
        let mut state = self.state.lock();
        if state.writer {
            return false;
        }
        state.readers += 1;
        true
    }

    unsafe fn unlock_shared(&self) {
        let mut state = self.state.lock();
        state.readers -= 1;
        self.changed.notify_all();
    }

    fn lock_exclusive(&self) {
        let mut state = self.state.lock();
        while state.readers > 0 || state.writer {
            self.changed.wait(&mut state);
        }
        state.writer = true;
    }

    fn try_lock_exclusive(&self) -> bool {
        let mut state = self.state.lock();
        if state.readers > 0 || state.writer {
            return false;
        }
        state.writer = true;
        true
    }

    unsafe fn unlock_exclusive(&self) {
        let mut state = self.state.lock();
        state.writer = false;
        self.changed.notify_all();
    }

    fn is_locked(&self) -> bool {
        let state = self.state.lock();
        state.readers > 0 || state.writer
    }

    fn is_locked_exclusive(&self) -> bool {
        self.state.lock().writer
    }
}

/// Shared/exclusive lock that owns the value it protects, admitting callers by
/// the rules of [`RawReadWriteLock`].
pub type ReadWriteLock<T> = lock_api::RwLock<RawReadWriteLock, T>;
pub type ReadGuard<'a, T> = lock_api::RwLockReadGuard<'a, RawReadWriteLock, T>;
pub type WriteGuard<'a, T> = lock_api::RwLockWriteGuard<'a, RawReadWriteLock, T>;
