use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

/// Outcome of an ownership acquisition attempt.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Acquire {
    /// The calling thread now owns the context.
    Acquired,
    /// The calling thread already owned the context; nothing changed.
    AlreadyOwned,
    /// Another thread owns the context (non-blocking attempts only).
    Contended,
}

/// Arbitrates which thread currently owns the graphics context.
///
/// A mutex-protected owner slot plus a condition variable: blocking acquisition
/// waits for a release, non-blocking acquisition fails fast. Unlike a bare mutex
/// guard, ownership can be taken in one call (`begin_frame`) and given back in
/// another (`end_frame`), and only the owning thread can give it back.
///
/// The lock is not re-entrant.
#[derive(Debug, Default)]
pub struct ContextLock {
    owner: Mutex<Option<ThreadId>>,
    released: Condvar,
}

impl ContextLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until the calling thread owns the context.
    pub fn acquire(&self) -> Acquire {
        let me = thread::current().id();
        let mut owner = self.slot();
        loop {
            match *owner {
                None => {
                    *owner = Some(me);
                    return Acquire::Acquired;
                }
                Some(id) if id == me => return Acquire::AlreadyOwned,
                Some(_) => {
                    owner = self
                        .released
                        .wait(owner)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    /// Takes ownership only if nobody holds it; never waits.
    pub fn try_acquire(&self) -> Acquire {
        let me = thread::current().id();
        let mut owner = self.slot();
        match *owner {
            None => {
                *owner = Some(me);
                Acquire::Acquired
            }
            Some(id) if id == me => Acquire::AlreadyOwned,
            Some(_) => Acquire::Contended,
        }
    }

    /// Gives ownership back. Returns `false` if the calling thread is not the owner.
    pub fn release(&self) -> bool {
        let me = thread::current().id();
        let mut owner = self.slot();
        if *owner != Some(me) {
            return false;
        }
        *owner = None;
        drop(owner);
        self.released.notify_one();
        true
    }

    /// Whether the calling thread is the current owner.
    pub fn is_owned_by_current_thread(&self) -> bool {
        *self.slot() == Some(thread::current().id())
    }

    /// Whether any thread currently owns the context.
    pub fn is_held(&self) -> bool {
        self.slot().is_some()
    }

    fn slot(&self) -> MutexGuard<'_, Option<ThreadId>> {
        // The slot is a plain value; a panic while holding it cannot leave it torn.
        self.owner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc, Barrier};
    use std::time::Duration;

    // ── single thread ─────────────────────────────────────────────────────

    #[test]
    fn acquire_then_release() {
        let lock = ContextLock::new();
        assert!(!lock.is_held());
        assert_eq!(lock.try_acquire(), Acquire::Acquired);
        assert!(lock.is_owned_by_current_thread());
        assert!(lock.release());
        assert!(!lock.is_held());
    }

    #[test]
    fn reacquire_by_owner_is_reported_not_deadlocked() {
        let lock = ContextLock::new();
        assert_eq!(lock.acquire(), Acquire::Acquired);
        assert_eq!(lock.acquire(), Acquire::AlreadyOwned);
        assert_eq!(lock.try_acquire(), Acquire::AlreadyOwned);
        assert!(lock.release());
    }

    #[test]
    fn release_without_ownership_fails() {
        let lock = ContextLock::new();
        assert!(!lock.release());
    }

    // ── cross thread ──────────────────────────────────────────────────────

    #[test]
    fn release_from_non_owner_thread_fails() {
        let lock = Arc::new(ContextLock::new());
        assert_eq!(lock.acquire(), Acquire::Acquired);

        let other = Arc::clone(&lock);
        let released = thread::spawn(move || other.release()).join().unwrap();
        assert!(!released);
        assert!(lock.is_owned_by_current_thread());
        assert!(lock.release());
    }

    #[test]
    fn racing_non_blocking_acquire_has_exactly_one_winner() {
        const THREADS: usize = 8;
        let lock = Arc::new(ContextLock::new());
        let barrier = Arc::new(Barrier::new(THREADS));
        let winners = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let lock = Arc::clone(&lock);
                let barrier = Arc::clone(&barrier);
                let winners = Arc::clone(&winners);
                thread::spawn(move || {
                    barrier.wait();
                    if lock.try_acquire() == Acquire::Acquired {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                    // Hold until every thread has attempted.
                    barrier.wait();
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(winners.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn non_blocking_acquire_fails_while_other_thread_owns() {
        let lock = Arc::new(ContextLock::new());
        assert_eq!(lock.acquire(), Acquire::Acquired);

        let other = Arc::clone(&lock);
        let outcome = thread::spawn(move || other.try_acquire()).join().unwrap();
        assert_eq!(outcome, Acquire::Contended);
        assert!(lock.release());
    }

    #[test]
    fn blocking_acquire_waits_for_release() {
        let lock = Arc::new(ContextLock::new());
        assert_eq!(lock.acquire(), Acquire::Acquired);

        let (tx, rx) = mpsc::channel();
        let other = Arc::clone(&lock);
        let waiter = thread::spawn(move || {
            let outcome = other.acquire();
            tx.send(outcome).unwrap();
            assert!(other.release());
        });

        // Still held here, so the waiter cannot have finished.
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        assert!(lock.release());
        assert_eq!(rx.recv().unwrap(), Acquire::Acquired);
        waiter.join().unwrap();
        assert!(!lock.is_held());
    }
}
