//! One-shot rendezvous point for a fixed number of threads.
//!
//! Works like `std::sync::Barrier` with two additions the pipeline needs:
//!
//! - **Release action**: the last thread to arrive runs a closure before any
//!   waiting thread is let go, so state can be handed over between phases
//!   without the peers racing to observe it.
//! - **Abort**: a rendezvous can be cancelled. Every waiter (present and
//!   future) returns [`Aborted`] instead of blocking forever when a peer
//!   failed to spawn or panicked.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Returned by [`Rendezvous::wait`] when the rendezvous was aborted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aborted;

#[derive(Debug, Default)]
struct State {
    arrived: usize,
    released: bool,
    aborted: bool,
}

/// A barrier crossed exactly once by `parties` threads
#[derive(Debug)]
pub struct Rendezvous {
    name: &'static str,
    parties: usize,
    state: Mutex<State>,
    cvar: Condvar,
}

impl Rendezvous {
    pub fn new(name: &'static str, parties: usize) -> Self {
        Self {
            name,
            parties,
            state: Mutex::new(State::default()),
            cvar: Condvar::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until all parties have arrived
    pub fn wait(&self) -> Result<(), Aborted> {
        self.wait_then(|| {})
    }

    /// Block until all parties have arrived.
    ///
    /// The last party to arrive runs `on_release` before anyone is released.
    /// Every caller should pass an equivalent action; only one of them runs.
    pub fn wait_then(&self, on_release: impl FnOnce()) -> Result<(), Aborted> {
        let mut state = self.lock();

        if state.aborted {
            return Err(Aborted);
        }
        if state.released {
            return Ok(());
        }

        state.arrived += 1;
        if state.arrived >= self.parties {
            on_release();
            state.released = true;
            self.cvar.notify_all();
            return Ok(());
        }

        while !state.released && !state.aborted {
            state = self.cvar.wait(state).unwrap_or_else(PoisonError::into_inner);
        }

        if state.released { Ok(()) } else { Err(Aborted) }
    }

    /// Wake every waiter with [`Aborted`]. No-op once released.
    pub fn abort(&self) {
        let mut state = self.lock();
        if !state.released {
            state.aborted = true;
            self.cvar.notify_all();
        }
    }

    pub fn is_released(&self) -> bool {
        self.lock().released
    }

    pub fn is_aborted(&self) -> bool {
        self.lock().aborted
    }
}

/// Aborts a set of rendezvous points if the owning thread unwinds
pub struct AbortOnPanic<'a, const N: usize> {
    points: [&'a Rendezvous; N],
}

impl<'a, const N: usize> AbortOnPanic<'a, N> {
    pub fn new(points: [&'a Rendezvous; N]) -> Self {
        Self { points }
    }
}

impl<const N: usize> Drop for AbortOnPanic<'_, N> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            for point in self.points {
                point.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_all_parties_released() {
        let point = Rendezvous::new("test", 4);
        let passed = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    point.wait().unwrap();
                    passed.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        assert_eq!(passed.load(Ordering::SeqCst), 4);
        assert!(point.is_released());
    }

    #[test]
    fn test_nobody_passes_early() {
        let point = Rendezvous::new("test", 3);
        let arrived = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..3 {
                s.spawn(|| {
                    arrived.fetch_add(1, Ordering::SeqCst);
                    point.wait().unwrap();
                    // Everyone must have arrived before anyone is released
                    assert_eq!(arrived.load(Ordering::SeqCst), 3);
                });
                thread::sleep(Duration::from_millis(5));
            }
        });
    }

    #[test]
    fn test_release_action_runs_once_before_release() {
        let point = Rendezvous::new("test", 5);
        let actions = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..5 {
                s.spawn(|| {
                    point
                        .wait_then(|| {
                            actions.fetch_add(1, Ordering::SeqCst);
                        })
                        .unwrap();
                    assert_eq!(actions.load(Ordering::SeqCst), 1);
                });
            }
        });

        assert_eq!(actions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_single_party() {
        let point = Rendezvous::new("test", 1);
        assert!(point.wait().is_ok());
        // One-shot: later arrivals pass straight through
        assert!(point.wait().is_ok());
    }

    #[test]
    fn test_abort_wakes_waiters() {
        let point = Rendezvous::new("test", 3);

        thread::scope(|s| {
            let a = s.spawn(|| point.wait());
            let b = s.spawn(|| point.wait());
            thread::sleep(Duration::from_millis(20));
            point.abort();
            assert_eq!(a.join().unwrap(), Err(Aborted));
            assert_eq!(b.join().unwrap(), Err(Aborted));
        });

        // Late arrivals fail fast
        assert_eq!(point.wait(), Err(Aborted));
        assert!(point.is_aborted());
    }

    #[test]
    fn test_abort_after_release_is_noop() {
        let point = Rendezvous::new("test", 1);
        point.wait().unwrap();
        point.abort();
        assert!(!point.is_aborted());
        assert!(point.is_released());
    }

    #[test]
    fn test_panic_guard_aborts() {
        let phase = Rendezvous::new("phase", 2);
        let completion = Rendezvous::new("completion", 2);

        thread::scope(|s| {
            let waiter = s.spawn(|| phase.wait());
            let panicker = s.spawn(|| {
                let _guard = AbortOnPanic::new([&phase, &completion]);
                panic!("worker failed");
            });
            assert!(panicker.join().is_err());
            assert_eq!(waiter.join().unwrap(), Err(Aborted));
        });

        assert!(completion.is_aborted());
    }

    #[test]
    fn test_guard_quiet_without_panic() {
        let phase = Rendezvous::new("phase", 2);
        {
            let _guard = AbortOnPanic::new([&phase]);
        }
        assert!(!phase.is_aborted());
    }
}
