//! One-shot completion shared between a blocking sender and the dispatcher.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::constants::MESSAGE_RESULT_UNSET;

struct Inner {
    signaled: Mutex<bool>,
    cond: Condvar,
    result: AtomicI32,
}

/// Manual-reset event plus an integer result slot.
///
/// Cloning shares the same event. Once signalled it stays signalled.
#[derive(Clone)]
pub struct Completion {
    inner: Arc<Inner>,
}

impl Completion {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                signaled: Mutex::new(false),
                cond: Condvar::new(),
                result: AtomicI32::new(MESSAGE_RESULT_UNSET),
            }),
        }
    }

    /// Wakes every waiter. Later calls are no-ops.
    pub fn signal(&self) {
        let mut signaled = self.inner.signaled.lock();
        if !*signaled {
            *signaled = true;
            self.inner.cond.notify_all();
        }
    }

    pub fn is_signaled(&self) -> bool {
        *self.inner.signaled.lock()
    }

    /// Blocks until signalled.
    pub fn wait(&self) {
        let mut signaled = self.inner.signaled.lock();
        while !*signaled {
            self.inner.cond.wait(&mut signaled);
        }
    }

    /// Blocks until signalled or the timeout elapses. Returns true if signalled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut signaled = self.inner.signaled.lock();
        if *signaled {
            return true;
        }
        let deadline = std::time::Instant::now() + timeout;
        while !*signaled {
            if self.inner.cond.wait_until(&mut signaled, deadline).timed_out() {
                return *signaled;
            }
        }
        true
    }

    pub fn set_result(&self, result: i32) {
        self.inner.result.store(result, Ordering::SeqCst);
    }

    pub fn result(&self) -> i32 {
        self.inner.result.load(Ordering::SeqCst)
    }
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("signaled", &self.is_signaled())
            .field("result", &self.result())
            .finish()
    }
}

/// Signals a completion when dropped.
///
/// Held across dispatch so the sender is released even if the handler unwinds.
pub(crate) struct SignalOnDrop(Option<Completion>);

impl SignalOnDrop {
    pub(crate) fn new(completion: Option<Completion>) -> Self {
        Self(completion)
    }
}

impl Drop for SignalOnDrop {
    fn drop(&mut self) {
        if let Some(completion) = self.0.take() {
            completion.signal();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn result_defaults_to_unset() {
        let completion = Completion::new();
        assert_eq!(completion.result(), -1);
        assert!(!completion.is_signaled());
    }

    #[test]
    fn waiter_sees_result_after_signal() {
        let completion = Completion::new();
        let remote = completion.clone();

        let handle = thread::spawn(move || {
            remote.wait();
            remote.result()
        });

        completion.set_result(42);
        completion.signal();
        assert_eq!(handle.join().unwrap(), 42);
    }

    #[test]
    fn wait_timeout_expires_when_unsignaled() {
        let completion = Completion::new();
        assert!(!completion.wait_timeout(Duration::from_millis(10)));
        completion.signal();
        assert!(completion.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn guard_signals_on_unwind() {
        let completion = Completion::new();
        let guarded = completion.clone();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = SignalOnDrop::new(Some(guarded));
            panic!("handler failed");
        }));

        assert!(outcome.is_err());
        assert!(completion.is_signaled());
    }
}
