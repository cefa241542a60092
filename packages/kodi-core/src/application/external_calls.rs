//! Cooperative access to GUI state from threads other than the owning one.
//!
//! The owning loop holds the frame lock while it moves a frame. Script and
//! add-on threads that need GUI state go through
//! [`FrameMoveGuard::external_call`]. Once per frame the owning loop opens a
//! short window in which waiting callers get the lock. The window grows with
//! the number of recently served calls and closes early once nobody waits.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, ReentrantMutex, ReentrantMutexGuard};

use crate::constants::{
    EXTERNAL_CALL_DECAY_FRAMES, EXTERNAL_CALL_MAX_WINDOW_IDLE_MS,
    EXTERNAL_CALL_MAX_WINDOW_VIDEO_MS, EXTERNAL_CALL_MIN_WINDOW_MS,
};

pub struct FrameMoveGuard {
    frame: ReentrantMutex<()>,
    waiting: AtomicU32,
    processed: AtomicU32,
    decay: AtomicU32,
    idle: Mutex<()>,
    idle_changed: Condvar,
}

/// Decrements the waiting counter even if the external call panics.
struct WaitingTicket<'a>(&'a FrameMoveGuard);

impl Drop for WaitingTicket<'_> {
    fn drop(&mut self) {
        let _idle = self.0.idle.lock();
        self.0.waiting.fetch_sub(1, Ordering::SeqCst);
        self.0.idle_changed.notify_all();
    }
}

impl FrameMoveGuard {
    pub fn new() -> Self {
        Self {
            frame: ReentrantMutex::new(()),
            waiting: AtomicU32::new(0),
            processed: AtomicU32::new(0),
            decay: AtomicU32::new(0),
            idle: Mutex::new(()),
            idle_changed: Condvar::new(),
        }
    }

    /// Takes the frame lock. Reentrant, so the owning thread may call into
    /// code that uses [`external_call`](Self::external_call) while holding it.
    pub fn lock(&self) -> ReentrantMutexGuard<'_, ()> {
        self.frame.lock()
    }

    /// Runs `f` while holding the frame lock.
    ///
    /// Blocks until the owning loop opens its window (or is between frames).
    pub fn external_call<T>(&self, f: impl FnOnce() -> T) -> T {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        let _ticket = WaitingTicket(self);
        let _frame = self.frame.lock();
        self.processed.fetch_add(1, Ordering::SeqCst);
        f()
    }

    pub fn waiting_calls(&self) -> u32 {
        self.waiting.load(Ordering::SeqCst)
    }

    pub fn processed_calls(&self) -> u32 {
        self.processed.load(Ordering::SeqCst)
    }

    /// Length of the next window.
    ///
    /// Every four recently processed calls add a millisecond, bounded by the
    /// minimum and a maximum that is tighter while video renders.
    pub fn window(&self, video_rendering: bool) -> Duration {
        let max = if video_rendering {
            EXTERNAL_CALL_MAX_WINDOW_VIDEO_MS
        } else {
            EXTERNAL_CALL_MAX_WINDOW_IDLE_MS
        };
        let ms = u64::from(self.processed_calls() >> 2).clamp(EXTERNAL_CALL_MIN_WINDOW_MS, max);
        Duration::from_millis(ms)
    }

    /// Per-frame yield point of the owning loop.
    ///
    /// `guard` must be the owning thread's frame lock. Returns the window that
    /// was opened, if any caller was waiting.
    pub fn yield_window(
        &self,
        guard: &mut ReentrantMutexGuard<'_, ()>,
        video_rendering: bool,
    ) -> Option<Duration> {
        if self.decay.load(Ordering::SeqCst) > 0 && self.decay.fetch_sub(1, Ordering::SeqCst) == 1
        {
            self.processed.store(0, Ordering::SeqCst);
        }

        if self.waiting_calls() == 0 {
            return None;
        }

        let window = self.window(video_rendering);
        ReentrantMutexGuard::unlocked_fair(guard, || self.wait_until_idle(window));
        self.decay
            .store(EXTERNAL_CALL_DECAY_FRAMES, Ordering::SeqCst);
        Some(window)
    }

    fn wait_until_idle(&self, window: Duration) {
        let deadline = Instant::now() + window;
        let mut idle = self.idle.lock();
        while self.waiting.load(Ordering::SeqCst) > 0 {
            if self.idle_changed.wait_until(&mut idle, deadline).timed_out() {
                break;
            }
        }
    }
}

impl Default for FrameMoveGuard {
    fn default() -> Self {
        Self::new()
    }
}
