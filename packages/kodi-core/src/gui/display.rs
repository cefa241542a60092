//! Display power, OS screensaver and window-state collaborators.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Display power management (DPMS).
pub trait DisplayPower: Send + Sync {
    fn is_supported(&self) -> bool;

    /// Turns the display off. Returns false if the display refused.
    fn enable_power_saving(&self) -> bool;

    /// Turns the display back on. Returns false if the display refused.
    fn disable_power_saving(&self) -> bool;
}

/// The host OS screensaver.
pub trait OsScreensaver: Send + Sync {
    /// Prevents the OS screensaver from starting.
    fn inhibit(&self);

    fn uninhibit(&self);
}

/// Top-level window state of the host windowing system.
pub trait WindowingSystem: Send + Sync {
    fn minimize(&self);

    /// Returns the new fullscreen state.
    fn toggle_fullscreen(&self) -> bool;
}

/// Display collaborators without real hardware.
///
/// Records every state change so callers can observe the application's
/// decisions.
pub struct HeadlessDisplay {
    dpms_supported: bool,
    power_saving: AtomicBool,
    inhibited: AtomicBool,
    inhibit_calls: AtomicU32,
    fullscreen: AtomicBool,
    minimized: AtomicU32,
}

impl HeadlessDisplay {
    pub fn new(dpms_supported: bool) -> Self {
        Self {
            dpms_supported,
            power_saving: AtomicBool::new(false),
            inhibited: AtomicBool::new(false),
            inhibit_calls: AtomicU32::new(0),
            fullscreen: AtomicBool::new(false),
            minimized: AtomicU32::new(0),
        }
    }

    pub fn is_power_saving(&self) -> bool {
        self.power_saving.load(Ordering::SeqCst)
    }

    pub fn is_inhibited(&self) -> bool {
        self.inhibited.load(Ordering::SeqCst)
    }

    /// Number of inhibit requests received.
    pub fn inhibit_calls(&self) -> u32 {
        self.inhibit_calls.load(Ordering::SeqCst)
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen.load(Ordering::SeqCst)
    }

    pub fn minimize_count(&self) -> u32 {
        self.minimized.load(Ordering::SeqCst)
    }
}

impl DisplayPower for HeadlessDisplay {
    fn is_supported(&self) -> bool {
        self.dpms_supported
    }

    fn enable_power_saving(&self) -> bool {
        if !self.dpms_supported {
            return false;
        }
        self.power_saving.store(true, Ordering::SeqCst);
        log::debug!("[Display] Power saving on");
        true
    }

    fn disable_power_saving(&self) -> bool {
        if !self.dpms_supported {
            return false;
        }
        self.power_saving.store(false, Ordering::SeqCst);
        log::debug!("[Display] Power saving off");
        true
    }
}

impl OsScreensaver for HeadlessDisplay {
    fn inhibit(&self) {
        self.inhibit_calls.fetch_add(1, Ordering::SeqCst);
        self.inhibited.store(true, Ordering::SeqCst);
    }

    fn uninhibit(&self) {
        self.inhibited.store(false, Ordering::SeqCst);
    }
}

impl WindowingSystem for HeadlessDisplay {
    fn minimize(&self) {
        self.minimized.fetch_add(1, Ordering::SeqCst);
    }

    fn toggle_fullscreen(&self) -> bool {
        !self.fullscreen.fetch_xor(true, Ordering::SeqCst)
    }
}
