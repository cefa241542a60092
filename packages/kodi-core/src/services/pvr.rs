//! PVR (live TV) manager.
//!
//! Only the parts the application consults are modelled: whether the backend
//! is started, channel scans, active recordings and upcoming timers. These
//! feed the advisory power-down veto.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Upcoming timers closer than this block a power-down.
const POWERDOWN_TIMER_MARGIN: Duration = Duration::from_secs(5 * 60);

#[derive(Default)]
pub struct PvrManager {
    started: AtomicBool,
    scanning: AtomicBool,
    recordings: AtomicUsize,
    next_timer: Mutex<Option<Instant>>,
}

impl PvrManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) {
        if !self.started.swap(true, Ordering::SeqCst) {
            log::info!("[PVR] Started");
        }
    }

    /// Stops the manager, aborting any channel scan.
    pub fn stop(&self) {
        if self.started.swap(false, Ordering::SeqCst) {
            self.scanning.store(false, Ordering::SeqCst);
            log::info!("[PVR] Stopped");
        }
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Starts a channel scan. Returns false if one is already running.
    pub fn start_channel_scan(&self) -> bool {
        let started = !self.scanning.swap(true, Ordering::SeqCst);
        if started {
            log::info!("[PVR] Channel scan started");
        }
        started
    }

    pub fn finish_channel_scan(&self) {
        if self.scanning.swap(false, Ordering::SeqCst) {
            log::info!("[PVR] Channel scan finished");
        }
    }

    pub fn is_channel_scan_running(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    pub fn recording_started(&self) {
        self.recordings.fetch_add(1, Ordering::SeqCst);
    }

    pub fn recording_finished(&self) {
        let _ = self
            .recordings
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    pub fn is_recording(&self) -> bool {
        self.recordings.load(Ordering::SeqCst) > 0
    }

    pub fn set_next_timer(&self, at: Option<Instant>) {
        *self.next_timer.lock() = at;
    }

    /// Advisory veto for power transitions.
    ///
    /// False while a channel scan or recording runs, or a timer starts soon.
    pub fn can_system_powerdown(&self) -> bool {
        if self.is_channel_scan_running() {
            log::debug!("[PVR] Power-down vetoed: channel scan running");
            return false;
        }
        if self.is_recording() {
            log::debug!("[PVR] Power-down vetoed: recording in progress");
            return false;
        }
        if let Some(at) = *self.next_timer.lock() {
            if at.saturating_duration_since(Instant::now()) < POWERDOWN_TIMER_MARGIN {
                log::debug!("[PVR] Power-down vetoed: timer due");
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_and_recordings_veto_powerdown() {
        let pvr = PvrManager::new();
        pvr.start();
        assert!(pvr.can_system_powerdown());

        assert!(pvr.start_channel_scan());
        assert!(!pvr.start_channel_scan());
        assert!(!pvr.can_system_powerdown());
        pvr.finish_channel_scan();

        pvr.recording_started();
        assert!(!pvr.can_system_powerdown());
        pvr.recording_finished();
        pvr.recording_finished();
        assert!(pvr.can_system_powerdown());
    }

    #[test]
    fn near_timer_vetoes_powerdown() {
        let pvr = PvrManager::new();
        pvr.set_next_timer(Some(Instant::now() + Duration::from_secs(60)));
        assert!(!pvr.can_system_powerdown());
        pvr.set_next_timer(Some(Instant::now() + Duration::from_secs(3600)));
        assert!(pvr.can_system_powerdown());
    }

    #[test]
    fn stop_aborts_scan() {
        let pvr = PvrManager::new();
        pvr.start();
        pvr.start_channel_scan();
        pvr.stop();
        assert!(!pvr.is_channel_scan_running());
    }
}
