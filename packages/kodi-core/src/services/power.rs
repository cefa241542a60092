//! System power transitions.

use std::sync::Arc;

use parking_lot::Mutex;

/// A system power transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Powerdown,
    Suspend,
    Hibernate,
    Reboot,
}

/// Platform power API.
pub trait PowerBackend: Send + Sync {
    fn can_perform(&self, action: PowerAction) -> bool;

    /// Starts the transition. Returns false if the platform refused.
    fn perform(&self, action: PowerAction) -> bool;
}

/// Backend that records requests instead of touching the machine.
///
/// Powerdown and reboot are only offered in standalone mode, where the
/// application owns the machine.
pub struct LoggingPowerBackend {
    standalone: bool,
    requests: Mutex<Vec<PowerAction>>,
}

impl LoggingPowerBackend {
    pub fn new(standalone: bool) -> Self {
        Self {
            standalone,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<PowerAction> {
        self.requests.lock().clone()
    }
}

impl PowerBackend for LoggingPowerBackend {
    fn can_perform(&self, action: PowerAction) -> bool {
        match action {
            PowerAction::Powerdown | PowerAction::Reboot => self.standalone,
            PowerAction::Suspend | PowerAction::Hibernate => true,
        }
    }

    fn perform(&self, action: PowerAction) -> bool {
        log::info!("[Power] {:?} requested", action);
        self.requests.lock().push(action);
        true
    }
}

/// Capability checks and power transitions.
pub struct PowerManager {
    backend: Arc<dyn PowerBackend>,
}

impl PowerManager {
    pub fn new(backend: Arc<dyn PowerBackend>) -> Self {
        Self { backend }
    }

    pub fn can_powerdown(&self) -> bool {
        self.backend.can_perform(PowerAction::Powerdown)
    }

    pub fn can_suspend(&self) -> bool {
        self.backend.can_perform(PowerAction::Suspend)
    }

    pub fn can_hibernate(&self) -> bool {
        self.backend.can_perform(PowerAction::Hibernate)
    }

    pub fn can_reboot(&self) -> bool {
        self.backend.can_perform(PowerAction::Reboot)
    }

    pub fn powerdown(&self) -> bool {
        self.request(PowerAction::Powerdown)
    }

    pub fn suspend(&self) -> bool {
        self.request(PowerAction::Suspend)
    }

    pub fn hibernate(&self) -> bool {
        self.request(PowerAction::Hibernate)
    }

    pub fn reboot(&self) -> bool {
        self.request(PowerAction::Reboot)
    }

    fn request(&self, action: PowerAction) -> bool {
        if !self.backend.can_perform(action) {
            log::debug!("[Power] {:?} not supported", action);
            return false;
        }
        self.backend.perform(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_standalone_refuses_powerdown() {
        let backend = Arc::new(LoggingPowerBackend::new(false));
        let power = PowerManager::new(backend.clone());

        assert!(!power.powerdown());
        assert!(power.suspend());
        assert_eq!(backend.requests(), vec![PowerAction::Suspend]);
    }

    #[test]
    fn standalone_allows_everything() {
        let backend = Arc::new(LoggingPowerBackend::new(true));
        let power = PowerManager::new(backend.clone());
        assert!(power.can_reboot());
        assert!(power.powerdown());
        assert!(power.reboot());
        assert_eq!(
            backend.requests(),
            vec![PowerAction::Powerdown, PowerAction::Reboot]
        );
    }
}
