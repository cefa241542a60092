//! Peripheral devices. Only HDMI-CEC adapters matter to the application core.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

#[derive(Debug, Default)]
struct CecState {
    device_on: bool,
    active_source: bool,
}

/// A CEC adapter controlling the connected TV.
#[derive(Debug)]
pub struct CecAdapter {
    name: String,
    state: Mutex<CecState>,
}

impl CecAdapter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(CecState {
                device_on: true,
                active_source: false,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Toggles the TV between on and standby. Returns the new state.
    pub fn toggle_device_state(&self) -> bool {
        let mut state = self.state.lock();
        state.device_on = !state.device_on;
        if !state.device_on {
            state.active_source = false;
        }
        log::info!(
            "[CEC] {} turned {}",
            self.name,
            if state.device_on { "on" } else { "off" }
        );
        state.device_on
    }

    /// Turns the TV on and switches its input to this device.
    pub fn activate_source(&self) {
        let mut state = self.state.lock();
        state.device_on = true;
        state.active_source = true;
        log::info!("[CEC] {} is the active source", self.name);
    }

    pub fn standby(&self) {
        let mut state = self.state.lock();
        state.device_on = false;
        state.active_source = false;
        log::info!("[CEC] {} put devices in standby", self.name);
    }

    pub fn is_device_on(&self) -> bool {
        self.state.lock().device_on
    }

    pub fn is_active_source(&self) -> bool {
        self.state.lock().active_source
    }
}

/// Registry of attached peripherals.
#[derive(Default)]
pub struct Peripherals {
    cec: RwLock<Option<Arc<CecAdapter>>>,
}

impl Peripherals {
    /// Creates the registry, optionally with an emulated CEC adapter.
    pub fn new(emulate_cec: bool) -> Self {
        let peripherals = Self::default();
        if emulate_cec {
            peripherals.attach_cec(Arc::new(CecAdapter::new("emulated")));
        }
        peripherals
    }

    pub fn attach_cec(&self, adapter: Arc<CecAdapter>) {
        log::info!("[Peripherals] CEC adapter {} attached", adapter.name());
        *self.cec.write() = Some(adapter);
    }

    pub fn detach_all(&self) {
        if self.cec.write().take().is_some() {
            log::info!("[Peripherals] CEC adapter detached");
        }
    }

    pub fn cec(&self) -> Option<Arc<CecAdapter>> {
        self.cec.read().clone()
    }

    pub fn has_cec(&self) -> bool {
        self.cec.read().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emulated_adapter_toggles() {
        let peripherals = Peripherals::new(true);
        let cec = peripherals.cec().unwrap();
        cec.activate_source();
        assert!(cec.is_active_source());
        assert!(!cec.toggle_device_state());
        assert!(!cec.is_active_source());
        assert!(cec.toggle_device_state());
    }

    #[test]
    fn no_adapter_by_default() {
        let peripherals = Peripherals::new(false);
        assert!(!peripherals.has_cec());
        peripherals.attach_cec(Arc::new(CecAdapter::new("usb")));
        peripherals.detach_all();
        assert!(peripherals.cec().is_none());
    }
}
