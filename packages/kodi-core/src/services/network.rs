//! Network identity and network-service state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Errors that can occur during network operations.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// Could not detect local IP address.
    #[error("Failed to detect local IP: {0}")]
    Detection(String),

    /// Could not read the machine hostname.
    #[error("Failed to read hostname: {0}")]
    Hostname(String),
}

/// Trait for detecting the local IP address.
///
/// Abstracted so tests and embedders can supply a fixed address.
pub trait IpDetector: Send + Sync {
    fn detect(&self) -> Result<String, NetworkError>;
}

/// Default IP detector using the system's network interfaces.
#[derive(Debug, Clone, Default)]
pub struct LocalIpDetector;

impl LocalIpDetector {
    #[must_use]
    pub fn arc() -> Arc<dyn IpDetector> {
        Arc::new(Self)
    }
}

impl IpDetector for LocalIpDetector {
    fn detect(&self) -> Result<String, NetworkError> {
        local_ip_address::local_ip()
            .map(|ip| ip.to_string())
            .map_err(|e| NetworkError::Detection(e.to_string()))
    }
}

/// Requests carried by `NetworkMessage` commands in `param1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkMessage {
    ServicesUp = 1,
    ServicesDown = 2,
    ServicesRestart = 3,
}

impl NetworkMessage {
    pub fn from_param(param: i32) -> Option<Self> {
        match param {
            1 => Some(Self::ServicesUp),
            2 => Some(Self::ServicesDown),
            3 => Some(Self::ServicesRestart),
            _ => None,
        }
    }
}

/// Network identity of this instance and the running state of its network
/// services.
pub struct NetworkService {
    ip_detector: Arc<dyn IpDetector>,
    local_ip: RwLock<Option<String>>,
    running: AtomicBool,
}

impl NetworkService {
    pub fn new(ip_detector: Arc<dyn IpDetector>) -> Self {
        Self {
            ip_detector,
            local_ip: RwLock::new(None),
            running: AtomicBool::new(false),
        }
    }

    /// Detects the local address and marks network services as running.
    ///
    /// Returns false if no usable address was found.
    pub fn start_services(&self) -> bool {
        match self.ip_detector.detect() {
            Ok(ip) => {
                log::info!("[Network] Services up on {}", ip);
                *self.local_ip.write() = Some(ip);
                self.running.store(true, Ordering::SeqCst);
                true
            }
            Err(e) => {
                log::warn!("[Network] Not starting services: {}", e);
                false
            }
        }
    }

    pub fn stop_services(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            log::info!("[Network] Services down");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn handle_message(&self, message: NetworkMessage) {
        match message {
            NetworkMessage::ServicesUp => {
                self.start_services();
            }
            NetworkMessage::ServicesDown => self.stop_services(),
            NetworkMessage::ServicesRestart => {
                self.stop_services();
                self.start_services();
            }
        }
    }

    /// Last detected local address.
    pub fn local_ip(&self) -> Option<String> {
        self.local_ip.read().clone()
    }

    pub fn hostname(&self) -> Result<String, NetworkError> {
        hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .map_err(|e| NetworkError::Hostname(e.to_string()))
    }

    /// Hostname sanitized for DNS (lowercase, no spaces).
    pub fn dns_hostname(&self) -> String {
        self.hostname()
            .unwrap_or_else(|_| "kodi".to_string())
            .to_lowercase()
            .replace(' ', "-")
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockIpDetector {
        ip: Option<String>,
    }

    impl IpDetector for MockIpDetector {
        fn detect(&self) -> Result<String, NetworkError> {
            self.ip
                .clone()
                .ok_or_else(|| NetworkError::Detection("no interface".to_string()))
        }
    }

    #[test]
    fn start_records_detected_address() {
        let service = NetworkService::new(Arc::new(MockIpDetector {
            ip: Some("10.0.0.5".to_string()),
        }));
        assert!(service.start_services());
        assert!(service.is_running());
        assert_eq!(service.local_ip().as_deref(), Some("10.0.0.5"));

        service.handle_message(NetworkMessage::ServicesDown);
        assert!(!service.is_running());
    }

    #[test]
    fn detection_failure_keeps_services_down() {
        let service = NetworkService::new(Arc::new(MockIpDetector { ip: None }));
        service.handle_message(NetworkMessage::ServicesRestart);
        assert!(!service.is_running());
        assert_eq!(NetworkMessage::from_param(9), None);
    }
}
