//! The application context: everything one running core owns.
//!
//! There are no process-wide singletons. Two contexts in one process (as in
//! the integration tests) share nothing.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::application::{Application, ExitCode};
use crate::events::{Announcement, BroadcastEventBridge};
use crate::messaging::{ApplicationMessenger, MessageTarget, TargetKind};
use crate::services::ServiceManager;

/// Owns the messenger, the staged services and the application.
///
/// The messenger only keeps weak references to its receivers; the context
/// keeps them alive until [`shutdown`](Self::shutdown).
pub struct ApplicationContext {
    messenger: Arc<ApplicationMessenger>,
    services: ServiceManager,
    application: Arc<Application>,
    event_bridge: Arc<BroadcastEventBridge>,
    receivers: Vec<Arc<dyn MessageTarget>>,
    shut_down: bool,
}

impl ApplicationContext {
    pub(crate) fn new(
        messenger: Arc<ApplicationMessenger>,
        services: ServiceManager,
        application: Arc<Application>,
        event_bridge: Arc<BroadcastEventBridge>,
        receivers: Vec<Arc<dyn MessageTarget>>,
    ) -> Self {
        Self {
            messenger,
            services,
            application,
            event_bridge,
            receivers,
            shut_down: false,
        }
    }

    pub fn messenger(&self) -> &Arc<ApplicationMessenger> {
        &self.messenger
    }

    pub fn application(&self) -> &Arc<Application> {
        &self.application
    }

    pub fn services(&self) -> &ServiceManager {
        &self.services
    }

    /// Subscribes to every announcement.
    pub fn subscribe(&self) -> broadcast::Receiver<Announcement> {
        self.event_bridge.subscribe()
    }

    /// Runs the main loop on the calling thread, which becomes the owning
    /// thread of the messenger.
    pub fn run(&self, max_frames: Option<u64>) -> ExitCode {
        self.messenger.set_owning_thread();
        self.application.run(max_frames)
    }

    /// Tears everything down in reverse start order.
    ///
    /// The application releases playback and the skin, the messenger
    /// releases every waiter, then the services go down stage by stage.
    /// Safe to call more than once.
    pub fn shutdown(&mut self) -> ExitCode {
        let exit_code = self.application.exit_code();
        if self.shut_down {
            return exit_code;
        }
        self.shut_down = true;
        log::info!("[Context] Beginning shutdown...");

        self.application.cleanup();
        let released = self.messenger.cleanup();
        if released > 0 {
            log::debug!("[Context] {} message(s) released at shutdown", released);
        }

        self.application.detach_services();
        self.services.deinit_stage_one();

        for receiver in self.receivers.drain(..) {
            self.messenger.unregister_receiver(receiver.target());
        }
        self.messenger.unregister_receiver(TargetKind::Application);

        log::info!(
            "[Context] Shutdown complete, exit code {}",
            exit_code.code()
        );
        exit_code
    }
}

impl Drop for ApplicationContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}
