//! Event emitter abstraction for decoupling subsystems from delivery.
//!
//! Subsystems depend on the [`EventEmitter`] trait rather than concrete broadcast
//! channels, enabling testing and alternative delivery implementations.

use super::{ApplicationEvent, GuiEvent, LifecycleEvent, PlayerEvent, SystemEvent};

/// Trait for announcing state changes without knowledge of delivery.
///
/// # Example
///
/// ```ignore
/// struct MyService {
///     emitter: Arc<dyn EventEmitter>,
/// }
///
/// impl MyService {
///     fn quit(&self) {
///         self.emitter.emit_system(SystemEvent::OnQuit { exit_code: 0 });
///     }
/// }
/// ```
pub trait EventEmitter: Send + Sync {
    /// Emits a playback state event.
    fn emit_player(&self, event: PlayerEvent);

    /// Emits a screensaver or display power event.
    fn emit_gui(&self, event: GuiEvent);

    /// Emits a process-level event.
    fn emit_system(&self, event: SystemEvent);

    /// Emits an application settings event.
    fn emit_application(&self, event: ApplicationEvent);

    /// Emits a service stage transition.
    fn emit_lifecycle(&self, event: LifecycleEvent);
}

/// No-op emitter for tests and embedders without subscribers.
pub struct NoopEventEmitter;

impl EventEmitter for NoopEventEmitter {
    fn emit_player(&self, _event: PlayerEvent) {}

    fn emit_gui(&self, _event: GuiEvent) {}

    fn emit_system(&self, _event: SystemEvent) {}

    fn emit_application(&self, _event: ApplicationEvent) {}

    fn emit_lifecycle(&self, _event: LifecycleEvent) {}
}

/// Logging emitter for debugging and development.
///
/// Logs all events at debug level.
pub struct LoggingEventEmitter;

impl EventEmitter for LoggingEventEmitter {
    fn emit_player(&self, event: PlayerEvent) {
        tracing::debug!(?event, "player_event");
    }

    fn emit_gui(&self, event: GuiEvent) {
        tracing::debug!(?event, "gui_event");
    }

    fn emit_system(&self, event: SystemEvent) {
        tracing::info!(?event, "system_event");
    }

    fn emit_application(&self, event: ApplicationEvent) {
        tracing::debug!(?event, "application_event");
    }

    fn emit_lifecycle(&self, event: LifecycleEvent) {
        tracing::debug!(?event, "lifecycle_event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingEventEmitter {
        gui_count: AtomicUsize,
        system_count: AtomicUsize,
    }

    impl EventEmitter for CountingEventEmitter {
        fn emit_player(&self, _event: PlayerEvent) {}

        fn emit_gui(&self, _event: GuiEvent) {
            self.gui_count.fetch_add(1, Ordering::SeqCst);
        }

        fn emit_system(&self, _event: SystemEvent) {
            self.system_count.fetch_add(1, Ordering::SeqCst);
        }

        fn emit_application(&self, _event: ApplicationEvent) {}
        fn emit_lifecycle(&self, _event: LifecycleEvent) {}
    }

    #[test]
    fn counting_emitter_tracks_events() {
        let emitter = Arc::new(CountingEventEmitter {
            gui_count: AtomicUsize::new(0),
            system_count: AtomicUsize::new(0),
        });

        emitter.emit_gui(GuiEvent::OnScreensaverActivated);
        emitter.emit_gui(GuiEvent::OnScreensaverDeactivated {
            shutting_down: false,
        });
        emitter.emit_system(SystemEvent::OnQuit { exit_code: 0 });

        assert_eq!(emitter.gui_count.load(Ordering::SeqCst), 2);
        assert_eq!(emitter.system_count.load(Ordering::SeqCst), 1);
    }
}
