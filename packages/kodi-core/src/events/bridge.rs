//! Bridge implementation that maps announcements to a broadcast channel.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use super::emitter::EventEmitter;
use super::{
    Announcement, ApplicationEvent, GuiEvent, LifecycleEvent, PlayerEvent, SystemEvent,
};

/// Fans announcements out to any number of subscribers.
///
/// Implements [`EventEmitter`] by forwarding events to a
/// `tokio::sync::broadcast` channel. Hosts that need their own delivery path
/// (JSON-RPC, a UI toolkit) can additionally set an external emitter after
/// construction.
///
/// # Thread Safety
///
/// The bridge is `Send + Sync`; sending never blocks the caller, so it is safe
/// to emit from the owning thread inside message handlers.
#[derive(Clone)]
pub struct BroadcastEventBridge {
    tx: broadcast::Sender<Announcement>,
    external_emitter: Arc<RwLock<Option<Arc<dyn EventEmitter>>>>,
}

impl BroadcastEventBridge {
    /// Creates a new bridge with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            external_emitter: Arc::new(RwLock::new(None)),
        }
    }

    /// Sets an external emitter that receives every announcement as well.
    pub fn set_external_emitter(&self, emitter: Arc<dyn EventEmitter>) {
        *self.external_emitter.write() = Some(emitter);
    }

    /// Returns a new receiver for the broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<Announcement> {
        self.tx.subscribe()
    }

    /// Returns the number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Generates an [`EventEmitter`] method that forwards to the external emitter
/// (if set) and then sends to the broadcast channel.
macro_rules! impl_emit {
    ($method:ident, $event_ty:ty, $variant:ident) => {
        fn $method(&self, event: $event_ty) {
            if let Some(ref emitter) = *self.external_emitter.read() {
                emitter.$method(event.clone());
            }
            if let Err(e) = self.tx.send(Announcement::$variant(event)) {
                log::trace!("[EventBridge] No announcement receivers: {}", e);
            }
        }
    };
}

impl EventEmitter for BroadcastEventBridge {
    impl_emit!(emit_player, PlayerEvent, Player);
    impl_emit!(emit_gui, GuiEvent, Gui);
    impl_emit!(emit_system, SystemEvent, System);
    impl_emit!(emit_application, ApplicationEvent, Application);
    impl_emit!(emit_lifecycle, LifecycleEvent, Lifecycle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoopEventEmitter;

    #[test]
    fn subscribers_receive_announcements_in_order() {
        let bridge = BroadcastEventBridge::new(8);
        let mut rx = bridge.subscribe();

        bridge.emit_lifecycle(LifecycleEvent::StageInitialized { stage: 1 });
        bridge.emit_system(SystemEvent::OnQuit { exit_code: 64 });

        match rx.try_recv() {
            Ok(Announcement::Lifecycle(LifecycleEvent::StageInitialized { stage })) => {
                assert_eq!(stage, 1)
            }
            other => panic!("unexpected announcement: {other:?}"),
        }
        match rx.try_recv() {
            Ok(Announcement::System(SystemEvent::OnQuit { exit_code })) => {
                assert_eq!(exit_code, 64)
            }
            other => panic!("unexpected announcement: {other:?}"),
        }
    }

    #[test]
    fn emitting_without_receivers_is_harmless() {
        let bridge = BroadcastEventBridge::new(4);
        bridge.set_external_emitter(Arc::new(NoopEventEmitter));
        bridge.emit_gui(GuiEvent::OnDpmsActivated);
        assert_eq!(bridge.receiver_count(), 0);
    }
}
