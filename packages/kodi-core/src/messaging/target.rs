use super::command::TargetKind;
use super::message::ThreadMessage;

/// A receiver of dispatched messages.
///
/// Handlers run on the owning thread with the queue lock released, so they may
/// post or send further messages. A send from inside a handler runs inline.
/// Implementations must not hold their own state locks across such calls.
pub trait MessageTarget: Send + Sync {
    /// Receiver kind this target serves.
    fn target(&self) -> TargetKind;

    /// Handles one message. Owned payloads may be moved out; reply slots written.
    fn on_application_message(&self, message: &mut ThreadMessage);
}
