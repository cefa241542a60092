//! Cross-thread command queue drained by the owning (GUI) thread.

use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use super::command::{Command, QueueKind, TargetKind};
use super::completion::SignalOnDrop;
use super::message::{OwnedPayload, ThreadMessage};
use super::target::MessageTarget;
use crate::constants::MESSAGE_RESULT_UNSET;

#[derive(Default)]
struct MessageQueues {
    general: VecDeque<ThreadMessage>,
    window: VecDeque<ThreadMessage>,
}

impl MessageQueues {
    fn get_mut(&mut self, kind: QueueKind) -> &mut VecDeque<ThreadMessage> {
        match kind {
            QueueKind::General => &mut self.general,
            QueueKind::Window => &mut self.window,
        }
    }
}

/// Thread-safe command queue with fire-and-forget and blocking dispatch.
///
/// Any thread may post or send. Only the owning thread drains the queues and
/// runs handlers, so receivers observe a single-threaded sequence of messages.
///
/// # Ordering
///
/// Each queue is FIFO. Messages in different queues have no relative order.
///
/// # Blocking sends
///
/// [`send`](Self::send) from a non-owning thread waits until the owning thread
/// dispatched the message, or until [`cleanup`](Self::cleanup) releases it.
/// From the owning thread it runs the handler inline and never touches the
/// queue.
pub struct ApplicationMessenger {
    queues: Mutex<MessageQueues>,
    targets: RwLock<HashMap<TargetKind, Weak<dyn MessageTarget>>>,
    owning_thread: RwLock<Option<ThreadId>>,
    stopping: AtomicBool,
}

impl ApplicationMessenger {
    pub fn new() -> Self {
        Self {
            queues: Mutex::new(MessageQueues::default()),
            targets: RwLock::new(HashMap::new()),
            owning_thread: RwLock::new(None),
            stopping: AtomicBool::new(false),
        }
    }

    /// Marks the calling thread as the one that drains queues.
    pub fn set_owning_thread(&self) {
        let id = thread::current().id();
        *self.owning_thread.write() = Some(id);
        log::debug!("[Messenger] Owning thread set to {:?}", id);
    }

    pub fn is_owning_thread(&self) -> bool {
        *self.owning_thread.read() == Some(thread::current().id())
    }

    /// Registers a receiver for its [`TargetKind`], replacing any previous one.
    ///
    /// Only a weak reference is kept; a dropped receiver is skipped at dispatch.
    pub fn register_receiver(&self, target: &Arc<dyn MessageTarget>) {
        let kind = target.target();
        self.targets.write().insert(kind, Arc::downgrade(target));
        log::debug!("[Messenger] Registered receiver for {:?}", kind);
    }

    pub fn unregister_receiver(&self, kind: TargetKind) {
        self.targets.write().remove(&kind);
    }

    /// Stops accepting blocking sends. Posts are still queued.
    pub fn begin_shutdown(&self) {
        if !self.stopping.swap(true, Ordering::SeqCst) {
            log::info!("[Messenger] Shutdown started, blocking sends are now rejected");
        }
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    pub fn queue_len(&self, kind: QueueKind) -> usize {
        self.queues.lock().get_mut(kind).len()
    }

    /// Appends a message to its queue and returns immediately.
    pub fn post(&self, message: ThreadMessage) {
        let kind = message.command.queue();
        log::trace!("[Messenger] Post {}", message.command);
        self.queues.lock().get_mut(kind).push_back(message);
    }

    /// Delivers a message and waits for the handler's result.
    ///
    /// Returns `-1` if the handler did not set a result, or if the messenger is
    /// stopping (the message is then dropped without dispatch).
    pub fn send(&self, mut message: ThreadMessage) -> i32 {
        if self.is_stopping() {
            log::debug!("[Messenger] Dropping {} sent during shutdown", message.command);
            return MESSAGE_RESULT_UNSET;
        }
        let completion = message.attach_completion();

        if self.is_owning_thread() {
            self.dispatch(message);
            return completion.result();
        }

        if !self.enqueue_blocking(message) {
            return MESSAGE_RESULT_UNSET;
        }
        completion.wait();
        completion.result()
    }

    /// Like [`send`](Self::send) but gives up waiting after `timeout`.
    ///
    /// Returns `None` on timeout. The message stays queued and is still
    /// dispatched later; only the caller stops waiting for it.
    pub fn send_timeout(&self, mut message: ThreadMessage, timeout: Duration) -> Option<i32> {
        if self.is_stopping() {
            return Some(MESSAGE_RESULT_UNSET);
        }
        let completion = message.attach_completion();

        if self.is_owning_thread() {
            self.dispatch(message);
            return Some(completion.result());
        }

        if !self.enqueue_blocking(message) {
            return Some(MESSAGE_RESULT_UNSET);
        }
        if completion.wait_timeout(timeout) {
            Some(completion.result())
        } else {
            log::warn!("[Messenger] Blocking send timed out after {:?}", timeout);
            None
        }
    }

    /// Dispatches every general-queue message, including ones appended meanwhile.
    ///
    /// Returns the number of messages dispatched.
    pub fn process_messages(&self) -> usize {
        self.drain(QueueKind::General)
    }

    /// Dispatches every window-queue message.
    pub fn process_window_messages(&self) -> usize {
        self.drain(QueueKind::Window)
    }

    /// Releases every queued message without dispatching it.
    ///
    /// Blocking senders wake with the default result. Also starts shutdown,
    /// so later blocking sends return immediately. Must run after the owning
    /// loop stopped draining.
    pub fn cleanup(&self) -> usize {
        self.begin_shutdown();
        let drained: Vec<ThreadMessage> = {
            let mut guard = self.queues.lock();
            let queues = &mut *guard;
            queues
                .general
                .drain(..)
                .chain(queues.window.drain(..))
                .collect()
        };

        let count = drained.len();
        for message in drained {
            if let Some(completion) = message.completion() {
                completion.signal();
            }
        }
        if count > 0 {
            log::info!("[Messenger] Released {} undispatched message(s)", count);
        }
        count
    }

    /// Queues a blocking message unless shutdown started.
    ///
    /// The stopping flag is read under the queue lock, so a message is either
    /// queued before `cleanup` drains or rejected here.
    fn enqueue_blocking(&self, message: ThreadMessage) -> bool {
        let mut queues = self.queues.lock();
        if self.is_stopping() {
            log::debug!(
                "[Messenger] Dropping {} sent during shutdown",
                message.command
            );
            return false;
        }
        log::trace!("[Messenger] Send {}", message.command);
        queues.get_mut(message.command.queue()).push_back(message);
        true
    }

    fn drain(&self, kind: QueueKind) -> usize {
        if let Some(owner) = *self.owning_thread.read() {
            if owner != thread::current().id() {
                log::warn!("[Messenger] Ignoring {:?} drain from non-owning thread", kind);
                return 0;
            }
        }

        let mut processed = 0;
        loop {
            // pop under the lock, dispatch without it
            let next = self.queues.lock().get_mut(kind).pop_front();
            let Some(message) = next else { break };
            self.dispatch(message);
            processed += 1;
        }
        processed
    }

    fn dispatch(&self, mut message: ThreadMessage) {
        let _signal = SignalOnDrop::new(message.completion());
        let command = message.command;

        let outcome = match command {
            Command::Callback => match message.take_owned() {
                Some(OwnedPayload::Callback(callback)) => {
                    panic::catch_unwind(AssertUnwindSafe(callback))
                }
                _ => {
                    log::warn!("[Messenger] Callback message without a closure");
                    Ok(())
                }
            },
            _ => {
                let Some(target) = self.resolve_target(command) else {
                    log::warn!("[Messenger] No receiver for {}", command);
                    return;
                };
                panic::catch_unwind(AssertUnwindSafe(|| {
                    target.on_application_message(&mut message)
                }))
            }
        };

        if outcome.is_err() {
            log::error!("[Messenger] Handler for {} panicked", command);
        }
    }

    fn resolve_target(&self, command: Command) -> Option<Arc<dyn MessageTarget>> {
        let kind = command.target()?;
        self.targets.read().get(&kind).and_then(Weak::upgrade)
    }
}

impl Default for ApplicationMessenger {
    fn default() -> Self {
        Self::new()
    }
}
