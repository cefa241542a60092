//! Script invocation.
//!
//! Interpreters register as [`ScriptInvocationHandler`]s for file extensions.
//! Scripts run on the job runtime; they talk to the application through the
//! messenger, or touch GUI state directly inside
//! [`FrameMoveGuard::external_call`].

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::application::FrameMoveGuard;
use crate::error::{KodiError, KodiResult};
use crate::jobs::{JobCategory, JobId, JobManager};
use crate::messaging::ApplicationMessenger;
use crate::utils;

/// Everything a running script gets.
pub struct ScriptInvocation {
    pub path: String,
    pub args: Vec<String>,
    pub cancel: CancellationToken,
    pub messenger: Arc<ApplicationMessenger>,
    /// Present once the application is running.
    pub frame_guard: Option<Arc<FrameMoveGuard>>,
}

/// An interpreter for one or more script types.
pub trait ScriptInvocationHandler: Send + Sync {
    /// Runs the script to completion. Should return early once
    /// `invocation.cancel` fires.
    fn execute(&self, invocation: &ScriptInvocation) -> Result<(), String>;
}

pub struct ScriptInvocationManager {
    jobs: Arc<JobManager>,
    messenger: Arc<ApplicationMessenger>,
    handlers: RwLock<HashMap<String, Arc<dyn ScriptInvocationHandler>>>,
    frame_guard: RwLock<Option<Arc<FrameMoveGuard>>>,
}

impl ScriptInvocationManager {
    pub fn new(jobs: Arc<JobManager>, messenger: Arc<ApplicationMessenger>) -> Self {
        Self {
            jobs,
            messenger,
            handlers: RwLock::new(HashMap::new()),
            frame_guard: RwLock::new(None),
        }
    }

    /// Registers `handler` for each extension (without the dot).
    pub fn register_handler(&self, extensions: &[&str], handler: Arc<dyn ScriptInvocationHandler>) {
        let mut handlers = self.handlers.write();
        for ext in extensions {
            handlers.insert(ext.trim_start_matches('.').to_ascii_lowercase(), Arc::clone(&handler));
        }
        log::debug!("[Scripts] Handler registered for {:?}", extensions);
    }

    pub fn unregister_handlers(&self) {
        self.handlers.write().clear();
    }

    pub fn set_frame_guard(&self, guard: Option<Arc<FrameMoveGuard>>) {
        *self.frame_guard.write() = guard;
    }

    pub fn has_handler(&self, path: &str) -> bool {
        self.handler_for(path).is_some()
    }

    fn handler_for(&self, path: &str) -> Option<Arc<dyn ScriptInvocationHandler>> {
        let ext = utils::extension(path)?;
        self.handlers.read().get(&ext).cloned()
    }

    /// Starts a script on the job runtime.
    pub fn execute(&self, path: &str, args: Vec<String>) -> KodiResult<JobId> {
        let handler = self
            .handler_for(path)
            .ok_or_else(|| KodiError::Script(format!("no handler for {}", path)))?;
        let messenger = Arc::clone(&self.messenger);
        let frame_guard = self.frame_guard.read().clone();
        let script_path = path.to_string();

        log::info!("[Scripts] Starting {}", path);
        self.jobs
            .submit(format!("script {}", path), JobCategory::Script, move |cancel| {
                let invocation = ScriptInvocation {
                    path: script_path,
                    args,
                    cancel,
                    messenger,
                    frame_guard,
                };
                match handler.execute(&invocation) {
                    Ok(()) => log::info!("[Scripts] {} finished", invocation.path),
                    Err(e) => log::warn!("[Scripts] {} failed: {}", invocation.path, e),
                }
            })
    }

    pub fn is_running(&self, id: JobId) -> bool {
        self.jobs.is_active(id)
    }

    pub fn running_count(&self) -> usize {
        self.jobs.active_count(JobCategory::Script)
    }

    /// Asks every running script to stop.
    pub fn stop_all(&self) -> usize {
        self.jobs.cancel_jobs(JobCategory::Script)
    }
}
