//! Dedicated Tokio runtime for background jobs.
//!
//! Library scans and scripts run here, on their own worker threads, so they
//! never compete with the owning thread's frame loop. The runtime lives on a
//! dedicated OS thread that blocks until shutdown is requested.

use std::thread::{self, JoinHandle};

use tokio::runtime::{Builder, Handle};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::constants::JOB_WORKER_THREADS;

pub struct JobRuntime {
    handle: Handle,
    cancel: CancellationToken,
    /// None after shutdown.
    thread: Option<JoinHandle<()>>,
}

impl JobRuntime {
    /// Starts the runtime thread and waits until it is ready.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned or the runtime fails
    /// to build.
    pub fn new() -> std::io::Result<Self> {
        let (tx, rx) = oneshot::channel::<std::io::Result<Handle>>();
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();

        let thread = thread::Builder::new()
            .name("job-runtime".into())
            .spawn(move || {
                let runtime = match Builder::new_multi_thread()
                    .worker_threads(JOB_WORKER_THREADS)
                    .thread_name("job-worker")
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = tx.send(Err(e));
                        return;
                    }
                };

                if tx.send(Ok(runtime.handle().clone())).is_err() {
                    log::error!("[Jobs] Failed to hand out runtime handle");
                    return;
                }

                runtime.block_on(async {
                    cancel_clone.cancelled().await;
                    log::info!("[Jobs] Runtime shutting down");
                });
                // dropping the runtime waits for blocking tasks to finish
            })?;

        let handle = rx
            .blocking_recv()
            .map_err(|_| std::io::Error::other("Job runtime thread exited during startup"))??;

        log::info!(
            "[Jobs] Runtime started with {} worker threads",
            JOB_WORKER_THREADS
        );

        Ok(Self {
            handle,
            cancel,
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Runs blocking work on the runtime's blocking pool.
    pub fn spawn_blocking<F, R>(&self, work: F) -> tokio::task::JoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.handle.spawn_blocking(work)
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Stops the runtime and joins its thread.
    pub fn shutdown(&mut self) {
        self.cancel.cancel();

        if let Some(thread) = self.thread.take() {
            if let Err(e) = thread.join() {
                log::error!("[Jobs] Runtime thread panicked: {:?}", e);
            } else {
                log::info!("[Jobs] Runtime shutdown complete");
            }
        }
    }
}

impl Drop for JobRuntime {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.shutdown();
        }
    }
}
