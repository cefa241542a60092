//! Background jobs.
//!
//! [`JobManager`] runs blocking work on the dedicated [`JobRuntime`] and keeps
//! a cancellation token per job, so whole categories can be cancelled at
//! shutdown. Cancellation is cooperative: jobs poll their token.

mod library;
mod runtime;

pub use library::LibraryScanner;
pub use runtime::JobRuntime;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::{KodiError, KodiResult};

/// Identifier of a submitted job.
pub type JobId = u64;

/// Category used to cancel related jobs together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobCategory {
    LibraryScan,
    Script,
    Other,
}

/// A running job, as listed by [`JobManager::active_jobs`].
#[derive(Debug, Clone)]
pub struct JobInfo {
    pub id: JobId,
    pub name: String,
    pub category: JobCategory,
    pub started: Instant,
}

struct JobEntry {
    info: JobInfo,
    cancel: CancellationToken,
}

/// Unlists a job when its work returns or panics.
struct JobListing {
    jobs: Arc<DashMap<JobId, JobEntry>>,
    id: JobId,
}

impl Drop for JobListing {
    fn drop(&mut self) {
        if let Some((_, entry)) = self.jobs.remove(&self.id) {
            if std::thread::panicking() {
                log::warn!("[Jobs] #{} {} panicked", self.id, entry.info.name);
            } else {
                log::debug!(
                    "[Jobs] #{} {} finished after {:?}",
                    self.id,
                    entry.info.name,
                    entry.info.started.elapsed()
                );
            }
        }
    }
}

pub struct JobManager {
    runtime: Mutex<Option<JobRuntime>>,
    jobs: Arc<DashMap<JobId, JobEntry>>,
    next_id: AtomicU64,
}

impl JobManager {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            runtime: Mutex::new(Some(JobRuntime::new()?)),
            jobs: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
        })
    }

    /// Runs `work` on the job runtime's blocking pool.
    ///
    /// The job is listed until `work` returns.
    pub fn submit<F>(&self, name: impl Into<String>, category: JobCategory, work: F) -> KodiResult<JobId>
    where
        F: FnOnce(CancellationToken) + Send + 'static,
    {
        let runtime = self.runtime.lock();
        let runtime = runtime
            .as_ref()
            .ok_or_else(|| KodiError::Internal("job runtime is shut down".to_string()))?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let cancel = CancellationToken::new();
        let info = JobInfo {
            id,
            name: name.into(),
            category,
            started: Instant::now(),
        };
        log::debug!("[Jobs] Starting #{} {} ({:?})", id, info.name, category);
        self.jobs.insert(
            id,
            JobEntry {
                info,
                cancel: cancel.clone(),
            },
        );

        let listing = JobListing {
            jobs: Arc::clone(&self.jobs),
            id,
        };
        runtime.spawn_blocking(move || {
            let _listing = listing;
            work(cancel);
        });
        Ok(id)
    }

    pub fn cancel(&self, id: JobId) -> bool {
        match self.jobs.get(&id) {
            Some(entry) => {
                entry.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancels every job of a category. Returns how many were signalled.
    pub fn cancel_jobs(&self, category: JobCategory) -> usize {
        let mut cancelled = 0;
        for entry in self.jobs.iter().filter(|e| e.info.category == category) {
            entry.cancel.cancel();
            cancelled += 1;
        }
        if cancelled > 0 {
            log::info!("[Jobs] Cancelled {} {:?} job(s)", cancelled, category);
        }
        cancelled
    }

    pub fn active_jobs(&self) -> Vec<JobInfo> {
        let mut jobs: Vec<JobInfo> = self.jobs.iter().map(|e| e.info.clone()).collect();
        jobs.sort_by_key(|info| info.id);
        jobs
    }

    pub fn active_count(&self, category: JobCategory) -> usize {
        self.jobs
            .iter()
            .filter(|e| e.info.category == category)
            .count()
    }

    pub fn is_active(&self, id: JobId) -> bool {
        self.jobs.contains_key(&id)
    }

    /// Waits until no job is listed. Returns false on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.jobs.is_empty() {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        true
    }

    /// Cancels all jobs and stops the runtime, waiting for running jobs.
    pub fn shutdown(&self) {
        for entry in self.jobs.iter() {
            entry.cancel.cancel();
        }
        if let Some(mut runtime) = self.runtime.lock().take() {
            runtime.shutdown();
        }
    }
}

impl Drop for JobManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn cancel_jobs_signals_only_that_category() {
        let jobs = JobManager::new().unwrap();
        let scan_stopped = Arc::new(AtomicBool::new(false));
        let (started_tx, started_rx) = std::sync::mpsc::channel();

        let flag = Arc::clone(&scan_stopped);
        let tx = started_tx.clone();
        let scan = jobs
            .submit("scan", JobCategory::LibraryScan, move |cancel| {
                let _ = tx.send(());
                while !cancel.is_cancelled() {
                    std::thread::sleep(Duration::from_millis(1));
                }
                flag.store(true, Ordering::SeqCst);
            })
            .unwrap();
        let other = jobs
            .submit("other", JobCategory::Other, move |cancel| {
                let _ = started_tx.send(());
                while !cancel.is_cancelled() {
                    std::thread::sleep(Duration::from_millis(1));
                }
            })
            .unwrap();
        started_rx.recv().unwrap();
        started_rx.recv().unwrap();

        assert_eq!(jobs.cancel_jobs(JobCategory::LibraryScan), 1);
        let deadline = Instant::now() + Duration::from_secs(5);
        while jobs.is_active(scan) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(scan_stopped.load(Ordering::SeqCst));
        assert!(jobs.is_active(other));

        jobs.shutdown();
        assert!(!jobs.is_active(other));
    }

    #[test]
    fn submit_after_shutdown_fails() {
        let jobs = JobManager::new().unwrap();
        jobs.shutdown();
        assert!(jobs.submit("late", JobCategory::Other, |_| {}).is_err());
    }

    #[test]
    fn finished_jobs_leave_the_list() {
        let jobs = JobManager::new().unwrap();
        jobs.submit("quick", JobCategory::Other, |_| {}).unwrap();
        assert!(jobs.wait_idle(Duration::from_secs(5)));
        assert!(jobs.active_jobs().is_empty());
    }

    #[test]
    fn panicking_job_leaves_the_list() {
        let jobs = JobManager::new().unwrap();
        let id = jobs
            .submit("broken", JobCategory::Script, |_| panic!("script failed"))
            .unwrap();
        assert!(jobs.wait_idle(Duration::from_secs(5)));
        assert!(!jobs.is_active(id));
        assert_eq!(jobs.active_count(JobCategory::Script), 0);

        assert!(jobs.submit("next", JobCategory::Other, |_| {}).is_ok());
        assert!(jobs.wait_idle(Duration::from_secs(5)));
    }
}
