//! Library scanning on the job runtime.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use super::{JobCategory, JobId, JobManager};
use crate::error::KodiResult;
use crate::gui::{GuiMessage, GuiMessageKind};
use crate::media::{MediaItem, MediaKind};
use crate::messaging::ApplicationMessenger;
use crate::services::FileExtensionProvider;

/// Walks source folders and collects playable items.
///
/// Running scans block idle shutdown and are cancelled when the services
/// stop.
pub struct LibraryScanner {
    jobs: Arc<JobManager>,
    extensions: Arc<FileExtensionProvider>,
    messenger: Arc<ApplicationMessenger>,
    items: Arc<Mutex<Vec<MediaItem>>>,
}

impl LibraryScanner {
    pub fn new(
        jobs: Arc<JobManager>,
        extensions: Arc<FileExtensionProvider>,
        messenger: Arc<ApplicationMessenger>,
    ) -> Self {
        Self {
            jobs,
            extensions,
            messenger,
            items: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Starts scanning `sources`. The previous results are replaced when the
    /// scan completes; a cancelled scan keeps them.
    pub fn start_scan(&self, sources: Vec<PathBuf>) -> KodiResult<JobId> {
        let extensions = Arc::clone(&self.extensions);
        let messenger = Arc::clone(&self.messenger);
        let items = Arc::clone(&self.items);

        self.jobs
            .submit("library scan", JobCategory::LibraryScan, move |cancel| {
                let mut found = Vec::new();
                for source in &sources {
                    scan_dir(source, &extensions, &cancel, &mut found);
                }
                if cancel.is_cancelled() {
                    log::info!("[Library] Scan cancelled");
                    return;
                }
                log::info!("[Library] Scan found {} item(s)", found.len());
                *items.lock() = found;
                messenger.send_gui_message(GuiMessage::new(GuiMessageKind::Refresh, 0, 0));
            })
    }

    pub fn is_scanning(&self) -> bool {
        self.jobs.active_count(JobCategory::LibraryScan) > 0
    }

    pub fn stop_scanning(&self) {
        self.jobs.cancel_jobs(JobCategory::LibraryScan);
    }

    pub fn items(&self) -> Vec<MediaItem> {
        self.items.lock().clone()
    }
}

fn scan_dir(
    dir: &Path,
    extensions: &FileExtensionProvider,
    cancel: &CancellationToken,
    found: &mut Vec<MediaItem>,
) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("[Library] Skipping {}: {}", dir.display(), e);
            return;
        }
    };

    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
    paths.sort();

    for path in paths {
        if cancel.is_cancelled() {
            return;
        }
        if path.is_dir() {
            scan_dir(&path, extensions, cancel, found);
            continue;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        let kind = extensions.kind_of(ext);
        if matches!(kind, MediaKind::Audio | MediaKind::Video) {
            found.push(MediaItem::new(path.display().to_string()).with_kind(kind));
        }
    }
}
